// Copyright (C) 2019-2020  Pierre Krieger
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.


use super::harness::{Fixture, TestInterface, DEFAULT_CAPS};
use crate::ffi::{FlowMessage, NGM_FLOW_COOKIE};
use crate::{
    CallbackSlot, ChecksumCaps, Error, EthernetNodeCallbacks as _, InputVerdict, InterfaceType,
    LifecycleState, LinkState, NetInterface as _, NodeId, NodeType as _, ShutdownOutcome,
};

#[test]
fn attach_creates_named_node() {
    let fixture = Fixture::new();
    let ifp = TestInterface::new("em0", 1);
    let node = fixture.attach(&ifp);

    assert_eq!(ifp.netgraph_node(), Some(node));
    assert_eq!(fixture.graph.node_name(node), Some("em0".into()));

    let status = fixture.status(node);
    assert!(status.has_interface);
    assert_eq!(status.num_hooks(), 0);
    assert!(status.auto_src_addr);
    assert!(!status.promiscuous);
    assert_eq!(status.saved_hw_checksum_caps, DEFAULT_CAPS);
    assert_eq!(status.lifecycle, LifecycleState::Attached);
}

#[test]
fn node_name_sanitized() {
    let fixture = Fixture::new();
    let ifp = TestInterface::with_type("em0.100", 4, InterfaceType::L2Vlan);
    let node = fixture.attach(&ifp);
    assert_eq!(fixture.graph.node_name(node), Some("em0_100".into()));
}

#[test]
fn naming_failure_not_fatal() {
    let fixture = Fixture::new();
    fixture.graph.set_fail_name(true);
    let ifp = TestInterface::new("em0", 1);
    let node = fixture.attach(&ifp);

    assert_eq!(fixture.graph.node_name(node), None);
    assert!(fixture.graph.node_exists(node));
}

#[test]
fn creation_failure() {
    let fixture = Fixture::new();
    fixture.graph.set_fail_create(true);
    let ifp = TestInterface::new("em0", 1);
    fixture.slot.attach(&ifp.as_dyn());

    assert_eq!(ifp.netgraph_node(), None);
    assert_eq!(fixture.node_type.num_nodes(), 0);
    assert_eq!(fixture.graph.num_nodes(), 0);

    // Frames flow as if there was no node.
    let verdict = fixture.slot.input(&ifp.as_dyn(), crate::Frame::new(vec![0; 60]));
    assert!(matches!(verdict, InputVerdict::Continue(_)));
}

#[test]
fn state_allocation_failure() {
    let fixture = Fixture::new();
    fixture.node_type.fail_next_insert();
    let ifp = TestInterface::new("em0", 1);
    fixture.slot.attach(&ifp.as_dyn());

    // The node created in the graph has been destroyed right away.
    assert_eq!(ifp.netgraph_node(), None);
    assert_eq!(fixture.node_type.num_nodes(), 0);
    assert_eq!(fixture.graph.num_nodes(), 0);
    assert!(fixture.graph.shutdowns().is_empty());

    let node = fixture.attach(&ifp);
    assert!(fixture.graph.node_exists(node));
    assert_eq!(fixture.graph.num_nodes(), 1);
}

#[test]
#[should_panic]
fn double_attach_panics() {
    let fixture = Fixture::new();
    let ifp = TestInterface::new("em0", 1);
    fixture.attach(&ifp);
    fixture.slot.attach(&ifp.as_dyn());
}

#[test]
fn constructor_refused() {
    let fixture = Fixture::new();
    assert_eq!(
        fixture.node_type.constructor(NodeId::from(1234)),
        Err(Error::InvalidArgument)
    );
    assert_eq!(fixture.node_type.type_name(), "ether");
}

#[test]
fn detach_destroys_node() {
    let fixture = Fixture::new();
    let ifp = TestInterface::new("em0", 1);
    let node = fixture.attach(&ifp);
    fixture.graph.connect(node, "upper").unwrap();
    fixture.graph.connect(node, "lower").unwrap();
    assert_eq!(ifp.hw_checksum_caps(), ChecksumCaps::NONE);

    fixture.slot.detach(&ifp.as_dyn());

    assert_eq!(ifp.hw_checksum_caps(), DEFAULT_CAPS);
    assert_eq!(ifp.netgraph_node(), None);
    assert_eq!(fixture.node_type.status(node), None);
    assert_eq!(fixture.node_type.num_nodes(), 0);
    assert!(!fixture.graph.node_exists(node));
    assert_eq!(
        fixture.graph.shutdowns(),
        vec![(node, ShutdownOutcome::Destroyed)]
    );
}

#[test]
fn detach_without_node_is_noop() {
    let fixture = Fixture::new();
    let ifp = TestInterface::new("em0", 1);
    fixture.slot.detach(&ifp.as_dyn());
    fixture.node_type.detach(&ifp.as_dyn());
    assert!(fixture.graph.shutdowns().is_empty());
}

#[test]
fn graph_removal_resets_node() {
    let fixture = Fixture::new();
    let ifp = TestInterface::new("em0", 1);
    let node = fixture.attach(&ifp);
    fixture.graph.connect(node, "upper").unwrap();
    fixture.graph.connect(node, "orphan").unwrap();
    fixture
        .control(node, crate::ffi::EtherMessage::SetPromisc(true))
        .unwrap();

    crate::GraphRuntime::remove_node(&*fixture.graph, node);

    assert!(fixture.graph.node_exists(node));
    assert_eq!(fixture.graph.revivals(node), 1);
    assert_eq!(ifp.hw_checksum_caps(), DEFAULT_CAPS);
    assert_eq!(ifp.promisc_calls(), vec![true, false]);

    let shutdowns = fixture.graph.shutdowns();
    assert_eq!(shutdowns.len(), 1);
    match &shutdowns[0] {
        (n, ShutdownOutcome::Reset(status)) => {
            assert_eq!(*n, node);
            assert_eq!(status.num_hooks(), 0);
            assert!(!status.promiscuous);
            assert!(status.auto_src_addr);
            assert!(status.has_interface);
            assert_eq!(status.lifecycle, LifecycleState::Attached);
        }
        _ => panic!(),
    }
}

#[test]
fn link_state_forwarded_on_lower() {
    let fixture = Fixture::new();
    let ifp = TestInterface::new("em0", 1);
    let node = fixture.attach(&ifp);

    fixture.slot.link_state_change(&ifp.as_dyn(), LinkState::Up);
    assert!(fixture.graph.sent_messages().is_empty());

    let lower = fixture.graph.connect(node, "lower").unwrap();
    fixture.slot.link_state_change(&ifp.as_dyn(), LinkState::Up);
    fixture.slot.link_state_change(&ifp.as_dyn(), LinkState::Unknown);
    fixture.slot.link_state_change(&ifp.as_dyn(), LinkState::Down);

    let messages = fixture.graph.sent_messages();
    assert_eq!(messages.len(), 2);
    for (n, hook, message) in &messages {
        assert_eq!(*n, node);
        assert_eq!(*hook, lower);
        assert_eq!(message.cookie, NGM_FLOW_COOKIE);
    }
    assert_eq!(
        FlowMessage::from_message(&messages[0].2),
        Ok(FlowMessage::LinkIsUp)
    );
    assert_eq!(
        FlowMessage::from_message(&messages[1].2),
        Ok(FlowMessage::LinkIsDown)
    );
}

#[test]
fn link_state_send_failure_ignored() {
    let fixture = Fixture::new();
    let ifp = TestInterface::new("em0", 1);
    let node = fixture.attach(&ifp);
    fixture.graph.connect(node, "lower").unwrap();
    fixture.graph.set_send_status(Err(Error::Interface(55)));

    fixture.slot.link_state_change(&ifp.as_dyn(), LinkState::Down);
    assert_eq!(fixture.graph.sent_messages().len(), 1);
    assert!(fixture.status(node).lower.is_some());
}

#[test]
fn rename_renames_node() {
    let fixture = Fixture::new();
    let ifp = TestInterface::new("em0", 1);
    let node = fixture.attach(&ifp);

    ifp.set_name("wan:0");
    fixture.slot.interface_renamed(&ifp.as_dyn());
    assert_eq!(fixture.graph.node_name(node), Some("wan_0".into()));

    fixture.graph.set_fail_name(true);
    ifp.set_name("wan1");
    fixture.slot.interface_renamed(&ifp.as_dyn());
    assert_eq!(fixture.graph.node_name(node), Some("wan_0".into()));
}

#[test]
fn existing_interfaces_attached_at_build() {
    let ether = TestInterface::new("em0", 1);
    let vlan = TestInterface::with_type("vlan5", 2, InterfaceType::L2Vlan);
    let other = TestInterface::with_type("lo0", 3, InterfaceType::Other);
    let taken = TestInterface::new("em1", 4);
    taken.set_netgraph_node(Some(NodeId::from(999)));

    let fixture = Fixture::with_existing(vec![
        ether.as_dyn(),
        vlan.as_dyn(),
        other.as_dyn(),
        taken.as_dyn(),
    ]);

    assert_eq!(fixture.node_type.num_nodes(), 2);
    let ether_node = fixture.node_type.node_for(&*ether).unwrap();
    let vlan_node = fixture.node_type.node_for(&*vlan).unwrap();
    assert_eq!(fixture.graph.node_name(ether_node), Some("em0".into()));
    assert_eq!(fixture.graph.node_name(vlan_node), Some("vlan5".into()));
    assert_eq!(other.netgraph_node(), None);
    assert_eq!(taken.netgraph_node(), Some(NodeId::from(999)));
    assert_eq!(fixture.node_type.node_for(&*taken), None);
}

#[test]
fn unregister_busy_while_nodes_exist() {
    let fixture = Fixture::new();
    let ifp = TestInterface::new("em0", 1);
    fixture.attach(&ifp);

    assert_eq!(fixture.node_type.unregister(&fixture.slot), Err(Error::Busy));
    assert!(fixture.slot.is_registered());

    fixture.slot.detach(&ifp.as_dyn());
    assert_eq!(fixture.node_type.unregister(&fixture.slot), Ok(()));
    assert!(!fixture.slot.is_registered());

    // Without callbacks, new interfaces don't get a node.
    let other = TestInterface::new("em1", 2);
    fixture.slot.attach(&other.as_dyn());
    assert_eq!(other.netgraph_node(), None);
}

#[test]
fn slot_registration() {
    let fixture = Fixture::new();
    assert_eq!(fixture.node_type.register(&fixture.slot), Err(Error::Busy));

    let empty = CallbackSlot::new();
    assert!(!empty.is_registered());
    let ifp = TestInterface::new("em0", 1);
    empty.attach(&ifp.as_dyn());
    assert_eq!(ifp.netgraph_node(), None);
}
