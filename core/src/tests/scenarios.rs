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


//! End-to-end runs through the interface layer, the node and the graph.

use super::harness::{ether_frame, Fixture, TestInterface, PEER_MAC};
use crate::{Error, Frame, GraphRuntime as _, InputVerdict, NetInterface as _, OutputVerdict};

#[test]
fn inbound_traffic_diverted_to_lower() {
    let fixture = Fixture::new();
    let ifp = TestInterface::new("em0", 1);
    let node = fixture.attach(&ifp);
    assert_eq!(fixture.status(node).num_hooks(), 0);

    let h1 = fixture.graph.connect(node, "lower").unwrap();

    let data = ether_frame(PEER_MAC, 64);
    match fixture.slot.input(&ifp.as_dyn(), Frame::new(data.clone())) {
        InputVerdict::Diverted => {}
        InputVerdict::Continue(_) => panic!(),
    }

    assert_eq!(fixture.graph.sent_data(), vec![(h1, data)]);
    assert!(ifp.demuxed().is_empty());
}

#[test]
fn outbound_traffic_diverted_to_upper() {
    let fixture = Fixture::new();
    let ifp = TestInterface::new("em0", 1);
    let node = fixture.attach(&ifp);
    let h2 = fixture.graph.connect(node, "upper").unwrap();
    fixture.graph.set_send_status(Err(Error::OutOfMemory));

    let data = ether_frame(ifp.mac_address(), 64);
    match fixture.slot.output(&ifp.as_dyn(), Frame::new(data.clone())) {
        OutputVerdict::Diverted(status) => assert_eq!(status, Err(Error::OutOfMemory)),
        OutputVerdict::Continue(_) => panic!(),
    }

    assert_eq!(fixture.graph.sent_data(), vec![(h2, data)]);
    assert!(ifp.transmitted().is_empty());
}

#[test]
fn short_frame_from_graph_not_transmitted() {
    let fixture = Fixture::new();
    let ifp = TestInterface::new("em0", 1);
    let node = fixture.attach(&ifp);
    let lower = fixture.graph.connect(node, "lower").unwrap();

    let frame = Frame::new(vec![0xff; 10]);
    assert_eq!(fixture.graph.deliver(lower, frame), Err(Error::InvalidArgument));
    assert!(ifp.transmitted().is_empty());
}

#[test]
fn detach_with_hooks_frees_node() {
    let fixture = Fixture::new();
    let ifp = TestInterface::new("em0", 1);
    let node = fixture.attach(&ifp);
    fixture.graph.connect(node, "lower").unwrap();
    fixture.graph.connect(node, "orphan").unwrap();

    fixture.slot.detach(&ifp.as_dyn());

    assert!(!fixture.graph.node_exists(node));
    assert!(!fixture.graph.is_node_valid(node));
    assert_eq!(fixture.graph.revivals(node), 0);
    assert_eq!(
        fixture.graph.shutdowns(),
        vec![(node, crate::ShutdownOutcome::Destroyed)]
    );
    assert_eq!(fixture.node_type.status(node), None);
    assert_eq!(ifp.netgraph_node(), None);

    // The interface layer no longer calls into the node for this interface.
    let data = ether_frame(PEER_MAC, 64);
    match fixture.slot.input(&ifp.as_dyn(), Frame::new(data.clone())) {
        InputVerdict::Continue(frame) => assert_eq!(frame.to_vec(), data),
        InputVerdict::Diverted => panic!(),
    }
}

#[test]
fn nodes_are_independent() {
    let fixture = Fixture::new();
    let em0 = TestInterface::new("em0", 1);
    let em1 = TestInterface::new("em1", 2);
    let node0 = fixture.attach(&em0);
    let node1 = fixture.attach(&em1);
    assert_ne!(node0, node1);

    let lower0 = fixture.graph.connect(node0, "lower").unwrap();
    let upper1 = fixture.graph.connect(node1, "upper").unwrap();

    let data = ether_frame(PEER_MAC, 64);
    assert!(matches!(
        fixture.slot.input(&em1.as_dyn(), Frame::new(data.clone())),
        InputVerdict::Continue(_)
    ));
    assert!(matches!(
        fixture.slot.input(&em0.as_dyn(), Frame::new(data.clone())),
        InputVerdict::Diverted
    ));

    // Frames written on the upper hook of em1 are received by em1 only.
    fixture.graph.deliver(upper1, Frame::new(data.clone())).unwrap();
    assert_eq!(em1.demuxed(), vec![(data.clone(), Some(2))]);
    assert!(em0.demuxed().is_empty());

    fixture.slot.detach(&em0.as_dyn());
    assert_eq!(fixture.node_type.num_nodes(), 1);
    assert!(fixture.graph.sent_data().iter().all(|(h, _)| *h == lower0));
    assert_eq!(fixture.status(node1).upper, Some(upper1));
}
