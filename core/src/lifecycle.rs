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

//! Creation and destruction of nodes.
//!
//! A node is created when its interface is attached, and lives until its interface is detached.
//! In between, the graph runtime can ask for the node to be shut down, for example when its
//! last hook is disconnected. Such a shutdown doesn't destroy the node: it is reset to its
//! initial state and stays attached to the interface.
//!
//! Detaching the interface first tells the graph runtime that the next shutdown is for real,
//! then asks for the node to be removed.

use crate::{
    error::Error,
    graph::{NodeId, ShutdownOutcome},
    ifnet::{LinkState, NetInterface},
    node::{EtherNode, HookSlot, LifecycleState},
    node_type::{is_ethernet, EtherNodeType},
};
use alloc::{string::String, sync::Arc};
use ng_ether_interface::ffi::{self, FlowMessage};

impl EtherNodeType {
    /// Creates the node of a newly-attached interface.
    ///
    /// # Panic
    ///
    /// Panics if the interface already has a node.
    ///
    pub(crate) fn attach_interface(&self, ifp: &Arc<dyn NetInterface>) -> Result<NodeId, Error> {
        if let Some(node) = ifp.netgraph_node() {
            panic!("ng_ether: {} is already attached to {:?}", ifp.name(), node);
        }

        let node = match self.runtime().create_node(ffi::NODE_TYPE_NAME) {
            Ok(n) => n,
            Err(err) => {
                log::error!("{}: failed to create node: {}", ifp.name(), err);
                return Err(err);
            }
        };

        if let Err(err) = self.insert_node(node, EtherNode::new(ifp)) {
            log::error!("{}: failed to allocate node state: {}", ifp.name(), err);
            self.runtime().destroy_node_now(node);
            return Err(err);
        }

        ifp.set_netgraph_node(Some(node));

        let name = sanitize_node_name(&ifp.name());
        if let Err(err) = self.runtime().name_node(node, &name) {
            log::warn!("{}: failed to name node {:?}: {}", ifp.name(), node, err);
        }

        log::debug!("{}: attached as {:?}", ifp.name(), node);
        Ok(node)
    }

    /// The interface is going away. Destroys its node.
    pub(crate) fn detach_interface(&self, ifp: &Arc<dyn NetInterface>) {
        let node = match self.node_for(&**ifp) {
            Some(n) => n,
            None => return,
        };

        log::debug!("{}: detaching {:?}", ifp.name(), node);
        self.detach_node(node);
    }

    /// Destroys a node for good. Works even if its interface no longer exists.
    pub(crate) fn detach_node(&self, node: NodeId) {
        let entry = match self.node(node) {
            Some(e) => e,
            None => return,
        };

        self.runtime().mark_really_die(node);

        let ifp = {
            let mut state = entry.lock();
            let ifp = state.interface();
            if let Some(ifp) = &ifp {
                if state.hook(HookSlot::Upper).is_some() {
                    ifp.set_hw_checksum_caps(state.saved_hw_checksum_caps);
                }
            }
            state.lifecycle = LifecycleState::ShuttingDownPermanent;
            state.clear_interface();
            ifp
        };

        if let Some(ifp) = ifp {
            ifp.set_netgraph_node(None);
        }
        self.runtime().remove_node(node);
    }

    /// Called by the graph runtime once all the hooks of the node are disconnected.
    pub(crate) fn shutdown_node(&self, node: NodeId) -> ShutdownOutcome {
        let entry = self.expect_node(node);

        let (ifp, was_promiscuous) = {
            let mut state = entry.lock();
            if state.lifecycle == LifecycleState::ShuttingDownPermanent {
                drop(state);
                self.remove_node_state(node);
                log::debug!("{:?}: destroyed", node);
                return ShutdownOutcome::Destroyed;
            }

            state.lifecycle = LifecycleState::ShuttingDownTransient;
            (state.interface(), state.promiscuous)
        };

        if was_promiscuous {
            if let Some(ifp) = &ifp {
                if let Err(err) = ifp.set_promiscuous(false) {
                    log::warn!("{}: failed to leave promiscuous mode: {}", ifp.name(), err);
                }
            }
        }

        let mut state = entry.lock();
        state.reset();
        let status = state.status();
        log::debug!("{:?}: reset", node);
        ShutdownOutcome::Reset(status)
    }

    /// Forwards a link state change on the `lower` hook.
    pub(crate) fn on_link_state_change(&self, ifp: &dyn NetInterface, link: LinkState) {
        let (node, lower) = match self.node_of(ifp) {
            Some((node, entry)) => match entry.lock().hook(HookSlot::Lower) {
                Some(hook) => (node, hook),
                None => return,
            },
            None => return,
        };

        let message = match link {
            LinkState::Up => FlowMessage::LinkIsUp,
            LinkState::Down => FlowMessage::LinkIsDown,
            LinkState::Unknown => return,
        };

        if let Err(err) = self.runtime().send_message(node, lower, message.to_message()) {
            log::debug!("{:?}: failed to notify link state: {}", node, err);
        }
    }

    /// Re-names the node after its interface.
    pub(crate) fn on_interface_renamed(&self, ifp: &dyn NetInterface) {
        if !is_ethernet(ifp) {
            return;
        }
        let node = match self.node_for(ifp) {
            Some(n) => n,
            None => return,
        };

        let name = sanitize_node_name(&ifp.name());
        if let Err(err) = self.runtime().name_node(node, &name) {
            log::warn!("{}: failed to rename node {:?}: {}", ifp.name(), node, err);
        }
    }
}

/// Turns an interface name into a valid node name.
///
/// Node names can't contain `.` or `:`, which are used in graph paths.
pub(crate) fn sanitize_node_name(ifname: &str) -> String {
    let mut out = String::with_capacity(ifname.len());
    for c in ifname.chars() {
        let c = match c {
            '.' | ':' => '_',
            c => c,
        };
        if out.len() + c.len_utf8() > ffi::IFNAMSIZ - 1 {
            break;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::sanitize_node_name;

    #[test]
    fn sanitize() {
        assert_eq!(sanitize_node_name("em0"), "em0");
        assert_eq!(sanitize_node_name("vlan0.100"), "vlan0_100");
        assert_eq!(sanitize_node_name("a:b.c"), "a_b_c");
        assert_eq!(sanitize_node_name("abcdefghijklmnopqrst"), "abcdefghijklmno");
    }
}
