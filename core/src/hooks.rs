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

//! Connection and disconnection of hooks.
//!
//! While `upper` is connected, frames sent by the protocol stack leave through the graph, where
//! nobody computes their checksums. The hardware checksum offload of the interface is therefore
//! disabled for as long as `upper` is connected.

use crate::{
    error::Error,
    graph::{HookId, NodeId},
    ifnet::ChecksumCaps,
    node::HookSlot,
    node_type::EtherNodeType,
};

impl EtherNodeType {
    /// Connects `hook` to the slot named `name`.
    pub(crate) fn connect_hook(&self, node: NodeId, hook: HookId, name: &str) -> Result<(), Error> {
        let slot = HookSlot::from_name(name).ok_or(Error::InvalidArgument)?;

        let entry = self.expect_node(node);
        let mut state = entry.lock();

        if state.hook(slot).is_some() {
            return Err(Error::AlreadyConnected);
        }

        if slot == HookSlot::Upper {
            // The capabilities are snapshotted again now, in case the driver changed them since
            // the interface was attached.
            if let Some(ifp) = state.interface() {
                state.saved_hw_checksum_caps = ifp.hw_checksum_caps();
                ifp.set_hw_checksum_caps(ChecksumCaps::NONE);
            }
        }

        *state.hook_mut(slot) = Some(hook);
        log::debug!("{:?}: connected {:?} as {}", node, hook, slot.name());
        Ok(())
    }

    /// Called after `hook` has been disconnected by the graph.
    pub(crate) fn disconnect_hook(&self, node: NodeId, hook: HookId) {
        let entry = self.expect_node(node);

        let now_hookless = {
            let mut state = entry.lock();
            let slot = match state.slot_of(hook) {
                Some(s) => s,
                None => panic!("ng_ether: {:?} isn't connected to {:?}", hook, node),
            };

            *state.hook_mut(slot) = None;
            if slot == HookSlot::Upper {
                if let Some(ifp) = state.interface() {
                    ifp.set_hw_checksum_caps(state.saved_hw_checksum_caps);
                }
            }

            log::debug!("{:?}: disconnected {:?} from {}", node, hook, slot.name());
            state.is_hookless()
        };

        // A node without hooks is reset. If the node is already being removed, the graph
        // reports it as invalid and nothing happens.
        if now_hookless && self.runtime().is_node_valid(node) {
            self.runtime().remove_node(node);
        }
    }
}
