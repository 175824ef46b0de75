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

//! Frames going through the node.
//!
//! There are two directions:
//!
//! - The interface layer calls the node while receiving or transmitting a frame. The node either
//! lets the frame continue, or diverts it on one of its hooks.
//! - The graph delivers a frame on one of the hooks. Frames arriving on `lower` or `orphan` are
//! transmitted on the wire, and frames arriving on `upper` are injected in the protocol stack
//! as if they had been received by the interface.

use crate::{
    error::Error,
    frame::Frame,
    graph::{HookId, NodeId},
    ifnet::{InputVerdict, NetInterface, OutputVerdict},
    node::HookSlot,
    node_type::EtherNodeType,
};
use alloc::sync::Arc;
use ng_ether_interface::ffi::{ETHER_ADDR_LEN, ETHER_HDR_LEN};

impl EtherNodeType {
    /// A frame has been received by the interface.
    pub(crate) fn on_inbound(&self, ifp: &dyn NetInterface, frame: Frame) -> InputVerdict {
        let lower = match self.node_of(ifp) {
            Some((_, entry)) => entry.lock().hook(HookSlot::Lower),
            None => None,
        };

        match lower {
            Some(hook) => {
                self.send_on_hook(hook, frame);
                InputVerdict::Diverted
            }
            None => InputVerdict::Continue(frame),
        }
    }

    /// A frame of an unrecognized protocol has been received by the interface.
    pub(crate) fn on_inbound_orphan(&self, ifp: &dyn NetInterface, frame: Frame) {
        let orphan = match self.node_of(ifp) {
            Some((_, entry)) => entry.lock().hook(HookSlot::Orphan),
            None => None,
        };

        match orphan {
            Some(hook) => self.send_on_hook(hook, frame),
            None => log::trace!("{}: dropping orphan frame of {} bytes", ifp.name(), frame.len()),
        }
    }

    /// The interface is about to transmit a frame.
    pub(crate) fn on_outbound(&self, ifp: &dyn NetInterface, frame: Frame) -> OutputVerdict {
        let upper = match self.node_of(ifp) {
            Some((_, entry)) => entry.lock().hook(HookSlot::Upper),
            None => None,
        };

        match upper {
            Some(hook) => OutputVerdict::Diverted(self.runtime().send_data(hook, frame)),
            None => OutputVerdict::Continue(frame),
        }
    }

    /// A frame has arrived on one of the hooks of the node.
    pub(crate) fn receive_from_graph(
        &self,
        node: NodeId,
        hook: HookId,
        frame: Frame,
    ) -> Result<(), Error> {
        let (slot, ifp, auto_src_addr) = {
            let entry = self.expect_node(node);
            let state = entry.lock();
            let slot = match state.slot_of(hook) {
                Some(s) => s,
                None => panic!("ng_ether: data on {:?} which isn't connected to {:?}", hook, node),
            };
            (slot, state.interface(), state.auto_src_addr)
        };

        let ifp = ifp.ok_or(Error::NoInterface)?;

        match slot {
            HookSlot::Lower | HookSlot::Orphan => self.inject_on_wire(&ifp, auto_src_addr, frame),
            HookSlot::Upper => self.inject_as_received(&ifp, frame),
        }
    }

    /// Transmits on the wire a frame that came from the graph.
    fn inject_on_wire(
        &self,
        ifp: &Arc<dyn NetInterface>,
        auto_src_addr: bool,
        frame: Frame,
    ) -> Result<(), Error> {
        if !ifp.is_up_and_running() {
            return Err(Error::NetworkDown);
        }

        if frame.len() < ETHER_HDR_LEN {
            return Err(Error::InvalidArgument);
        }
        let mut frame = frame.make_contiguous(ETHER_HDR_LEN)?;

        if auto_src_addr {
            frame = frame.make_writable(ETHER_HDR_LEN)?;
            let header = frame.header_mut(ETHER_HDR_LEN).ok_or(Error::OutOfMemory)?;
            header[ETHER_ADDR_LEN..2 * ETHER_ADDR_LEN].copy_from_slice(&ifp.mac_address());
        }

        ifp.transmit_raw(frame)
    }

    /// Hands to the protocol stack a frame that came from the graph, as if the interface had
    /// received it.
    fn inject_as_received(&self, ifp: &Arc<dyn NetInterface>, frame: Frame) -> Result<(), Error> {
        if frame.len() < ETHER_HDR_LEN {
            return Err(Error::InvalidArgument);
        }
        let mut frame = frame.make_contiguous(ETHER_HDR_LEN)?;
        frame.set_rcvif(Some(ifp.index()));

        if let Some(bridge) = ifp.bridge() {
            frame = match bridge.input(&**ifp, frame) {
                Some(f) => f,
                None => return Ok(()),
            };
        }

        // The frame now belongs to the stack. Errors are its business.
        if let Err(err) = ifp.demux(frame) {
            log::trace!("{}: demux dropped injected frame: {}", ifp.name(), err);
        }
        Ok(())
    }

    fn send_on_hook(&self, hook: HookId, frame: Frame) {
        if let Err(err) = self.runtime().send_data(hook, frame) {
            log::trace!("failed to send frame on {:?}: {}", hook, err);
        }
    }
}
