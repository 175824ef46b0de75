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

//! Control messages addressed to a node.
//!
//! Messages are decoded with [`EtherMessage::from_message`]. Anything that doesn't decode,
//! including messages with a foreign cookie, is refused with [`Error::InvalidArgument`].

use crate::{error::Error, graph::NodeId, ifnet::NetInterface, node_type::EtherNodeType};
use alloc::sync::Arc;
use ng_ether_interface::ffi::{EtherMessage, EtherResponse, NgMessage};

impl EtherNodeType {
    /// Processes a control message. Returns the response, for the commands that have one.
    pub(crate) fn handle_message(
        &self,
        node: NodeId,
        message: &NgMessage,
    ) -> Result<Option<NgMessage>, Error> {
        let request = match EtherMessage::from_message(message) {
            Ok(r) => r,
            Err(err) => {
                log::debug!("{:?}: refusing control message: {}", node, err);
                return Err(Error::InvalidArgument);
            }
        };

        let entry = self.expect_node(node);
        let interface = || entry.lock().interface().ok_or(Error::NoInterface);

        let response = match request {
            EtherMessage::GetIfName => Some(EtherResponse::IfName(interface()?.name())),
            EtherMessage::GetIfIndex => Some(EtherResponse::IfIndex(interface()?.index())),
            EtherMessage::GetEnaddr => Some(EtherResponse::Enaddr(interface()?.mac_address())),
            EtherMessage::SetEnaddr(addr) => {
                interface()?.set_mac_address(addr)?;
                None
            }
            EtherMessage::GetPromisc => Some(EtherResponse::Promisc(entry.lock().promiscuous)),
            EtherMessage::SetPromisc(enable) => {
                self.set_promiscuous(node, &interface()?, enable)?;
                None
            }
            EtherMessage::GetAutosrc => Some(EtherResponse::Autosrc(entry.lock().auto_src_addr)),
            EtherMessage::SetAutosrc(enable) => {
                entry.lock().auto_src_addr = enable;
                None
            }
            EtherMessage::AddMulti(addr) => {
                let ifp = interface()?;
                if ifp.has_multicast(&addr) {
                    return Err(Error::AddressInUse);
                }
                let membership = ifp.join_multicast(addr)?;
                log::debug!("{:?}: joined multicast group as {:?}", node, membership);
                None
            }
            EtherMessage::DelMulti(addr) => {
                interface()?.leave_multicast(addr)?;
                None
            }
            EtherMessage::Detach => {
                self.detach_node(node);
                None
            }
        };

        Ok(response.map(|r| r.to_message()))
    }

    /// Switches promiscuous mode. The interface layer counts the requests, so it is only told
    /// about actual changes.
    fn set_promiscuous(
        &self,
        node: NodeId,
        ifp: &Arc<dyn NetInterface>,
        enable: bool,
    ) -> Result<(), Error> {
        let entry = self.expect_node(node);
        if entry.lock().promiscuous == enable {
            return Ok(());
        }

        ifp.set_promiscuous(enable)?;
        entry.lock().promiscuous = enable;
        Ok(())
    }
}
