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

use core::convert::TryFrom;
use parity_scale_codec::{Decode, Encode};

/// Name under which the node type is known to the graph.
pub const NODE_TYPE_NAME: &str = "ether";

/// Cookie of all the control messages understood by the Ethernet node.
pub const NGM_ETHER_COOKIE: u32 = 917786906;

/// Cookie of the generic flow-control messages.
pub const NGM_FLOW_COOKIE: u32 = 851672669;
/// Flow-control command: the link went up.
pub const NGM_LINK_IS_UP: u32 = 32;
/// Flow-control command: the link went down.
pub const NGM_LINK_IS_DOWN: u32 = 33;

/// Hook receiving the frames sent by the interface, before they reach the wire. Frames written
/// on it are injected in the protocol stack as if they had been received.
pub const HOOK_UPPER: &str = "upper";
/// Hook receiving the frames that arrive from the wire. Frames written on it are transmitted.
pub const HOOK_LOWER: &str = "lower";
/// Same as [`HOOK_LOWER`] but only for frames of an unrecognized protocol.
pub const HOOK_ORPHAN: &str = "orphan";
/// Alias of [`HOOK_LOWER`].
pub const HOOK_DIVERT: &str = "divert";

/// Maximum length of an interface name, including the terminating NUL byte.
pub const IFNAMSIZ: usize = 16;
/// Length of a MAC address.
pub const ETHER_ADDR_LEN: usize = 6;
/// Length of an Ethernet header: destination MAC, source MAC, Ethertype.
pub const ETHER_HDR_LEN: usize = 14;

/// Control message as it travels through the graph.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct NgMessage {
    /// Identifies the family of messages `cmd` belongs to.
    pub cookie: u32,
    /// Command within the family.
    pub cmd: u32,
    /// Payload. Its layout depends on the command.
    pub data: Vec<u8>,
}

impl NgMessage {
    /// Builds a new message.
    pub fn new(cookie: u32, cmd: u32, data: Vec<u8>) -> NgMessage {
        NgMessage { cookie, cmd, data }
    }
}

/// Identifiers of the commands of the [`NGM_ETHER_COOKIE`] family.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum EtherCommand {
    GetIfName = 1,
    GetIfIndex = 2,
    GetEnaddr = 3,
    SetEnaddr = 4,
    GetPromisc = 5,
    SetPromisc = 6,
    GetAutosrc = 7,
    SetAutosrc = 8,
    AddMulti = 9,
    DelMulti = 10,
    Detach = 11,
}

impl EtherCommand {
    /// List of all the commands, in numerical order.
    pub const ALL: [EtherCommand; 11] = [
        EtherCommand::GetIfName,
        EtherCommand::GetIfIndex,
        EtherCommand::GetEnaddr,
        EtherCommand::SetEnaddr,
        EtherCommand::GetPromisc,
        EtherCommand::SetPromisc,
        EtherCommand::GetAutosrc,
        EtherCommand::SetAutosrc,
        EtherCommand::AddMulti,
        EtherCommand::DelMulti,
        EtherCommand::Detach,
    ];

    /// Exact number of bytes of the payload of a request with this command.
    pub fn request_len(&self) -> usize {
        match self {
            EtherCommand::SetEnaddr | EtherCommand::AddMulti | EtherCommand::DelMulti => {
                ETHER_ADDR_LEN
            }
            EtherCommand::SetPromisc | EtherCommand::SetAutosrc => 4,
            _ => 0,
        }
    }

    /// Exact number of bytes of the payload of the response to this command, or `None` if the
    /// command has no response.
    pub fn response_len(&self) -> Option<usize> {
        match self {
            EtherCommand::GetIfName => Some(IFNAMSIZ),
            EtherCommand::GetIfIndex | EtherCommand::GetPromisc | EtherCommand::GetAutosrc => {
                Some(4)
            }
            EtherCommand::GetEnaddr => Some(ETHER_ADDR_LEN),
            _ => None,
        }
    }
}

impl From<EtherCommand> for u32 {
    fn from(cmd: EtherCommand) -> u32 {
        cmd as u32
    }
}

impl TryFrom<u32> for EtherCommand {
    type Error = DecodeError;

    fn try_from(cmd: u32) -> Result<Self, Self::Error> {
        EtherCommand::ALL
            .iter()
            .copied()
            .find(|c| u32::from(*c) == cmd)
            .ok_or(DecodeError::UnknownCommand(cmd))
    }
}

/// Request addressed to an Ethernet node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EtherMessage {
    /// Returns the name of the interface. Answered with [`EtherResponse::IfName`].
    GetIfName,
    /// Returns the index of the interface. Answered with [`EtherResponse::IfIndex`].
    GetIfIndex,
    /// Returns the current MAC address of the interface. Answered with
    /// [`EtherResponse::Enaddr`].
    GetEnaddr,
    /// Changes the MAC address of the interface.
    SetEnaddr([u8; ETHER_ADDR_LEN]),
    /// Returns whether promiscuous mode was enabled through this node. Answered with
    /// [`EtherResponse::Promisc`].
    GetPromisc,
    /// Enables or disables promiscuous mode.
    SetPromisc(bool),
    /// Returns whether the source address of frames written on `lower` is overwritten.
    /// Answered with [`EtherResponse::Autosrc`].
    GetAutosrc,
    /// Enables or disables the overwriting of the source address of frames written on `lower`.
    SetAutosrc(bool),
    /// Joins a link-layer multicast group.
    AddMulti([u8; ETHER_ADDR_LEN]),
    /// Leaves a link-layer multicast group.
    DelMulti([u8; ETHER_ADDR_LEN]),
    /// Detaches the node from its interface and destroys it.
    Detach,
}

impl EtherMessage {
    /// Returns the command identifier of this request.
    pub fn command(&self) -> EtherCommand {
        match self {
            EtherMessage::GetIfName => EtherCommand::GetIfName,
            EtherMessage::GetIfIndex => EtherCommand::GetIfIndex,
            EtherMessage::GetEnaddr => EtherCommand::GetEnaddr,
            EtherMessage::SetEnaddr(_) => EtherCommand::SetEnaddr,
            EtherMessage::GetPromisc => EtherCommand::GetPromisc,
            EtherMessage::SetPromisc(_) => EtherCommand::SetPromisc,
            EtherMessage::GetAutosrc => EtherCommand::GetAutosrc,
            EtherMessage::SetAutosrc(_) => EtherCommand::SetAutosrc,
            EtherMessage::AddMulti(_) => EtherCommand::AddMulti,
            EtherMessage::DelMulti(_) => EtherCommand::DelMulti,
            EtherMessage::Detach => EtherCommand::Detach,
        }
    }

    /// Encodes the request.
    pub fn to_message(&self) -> NgMessage {
        let data = match self {
            EtherMessage::SetEnaddr(addr)
            | EtherMessage::AddMulti(addr)
            | EtherMessage::DelMulti(addr) => addr.encode(),
            EtherMessage::SetPromisc(val) | EtherMessage::SetAutosrc(val) => {
                u32::from(*val).encode()
            }
            _ => Vec::new(),
        };

        NgMessage::new(NGM_ETHER_COOKIE, self.command().into(), data)
    }

    /// Decodes a request. The length of the payload must exactly match what the command
    /// expects.
    pub fn from_message(msg: &NgMessage) -> Result<Self, DecodeError> {
        if msg.cookie != NGM_ETHER_COOKIE {
            return Err(DecodeError::WrongCookie(msg.cookie));
        }

        let command = EtherCommand::try_from(msg.cmd)?;
        check_len(msg, command.request_len())?;

        let mut data = &msg.data[..];
        Ok(match command {
            EtherCommand::GetIfName => EtherMessage::GetIfName,
            EtherCommand::GetIfIndex => EtherMessage::GetIfIndex,
            EtherCommand::GetEnaddr => EtherMessage::GetEnaddr,
            EtherCommand::SetEnaddr => EtherMessage::SetEnaddr(decode_addr(&mut data)?),
            EtherCommand::GetPromisc => EtherMessage::GetPromisc,
            EtherCommand::SetPromisc => EtherMessage::SetPromisc(decode_bool(&mut data)?),
            EtherCommand::GetAutosrc => EtherMessage::GetAutosrc,
            EtherCommand::SetAutosrc => EtherMessage::SetAutosrc(decode_bool(&mut data)?),
            EtherCommand::AddMulti => EtherMessage::AddMulti(decode_addr(&mut data)?),
            EtherCommand::DelMulti => EtherMessage::DelMulti(decode_addr(&mut data)?),
            EtherCommand::Detach => EtherMessage::Detach,
        })
    }
}

/// Answer of an Ethernet node to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EtherResponse {
    /// Name of the interface. At most `IFNAMSIZ - 1` bytes are transmitted.
    IfName(String),
    IfIndex(u32),
    Enaddr([u8; ETHER_ADDR_LEN]),
    Promisc(bool),
    Autosrc(bool),
}

impl EtherResponse {
    /// Returns the command this is a response to.
    pub fn command(&self) -> EtherCommand {
        match self {
            EtherResponse::IfName(_) => EtherCommand::GetIfName,
            EtherResponse::IfIndex(_) => EtherCommand::GetIfIndex,
            EtherResponse::Enaddr(_) => EtherCommand::GetEnaddr,
            EtherResponse::Promisc(_) => EtherCommand::GetPromisc,
            EtherResponse::Autosrc(_) => EtherCommand::GetAutosrc,
        }
    }

    /// Encodes the response.
    pub fn to_message(&self) -> NgMessage {
        let data = match self {
            EtherResponse::IfName(name) => encode_ifname(name).to_vec(),
            EtherResponse::IfIndex(index) => index.encode(),
            EtherResponse::Enaddr(addr) => addr.encode(),
            EtherResponse::Promisc(val) | EtherResponse::Autosrc(val) => u32::from(*val).encode(),
        };

        NgMessage::new(NGM_ETHER_COOKIE, self.command().into(), data)
    }

    /// Decodes a response.
    pub fn from_message(msg: &NgMessage) -> Result<Self, DecodeError> {
        if msg.cookie != NGM_ETHER_COOKIE {
            return Err(DecodeError::WrongCookie(msg.cookie));
        }

        let command = EtherCommand::try_from(msg.cmd)?;
        let expected = command
            .response_len()
            .ok_or(DecodeError::UnknownCommand(msg.cmd))?;
        check_len(msg, expected)?;

        let mut data = &msg.data[..];
        Ok(match command {
            EtherCommand::GetIfName => EtherResponse::IfName(decode_ifname(data)),
            EtherCommand::GetIfIndex => EtherResponse::IfIndex(
                u32::decode(&mut data).map_err(|_| DecodeError::Malformed)?,
            ),
            EtherCommand::GetEnaddr => EtherResponse::Enaddr(decode_addr(&mut data)?),
            EtherCommand::GetPromisc => EtherResponse::Promisc(decode_bool(&mut data)?),
            EtherCommand::GetAutosrc => EtherResponse::Autosrc(decode_bool(&mut data)?),
            other => return Err(DecodeError::UnknownCommand(other.into())),
        })
    }
}

/// One-way notification of the [`NGM_FLOW_COOKIE`] family.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FlowMessage {
    LinkIsUp,
    LinkIsDown,
}

impl FlowMessage {
    /// Encodes the notification. Notifications have no payload.
    pub fn to_message(&self) -> NgMessage {
        let cmd = match self {
            FlowMessage::LinkIsUp => NGM_LINK_IS_UP,
            FlowMessage::LinkIsDown => NGM_LINK_IS_DOWN,
        };
        NgMessage::new(NGM_FLOW_COOKIE, cmd, Vec::new())
    }

    /// Decodes a notification.
    pub fn from_message(msg: &NgMessage) -> Result<Self, DecodeError> {
        if msg.cookie != NGM_FLOW_COOKIE {
            return Err(DecodeError::WrongCookie(msg.cookie));
        }
        let notif = match msg.cmd {
            NGM_LINK_IS_UP => FlowMessage::LinkIsUp,
            NGM_LINK_IS_DOWN => FlowMessage::LinkIsDown,
            cmd => return Err(DecodeError::UnknownCommand(cmd)),
        };
        check_len(msg, 0)?;
        Ok(notif)
    }
}

/// Error while decoding a message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Unexpected message cookie {0}")]
    WrongCookie(u32),

    #[error("Unknown command {0}")]
    UnknownCommand(u32),

    #[error("Command {cmd} expects {expected} bytes of payload, got {actual}")]
    BadLength {
        cmd: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Malformed payload")]
    Malformed,
}

/// Turns an interface name into the fixed-size NUL-padded form used on the wire.
///
/// Names longer than `IFNAMSIZ - 1` bytes are truncated on a character boundary.
pub fn encode_ifname(name: &str) -> [u8; IFNAMSIZ] {
    let mut end = name.len().min(IFNAMSIZ - 1);
    while !name.is_char_boundary(end) {
        end -= 1;
    }

    let mut out = [0; IFNAMSIZ];
    out[..end].copy_from_slice(&name.as_bytes()[..end]);
    out
}

fn decode_ifname(data: &[u8]) -> String {
    let end = data.iter().position(|b| *b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).into_owned()
}

fn check_len(msg: &NgMessage, expected: usize) -> Result<(), DecodeError> {
    if msg.data.len() != expected {
        return Err(DecodeError::BadLength {
            cmd: msg.cmd,
            expected,
            actual: msg.data.len(),
        });
    }
    Ok(())
}

fn decode_addr(data: &mut &[u8]) -> Result<[u8; ETHER_ADDR_LEN], DecodeError> {
    <[u8; ETHER_ADDR_LEN]>::decode(data).map_err(|_| DecodeError::Malformed)
}

fn decode_bool(data: &mut &[u8]) -> Result<bool, DecodeError> {
    let val = u32::decode(data).map_err(|_| DecodeError::Malformed)?;
    Ok(val != 0)
}
