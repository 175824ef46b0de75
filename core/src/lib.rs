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

//! Netgraph Ethernet node.
//!
//! This crate implements the `ether` node type: a graph node that shadows an Ethernet interface
//! and interposes on its receive and transmit paths. One node exists per interface. It is
//! created automatically when the interface appears and destroyed when the interface goes away.
//!
//! # Overview
//!
//! The node has up to three hooks:
//!
//! - `lower` (or its alias `divert`): frames received by the interface are diverted on this hook
//! instead of being processed by the protocol stack. Frames written on it are transmitted on the
//! wire.
//! - `orphan`: same as `lower`, but only for the received frames whose protocol the interface
//! layer didn't recognize.
//! - `upper`: frames that the interface is about to transmit are diverted on this hook. Frames
//! written on it are injected in the protocol stack as if they had been received.
//!
//! Hooks can be connected and disconnected at any time. Disconnecting the last hook resets the
//! node rather than destroying it.
//!
//! # Usage
//!
//! The node sits between two collaborators that are implemented elsewhere:
//!
//! - The interface layer, represented by the [`NetInterface`] trait. It calls into the node
//! through the [`EthernetNodeCallbacks`] registered in its [`CallbackSlot`].
//! - The graph runtime, represented by the [`GraphRuntime`] trait. It calls into the node through
//! the [`NodeType`] trait.
//!
//! Build an [`EtherNodeType`] with an [`EtherNodeTypeBuilder`], hand it to the graph runtime as a
//! [`NodeType`], then call [`EtherNodeType::register`] to start receiving the callbacks of the
//! interface layer.
//!

#![warn(missing_docs)]
#![deny(unsafe_code)]

extern crate alloc;

pub use self::error::Error;
pub use self::frame::{Frame, FrameError};
pub use self::graph::{GraphRuntime, HookId, NodeId, NodeType, ShutdownOutcome};
pub use self::ifnet::{
    BridgeFilter, CallbackSlot, ChecksumCaps, EthernetNodeCallbacks, InputVerdict,
    InterfaceType, LinkState, MembershipHandle, NetInterface, OutputVerdict,
};
pub use self::node::{HookSlot, LifecycleState, NodeStatus};
pub use self::node_type::{EtherNodeType, EtherNodeTypeBuilder};
pub use ng_ether_interface::ffi;

mod control;
mod datapath;
mod error;
mod frame;
mod graph;
mod hooks;
mod ifnet;
mod lifecycle;
mod node;
mod node_type;
