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

//! Boundary with the graph runtime.
//!
//! The graph runtime owns the nodes and the hooks between them, and routes data and control
//! messages along the hooks. It is not implemented in this crate. The node type only consumes
//! the primitives of the [`GraphRuntime`] trait and implements the [`NodeType`] trait.

use crate::{error::Error, frame::Frame, node::NodeStatus};
use core::fmt;
use ng_ether_interface::ffi::NgMessage;

/// Identifier of a node within the graph runtime.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

/// Identifier of a hook within the graph runtime.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct HookId(u64);

impl From<u64> for NodeId {
    fn from(id: u64) -> NodeId {
        NodeId(id)
    }
}

impl From<NodeId> for u64 {
    fn from(id: NodeId) -> u64 {
        id.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{:x}]", self.0)
    }
}

impl From<u64> for HookId {
    fn from(id: u64) -> HookId {
        HookId(id)
    }
}

impl From<HookId> for u64 {
    fn from(id: HookId) -> u64 {
        id.0
    }
}

impl fmt::Debug for HookId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "hook#{}", self.0)
    }
}

/// Primitives of the graph runtime that the node type uses.
///
/// None of these methods must call back into the [`NodeType`] while the caller could still be
/// inside of a [`NodeType`] method of the same node, except for [`GraphRuntime::remove_node`]
/// and [`GraphRuntime::send_data`] which are allowed to.
pub trait GraphRuntime: Send + Sync {
    /// Creates a new node of the given type, without calling its constructor.
    fn create_node(&self, type_name: &'static str) -> Result<NodeId, Error>;

    /// Destroys a node that was just created and that has no hook, without calling its
    /// shutdown method.
    fn destroy_node_now(&self, node: NodeId);

    /// Flags the node so that it is destroyed for real by the next [`GraphRuntime::remove_node`],
    /// even if its shutdown method returns [`ShutdownOutcome::Reset`].
    fn mark_really_die(&self, node: NodeId);

    /// Disconnects all the hooks of the node, then calls its shutdown method.
    ///
    /// While this is in progress, [`GraphRuntime::is_node_valid`] returns `false` for the node.
    fn remove_node(&self, node: NodeId);

    /// Returns `false` if the node doesn't exist or is being removed.
    fn is_node_valid(&self, node: NodeId) -> bool;

    /// Gives a name to the node.
    fn name_node(&self, node: NodeId, name: &str) -> Result<(), Error>;

    /// Sends a frame along the given hook, to the node at the other side.
    fn send_data(&self, hook: HookId, frame: Frame) -> Result<(), Error>;

    /// Sends a one-way control message along the given hook of the given node.
    fn send_message(&self, node: NodeId, hook: HookId, message: NgMessage) -> Result<(), Error>;
}

/// Callbacks of a node type, called by the graph runtime.
pub trait NodeType: Send + Sync {
    /// Name of the type.
    fn type_name(&self) -> &'static str;

    /// Called when someone asks the graph runtime to create a node of this type.
    fn constructor(&self, node: NodeId) -> Result<(), Error>;

    /// Called when a hook named `name` is being connected to the node. Returning an error
    /// refuses the connection.
    fn new_hook(&self, node: NodeId, hook: HookId, name: &str) -> Result<(), Error>;

    /// Called when a control message is addressed to the node. Returns the response, if the
    /// message has one.
    fn receive_message(&self, node: NodeId, message: &NgMessage)
        -> Result<Option<NgMessage>, Error>;

    /// Called when a frame arrives on one of the hooks of the node.
    fn receive_data(&self, node: NodeId, hook: HookId, frame: Frame) -> Result<(), Error>;

    /// Called when the node is being removed, after all its hooks have been disconnected.
    fn shutdown(&self, node: NodeId) -> ShutdownOutcome;

    /// Called when a hook of the node has been disconnected.
    fn disconnect(&self, node: NodeId, hook: HookId);
}

/// Outcome of [`NodeType::shutdown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The node type has released everything it had about the node. The graph runtime must
    /// finish destroying it.
    Destroyed,

    /// The node type wants the node to stay alive. It has been reset to the given state.
    Reset(NodeStatus),
}
