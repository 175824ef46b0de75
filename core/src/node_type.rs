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

//! The `ether` node type.
//!
//! The [`EtherNodeType`] holds the private state of every node of the type, and implements
//! both the callbacks of the graph runtime ([`NodeType`]) and the callbacks of the interface
//! layer ([`EthernetNodeCallbacks`]). The actual logic is split between the `hooks`,
//! `datapath`, `control` and `lifecycle` modules.

use crate::{
    error::Error,
    frame::Frame,
    graph::{GraphRuntime, HookId, NodeId, NodeType, ShutdownOutcome},
    ifnet::{
        CallbackSlot, EthernetNodeCallbacks, InputVerdict, InterfaceType, LinkState,
        NetInterface, OutputVerdict,
    },
    node::{EtherNode, NodeStatus},
};
use alloc::{sync::Arc, vec::Vec};
use core::fmt;
use hashbrown::HashMap;
use ng_ether_interface::ffi::{self, NgMessage};
use nohash_hasher::BuildNoHashHasher;
use spinning_top::Spinlock;

/// Node type shadowing Ethernet interfaces.
///
/// See [the crate-level documentation](crate) for more information.
pub struct EtherNodeType {
    /// Graph runtime the nodes belong to.
    runtime: Arc<dyn GraphRuntime>,

    /// Private state of each node of this type.
    ///
    /// The outer lock is only ever held for the duration of a lookup. The lock of an individual
    /// node is never held while calling into the graph runtime.
    nodes: Spinlock<HashMap<NodeId, Arc<Spinlock<EtherNode>>, BuildNoHashHasher<u64>>>,

    /// If true, the next call to [`EtherNodeType::insert_node`] fails as if out of memory.
    #[cfg(test)]
    fail_next_insert: core::sync::atomic::AtomicBool,
}

/// Prototype for an [`EtherNodeType`].
pub struct EtherNodeTypeBuilder {
    /// Graph runtime the nodes will belong to.
    runtime: Arc<dyn GraphRuntime>,

    /// Interfaces that already exist and that must get a node immediately.
    existing_interfaces: Vec<Arc<dyn NetInterface>>,
}

impl EtherNodeTypeBuilder {
    /// Starts building a node type whose nodes belong to the given graph runtime.
    pub fn new(runtime: Arc<dyn GraphRuntime>) -> Self {
        EtherNodeTypeBuilder {
            runtime,
            existing_interfaces: Vec::new(),
        }
    }

    /// Adds an interface that already exists in the system. A node will be created for it
    /// when the node type is built, if it is an Ethernet or VLAN interface that doesn't already
    /// have a node.
    pub fn with_existing_interface(mut self, ifp: Arc<dyn NetInterface>) -> Self {
        self.existing_interfaces.push(ifp);
        self
    }

    /// Builds the node type.
    pub fn build(self) -> Arc<EtherNodeType> {
        let node_type = Arc::new(EtherNodeType {
            runtime: self.runtime,
            nodes: Spinlock::new(HashMap::with_hasher(Default::default())),
            #[cfg(test)]
            fail_next_insert: core::sync::atomic::AtomicBool::new(false),
        });

        for ifp in &self.existing_interfaces {
            if !is_ethernet(&**ifp) || ifp.netgraph_node().is_some() {
                continue;
            }
            // Failures are already logged.
            let _ = node_type.attach_interface(ifp);
        }

        node_type
    }
}

impl EtherNodeType {
    /// Registers the node type towards the interface layer. From now on, new Ethernet
    /// interfaces get a node.
    pub fn register(self: &Arc<Self>, slot: &CallbackSlot) -> Result<(), Error> {
        slot.register(self.clone())
    }

    /// Unregisters the node type from the interface layer.
    ///
    /// Returns [`Error::Busy`] if nodes of this type still exist.
    pub fn unregister(&self, slot: &CallbackSlot) -> Result<(), Error> {
        if !self.nodes.lock().is_empty() {
            return Err(Error::Busy);
        }
        slot.unregister();
        Ok(())
    }

    /// Returns the node attached to the given interface, if any.
    pub fn node_for(&self, ifp: &dyn NetInterface) -> Option<NodeId> {
        let node = ifp.netgraph_node()?;
        if self.nodes.lock().contains_key(&node) {
            Some(node)
        } else {
            None
        }
    }

    /// Returns a snapshot of the state of a node, or `None` if it doesn't exist.
    pub fn status(&self, node: NodeId) -> Option<NodeStatus> {
        Some(self.node(node)?.lock().status())
    }

    /// Returns the number of nodes of this type.
    pub fn num_nodes(&self) -> usize {
        self.nodes.lock().len()
    }

    pub(crate) fn runtime(&self) -> &dyn GraphRuntime {
        &*self.runtime
    }

    pub(crate) fn node(&self, node: NodeId) -> Option<Arc<Spinlock<EtherNode>>> {
        self.nodes.lock().get(&node).cloned()
    }

    /// Same as [`EtherNodeType::node`], for the calls coming from the graph runtime. These
    /// always concern a node that we have created.
    pub(crate) fn expect_node(&self, node: NodeId) -> Arc<Spinlock<EtherNode>> {
        match self.node(node) {
            Some(n) => n,
            None => panic!("ng_ether: graph runtime called with unknown node {:?}", node),
        }
    }

    /// Looks up the node attached to an interface, for the calls coming from the interface
    /// layer.
    pub(crate) fn node_of(
        &self,
        ifp: &dyn NetInterface,
    ) -> Option<(NodeId, Arc<Spinlock<EtherNode>>)> {
        let node = ifp.netgraph_node()?;
        Some((node, self.node(node)?))
    }

    /// Stores the private state of a newly-created node. Fails if memory can't be allocated.
    pub(crate) fn insert_node(&self, node: NodeId, state: EtherNode) -> Result<(), Error> {
        #[cfg(test)]
        {
            use core::sync::atomic::Ordering;
            if self.fail_next_insert.swap(false, Ordering::SeqCst) {
                return Err(Error::OutOfMemory);
            }
        }

        let mut nodes = self.nodes.lock();
        nodes.try_reserve(1).map_err(|_| Error::OutOfMemory)?;
        nodes.insert(node, Arc::new(Spinlock::new(state)));
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn fail_next_insert(&self) {
        self.fail_next_insert.store(true, core::sync::atomic::Ordering::SeqCst);
    }

    pub(crate) fn remove_node_state(&self, node: NodeId) -> Option<Arc<Spinlock<EtherNode>>> {
        self.nodes.lock().remove(&node)
    }
}

/// Returns true for the kinds of interfaces that get a node.
pub(crate) fn is_ethernet(ifp: &dyn NetInterface) -> bool {
    matches!(
        ifp.interface_type(),
        InterfaceType::Ethernet | InterfaceType::L2Vlan
    )
}

impl NodeType for EtherNodeType {
    fn type_name(&self) -> &'static str {
        ffi::NODE_TYPE_NAME
    }

    fn constructor(&self, _: NodeId) -> Result<(), Error> {
        // Nodes only come into existence when an interface is attached.
        Err(Error::InvalidArgument)
    }

    fn new_hook(&self, node: NodeId, hook: HookId, name: &str) -> Result<(), Error> {
        self.connect_hook(node, hook, name)
    }

    fn receive_message(
        &self,
        node: NodeId,
        message: &NgMessage,
    ) -> Result<Option<NgMessage>, Error> {
        self.handle_message(node, message)
    }

    fn receive_data(&self, node: NodeId, hook: HookId, frame: Frame) -> Result<(), Error> {
        self.receive_from_graph(node, hook, frame)
    }

    fn shutdown(&self, node: NodeId) -> ShutdownOutcome {
        self.shutdown_node(node)
    }

    fn disconnect(&self, node: NodeId, hook: HookId) {
        self.disconnect_hook(node, hook)
    }
}

impl EthernetNodeCallbacks for EtherNodeType {
    fn attach(&self, ifp: &Arc<dyn NetInterface>) {
        // Failures are already logged.
        let _ = self.attach_interface(ifp);
    }

    fn detach(&self, ifp: &Arc<dyn NetInterface>) {
        self.detach_interface(ifp)
    }

    fn input(&self, ifp: &Arc<dyn NetInterface>, frame: Frame) -> InputVerdict {
        self.on_inbound(&**ifp, frame)
    }

    fn input_orphan(&self, ifp: &Arc<dyn NetInterface>, frame: Frame) {
        self.on_inbound_orphan(&**ifp, frame)
    }

    fn output(&self, ifp: &Arc<dyn NetInterface>, frame: Frame) -> OutputVerdict {
        self.on_outbound(&**ifp, frame)
    }

    fn link_state_change(&self, ifp: &Arc<dyn NetInterface>, state: LinkState) {
        self.on_link_state_change(&**ifp, state)
    }

    fn interface_renamed(&self, ifp: &Arc<dyn NetInterface>) {
        self.on_interface_renamed(&**ifp)
    }
}

impl fmt::Debug for EtherNodeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EtherNodeType")
            .field("num_nodes", &self.num_nodes())
            .finish()
    }
}
