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

use crate::{
    graph::HookId,
    ifnet::{ChecksumCaps, NetInterface},
};
use alloc::sync::{Arc, Weak};
use ng_ether_interface::ffi;

/// One of the three places where a hook can be connected on a node.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum HookSlot {
    /// Between the node and the protocol stack.
    Upper,
    /// Between the node and the wire.
    Lower,
    /// Between the node and the wire, for frames of unknown protocols.
    Orphan,
}

impl HookSlot {
    /// Finds the slot corresponding to a hook name. `divert` is an alias of `lower`.
    pub fn from_name(name: &str) -> Option<HookSlot> {
        match name {
            ffi::HOOK_UPPER => Some(HookSlot::Upper),
            ffi::HOOK_LOWER | ffi::HOOK_DIVERT => Some(HookSlot::Lower),
            ffi::HOOK_ORPHAN => Some(HookSlot::Orphan),
            _ => None,
        }
    }

    /// Canonical name of the hook connected to this slot.
    pub fn name(&self) -> &'static str {
        match self {
            HookSlot::Upper => ffi::HOOK_UPPER,
            HookSlot::Lower => ffi::HOOK_LOWER,
            HookSlot::Orphan => ffi::HOOK_ORPHAN,
        }
    }
}

/// Where a node is in its life.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    /// Attached to its interface. Normal state.
    Attached,
    /// Being reset by the graph. Goes back to `Attached` once the shutdown is over.
    ShuttingDownTransient,
    /// The interface has gone away. The next shutdown destroys the node.
    ShuttingDownPermanent,
}

/// Private state of a node.
pub(crate) struct EtherNode {
    /// Interface the node is attached to. Set to `None` when the interface is detached, which
    /// happens strictly before the node is destroyed.
    interface: Option<Weak<dyn NetInterface>>,
    upper: Option<HookId>,
    lower: Option<HookId>,
    orphan: Option<HookId>,
    /// If true, the source MAC address of frames written on `lower` or `orphan` is overwritten
    /// with the one of the interface.
    pub(crate) auto_src_addr: bool,
    /// True if promiscuous mode has been enabled through this node.
    pub(crate) promiscuous: bool,
    /// Checksum capabilities of the interface, restored when `upper` is disconnected.
    pub(crate) saved_hw_checksum_caps: ChecksumCaps,
    pub(crate) lifecycle: LifecycleState,
}

impl EtherNode {
    pub(crate) fn new(ifp: &Arc<dyn NetInterface>) -> EtherNode {
        EtherNode {
            interface: Some(Arc::downgrade(ifp)),
            upper: None,
            lower: None,
            orphan: None,
            auto_src_addr: true,
            promiscuous: false,
            saved_hw_checksum_caps: ifp.hw_checksum_caps(),
            lifecycle: LifecycleState::Attached,
        }
    }

    /// Returns the interface, or `None` if it has been detached or destroyed.
    pub(crate) fn interface(&self) -> Option<Arc<dyn NetInterface>> {
        self.interface.as_ref()?.upgrade()
    }

    pub(crate) fn clear_interface(&mut self) {
        self.interface = None;
    }

    pub(crate) fn hook(&self, slot: HookSlot) -> Option<HookId> {
        match slot {
            HookSlot::Upper => self.upper,
            HookSlot::Lower => self.lower,
            HookSlot::Orphan => self.orphan,
        }
    }

    pub(crate) fn hook_mut(&mut self, slot: HookSlot) -> &mut Option<HookId> {
        match slot {
            HookSlot::Upper => &mut self.upper,
            HookSlot::Lower => &mut self.lower,
            HookSlot::Orphan => &mut self.orphan,
        }
    }

    /// Finds which slot the hook is connected to.
    pub(crate) fn slot_of(&self, hook: HookId) -> Option<HookSlot> {
        [HookSlot::Upper, HookSlot::Lower, HookSlot::Orphan]
            .iter()
            .copied()
            .find(|slot| self.hook(*slot) == Some(hook))
    }

    pub(crate) fn is_hookless(&self) -> bool {
        self.upper.is_none() && self.lower.is_none() && self.orphan.is_none()
    }

    /// Puts the node back in its quiescent state. Doesn't touch the interface.
    pub(crate) fn reset(&mut self) {
        self.promiscuous = false;
        self.auto_src_addr = true;
        self.lifecycle = LifecycleState::Attached;
    }

    pub(crate) fn status(&self) -> NodeStatus {
        NodeStatus {
            has_interface: self.interface().is_some(),
            upper: self.upper,
            lower: self.lower,
            orphan: self.orphan,
            auto_src_addr: self.auto_src_addr,
            promiscuous: self.promiscuous,
            saved_hw_checksum_caps: self.saved_hw_checksum_caps,
            lifecycle: self.lifecycle,
        }
    }
}

/// Snapshot of the state of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeStatus {
    /// True if the node is still attached to a live interface.
    pub has_interface: bool,
    /// Hook connected as `upper`.
    pub upper: Option<HookId>,
    /// Hook connected as `lower` (or `divert`).
    pub lower: Option<HookId>,
    /// Hook connected as `orphan`.
    pub orphan: Option<HookId>,
    /// See [`ffi::EtherMessage::SetAutosrc`].
    pub auto_src_addr: bool,
    /// See [`ffi::EtherMessage::SetPromisc`].
    pub promiscuous: bool,
    /// Checksum capabilities that will be restored when `upper` is disconnected.
    pub saved_hw_checksum_caps: ChecksumCaps,
    /// Where the node is in its life.
    pub lifecycle: LifecycleState,
}

impl NodeStatus {
    /// Number of connected hooks.
    pub fn num_hooks(&self) -> usize {
        [self.upper, self.lower, self.orphan]
            .iter()
            .filter(|h| h.is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::HookSlot;

    #[test]
    fn hook_names() {
        assert_eq!(HookSlot::from_name("upper"), Some(HookSlot::Upper));
        assert_eq!(HookSlot::from_name("lower"), Some(HookSlot::Lower));
        assert_eq!(HookSlot::from_name("divert"), Some(HookSlot::Lower));
        assert_eq!(HookSlot::from_name("orphan"), Some(HookSlot::Orphan));
        assert_eq!(HookSlot::from_name("Upper"), None);
        assert_eq!(HookSlot::from_name(""), None);
        assert_eq!(HookSlot::Lower.name(), "lower");
    }
}
