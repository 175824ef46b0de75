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

//! Boundary with the interface layer.
//!
//! The interface layer owns the network interfaces and their drivers. It exposes each interface
//! through the [`NetInterface`] trait. In the other direction, it holds a [`CallbackSlot`] in
//! which the node type registers its [`EthernetNodeCallbacks`], and calls through that slot at
//! specific points of its receive and transmit paths.

use crate::{error::Error, frame::Frame, graph::NodeId};
use alloc::{string::String, sync::Arc};
use core::{fmt, ops};
use ng_ether_interface::ffi::ETHER_ADDR_LEN;
use spinning_top::Spinlock;

/// Kind of network interface.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InterfaceType {
    /// Regular Ethernet interface.
    Ethernet,
    /// 802.1Q VLAN interface.
    L2Vlan,
    /// Anything else. Never gets a node.
    Other,
}

/// State of the link of an interface.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LinkState {
    /// The driver doesn't know.
    Unknown,
    /// No carrier.
    Down,
    /// Carrier detected.
    Up,
}

/// Set of checksums that the hardware computes on behalf of the protocol stack.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct ChecksumCaps(u32);

impl ChecksumCaps {
    /// No checksum offload.
    pub const NONE: ChecksumCaps = ChecksumCaps(0);
    /// IPv4 header checksum.
    pub const IP: ChecksumCaps = ChecksumCaps(0x1);
    /// TCP checksum.
    pub const TCP: ChecksumCaps = ChecksumCaps(0x2);
    /// UDP checksum.
    pub const UDP: ChecksumCaps = ChecksumCaps(0x4);
    /// IP fragmentation.
    pub const FRAGMENT: ChecksumCaps = ChecksumCaps(0x8);

    /// Builds from the raw bitmask.
    pub const fn from_bits(bits: u32) -> ChecksumCaps {
        ChecksumCaps(bits)
    }

    /// Returns the raw bitmask.
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Returns true if no capability is set.
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if all the capabilities of `other` are in `self`.
    pub const fn contains(&self, other: ChecksumCaps) -> bool {
        self.0 & other.0 == other.0
    }
}

impl ops::BitOr for ChecksumCaps {
    type Output = ChecksumCaps;

    fn bitor(self, rhs: ChecksumCaps) -> ChecksumCaps {
        ChecksumCaps(self.0 | rhs.0)
    }
}

impl fmt::Debug for ChecksumCaps {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ChecksumCaps(0x{:x})", self.0)
    }
}

/// Opaque handle to a multicast membership, as returned by the interface layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct MembershipHandle(pub u64);

/// Network interface, as seen by the node.
///
/// All the methods take `&self`. Implementations are expected to use interior mutability.
pub trait NetInterface: Send + Sync {
    /// Name of the interface, for example `em0`.
    fn name(&self) -> String;

    /// Index of the interface. Unique among all interfaces.
    fn index(&self) -> u32;

    /// Kind of interface.
    fn interface_type(&self) -> InterfaceType;

    /// Current MAC address.
    fn mac_address(&self) -> [u8; ETHER_ADDR_LEN];

    /// Returns true if the interface is administratively up and its driver is running.
    fn is_up_and_running(&self) -> bool;

    /// Checksum offload capabilities currently advertised to the protocol stack.
    fn hw_checksum_caps(&self) -> ChecksumCaps;

    /// Overrides the checksum offload capabilities advertised to the protocol stack.
    fn set_hw_checksum_caps(&self, caps: ChecksumCaps);

    /// Node attached to this interface, if any.
    fn netgraph_node(&self) -> Option<NodeId>;

    /// Sets or clears the node attached to this interface.
    fn set_netgraph_node(&self, node: Option<NodeId>);

    /// Transmits a frame that already has its Ethernet header.
    fn transmit_raw(&self, frame: Frame) -> Result<(), Error>;

    /// Hands a received frame to the protocol demultiplexer.
    fn demux(&self, frame: Frame) -> Result<(), Error>;

    /// Bridge this interface is a member of, if any.
    fn bridge(&self) -> Option<Arc<dyn BridgeFilter>> {
        None
    }

    /// Enables or disables promiscuous mode.
    ///
    /// Calls are counted by the interface layer. Each `true` must eventually be matched with a
    /// `false`.
    fn set_promiscuous(&self, enable: bool) -> Result<(), Error>;

    /// Changes the MAC address of the interface.
    fn set_mac_address(&self, addr: [u8; ETHER_ADDR_LEN]) -> Result<(), Error>;

    /// Returns true if the interface is already a member of the given link-layer multicast
    /// group.
    fn has_multicast(&self, addr: &[u8; ETHER_ADDR_LEN]) -> bool;

    /// Joins a link-layer multicast group.
    fn join_multicast(&self, addr: [u8; ETHER_ADDR_LEN]) -> Result<MembershipHandle, Error>;

    /// Leaves a link-layer multicast group.
    fn leave_multicast(&self, addr: [u8; ETHER_ADDR_LEN]) -> Result<(), Error>;
}

/// Bridge that frames injected as received must go through.
pub trait BridgeFilter: Send + Sync {
    /// Processes a frame received on `ifp`. Returns `None` if the bridge has consumed the frame,
    /// or the frame to continue processing.
    fn input(&self, ifp: &dyn NetInterface, frame: Frame) -> Option<Frame>;
}

/// What the interface layer must do with a received frame.
#[derive(Debug)]
pub enum InputVerdict {
    /// Continue processing the frame normally.
    Continue(Frame),
    /// The frame has been taken away.
    Diverted,
}

/// What the interface layer must do with a frame about to be transmitted.
#[derive(Debug)]
pub enum OutputVerdict {
    /// Continue transmitting the frame normally.
    Continue(Frame),
    /// The frame has been taken away. Contains the status to report as the result of the
    /// transmission.
    Diverted(Result<(), Error>),
}

/// Points of the interface layer where the node type gets called.
pub trait EthernetNodeCallbacks: Send + Sync {
    /// A new Ethernet interface has been registered.
    fn attach(&self, ifp: &Arc<dyn NetInterface>);

    /// An Ethernet interface is being unregistered.
    fn detach(&self, ifp: &Arc<dyn NetInterface>);

    /// A frame has been received, before protocol demultiplexing.
    fn input(&self, ifp: &Arc<dyn NetInterface>, frame: Frame) -> InputVerdict;

    /// A frame of an unrecognized protocol has been received. The frame is always consumed.
    fn input_orphan(&self, ifp: &Arc<dyn NetInterface>, frame: Frame);

    /// A frame with its Ethernet header is about to be transmitted.
    fn output(&self, ifp: &Arc<dyn NetInterface>, frame: Frame) -> OutputVerdict;

    /// The link state of the interface has changed.
    fn link_state_change(&self, ifp: &Arc<dyn NetInterface>, state: LinkState);

    /// The interface has been renamed.
    fn interface_renamed(&self, ifp: &Arc<dyn NetInterface>);
}

/// Slot where the node type registers its callbacks. Held by the interface layer.
///
/// The dispatch methods only call the callbacks for interfaces that have a node attached, with
/// the exception of [`CallbackSlot::attach`]. When the slot is empty, frames continue their
/// normal path.
#[derive(Default)]
pub struct CallbackSlot {
    callbacks: Spinlock<Option<Arc<dyn EthernetNodeCallbacks>>>,
}

impl CallbackSlot {
    /// Builds a new empty slot.
    pub fn new() -> CallbackSlot {
        CallbackSlot::default()
    }

    /// Fills the slot. Returns [`Error::Busy`] if it is already filled.
    pub fn register(&self, callbacks: Arc<dyn EthernetNodeCallbacks>) -> Result<(), Error> {
        let mut slot = self.callbacks.lock();
        if slot.is_some() {
            return Err(Error::Busy);
        }
        *slot = Some(callbacks);
        Ok(())
    }

    /// Empties the slot. Returns what it contained.
    pub fn unregister(&self) -> Option<Arc<dyn EthernetNodeCallbacks>> {
        self.callbacks.lock().take()
    }

    /// Returns true if the slot is filled.
    pub fn is_registered(&self) -> bool {
        self.callbacks.lock().is_some()
    }

    /// See [`EthernetNodeCallbacks::attach`].
    pub fn attach(&self, ifp: &Arc<dyn NetInterface>) {
        if let Some(callbacks) = self.get() {
            callbacks.attach(ifp);
        }
    }

    /// See [`EthernetNodeCallbacks::detach`].
    pub fn detach(&self, ifp: &Arc<dyn NetInterface>) {
        if let Some(callbacks) = self.get_for(ifp) {
            callbacks.detach(ifp);
        }
    }

    /// See [`EthernetNodeCallbacks::input`].
    pub fn input(&self, ifp: &Arc<dyn NetInterface>, frame: Frame) -> InputVerdict {
        match self.get_for(ifp) {
            Some(callbacks) => callbacks.input(ifp, frame),
            None => InputVerdict::Continue(frame),
        }
    }

    /// See [`EthernetNodeCallbacks::input_orphan`]. Without a node, the frame is dropped.
    pub fn input_orphan(&self, ifp: &Arc<dyn NetInterface>, frame: Frame) {
        if let Some(callbacks) = self.get_for(ifp) {
            callbacks.input_orphan(ifp, frame);
        }
    }

    /// See [`EthernetNodeCallbacks::output`].
    pub fn output(&self, ifp: &Arc<dyn NetInterface>, frame: Frame) -> OutputVerdict {
        match self.get_for(ifp) {
            Some(callbacks) => callbacks.output(ifp, frame),
            None => OutputVerdict::Continue(frame),
        }
    }

    /// See [`EthernetNodeCallbacks::link_state_change`].
    pub fn link_state_change(&self, ifp: &Arc<dyn NetInterface>, state: LinkState) {
        if let Some(callbacks) = self.get_for(ifp) {
            callbacks.link_state_change(ifp, state);
        }
    }

    /// See [`EthernetNodeCallbacks::interface_renamed`].
    pub fn interface_renamed(&self, ifp: &Arc<dyn NetInterface>) {
        if let Some(callbacks) = self.get_for(ifp) {
            callbacks.interface_renamed(ifp);
        }
    }

    // The lock is released before the callbacks run, so that they can re-enter the slot.
    fn get(&self) -> Option<Arc<dyn EthernetNodeCallbacks>> {
        self.callbacks.lock().clone()
    }

    fn get_for(&self, ifp: &Arc<dyn NetInterface>) -> Option<Arc<dyn EthernetNodeCallbacks>> {
        if ifp.netgraph_node().is_none() {
            return None;
        }
        self.get()
    }
}

impl fmt::Debug for CallbackSlot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CallbackSlot")
            .field("registered", &self.is_registered())
            .finish()
    }
}
