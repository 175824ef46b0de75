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

//! Control messages of the netgraph Ethernet node.
//!
//! Every Ethernet interface of the system is shadowed by a graph node of type `ether`. That node
//! exposes up to three hooks (`upper`, `lower` and `orphan`) through which frames are diverted
//! out of and into the regular network stack, and it answers a small set of synchronous control
//! messages.
//!
//! This crate contains the definition of these control messages, in other words everything that
//! a program needs in order to talk to an Ethernet node without linking to the node itself.
//!
//! # Message overview
//!
//! All messages travel through the graph as a [`ffi::NgMessage`], which is a `(cookie, command)`
//! pair followed by a small payload. Messages addressed to the Ethernet node use the
//! [`ffi::NGM_ETHER_COOKIE`] cookie. The payload is either empty, a 32 bits little-endian
//! integer, or a 6-bytes MAC address.
//!
//! The node also emits one-way [`ffi::FlowMessage`]s on its `lower` hook whenever the link state
//! of the interface changes.
//!
//! Messages can also be written in a textual form, for example `setpromisc 1` or
//! `addmulti 01:00:5e:00:00:01`. See the [`ascii`] module.
//!

pub mod ascii;
pub mod ffi;
