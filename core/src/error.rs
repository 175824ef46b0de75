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

use crate::frame::FrameError;

/// Error that can be returned by the node, or by its collaborators towards the node.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Unknown hook name, unknown or malformed control message, or frame too short.
    #[error("Invalid argument")]
    InvalidArgument,

    /// A hook with the same name is already connected.
    #[error("Hook already connected")]
    AlreadyConnected,

    /// The multicast group has already been joined.
    #[error("Address already in use")]
    AddressInUse,

    /// Failed to allocate memory.
    #[error("Out of memory")]
    OutOfMemory,

    /// The interface isn't administratively up and running.
    #[error("Network is down")]
    NetworkDown,

    /// The node is no longer associated with an interface.
    #[error("No interface")]
    NoInterface,

    /// The resource is still in use.
    #[error("Resource busy")]
    Busy,

    /// Error reported by the interface layer or the graph runtime, as an errno value.
    #[error("Interface error (errno {0})")]
    Interface(i32),
}

impl Error {
    /// Returns the BSD errno value corresponding to this error.
    pub fn errno(&self) -> i32 {
        match self {
            Error::InvalidArgument => 22,
            Error::AlreadyConnected => 56,
            Error::AddressInUse => 48,
            Error::OutOfMemory => 12,
            Error::NetworkDown => 50,
            Error::NoInterface => 6,
            Error::Busy => 16,
            Error::Interface(errno) => *errno,
        }
    }
}

impl From<FrameError> for Error {
    fn from(err: FrameError) -> Error {
        match err {
            FrameError::TooShort { .. } => Error::InvalidArgument,
            FrameError::OutOfMemory => Error::OutOfMemory,
        }
    }
}
