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

//! Packet buffers.
//!
//! A [`Frame`] is a chain of segments. Segments can be shared between multiple frames, for
//! example after a call to [`Frame::share`], in which case they must be considered as
//! read-only by everyone.
//!
//! Operations that need to look at or modify the beginning of a frame take the frame by value
//! and give it back once it has the requested shape. If this fails, the frame is dropped.

use alloc::{sync::Arc, vec::Vec};
use core::fmt;
use smallvec::SmallVec;

/// Ethernet frame, possibly split in multiple segments.
pub struct Frame {
    /// Segments of the frame, in order. Never contains an empty segment.
    segments: SmallVec<[Arc<Vec<u8>>; 4]>,
    /// Index of the interface the frame was received on, if any.
    rcvif: Option<u32>,
}

/// Error when reshaping a [`Frame`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The frame is shorter than the requested length.
    #[error("Frame of {len} bytes is shorter than {min_len} bytes")]
    TooShort {
        /// Length of the frame.
        len: usize,
        /// Requested length.
        min_len: usize,
    },

    /// Failed to allocate the buffer for the copy.
    #[error("Out of memory")]
    OutOfMemory,
}

impl Frame {
    /// Builds a frame made of a single segment.
    pub fn new(data: impl Into<Vec<u8>>) -> Frame {
        Frame::from_segments(core::iter::once(data.into()))
    }

    /// Builds a frame from a list of segments. Empty segments are ignored.
    pub fn from_segments(segments: impl IntoIterator<Item = Vec<u8>>) -> Frame {
        Frame {
            segments: segments
                .into_iter()
                .filter(|s| !s.is_empty())
                .map(Arc::new)
                .collect(),
            rcvif: None,
        }
    }

    /// Returns the total number of bytes in the frame.
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.len()).sum()
    }

    /// Returns true if the frame contains no byte.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the number of segments of the frame.
    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    /// Returns the content of the first segment.
    pub fn first_segment(&self) -> &[u8] {
        self.segments.first().map(|s| &s[..]).unwrap_or(&[])
    }

    /// Copies the content of the frame in a single buffer.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        for segment in &self.segments {
            out.extend_from_slice(segment);
        }
        out
    }

    /// Returns a new frame that shares its segments with this one.
    pub fn share(&self) -> Frame {
        Frame {
            segments: self.segments.clone(),
            rcvif: self.rcvif,
        }
    }

    /// Returns true if at least one segment is shared with another frame.
    pub fn is_shared(&self) -> bool {
        self.segments.iter().any(|s| Arc::strong_count(s) > 1)
    }

    /// Index of the interface the frame was received on.
    pub fn rcvif(&self) -> Option<u32> {
        self.rcvif
    }

    /// Sets the index of the interface the frame was received on.
    pub fn set_rcvif(&mut self, index: Option<u32>) {
        self.rcvif = index;
    }

    /// Makes sure that the first `min_len` bytes of the frame are in the first segment, merging
    /// segments if necessary.
    pub fn make_contiguous(mut self, min_len: usize) -> Result<Frame, FrameError> {
        let len = self.len();
        if len < min_len {
            return Err(FrameError::TooShort { len, min_len });
        }

        if self.first_segment().len() >= min_len {
            return Ok(self);
        }

        let mut num_merged = 0;
        let mut merged_len = 0;
        for segment in &self.segments {
            if merged_len >= min_len {
                break;
            }
            merged_len += segment.len();
            num_merged += 1;
        }

        let mut merged = Vec::new();
        merged
            .try_reserve_exact(merged_len)
            .map_err(|_| FrameError::OutOfMemory)?;
        for segment in self.segments.drain(..num_merged) {
            merged.extend_from_slice(&segment);
        }
        self.segments.insert(0, Arc::new(merged));
        Ok(self)
    }

    /// Same as [`Frame::make_contiguous`], and additionally makes sure that the first segment
    /// isn't shared with any other frame, copying it if necessary.
    pub fn make_writable(self, min_len: usize) -> Result<Frame, FrameError> {
        let mut frame = self.make_contiguous(min_len)?;

        if let Some(first) = frame.segments.first_mut() {
            if Arc::get_mut(first).is_none() {
                let mut copy = Vec::new();
                copy.try_reserve_exact(first.len())
                    .map_err(|_| FrameError::OutOfMemory)?;
                copy.extend_from_slice(first);
                *first = Arc::new(copy);
            }
        }

        Ok(frame)
    }

    /// Gives mutable access to the first `len` bytes of the frame.
    ///
    /// Returns `None` if these bytes aren't all in the first segment, or if the first segment is
    /// shared. Use [`Frame::make_writable`] beforehand.
    pub fn header_mut(&mut self, len: usize) -> Option<&mut [u8]> {
        let first = Arc::get_mut(self.segments.first_mut()?)?;
        first.get_mut(..len)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Frame")
            .field("len", &self.len())
            .field("segments", &self.segments.len())
            .field("rcvif", &self.rcvif)
            .finish()
    }
}
