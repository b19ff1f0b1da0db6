// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Bounded, pre-allocated buffers for in-progress frames.
//!
//! Both buffers allocate once at construction and never grow: appends are
//! checked against the fixed capacity and report overflow instead of
//! reallocating or writing out of bounds.
//!
//! - [`RangeBuffer`]: ordered range samples of the open SF30C revolution
//! - [`PointBuffer`]: structure-of-arrays x/y/z of the open SF45B batch
//!
//! # Example
//!
//! ```
//! use edgefirst_lightwarepub::buffer::PointBuffer;
//!
//! let mut buf = PointBuffer::with_capacity(2);
//! assert!(buf.push(1.0, 2.0, 0.0).is_ok());
//! assert!(buf.push(3.0, 4.0, 0.0).is_ok());
//! assert!(buf.is_full());
//! assert!(buf.push(5.0, 6.0, 0.0).is_err());
//! assert_eq!(buf.x(), &[1.0, 3.0]);
//! ```

use crate::lidar::Error;

/// Ordered range samples with a hard capacity.
#[derive(Debug, Clone)]
pub struct RangeBuffer {
    ranges: Vec<f32>,
    capacity: usize,
}

impl RangeBuffer {
    /// Create a new buffer holding at most `capacity` ranges.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ranges: Vec::with_capacity(capacity),
            capacity,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Clear all ranges while retaining the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Append every range from `iter`, or nothing at all.
    ///
    /// Returns [`Error::BufferOverflow`] and leaves the buffer unchanged if
    /// the ranges do not fit.
    pub fn try_extend<I>(&mut self, iter: I) -> Result<(), Error>
    where
        I: ExactSizeIterator<Item = f32>,
    {
        if self.ranges.len() + iter.len() > self.capacity {
            return Err(Error::BufferOverflow);
        }
        self.ranges.extend(iter);
        Ok(())
    }

    /// Ranges in collection order.
    #[inline]
    pub fn ranges(&self) -> &[f32] {
        &self.ranges
    }

    /// Copy out the ranges, last collected first.
    pub fn to_reversed(&self) -> Vec<f32> {
        self.ranges.iter().rev().copied().collect()
    }
}

/// Pre-allocated point buffer in structure-of-arrays layout.
///
/// The separate coordinate arrays feed directly into
/// [`crate::formats::format_points_12byte_into`].
#[derive(Debug, Clone)]
pub struct PointBuffer {
    x: Vec<f32>,
    y: Vec<f32>,
    z: Vec<f32>,
    len: usize,
}

impl PointBuffer {
    /// Create a new buffer with the specified capacity.
    ///
    /// Memory is allocated once at construction; no allocations occur during
    /// normal operation (push/clear).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            x: vec![0.0; capacity],
            y: vec![0.0; capacity],
            z: vec![0.0; capacity],
            len: 0,
        }
    }

    /// Returns the number of valid points in the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the buffer contains no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the maximum capacity of the buffer.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.x.len()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Clear all points, resetting length to zero.
    ///
    /// The underlying memory is not zeroed.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Add a point to the buffer.
    ///
    /// Returns [`Error::BufferOverflow`] when the buffer is already full.
    #[inline]
    pub fn push(&mut self, x: f32, y: f32, z: f32) -> Result<(), Error> {
        if self.is_full() {
            return Err(Error::BufferOverflow);
        }

        self.x[self.len] = x;
        self.y[self.len] = y;
        self.z[self.len] = z;
        self.len += 1;
        Ok(())
    }

    /// Returns a slice of valid X coordinates.
    #[inline]
    pub fn x(&self) -> &[f32] {
        &self.x[..self.len]
    }

    /// Returns a slice of valid Y coordinates.
    #[inline]
    pub fn y(&self) -> &[f32] {
        &self.y[..self.len]
    }

    /// Returns a slice of valid Z coordinates.
    #[inline]
    pub fn z(&self) -> &[f32] {
        &self.z[..self.len]
    }
}

impl Default for PointBuffer {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}
