// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! SF45B point batch packing.
//!
//! The SF45B reports one distance + head angle reading per packet. Each
//! reading is projected into the sensor plane and appended to the open
//! batch; once the batch holds `capacity` points it is serialized into
//! packed 12-byte xyz records and handed out as a [`PointBatch`].
//!
//! Flushing is strictly capacity-triggered. A partially filled batch is
//! never emitted, including on shutdown.

use crate::{
    buffer::PointBuffer,
    formats::{XYZ_POINT_STEP, format_points_12byte},
    lidar::{Error, LidarDriver, timestamp_or_zero},
    lwnx::{PointSample, RawPacket, command, decode_point},
};
use std::f64::consts::PI;

/// A point in the sensor frame, meters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Project a distance + head angle reading onto the sensor plane.
///
/// The head angle is measured from the sensor's zero reference, which sits
/// 90° from the forward axis, and the forward axis is mirrored:
///
/// ```text
/// face = (angle - 90°) in radians
/// x = distance * -cos(face)
/// y = distance *  sin(face)
/// z = 0
/// ```
///
/// Downstream consumers depend on this exact orientation and on the exact
/// bits: only the degree to radian scaling runs in double precision, the
/// face angle is narrowed to `f32` and the trigonometry stays single
/// precision.
pub fn project(sample: &PointSample) -> Point3D {
    let face_angle = ((sample.angle - 90.0) as f64 * PI / 180.0) as f32;

    Point3D {
        x: sample.distance * -face_angle.cos(),
        y: sample.distance * face_angle.sin(),
        z: 0.0,
    }
}

/// A full batch of packed points.
#[derive(Clone, Debug, PartialEq)]
pub struct PointBatch {
    /// Time the batch was flushed, in nanoseconds.
    pub timestamp: u64,
    /// Number of points, always the packer capacity.
    pub n_points: u32,
    /// `n_points` packed xyz records, see [`crate::formats`].
    pub data: Vec<u8>,
}

impl PointBatch {
    /// Bytes per point record.
    pub const POINT_STEP: usize = XYZ_POINT_STEP;

    /// Read back the point at `index`.
    pub fn point(&self, index: usize) -> Option<Point3D> {
        let offset = index * Self::POINT_STEP;
        let record = self.data.get(offset..offset + Self::POINT_STEP)?;
        let field = |at: usize| {
            f32::from_le_bytes([record[at], record[at + 1], record[at + 2], record[at + 3]])
        };
        Some(Point3D {
            x: field(0),
            y: field(4),
            z: field(8),
        })
    }
}

/// SF45B point batch packer.
///
/// Owns the single open batch. Not thread-safe: feed it from exactly one
/// packet consumer.
#[derive(Debug)]
pub struct PointBatchPacker {
    points: PointBuffer,
}

impl PointBatchPacker {
    /// Create a packer flushing every `capacity` points.
    pub fn new(capacity: usize) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::Config(
                "point batch capacity must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            points: PointBuffer::with_capacity(capacity),
        })
    }

    pub fn capacity(&self) -> usize {
        self.points.capacity()
    }

    /// Points in the open batch.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Project and append one sample, returning the batch when it fills.
    pub fn push(&mut self, sample: &PointSample) -> Option<PointBatch> {
        let point = project(sample);
        // The batch is flushed as soon as it fills, so there is always room.
        if self.points.push(point.x, point.y, point.z).is_err() {
            return None;
        }

        if self.points.is_full() {
            return Some(self.flush());
        }
        None
    }

    fn flush(&mut self) -> PointBatch {
        let n_points = self.points.len();
        let data = format_points_12byte(self.points.x(), self.points.y(), self.points.z(), n_points);
        self.points.clear();

        PointBatch {
            timestamp: timestamp_or_zero(),
            n_points: n_points as u32,
            data,
        }
    }
}

impl LidarDriver for PointBatchPacker {
    type Frame = PointBatch;

    fn command(&self) -> u8 {
        command::DISTANCE_DATA_CM
    }

    fn process_packet(&mut self, packet: &RawPacket<'_>) -> Result<Option<PointBatch>, Error> {
        let sample = decode_point(packet.data())?;
        Ok(self.push(&sample))
    }
}
