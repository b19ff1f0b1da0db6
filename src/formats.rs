// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Point cloud formatting with architecture-specific SIMD optimizations.
//!
//! This module converts structure-of-arrays point data into the packed
//! binary record layout carried by ROS PointCloud2 messages.
//!
//! # Architectures
//!
//! - **aarch64**: Native NEON intrinsics (stable Rust)
//! - **x86_64 with `portable_simd`**: std::simd (nightly Rust)
//! - **Fallback**: Scalar implementation (stable Rust)
//!
//! # Format
//!
//! ## 12-byte format (xyz)
//! ```text
//! ┌───────┬───────┬───────┐
//! │ x:f32 │ y:f32 │ z:f32 │
//! │ 4B    │ 4B    │ 4B    │
//! └───────┴───────┴───────┘
//! ```
//!
//! Records are row-major, little-endian, with no padding and no interleaved
//! metadata.

#[cfg(all(feature = "portable_simd", not(target_arch = "aarch64")))]
use std::simd::{Simd, ToBytes as _};

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::*;

use edgefirst_schemas::sensor_msgs::PointField;

/// Size of one packed xyz record in bytes.
pub const XYZ_POINT_STEP: usize = 12;

/// Point field data types for PointCloud2 messages.
///
/// These values correspond to the ROS sensor_msgs/PointField datatype field.
/// All variants are defined for completeness, even if not all are currently
/// used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
#[allow(dead_code)]
pub enum PointFieldType {
    INT8 = 1,
    UINT8 = 2,
    INT16 = 3,
    UINT16 = 4,
    INT32 = 5,
    UINT32 = 6,
    FLOAT32 = 7,
    FLOAT64 = 8,
}

/// Build the XYZ point fields (12-byte stride).
///
/// Returns a vector of PointField definitions for:
/// - x: FLOAT32 at offset 0
/// - y: FLOAT32 at offset 4
/// - z: FLOAT32 at offset 8
pub fn xyz_fields() -> Vec<PointField> {
    ["x", "y", "z"]
        .iter()
        .enumerate()
        .map(|(i, name)| PointField {
            name: String::from(*name),
            offset: (i * 4) as u32,
            datatype: PointFieldType::FLOAT32 as u8,
            count: 1,
        })
        .collect()
}

/// Format point cloud data into 12-byte packed format (XYZ).
///
/// Uses architecture-specific SIMD optimizations when available.
///
/// # Arguments
///
/// * `x`, `y`, `z` - Coordinate arrays (must be at least `n_points` long)
/// * `n_points` - Number of points to format
///
/// # Returns
///
/// A vector of `12 * n_points` bytes.
#[inline(never)]
pub fn format_points_12byte(x: &[f32], y: &[f32], z: &[f32], n_points: usize) -> Vec<u8> {
    let mut data = vec![0u8; XYZ_POINT_STEP * n_points];
    format_points_12byte_into(x, y, z, n_points, &mut data);
    data
}

/// Format point cloud data into a pre-allocated buffer (12-byte format).
///
/// # Panics
///
/// Panics if `out` is smaller than `12 * n_points` bytes.
#[cfg(target_arch = "aarch64")]
#[inline(never)]
pub fn format_points_12byte_into(x: &[f32], y: &[f32], z: &[f32], n_points: usize, out: &mut [u8]) {
    assert!(out.len() >= XYZ_POINT_STEP * n_points);
    assert!(x.len() >= n_points && y.len() >= n_points && z.len() >= n_points);
    let n_simd = n_points - n_points % 4;

    // SAFETY: NEON intrinsics are always available on aarch64.
    // All pointer accesses are bounds-checked by the asserts above.
    unsafe {
        let out_ptr = out.as_mut_ptr();

        for index in (0..n_simd).step_by(4) {
            let x_u32 = vreinterpretq_u32_f32(vld1q_f32(x.as_ptr().add(index)));
            let y_u32 = vreinterpretq_u32_f32(vld1q_f32(y.as_ptr().add(index)));
            let z_u32 = vreinterpretq_u32_f32(vld1q_f32(z.as_ptr().add(index)));

            let base = out_ptr.add(index * XYZ_POINT_STEP);

            (base as *mut u32).write_unaligned(vgetq_lane_u32::<0>(x_u32));
            (base.add(4) as *mut u32).write_unaligned(vgetq_lane_u32::<0>(y_u32));
            (base.add(8) as *mut u32).write_unaligned(vgetq_lane_u32::<0>(z_u32));

            let p1 = base.add(12);
            (p1 as *mut u32).write_unaligned(vgetq_lane_u32::<1>(x_u32));
            (p1.add(4) as *mut u32).write_unaligned(vgetq_lane_u32::<1>(y_u32));
            (p1.add(8) as *mut u32).write_unaligned(vgetq_lane_u32::<1>(z_u32));

            let p2 = base.add(24);
            (p2 as *mut u32).write_unaligned(vgetq_lane_u32::<2>(x_u32));
            (p2.add(4) as *mut u32).write_unaligned(vgetq_lane_u32::<2>(y_u32));
            (p2.add(8) as *mut u32).write_unaligned(vgetq_lane_u32::<2>(z_u32));

            let p3 = base.add(36);
            (p3 as *mut u32).write_unaligned(vgetq_lane_u32::<3>(x_u32));
            (p3.add(4) as *mut u32).write_unaligned(vgetq_lane_u32::<3>(y_u32));
            (p3.add(8) as *mut u32).write_unaligned(vgetq_lane_u32::<3>(z_u32));
        }
    }

    // Handle remainder with scalar code
    for index in n_simd..n_points {
        write_point(out, index, x[index], y[index], z[index]);
    }
}

/// Portable SIMD implementation for non-aarch64 targets (requires nightly).
#[cfg(all(feature = "portable_simd", not(target_arch = "aarch64")))]
#[inline(never)]
pub fn format_points_12byte_into(x: &[f32], y: &[f32], z: &[f32], n_points: usize, out: &mut [u8]) {
    assert!(out.len() >= XYZ_POINT_STEP * n_points);
    const N: usize = 4;
    let n_simd = n_points - n_points % N;

    for index in (0..n_simd).step_by(N) {
        let xb = Simd::<f32, N>::from_slice(&x[index..index + N]).to_le_bytes();
        let yb = Simd::<f32, N>::from_slice(&y[index..index + N]).to_le_bytes();
        let zb = Simd::<f32, N>::from_slice(&z[index..index + N]).to_le_bytes();

        for lane in 0..N {
            let offset = (index + lane) * XYZ_POINT_STEP;
            let bytes = lane * 4..lane * 4 + 4;
            out[offset..offset + 4].copy_from_slice(&xb[bytes.clone()]);
            out[offset + 4..offset + 8].copy_from_slice(&yb[bytes.clone()]);
            out[offset + 8..offset + 12].copy_from_slice(&zb[bytes]);
        }
    }

    for index in n_simd..n_points {
        write_point(out, index, x[index], y[index], z[index]);
    }
}

/// Scalar fallback for non-aarch64 targets without portable_simd.
#[cfg(all(not(feature = "portable_simd"), not(target_arch = "aarch64")))]
#[inline(never)]
pub fn format_points_12byte_into(x: &[f32], y: &[f32], z: &[f32], n_points: usize, out: &mut [u8]) {
    assert!(out.len() >= XYZ_POINT_STEP * n_points);

    for index in 0..n_points {
        write_point(out, index, x[index], y[index], z[index]);
    }
}

#[inline(always)]
fn write_point(out: &mut [u8], index: usize, x: f32, y: f32, z: f32) {
    let offset = index * XYZ_POINT_STEP;
    out[offset..offset + 4].copy_from_slice(&x.to_le_bytes());
    out[offset + 4..offset + 8].copy_from_slice(&y.to_le_bytes());
    out[offset + 8..offset + 12].copy_from_slice(&z.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_f32(data: &[u8], offset: usize) -> f32 {
        f32::from_le_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ])
    }

    #[test]
    fn test_format_points_12byte() {
        let x = vec![1.0f32, 2.0, 3.0, 4.0, 5.0];
        let y = vec![10.0f32, 20.0, 30.0, 40.0, 50.0];
        let z = vec![100.0f32, 200.0, 300.0, 400.0, 500.0];

        let data = format_points_12byte(&x, &y, &z, 5);
        assert_eq!(data.len(), 12 * 5);

        for i in 0..5 {
            let offset = i * 12;
            assert_eq!(read_f32(&data, offset), x[i]);
            assert_eq!(read_f32(&data, offset + 4), y[i]);
            assert_eq!(read_f32(&data, offset + 8), z[i]);
        }
    }

    #[test]
    fn test_format_points_bit_exact() {
        let x = [-10.0f32];
        let y = [f32::MIN_POSITIVE];
        let z = [0.0f32];

        let data = format_points_12byte(&x, &y, &z, 1);
        assert_eq!(&data[0..4], &(-10.0f32).to_le_bytes());
        assert_eq!(&data[4..8], &f32::MIN_POSITIVE.to_le_bytes());
        assert_eq!(&data[8..12], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_format_points_partial_count() {
        // Only the first n_points are written even if arrays are longer
        let x = vec![1.0f32; 8];
        let y = vec![2.0f32; 8];
        let z = vec![3.0f32; 8];
        let data = format_points_12byte(&x, &y, &z, 6);
        assert_eq!(data.len(), 72);
        assert_eq!(read_f32(&data, 60), 1.0);
        assert_eq!(read_f32(&data, 68), 3.0);
    }

    #[test]
    fn test_xyz_fields() {
        let fields = xyz_fields();
        assert_eq!(fields.len(), 3);
        for (i, name) in ["x", "y", "z"].iter().enumerate() {
            assert_eq!(fields[i].name, *name);
            assert_eq!(fields[i].offset, (i * 4) as u32);
            assert_eq!(fields[i].datatype, PointFieldType::FLOAT32 as u8);
            assert_eq!(fields[i].count, 1);
        }
    }

    #[test]
    fn test_format_into_preallocated() {
        let x = vec![1.0f32; 100];
        let y = vec![2.0f32; 100];
        let z = vec![3.0f32; 100];

        let mut buffer = vec![0u8; 12 * 100];
        format_points_12byte_into(&x, &y, &z, 100, &mut buffer);

        let offset = 99 * 12;
        assert_eq!(read_f32(&buffer, offset), 1.0);
        assert_eq!(read_f32(&buffer, offset + 4), 2.0);
        assert_eq!(read_f32(&buffer, offset + 8), 3.0);
    }
}
