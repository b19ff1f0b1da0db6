// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! ROS2-compatible messages for the finished products.
//!
//! Revolutions and single readings become `sensor_msgs/LaserScan`, point
//! batches become `sensor_msgs/PointCloud2`. Both serialize with CDR.

use crate::{batch::PointBatch, formats::xyz_fields, revolution::Revolution};
use edgefirst_schemas::{builtin_interfaces::Time, sensor_msgs::PointCloud2, std_msgs::Header};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// `sensor_msgs/msg/LaserScan`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LaserScan {
    pub header: Header,
    pub angle_min: f32,
    pub angle_max: f32,
    pub angle_increment: f32,
    pub time_increment: f32,
    pub scan_time: f32,
    pub range_min: f32,
    pub range_max: f32,
    pub ranges: Vec<f32>,
    pub intensities: Vec<f32>,
}

/// Frame and range limits stamped onto every scan.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanConfig {
    pub frame_id: String,
    pub range_min: f32,
    pub range_max: f32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            frame_id: "laser".to_string(),
            range_min: 0.0,
            range_max: 100.0,
        }
    }
}

/// Convert a nanosecond timestamp to a ROS time.
pub fn time_from_nanos(nanos: u64) -> Time {
    Time {
        sec: (nanos / 1_000_000_000) as i32,
        nanosec: (nanos % 1_000_000_000) as u32,
    }
}

/// Build a full-circle scan from a completed revolution.
pub fn laser_scan(revolution: &Revolution, config: &ScanConfig) -> LaserScan {
    LaserScan {
        header: Header {
            stamp: time_from_nanos(revolution.timestamp),
            frame_id: config.frame_id.clone(),
        },
        angle_min: 0.0,
        angle_max: TAU,
        angle_increment: revolution.angle_increment(),
        time_increment: revolution.time_increment(),
        scan_time: revolution.scan_period,
        range_min: config.range_min,
        range_max: config.range_max,
        ranges: revolution.ranges.clone(),
        intensities: Vec::new(),
    }
}

/// Build a one-range scan from an ASCII mode reading.
pub fn single_reading_scan(
    distance: f32,
    timestamp: u64,
    scan_period: f32,
    config: &ScanConfig,
) -> LaserScan {
    LaserScan {
        header: Header {
            stamp: time_from_nanos(timestamp),
            frame_id: config.frame_id.clone(),
        },
        angle_min: 0.0,
        angle_max: 0.0,
        angle_increment: 0.0,
        time_increment: scan_period,
        scan_time: scan_period,
        range_min: config.range_min,
        range_max: config.range_max,
        ranges: vec![distance],
        intensities: Vec::new(),
    }
}

/// Wrap a packed point batch in a PointCloud2 message.
pub fn point_cloud(batch: PointBatch, frame_id: &str) -> PointCloud2 {
    let step = PointBatch::POINT_STEP as u32;
    PointCloud2 {
        header: Header {
            stamp: time_from_nanos(batch.timestamp),
            frame_id: frame_id.to_string(),
        },
        height: 1,
        width: batch.n_points,
        fields: xyz_fields(),
        is_bigendian: false,
        point_step: step,
        row_step: step * batch.n_points,
        data: batch.data,
        is_dense: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revolution::DEFAULT_SCAN_PERIOD;
    use edgefirst_schemas::serde_cdr;

    #[test]
    fn test_time_from_nanos() {
        let t = time_from_nanos(3_250_000_001);
        assert_eq!(t.sec, 3);
        assert_eq!(t.nanosec, 250_000_001);
    }

    #[test]
    fn test_laser_scan_from_revolution() {
        let revolution = Revolution {
            revolution_id: 2,
            timestamp: 1_500_000_000,
            scan_period: DEFAULT_SCAN_PERIOD,
            ranges: vec![4.0, 3.0, 2.0, 1.0],
        };
        let scan = laser_scan(&revolution, &ScanConfig::default());

        assert_eq!(scan.header.frame_id, "laser");
        assert_eq!(scan.header.stamp.sec, 1);
        assert_eq!(scan.header.stamp.nanosec, 500_000_000);
        assert_eq!(scan.angle_min, 0.0);
        assert_eq!(scan.angle_max, TAU);
        assert_eq!(scan.angle_increment, TAU / 4.0);
        assert_eq!(scan.time_increment, DEFAULT_SCAN_PERIOD / 4.0);
        assert_eq!(scan.scan_time, DEFAULT_SCAN_PERIOD);
        assert_eq!(scan.range_max, 100.0);
        assert_eq!(scan.ranges, vec![4.0, 3.0, 2.0, 1.0]);
        assert!(scan.intensities.is_empty());

        assert!(!serde_cdr::serialize(&scan).unwrap().is_empty());
    }

    #[test]
    fn test_single_reading_scan() {
        let config = ScanConfig {
            frame_id: "laserpointer".to_string(),
            ..Default::default()
        };
        let scan = single_reading_scan(12.5, 0, 0.2, &config);
        assert_eq!(scan.ranges, vec![12.5]);
        assert_eq!(scan.angle_increment, 0.0);
        assert_eq!(scan.time_increment, 0.2);
        assert_eq!(scan.scan_time, 0.2);
        assert_eq!(scan.header.frame_id, "laserpointer");
    }

    #[test]
    fn test_point_cloud_layout() {
        let batch = PointBatch {
            timestamp: 7,
            n_points: 3,
            data: vec![0u8; 36],
        };
        let msg = point_cloud(batch, "laser");
        assert_eq!(msg.height, 1);
        assert_eq!(msg.width, 3);
        assert_eq!(msg.point_step, 12);
        assert_eq!(msg.row_step, 36);
        assert_eq!(msg.data.len(), 36);
        assert_eq!(msg.fields.len(), 3);
        assert!(!msg.is_bigendian);
        assert!(msg.is_dense);
        assert_eq!(msg.header.stamp.nanosec, 7);
    }
}
