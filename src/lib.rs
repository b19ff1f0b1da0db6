// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! EdgeFirst LightWare Publisher Library
//!
//! This library turns verified LWNX packets from LightWare SF30C and SF45B
//! scanners into ROS2-compatible scan and point cloud messages.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌───────────────┐     ┌─────────────────────┐
//! │  PacketSource   │ ──► │  FrameReader  │ ──► │  LidarDriver        │
//! │  (UDP/test)     │     │  (routing)    │     │  (SF30C / SF45B)    │
//! └─────────────────┘     └───────────────┘     └─────────────────────┘
//!                                                          │
//!                          ┌───────────────────────────────┴──────┐
//!                          ▼                                      ▼
//!               ┌─────────────────────┐             ┌──────────────────────┐
//!               │  Revolution         │             │  PointBatch          │
//!               │  → LaserScan        │             │  → PointCloud2       │
//!               └─────────────────────┘             └──────────────────────┘
//! ```
//!
//! Each driver owns its accumulation state and must be fed from a single
//! consumer in packet arrival order:
//! 1. The source yields one verified packet or a timeout
//! 2. The reader skips packets for other commands
//! 3. The driver decodes the payload and advances its state
//! 4. When a frame completes the reader hands it to the caller
//!
//! # Modules
//!
//! - [`lwnx`]: Packet views and fixed-offset payload decoders
//! - [`revolution`]: SF30C revolution assembly state machine
//! - [`batch`]: SF45B projection and point batch packing
//! - [`buffer`]: Bounded range and point accumulators
//! - [`formats`]: SIMD-optimized point cloud formatting
//! - [`messages`]: LaserScan and PointCloud2 conversion
//! - [`packet_source`]: Packet source abstraction for testing
//! - [`reader`]: Sequential decode loop
//! - [`ascii`]: SF30C ASCII line mode
//! - [`lidar`]: Common types, traits, and error handling
//!
//! # Example
//!
//! ```ignore
//! use edgefirst_lightwarepub::{
//!     messages::{ScanConfig, laser_scan},
//!     packet_source::UdpSource,
//!     reader::FrameReader,
//!     revolution::RevolutionAssembler,
//! };
//!
//! let source = UdpSource::bind("0.0.0.0:5600").await?;
//! let mut reader = FrameReader::new(source, RevolutionAssembler::default());
//! let config = ScanConfig::default();
//!
//! loop {
//!     let revolution = reader.next_frame().await?;
//!     let scan = laser_scan(&revolution, &config);
//!     // Publish scan
//! }
//! ```

#![cfg_attr(feature = "portable_simd", feature(portable_simd))]

pub mod ascii;
pub mod batch;
pub mod buffer;
pub mod formats;
pub mod lidar;
pub mod lwnx;
pub mod messages;
pub mod packet_source;
pub mod reader;
pub mod revolution;

// Re-exports for convenience
pub use batch::{PointBatch, PointBatchPacker};
pub use formats::PointFieldType;
pub use lidar::{Error, LidarDriver, SensorType};
pub use lwnx::{DeviceInfo, RawPacket};
pub use messages::{LaserScan, ScanConfig};
pub use packet_source::PacketSource;
pub use reader::FrameReader;
pub use revolution::{Revolution, RevolutionAssembler};
