// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Common LiDAR types and trait abstraction for the LightWare sensors.
//!
//! This module provides the sensor-agnostic pieces shared by the SF30C
//! revolution assembler and the SF45B point batch packer: the crate error
//! type, the [`LidarDriver`] trait and a monotonic timestamp source.

use crate::lwnx::RawPacket;
use clap::ValueEnum;
use log::warn;
use std::fmt;

/// Common error type for LiDAR operations
///
/// Packet-level errors ([`Error::MalformedPacket`], [`Error::UnexpectedEnd`])
/// are never fatal: the [`crate::reader::FrameReader`] drops the offending
/// packet and keeps reading.
#[derive(Debug)]
#[allow(dead_code)] // All variants defined for completeness; some used by library consumers
pub enum Error {
    /// I/O error (socket, serial port)
    Io(std::io::Error),
    /// Payload too short or internally inconsistent for its declared kind
    MalformedPacket(String),
    /// Buffer overflow (too many points for buffer capacity)
    BufferOverflow,
    /// System time error
    SystemTime(std::time::SystemTimeError),
    /// Unexpected end of data at given byte position
    UnexpectedEnd(usize),
    /// Unknown packet (command) type
    UnknownPacketType(u8),
    /// Configuration error
    Config(String),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::MalformedPacket(msg) => write!(f, "malformed packet: {}", msg),
            Error::BufferOverflow => write!(f, "buffer overflow"),
            Error::SystemTime(err) => write!(f, "system time error: {}", err),
            Error::UnexpectedEnd(len) => write!(f, "unexpected end of data at {} bytes", len),
            Error::UnknownPacketType(typ) => write!(f, "unknown packet type: {}", typ),
            Error::Config(msg) => write!(f, "configuration error: {}", msg),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<std::time::SystemTimeError> for Error {
    fn from(err: std::time::SystemTimeError) -> Self {
        Error::SystemTime(err)
    }
}

/// Sensor type for CLI dispatch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SensorType {
    /// LightWare SF30C rotating-head scanner (revolution stream)
    #[default]
    Sf30c,
    /// LightWare SF45B steerable-head scanner (distance + angle samples)
    Sf45b,
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SensorType::Sf30c => write!(f, "sf30c"),
            SensorType::Sf45b => write!(f, "sf45b"),
        }
    }
}

/// Trait for LiDAR driver implementations
///
/// A driver consumes verified packets of a single LWNX command and
/// accumulates them into a higher-level frame. Drivers are not thread-safe
/// and must be fed by exactly one consumer, in arrival order.
pub trait LidarDriver: Send {
    /// Product emitted when a frame completes.
    type Frame;

    /// LWNX command id of the packets this driver consumes.
    fn command(&self) -> u8;

    /// Process a verified packet, returning a complete frame when ready
    ///
    /// # Returns
    /// - `Ok(None)` if more packets are needed to complete the frame
    /// - `Ok(Some(frame))` when a complete frame is ready
    /// - `Err` if the packet could not be decoded; the driver state is left
    ///   untouched so the caller may simply drop the packet
    fn process_packet(&mut self, packet: &RawPacket<'_>) -> Result<Option<Self::Frame>, Error>;
}

/// Get current timestamp in nanoseconds.
///
/// On Linux, uses `CLOCK_MONOTONIC_RAW` for best accuracy.
/// On other platforms, falls back to `SystemTime`.
#[cfg(target_os = "linux")]
pub fn timestamp() -> Result<u64, Error> {
    let mut tp = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    let err = unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC_RAW, &mut tp) };
    if err != 0 {
        return Err(std::io::Error::last_os_error().into());
    }

    Ok(tp.tv_sec as u64 * 1_000_000_000 + tp.tv_nsec as u64)
}

#[cfg(not(target_os = "linux"))]
pub fn timestamp() -> Result<u64, Error> {
    let now = std::time::SystemTime::now();
    let duration = now.duration_since(std::time::UNIX_EPOCH)?;
    Ok(duration.as_nanos() as u64)
}

/// Current timestamp for stamping frames, `0` if the clock cannot be read.
///
/// A failed read is logged so zero stamps downstream can be traced back.
pub fn timestamp_or_zero() -> u64 {
    stamp_or_zero(timestamp())
}

fn stamp_or_zero(stamp: Result<u64, Error>) -> u64 {
    match stamp {
        Ok(ns) => ns,
        Err(e) => {
            warn!("clock read failed, stamping 0: {}", e);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::MalformedPacket("short".into()).to_string(),
            "malformed packet: short"
        );
        assert_eq!(
            Error::UnexpectedEnd(3).to_string(),
            "unexpected end of data at 3 bytes"
        );
        assert_eq!(Error::UnknownPacketType(7).to_string(), "unknown packet type: 7");
    }

    #[test]
    fn test_sensor_type_display() {
        assert_eq!(SensorType::default(), SensorType::Sf30c);
        assert_eq!(SensorType::Sf30c.to_string(), "sf30c");
        assert_eq!(SensorType::Sf45b.to_string(), "sf45b");
    }

    #[test]
    fn test_timestamp_monotonic() {
        let a = timestamp().unwrap();
        let b = timestamp().unwrap();
        assert!(b >= a);
    }

    #[test]
    fn test_timestamp_or_zero() {
        assert!(timestamp_or_zero() > 0);
        assert_eq!(stamp_or_zero(Ok(42)), 42);

        let failed = Error::Io(std::io::Error::other("clock unavailable"));
        assert_eq!(stamp_or_zero(Err(failed)), 0);
    }
}
