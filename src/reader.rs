// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Sequential decode loop.
//!
//! [`FrameReader`] pulls verified packets from a [`PacketSource`], routes the
//! ones matching the driver's command to the driver and returns each
//! completed frame. Everything short of a source failure is absorbed here:
//!
//! - timeouts are "no packet this cycle"
//! - packets for other commands are skipped
//! - packets the driver cannot decode are dropped
//! - identity responses update the reader's [`DeviceInfo`]
//!
//! Nothing is flushed when the reader is dropped; a partially assembled
//! frame is simply lost.

use crate::{
    lidar::{Error, LidarDriver},
    lwnx::{DeviceInfo, RawPacket, command},
    packet_source::{DEFAULT_PACKET_TIMEOUT, PacketSource},
};
use log::{debug, info, trace, warn};
use std::time::Duration;

/// Largest packet the reader accepts, matching the LWNX payload limit plus
/// header and CRC.
pub const MAX_PACKET_SIZE: usize = 1024 + 6;

/// Running counters, useful for diagnosing lossy links.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReaderStats {
    /// Packets received from the source.
    pub packets: u64,
    /// Receive calls that timed out.
    pub timeouts: u64,
    /// Packets skipped because they carry another command.
    pub skipped: u64,
    /// Identity responses absorbed into the device info.
    pub identity: u64,
    /// Packets dropped because they could not be decoded.
    pub dropped: u64,
    /// Frames returned.
    pub frames: u64,
}

/// Drives one [`LidarDriver`] from one [`PacketSource`].
pub struct FrameReader<S, D> {
    source: S,
    driver: D,
    buf: Vec<u8>,
    timeout: Duration,
    stats: ReaderStats,
    device: DeviceInfo,
}

impl<S, D> FrameReader<S, D>
where
    S: PacketSource,
    D: LidarDriver,
{
    /// Create a reader using the default one second packet timeout.
    pub fn new(source: S, driver: D) -> Self {
        Self::with_timeout(source, driver, DEFAULT_PACKET_TIMEOUT)
    }

    pub fn with_timeout(source: S, driver: D, timeout: Duration) -> Self {
        Self {
            source,
            driver,
            buf: vec![0u8; MAX_PACKET_SIZE],
            timeout,
            stats: ReaderStats::default(),
            device: DeviceInfo::default(),
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn stats(&self) -> ReaderStats {
        self.stats
    }

    /// Identity reported by the sensor so far, if the bridge forwards it.
    pub fn device_info(&self) -> &DeviceInfo {
        &self.device
    }

    /// Read packets until the driver completes a frame.
    ///
    /// Only source errors are returned; they end the stream.
    pub async fn next_frame(&mut self) -> Result<D::Frame, Error> {
        loop {
            let len = match self.source.recv(&mut self.buf, self.timeout).await? {
                Some(len) => len,
                None => {
                    self.stats.timeouts += 1;
                    debug!("no packet within {:?}", self.timeout);
                    continue;
                }
            };
            self.stats.packets += 1;

            let packet = match RawPacket::from_slice(&self.buf[..len]) {
                Ok(packet) => packet,
                Err(e) => {
                    self.stats.dropped += 1;
                    warn!("unroutable packet: {}", e);
                    continue;
                }
            };

            if packet.command() <= command::SERIAL_NUMBER {
                match self.device.update(&packet) {
                    Ok(()) => {
                        self.stats.identity += 1;
                        info!(
                            "sensor: model={:?} hardware={} firmware={} serial={:?}",
                            self.device.model,
                            self.device.hardware_version,
                            self.device.firmware_string(),
                            self.device.serial_number
                        );
                    }
                    Err(e) => {
                        self.stats.dropped += 1;
                        debug!("bad identity response: {}", e);
                    }
                }
                continue;
            }

            if packet.command() != self.driver.command() {
                self.stats.skipped += 1;
                trace!("skipping packet for command {}", packet.command());
                continue;
            }

            match self.driver.process_packet(&packet) {
                Ok(Some(frame)) => {
                    self.stats.frames += 1;
                    return Ok(frame);
                }
                Ok(None) => {}
                Err(e) => {
                    self.stats.dropped += 1;
                    debug!("dropping packet: {}", e);
                }
            }
        }
    }
}
