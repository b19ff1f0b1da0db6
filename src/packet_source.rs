// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Packet source abstraction for LiDAR drivers.
//!
//! This module provides a [`PacketSource`] trait standing in for the LWNX
//! transaction layer. A source yields one already verified packet (framing
//! and CRC checked) per call, or nothing if the wait timed out:
//!
//! - **Live operation**: [`UdpSource`], one packet per datagram from a
//!   serial bridge
//! - **Testing**: [`TestSource`] replays pre-recorded packets
//! - **Benchmarks**: [`LoopingTestSource`] repeats packets indefinitely
//!
//! # Example
//!
//! ```ignore
//! use edgefirst_lightwarepub::{
//!     packet_source::{PacketSource, TestSource},
//!     reader::MAX_PACKET_SIZE,
//! };
//!
//! let mut source = TestSource::new(recorded);
//! let mut buf = [0u8; MAX_PACKET_SIZE];
//! while source.has_more() {
//!     if let Some(len) = source.recv(&mut buf, timeout).await? {
//!         // Process buf[..len]
//!     }
//! }
//! ```

use crate::lidar::Error;
use std::{future::Future, pin::Pin, time::Duration};

/// Default time to wait for a single packet.
pub const DEFAULT_PACKET_TIMEOUT: Duration = Duration::from_millis(1000);

/// Trait for packet sources.
///
/// Implementations provide verified packets from various sources (UDP, test
/// data).
pub trait PacketSource: Send {
    /// Receive the next packet into the provided buffer, waiting at most
    /// `timeout`.
    ///
    /// # Returns
    /// - `Ok(Some(len))` - Number of bytes received
    /// - `Ok(None)` - No packet arrived within `timeout`
    /// - `Err` - I/O or source error
    fn recv<'a>(
        &'a mut self,
        buf: &'a mut [u8],
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Option<usize>, Error>> + Send + 'a>>;

    /// Check if more packets are available.
    ///
    /// For infinite sources (like UDP), always returns `true`.
    /// For finite sources (test data), returns `false` when exhausted.
    fn has_more(&self) -> bool;
}

/// UDP socket packet source for live sensor operation.
///
/// Each datagram carries exactly one verified LWNX packet.
pub struct UdpSource {
    socket: tokio::net::UdpSocket,
}

impl UdpSource {
    /// Create a new UDP source from an existing socket.
    pub fn new(socket: tokio::net::UdpSocket) -> Self {
        Self { socket }
    }

    /// Bind to an address and create a UDP source.
    pub async fn bind(addr: &str) -> Result<Self, Error> {
        let socket = tokio::net::UdpSocket::bind(addr).await?;
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr, Error> {
        Ok(self.socket.local_addr()?)
    }
}

impl PacketSource for UdpSource {
    fn recv<'a>(
        &'a mut self,
        buf: &'a mut [u8],
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Option<usize>, Error>> + Send + 'a>> {
        Box::pin(async move {
            match tokio::time::timeout(timeout, self.socket.recv(buf)).await {
                Ok(len) => Ok(Some(len?)),
                Err(_) => Ok(None),
            }
        })
    }

    fn has_more(&self) -> bool {
        true // UDP sources are infinite
    }
}

/// Copy a recorded packet into `buf`, or report a recorded timeout.
fn replay(packet: &[u8], buf: &mut [u8]) -> Option<usize> {
    if packet.is_empty() {
        return None;
    }
    let len = packet.len().min(buf.len());
    buf[..len].copy_from_slice(&packet[..len]);
    Some(len)
}

/// Replays a recorded packet sequence once.
///
/// An empty entry stands for a receive that timed out. Once the recording
/// is exhausted every call fails with [`std::io::ErrorKind::UnexpectedEof`],
/// which ends a [`crate::reader::FrameReader`] loop.
pub struct TestSource {
    packets: std::vec::IntoIter<Vec<u8>>,
}

impl TestSource {
    pub fn new(packets: Vec<Vec<u8>>) -> Self {
        Self {
            packets: packets.into_iter(),
        }
    }

    /// Entries not yet replayed.
    pub fn remaining(&self) -> usize {
        self.packets.len()
    }
}

impl PacketSource for TestSource {
    fn recv<'a>(
        &'a mut self,
        buf: &'a mut [u8],
        _timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Option<usize>, Error>> + Send + 'a>> {
        Box::pin(async move {
            match self.packets.next() {
                Some(packet) => Ok(replay(&packet, buf)),
                None => Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "recording exhausted",
                ))),
            }
        })
    }

    fn has_more(&self) -> bool {
        self.packets.len() > 0
    }
}

/// Replays a recorded packet sequence forever, for benchmarks.
pub struct LoopingTestSource {
    packets: Vec<Vec<u8>>,
    index: usize,
}

impl LoopingTestSource {
    pub fn new(packets: Vec<Vec<u8>>) -> Self {
        Self { packets, index: 0 }
    }

    /// Number of completed passes over the recording.
    pub fn loops(&self) -> usize {
        match self.packets.len() {
            0 => 0,
            n => self.index / n,
        }
    }
}

impl PacketSource for LoopingTestSource {
    fn recv<'a>(
        &'a mut self,
        buf: &'a mut [u8],
        _timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Option<usize>, Error>> + Send + 'a>> {
        Box::pin(async move {
            if self.packets.is_empty() {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "empty recording",
                )));
            }

            let packet = &self.packets[self.index % self.packets.len()];
            self.index += 1;
            Ok(replay(packet, buf))
        })
    }

    fn has_more(&self) -> bool {
        !self.packets.is_empty()
    }
}
