// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! SF30C revolution assembly.
//!
//! The SF30C streams each 360° sweep as a sequence of distance stream packets,
//! each carrying a contiguous slice of the sweep. [`RevolutionAssembler`]
//! stitches the slices back together:
//!
//! ```text
//!            start_index == 0
//!   ┌──────┐ ─────────────────► ┌────────────┐
//!   │ Idle │                    │ Collecting │ ◄─┐ in-order slice
//!   └──────┘ ◄───────────────── └────────────┘ ──┘
//!            complete / id or index mismatch / overflow
//! ```
//!
//! Only strictly continuous slices are accepted: same revolution id and a
//! start index equal to the number of points collected so far. Any other
//! packet discards the open revolution. Lost packets are never recovered;
//! the assembler simply waits for the next revolution start.

use crate::{
    buffer::RangeBuffer,
    lidar::{Error, LidarDriver, timestamp_or_zero},
    lwnx::{RawPacket, StreamPacketSlice, StreamSample, command},
};
use log::debug;
use std::{f32::consts::TAU, fmt};

/// Upper bound on points in a single revolution (exclusive).
pub const MAX_REV_POINTS: usize = 4096;

/// Assumed duration of one revolution in seconds.
///
/// This is not derived from the device: the SF30C reports points per second
/// and motor voltage but the reference deployment hard-codes five
/// revolutions per second. Treat it as an approximation.
pub const DEFAULT_SCAN_PERIOD: f32 = 1.0 / 5.0;

/// Assembler state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum State {
    /// No partial revolution, waiting for a packet with start index 0.
    #[default]
    Idle,
    /// Accumulating one revolution.
    Collecting,
}

/// Why an open revolution was thrown away.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anomaly {
    /// Packet belongs to another revolution, skips points, repeats points or
    /// arrived out of order.
    ContinuityViolation {
        expected_id: u8,
        revolution_id: u8,
        expected_index: usize,
        start_index: u16,
    },
    /// Appending the packet would reach [`MAX_REV_POINTS`].
    Overflow { points: usize },
    /// Appending the packet would run past the declared revolution size.
    ExceedsTotal { points: usize, total: usize },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Anomaly::ContinuityViolation {
                expected_id,
                revolution_id,
                expected_index,
                start_index,
            } => write!(
                f,
                "expected revolution {} index {}, got revolution {} index {}",
                expected_id, expected_index, revolution_id, start_index
            ),
            Anomaly::Overflow { points } => {
                write!(f, "{} points exceeds limit of {}", points, MAX_REV_POINTS)
            }
            Anomaly::ExceedsTotal { points, total } => {
                write!(f, "{} points exceeds declared total of {}", points, total)
            }
        }
    }
}

/// Outcome of feeding one packet to the assembler.
#[derive(Clone, Debug, PartialEq)]
pub enum Assembly {
    /// Idle and the packet was not a revolution start.
    Waiting,
    /// Packet accepted, the revolution is still incomplete.
    Collecting,
    /// Packet completed the revolution.
    Complete(Revolution),
    /// The open revolution was discarded; the assembler is idle again.
    Discarded(Anomaly),
}

/// A complete revolution.
#[derive(Clone, Debug, PartialEq)]
pub struct Revolution {
    /// Device revolution index.
    pub revolution_id: u8,
    /// Time the first packet of the revolution was received, in nanoseconds.
    pub timestamp: u64,
    /// Assumed revolution duration in seconds.
    pub scan_period: f32,
    /// Ranges in meters, last collected point first.
    ///
    /// The sensor emits samples in decreasing angle order, so reversing the
    /// collection order yields increasing angles starting at 0.
    pub ranges: Vec<f32>,
}

impl Revolution {
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Angle between consecutive ranges in radians.
    pub fn angle_increment(&self) -> f32 {
        TAU / self.ranges.len() as f32
    }

    /// Time between consecutive ranges in seconds.
    pub fn time_increment(&self) -> f32 {
        self.scan_period / self.ranges.len() as f32
    }
}

/// SF30C revolution assembler.
///
/// Owns the single open revolution. Not thread-safe: feed it from exactly
/// one packet consumer.
#[derive(Debug)]
pub struct RevolutionAssembler {
    state: State,
    revolution_id: u8,
    expected_total: usize,
    start_timestamp: u64,
    scan_period: f32,
    ranges: RangeBuffer,
}

impl RevolutionAssembler {
    /// Create an idle assembler using the given revolution duration.
    pub fn new(scan_period: f32) -> Self {
        Self {
            state: State::Idle,
            revolution_id: 0,
            expected_total: 0,
            start_timestamp: 0,
            scan_period,
            ranges: RangeBuffer::with_capacity(MAX_REV_POINTS),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Points collected for the open revolution.
    pub fn collected(&self) -> usize {
        self.ranges.len()
    }

    pub fn scan_period(&self) -> f32 {
        self.scan_period
    }

    /// Feed one decoded distance stream sample.
    pub fn push(&mut self, sample: &StreamSample) -> Assembly {
        self.accept(
            sample.revolution_id,
            sample.total_points,
            sample.start_index,
            sample.distances.iter().copied(),
        )
    }

    fn accept<I>(
        &mut self,
        revolution_id: u8,
        total_points: u16,
        start_index: u16,
        distances: I,
    ) -> Assembly
    where
        I: ExactSizeIterator<Item = f32>,
    {
        if self.state == State::Idle {
            // Mid-stream join, or a revolution that declares no points
            if start_index != 0 || total_points == 0 {
                return Assembly::Waiting;
            }
            self.start(revolution_id, total_points);
        }

        if revolution_id != self.revolution_id || start_index as usize != self.ranges.len() {
            let anomaly = Anomaly::ContinuityViolation {
                expected_id: self.revolution_id,
                revolution_id,
                expected_index: self.ranges.len(),
                start_index,
            };
            return self.discard(anomaly);
        }

        let points = self.ranges.len() + distances.len();
        if points >= MAX_REV_POINTS {
            return self.discard(Anomaly::Overflow { points });
        }
        if points > self.expected_total {
            return self.discard(Anomaly::ExceedsTotal {
                points,
                total: self.expected_total,
            });
        }
        if self.ranges.try_extend(distances).is_err() {
            return self.discard(Anomaly::Overflow { points });
        }

        if self.ranges.len() == self.expected_total {
            let revolution = Revolution {
                revolution_id: self.revolution_id,
                timestamp: self.start_timestamp,
                scan_period: self.scan_period,
                ranges: self.ranges.to_reversed(),
            };
            self.reset();
            return Assembly::Complete(revolution);
        }

        Assembly::Collecting
    }

    fn start(&mut self, revolution_id: u8, total_points: u16) {
        self.state = State::Collecting;
        self.revolution_id = revolution_id;
        self.expected_total = total_points as usize;
        self.start_timestamp = timestamp_or_zero();
        self.ranges.clear();
    }

    fn discard(&mut self, anomaly: Anomaly) -> Assembly {
        self.reset();
        Assembly::Discarded(anomaly)
    }

    fn reset(&mut self) {
        self.state = State::Idle;
        self.ranges.clear();
    }
}

impl Default for RevolutionAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_PERIOD)
    }
}

impl LidarDriver for RevolutionAssembler {
    type Frame = Revolution;

    fn command(&self) -> u8 {
        command::DISTANCE_STREAM
    }

    fn process_packet(&mut self, packet: &RawPacket<'_>) -> Result<Option<Revolution>, Error> {
        let slice = StreamPacketSlice::from_slice(packet.data())?;
        let assembly = self.accept(
            slice.revolution_id(),
            slice.total_points(),
            slice.start_index(),
            slice.distances(),
        );

        match assembly {
            Assembly::Complete(revolution) => Ok(Some(revolution)),
            Assembly::Discarded(anomaly) => {
                debug!("discarding revolution: {}", anomaly);
                Ok(None)
            }
            Assembly::Waiting | Assembly::Collecting => Ok(None),
        }
    }
}
