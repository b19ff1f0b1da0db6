// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! ASCII line mode.
//!
//! In its factory serial mode the SF30C prints one distance per line in
//! meters, e.g. `12.34\r\n`. This path bypasses LWNX entirely and yields a
//! single reading at a time.

use crate::lidar::Error;
use std::io::{ErrorKind, Read};

/// Longest line kept before accumulation restarts.
pub const MAX_LINE_LEN: usize = 64;

/// Empty or timed out reads tolerated before [`read_reading`] gives up.
pub const MAX_READ_RETRIES: usize = 40;

/// Byte-at-a-time line accumulator.
#[derive(Debug, Default)]
pub struct LineDecoder {
    line: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            line: Vec::with_capacity(MAX_LINE_LEN),
        }
    }

    /// Characters accumulated on the current line.
    pub fn pending(&self) -> &[u8] {
        &self.line
    }

    pub fn reset(&mut self) {
        self.line.clear();
    }

    /// Feed one byte, returning the reading when it completes a line.
    ///
    /// Only digits and `.` are kept; everything else except `\n` is noise.
    pub fn push(&mut self, byte: u8) -> Option<f32> {
        match byte {
            b'\n' => {
                let value = parse_prefix(&self.line);
                self.line.clear();
                Some(value)
            }
            b'0'..=b'9' | b'.' => {
                self.line.push(byte);
                if self.line.len() == MAX_LINE_LEN {
                    self.line.clear();
                }
                None
            }
            _ => None,
        }
    }
}

/// Parse the longest leading decimal number, `0.0` if there is none.
pub fn parse_prefix(line: &[u8]) -> f32 {
    let mut end = 0;
    let mut seen_dot = false;
    for &b in line {
        match b {
            b'0'..=b'9' => {}
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }

    std::str::from_utf8(&line[..end])
        .ok()
        .and_then(|s| s.parse::<f32>().ok())
        .unwrap_or(0.0)
}

/// Read one reading from a byte stream.
///
/// Returns `Ok(None)` after [`MAX_READ_RETRIES`] reads that produced no data
/// or timed out. Other I/O errors are returned.
pub fn read_reading<R: Read>(reader: &mut R) -> Result<Option<f32>, Error> {
    let mut decoder = LineDecoder::new();
    let mut byte = [0u8; 1];
    let mut tries = 0;

    while tries < MAX_READ_RETRIES {
        match reader.read(&mut byte) {
            Ok(1) => {
                if let Some(value) = decoder.push(byte[0]) {
                    return Ok(Some(value));
                }
            }
            Ok(_) => tries += 1,
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                tries += 1
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(None)
}
