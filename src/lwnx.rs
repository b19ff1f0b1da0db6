// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! LightWare LWNX packet field decoding.
//!
//! The transaction layer hands over packets whose framing and CRC have
//! already been verified. Every decoder in this module is a pure function of
//! the packet bytes: no state, no I/O, no retries.
//!
//! # Packet Structure
//!
//! ```text
//! ┌───────┬─────────────┬─────────┬──────────────────────┐
//! │ start │ flags (u16) │ command │ payload ...          │
//! │ 0     │ 1..3        │ 3       │ 4..                  │
//! └───────┴─────────────┴─────────┴──────────────────────┘
//! ```
//!
//! ## Distance stream (command 48, SF30C) - 18 byte header
//! - 4: alarm state, 5-6: points per second, 7-8: forward offset,
//!   9-10: motor voltage
//! - 11: revolution index
//! - 12-13: points in revolution, 14-15: points in packet, 16-17: start index
//! - 18..: `u16` distances in centimeters
//!
//! ## Distance data in cm (command 44, SF45B) - 8 bytes
//! - 4-5: `i16` distance in centimeters
//! - 6-7: `i16` angle in hundredths of a degree
//!
//! All multi-byte fields are little-endian.

use crate::lidar::Error;

/// Offset of the command id inside a verified packet
const COMMAND_OFFSET: usize = 3;

/// Offset of the first payload byte
pub const PAYLOAD_OFFSET: usize = 4;

/// Size of the fixed distance stream header (up to the first distance)
const STREAM_HEADER_SIZE: usize = 18;

/// Size of a distance data in cm packet
const POINT_PACKET_SIZE: usize = 8;

/// Length of fixed string responses (product name, serial number)
const STRING_RESPONSE_LEN: usize = 16;

/// Centimeters per meter
const CM_PER_METER: f32 = 100.0;

/// Hundredths per degree
const HUNDREDTHS_PER_DEGREE: f32 = 100.0;

/// LWNX command ids the reader routes on.
pub mod command {
    /// Product name (16 byte string)
    pub const PRODUCT_NAME: u8 = 0;
    /// Hardware version (u32)
    pub const HARDWARE_VERSION: u8 = 1;
    /// Firmware version (u32, packed major.minor.patch)
    pub const FIRMWARE_VERSION: u8 = 2;
    /// Serial number (16 byte string)
    pub const SERIAL_NUMBER: u8 = 3;
    /// Distance data in cm (SF45B single sample)
    pub const DISTANCE_DATA_CM: u8 = 44;
    /// Distance output stream (SF30C revolution slice)
    pub const DISTANCE_STREAM: u8 = 48;
}

/// A verified packet borrowed from the transaction layer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RawPacket<'a> {
    slice: &'a [u8],
}

impl<'a> RawPacket<'a> {
    pub fn from_slice(slice: &'a [u8]) -> Result<RawPacket<'a>, Error> {
        if slice.len() < PAYLOAD_OFFSET {
            return Err(Error::UnexpectedEnd(slice.len()));
        }
        Ok(RawPacket { slice })
    }

    /// LWNX command id this packet answers or streams.
    pub fn command(&self) -> u8 {
        self.slice[COMMAND_OFFSET]
    }

    /// The whole packet, header included. Field offsets are relative to it.
    pub fn data(&self) -> &'a [u8] {
        self.slice
    }

    pub fn len(&self) -> usize {
        self.slice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slice.is_empty()
    }
}

/// Decoded distance stream packet (SF30C).
#[derive(Clone, Debug, PartialEq)]
pub struct StreamSample {
    /// Alarm state, passed through untouched.
    pub alarm_state: u8,
    /// Device reported output rate.
    pub points_per_second: u16,
    /// Forward offset, passed through untouched.
    pub forward_offset: i16,
    /// Motor voltage, passed through untouched.
    pub motor_voltage: i16,
    /// Revolution index, wraps at 255.
    pub revolution_id: u8,
    /// Number of points the device claims for the whole revolution.
    pub total_points: u16,
    /// Index of the first distance in this packet within the revolution.
    pub start_index: u16,
    /// Distances in meters, `points_in_packet` long.
    pub distances: Vec<f32>,
}

impl StreamSample {
    pub fn points_in_packet(&self) -> usize {
        self.distances.len()
    }
}

/// Zero-copy view over a distance stream packet.
///
/// Construction validates that every declared distance is present, so the
/// accessors never read out of bounds.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StreamPacketSlice<'a> {
    slice: &'a [u8],
}

impl<'a> StreamPacketSlice<'a> {
    pub fn from_slice(slice: &'a [u8]) -> Result<StreamPacketSlice<'a>, Error> {
        if slice.len() < STREAM_HEADER_SIZE {
            return Err(Error::MalformedPacket(format!(
                "distance stream packet too small: {} bytes, expected at least {}",
                slice.len(),
                STREAM_HEADER_SIZE
            )));
        }

        let view = StreamPacketSlice { slice };
        let needed = STREAM_HEADER_SIZE + 2 * view.points_in_packet() as usize;
        if slice.len() < needed {
            return Err(Error::MalformedPacket(format!(
                "distance stream declares {} points but only {} of {} bytes present",
                view.points_in_packet(),
                slice.len(),
                needed
            )));
        }

        Ok(view)
    }

    pub fn alarm_state(&self) -> u8 {
        self.slice[4]
    }

    pub fn points_per_second(&self) -> u16 {
        u16::from_le_bytes([self.slice[5], self.slice[6]])
    }

    pub fn forward_offset(&self) -> i16 {
        i16::from_le_bytes([self.slice[7], self.slice[8]])
    }

    pub fn motor_voltage(&self) -> i16 {
        i16::from_le_bytes([self.slice[9], self.slice[10]])
    }

    pub fn revolution_id(&self) -> u8 {
        self.slice[11]
    }

    pub fn total_points(&self) -> u16 {
        u16::from_le_bytes([self.slice[12], self.slice[13]])
    }

    pub fn points_in_packet(&self) -> u16 {
        u16::from_le_bytes([self.slice[14], self.slice[15]])
    }

    pub fn start_index(&self) -> u16 {
        u16::from_le_bytes([self.slice[16], self.slice[17]])
    }

    /// Raw distances in centimeters.
    pub fn raw_distances(self) -> impl ExactSizeIterator<Item = u16> + 'a {
        let end = STREAM_HEADER_SIZE + 2 * self.points_in_packet() as usize;
        let slice: &'a [u8] = self.slice;
        slice[STREAM_HEADER_SIZE..end]
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
    }

    /// Distances converted to meters.
    pub fn distances(self) -> impl ExactSizeIterator<Item = f32> + 'a {
        self.raw_distances().map(|cm| cm as f32 / CM_PER_METER)
    }

    pub fn to_sample(&self) -> StreamSample {
        StreamSample {
            alarm_state: self.alarm_state(),
            points_per_second: self.points_per_second(),
            forward_offset: self.forward_offset(),
            motor_voltage: self.motor_voltage(),
            revolution_id: self.revolution_id(),
            total_points: self.total_points(),
            start_index: self.start_index(),
            distances: self.distances().collect(),
        }
    }
}

/// Decode a distance stream packet into a [`StreamSample`].
pub fn decode_stream(data: &[u8]) -> Result<StreamSample, Error> {
    Ok(StreamPacketSlice::from_slice(data)?.to_sample())
}

/// Decoded distance + angle reading (SF45B).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointSample {
    /// Distance in meters.
    pub distance: f32,
    /// Head angle in degrees.
    pub angle: f32,
}

/// Decode a distance data in cm packet into a [`PointSample`].
pub fn decode_point(data: &[u8]) -> Result<PointSample, Error> {
    if data.len() < POINT_PACKET_SIZE {
        return Err(Error::MalformedPacket(format!(
            "distance data packet too small: {} bytes, expected {}",
            data.len(),
            POINT_PACKET_SIZE
        )));
    }

    let distance_cm = i16::from_le_bytes([data[4], data[5]]);
    let angle_hundredths = i16::from_le_bytes([data[6], data[7]]);

    Ok(PointSample {
        distance: distance_cm as f32 / CM_PER_METER,
        angle: angle_hundredths as f32 / HUNDREDTHS_PER_DEGREE,
    })
}

/// Decode a 16 byte string response (product name, serial number).
///
/// The string ends at the first NUL or after 16 bytes.
pub fn decode_string(data: &[u8]) -> Result<String, Error> {
    let end = PAYLOAD_OFFSET + STRING_RESPONSE_LEN;
    if data.len() < end {
        return Err(Error::UnexpectedEnd(data.len()));
    }

    let raw = &data[PAYLOAD_OFFSET..end];
    let len = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    Ok(String::from_utf8_lossy(&raw[..len]).into_owned())
}

/// Decode a `u32` response (hardware and firmware versions).
pub fn decode_u32(data: &[u8]) -> Result<u32, Error> {
    if data.len() < PAYLOAD_OFFSET + 4 {
        return Err(Error::UnexpectedEnd(data.len()));
    }
    Ok(u32::from_le_bytes([data[4], data[5], data[6], data[7]]))
}

/// Format a packed firmware version as `major.minor.patch`.
pub fn firmware_version_string(version: u32) -> String {
    format!(
        "{}.{}.{}",
        (version >> 16) & 0xFF,
        (version >> 8) & 0xFF,
        version & 0xFF
    )
}

/// Device identity as reported by the identity query responses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    pub model: String,
    pub hardware_version: u32,
    pub firmware_version: u32,
    pub serial_number: String,
}

impl DeviceInfo {
    /// Update the matching field from an identity response.
    ///
    /// Packets for other commands are rejected with
    /// [`Error::UnknownPacketType`].
    pub fn update(&mut self, packet: &RawPacket<'_>) -> Result<(), Error> {
        let data = packet.data();
        match packet.command() {
            command::PRODUCT_NAME => self.model = decode_string(data)?,
            command::HARDWARE_VERSION => self.hardware_version = decode_u32(data)?,
            command::FIRMWARE_VERSION => self.firmware_version = decode_u32(data)?,
            command::SERIAL_NUMBER => self.serial_number = decode_string(data)?,
            other => return Err(Error::UnknownPacketType(other)),
        }
        Ok(())
    }

    pub fn firmware_string(&self) -> String {
        firmware_version_string(self.firmware_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a distance stream packet with the given header values.
    fn stream_packet(rev: u8, total: u16, start: u16, distances: &[u16]) -> Vec<u8> {
        let mut data = vec![0xaa, 0, 0, command::DISTANCE_STREAM];
        data.push(0); // alarm
        data.extend_from_slice(&20010u16.to_le_bytes());
        data.extend_from_slice(&(-3i16).to_le_bytes());
        data.extend_from_slice(&1200i16.to_le_bytes());
        data.push(rev);
        data.extend_from_slice(&total.to_le_bytes());
        data.extend_from_slice(&(distances.len() as u16).to_le_bytes());
        data.extend_from_slice(&start.to_le_bytes());
        for d in distances {
            data.extend_from_slice(&d.to_le_bytes());
        }
        data
    }

    #[test]
    fn test_raw_packet_command() {
        let packet = RawPacket::from_slice(&[0xaa, 0x00, 0x01, 48, 0x10]).unwrap();
        assert_eq!(packet.command(), command::DISTANCE_STREAM);
        assert_eq!(packet.len(), 5);
    }

    #[test]
    fn test_routed_command_ids() {
        use crate::{LidarDriver, PointBatchPacker, RevolutionAssembler};

        assert_eq!(
            [
                command::PRODUCT_NAME,
                command::HARDWARE_VERSION,
                command::FIRMWARE_VERSION,
                command::SERIAL_NUMBER,
            ],
            [0, 1, 2, 3]
        );
        assert_eq!(RevolutionAssembler::default().command(), 48);
        assert_eq!(PointBatchPacker::new(1).unwrap().command(), 44);
    }

    #[test]
    fn test_raw_packet_too_short() {
        assert!(matches!(
            RawPacket::from_slice(&[0xaa, 0x00, 0x01]),
            Err(Error::UnexpectedEnd(3))
        ));
    }

    #[test]
    fn test_decode_stream_fields() {
        let data = stream_packet(7, 6, 2, &[300, 400]);
        let slice = StreamPacketSlice::from_slice(&data).unwrap();
        assert_eq!(slice.points_per_second(), 20010);
        assert_eq!(slice.forward_offset(), -3);
        assert_eq!(slice.motor_voltage(), 1200);

        let sample = slice.to_sample();
        assert_eq!(sample.revolution_id, 7);
        assert_eq!(sample.total_points, 6);
        assert_eq!(sample.start_index, 2);
        assert_eq!(sample.points_in_packet(), 2);
        assert_eq!(sample.distances, vec![3.0, 4.0]);
    }

    #[test]
    fn test_decode_stream_literal_bytes() {
        #[rustfmt::skip]
        let data = [
            0xaa, 0x00, 0x00, 0x30,         // header, command 48
            0x01,                           // alarm
            0x2a, 0x4e,                     // 20010 points/s
            0x00, 0x00, 0x00, 0x00,         // forward offset, motor voltage
            0x05,                           // revolution 5
            0x10, 0x01,                     // 272 points in revolution
            0x01, 0x00,                     // 1 point in packet
            0x0f, 0x01,                     // start index 271
            0xe8, 0x03,                     // 1000 cm
        ];
        let sample = decode_stream(&data).unwrap();
        assert_eq!(sample.alarm_state, 1);
        assert_eq!(sample.revolution_id, 5);
        assert_eq!(sample.total_points, 272);
        assert_eq!(sample.start_index, 271);
        assert_eq!(sample.distances, vec![10.0]);
    }

    #[test]
    fn test_decode_stream_declared_count_past_end() {
        let mut data = stream_packet(1, 6, 0, &[100, 200]);
        // Claim three points while only two are present
        data[14] = 3;
        assert!(matches!(
            decode_stream(&data),
            Err(Error::MalformedPacket(_))
        ));
    }

    #[test]
    fn test_decode_stream_header_too_small() {
        let data = vec![0u8; STREAM_HEADER_SIZE - 1];
        assert!(matches!(
            decode_stream(&data),
            Err(Error::MalformedPacket(_))
        ));
    }

    #[test]
    fn test_decode_stream_is_pure() {
        let data = stream_packet(9, 4, 0, &[123, 456, 789, 1011]);
        assert_eq!(decode_stream(&data).unwrap(), decode_stream(&data).unwrap());
    }

    #[test]
    fn test_decode_point() {
        let mut data = vec![0xaa, 0, 0, command::DISTANCE_DATA_CM];
        data.extend_from_slice(&523i16.to_le_bytes());
        data.extend_from_slice(&(-4550i16).to_le_bytes());

        let sample = decode_point(&data).unwrap();
        assert_eq!(sample.distance, 5.23);
        assert_eq!(sample.angle, -45.5);
    }

    #[test]
    fn test_decode_point_too_small() {
        let data = [0xaa, 0, 0, command::DISTANCE_DATA_CM, 0x01, 0x00, 0x02];
        assert!(matches!(
            decode_point(&data),
            Err(Error::MalformedPacket(_))
        ));
    }

    #[test]
    fn test_decode_string() {
        let mut data = vec![0xaa, 0, 0, command::PRODUCT_NAME];
        data.extend_from_slice(b"SF45\0\0\0\0\0\0\0\0\0\0\0\0");
        assert_eq!(decode_string(&data).unwrap(), "SF45");

        let mut full = vec![0xaa, 0, 0, command::SERIAL_NUMBER];
        full.extend_from_slice(b"0123456789ABCDEF");
        assert_eq!(decode_string(&full).unwrap(), "0123456789ABCDEF");

        assert!(decode_string(&data[..10]).is_err());
    }

    #[test]
    fn test_firmware_version_string() {
        assert_eq!(firmware_version_string(0x0001_0203), "1.2.3");
        assert_eq!(firmware_version_string(0xFF02_0A00), "2.10.0");
    }

    #[test]
    fn test_device_info_update() {
        let mut info = DeviceInfo::default();

        let mut hw = vec![0xaa, 0, 0, command::HARDWARE_VERSION];
        hw.extend_from_slice(&16u32.to_le_bytes());
        info.update(&RawPacket::from_slice(&hw).unwrap()).unwrap();

        let mut fw = vec![0xaa, 0, 0, command::FIRMWARE_VERSION];
        fw.extend_from_slice(&0x0002_0001u32.to_le_bytes());
        info.update(&RawPacket::from_slice(&fw).unwrap()).unwrap();

        assert_eq!(info.hardware_version, 16);
        assert_eq!(info.firmware_string(), "2.0.1");

        let other = [0xaa, 0, 0, command::DISTANCE_DATA_CM, 0, 0, 0, 0];
        assert!(matches!(
            info.update(&RawPacket::from_slice(&other).unwrap()),
            Err(Error::UnknownPacketType(44))
        ));
    }
}
