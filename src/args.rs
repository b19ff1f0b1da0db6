// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::Parser;
use edgefirst_lightwarepub::{SensorType, ScanConfig, revolution::DEFAULT_SCAN_PERIOD};
use serde_json::json;
use std::time::Duration;
use tracing::level_filters::LevelFilter;
use zenoh::config::{Config, WhatAmI};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Local UDP address receiving verified LWNX packets from the serial
    /// bridge, one packet per datagram.
    #[arg(env, default_value = "0.0.0.0:5600")]
    pub target: String,

    /// LightWare sensor model.
    #[arg(long, env, default_value = "sf30c")]
    pub sensor: SensorType,

    /// Read SF30C distances in ASCII line mode from --port instead of LWNX
    /// packets over UDP.
    #[arg(long, env)]
    pub ascii: bool,

    /// Serial port used by ASCII line mode.
    #[arg(long, env, default_value = "/dev/ttyUSB0")]
    pub port: String,

    /// Serial baud rate used by ASCII line mode.
    #[arg(long, env, default_value = "115200")]
    pub baudrate: u32,

    /// The name of the lidar frame
    #[arg(long, env, default_value = "laser")]
    pub frame_id: String,

    /// Output topic, defaults to rt/lidar/scan for the SF30C and
    /// rt/lidar/points for the SF45B.
    #[arg(long, env)]
    pub topic: Option<String>,

    /// Points per published SF45B batch.
    #[arg(long, env, default_value = "100")]
    pub max_points: usize,

    /// Nominal SF30C revolution period in seconds.
    #[arg(long, env, default_value_t = DEFAULT_SCAN_PERIOD)]
    pub scan_period: f32,

    /// Time to wait for a single packet, in milliseconds.
    #[arg(long, env, default_value = "1000")]
    pub packet_timeout: u64,

    /// Minimum valid range reported in LaserScan messages, in meters.
    #[arg(long, env, default_value = "0")]
    pub range_min: f32,

    /// Maximum valid range reported in LaserScan messages, in meters.
    #[arg(long, env, default_value = "100")]
    pub range_max: f32,

    /// Application log level
    #[arg(long, env, default_value = "info")]
    pub rust_log: LevelFilter,

    /// zenoh connection mode
    #[arg(long, env, default_value = "peer")]
    mode: WhatAmI,

    /// connect to zenoh endpoints
    #[arg(long, env)]
    connect: Vec<String>,

    /// listen to zenoh endpoints
    #[arg(long, env)]
    listen: Vec<String>,

    /// disable zenoh multicast scouting
    #[arg(long, env)]
    no_multicast_scouting: bool,
}

impl Args {
    /// Resolved output topic for the selected sensor.
    pub fn topic(&self) -> String {
        match (&self.topic, self.sensor) {
            (Some(topic), _) => topic.clone(),
            (None, SensorType::Sf45b) if !self.ascii => "rt/lidar/points".to_string(),
            (None, _) => "rt/lidar/scan".to_string(),
        }
    }

    /// Batch capacity, at least one point.
    pub fn batch_capacity(&self) -> usize {
        self.max_points.max(1)
    }

    pub fn packet_timeout(&self) -> Duration {
        Duration::from_millis(self.packet_timeout)
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            frame_id: self.frame_id.clone(),
            range_min: self.range_min,
            range_max: self.range_max,
        }
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        let mut config = Config::default();

        config
            .insert_json5("mode", &json!(args.mode).to_string())
            .unwrap();

        if !args.connect.is_empty() {
            config
                .insert_json5("connect/endpoints", &json!(args.connect).to_string())
                .unwrap();
        }

        if !args.listen.is_empty() {
            config
                .insert_json5("listen/endpoints", &json!(args.listen).to_string())
                .unwrap();
        }

        if args.no_multicast_scouting {
            config
                .insert_json5("scouting/multicast/enabled", &json!(false).to_string())
                .unwrap();
        }

        config
            .insert_json5("scouting/multicast/interface", &json!("lo").to_string())
            .unwrap();

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["lightwarepub"]).unwrap();
        assert_eq!(args.sensor, SensorType::Sf30c);
        assert_eq!(args.topic(), "rt/lidar/scan");
        assert_eq!(args.frame_id, "laser");
        assert_eq!(args.batch_capacity(), 100);
        assert_eq!(args.scan_period, DEFAULT_SCAN_PERIOD);
        assert_eq!(args.packet_timeout(), Duration::from_secs(1));
        assert_eq!(args.scan_config(), ScanConfig::default());
    }

    #[test]
    fn test_sf45b_topic_and_capacity() {
        let args =
            Args::try_parse_from(["lightwarepub", "--sensor", "sf45b", "--max-points", "0"])
                .unwrap();
        assert_eq!(args.topic(), "rt/lidar/points");
        assert_eq!(args.batch_capacity(), 1);

        let args = Args::try_parse_from([
            "lightwarepub",
            "--sensor",
            "sf45b",
            "--topic",
            "rt/sf45b",
        ])
        .unwrap();
        assert_eq!(args.topic(), "rt/sf45b");
    }
}
