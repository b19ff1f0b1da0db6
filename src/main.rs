// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

mod args;

use args::Args;
use clap::Parser as _;
use edgefirst_lightwarepub::{
    PointBatchPacker, RevolutionAssembler, SensorType,
    ascii::{MAX_READ_RETRIES, read_reading},
    lidar::{Error, timestamp_or_zero},
    messages::{laser_scan, point_cloud, single_reading_scan},
    packet_source::UdpSource,
    reader::FrameReader,
};
use edgefirst_schemas::serde_cdr;
use serde::Serialize;
use serialport::{DataBits, FlowControl, Parity, StopBits};
use tracing::{error, info, info_span, trace, warn};
use tracing_subscriber::EnvFilter;
use zenoh::{
    bytes::{Encoding, ZBytes},
    pubsub::Publisher,
    qos::{CongestionControl, Priority},
};

const LASER_SCAN_SCHEMA: &str = "sensor_msgs/msg/LaserScan";
const POINT_CLOUD_SCHEMA: &str = "sensor_msgs/msg/PointCloud2";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(args.rust_log.into())
                .from_env_lossy(),
        )
        .init();

    let session = zenoh::open(zenoh::Config::from(args.clone())).await?;
    let topic = args.topic();
    let publisher = match session
        .declare_publisher(topic.clone())
        .priority(Priority::DataHigh)
        .congestion_control(CongestionControl::Drop)
        .await
    {
        Ok(v) => v,
        Err(e) => {
            error!("Failed to create publisher {}: {:?}", topic, e);
            return Err(e);
        }
    };
    info!("publishing {} data on {}", args.sensor, topic);

    if args.ascii {
        run_ascii(&args, &publisher).await?;
    } else {
        match args.sensor {
            SensorType::Sf30c => run_sf30c(&args, &publisher).await?,
            SensorType::Sf45b => run_sf45b(&args, &publisher).await?,
        }
    }

    Ok(())
}

/// Assemble SF30C revolutions and publish each one as a LaserScan.
async fn run_sf30c(args: &Args, publisher: &Publisher<'_>) -> Result<(), Error> {
    let source = UdpSource::bind(&args.target).await?;
    info!("listening for LWNX packets on {}", source.local_addr()?);

    let driver = RevolutionAssembler::new(args.scan_period);
    let mut reader = FrameReader::with_timeout(source, driver, args.packet_timeout());
    let config = args.scan_config();

    loop {
        let revolution = reader.next_frame().await?;
        trace!(
            "revolution {} with {} points",
            revolution.revolution_id,
            revolution.len()
        );
        let scan = info_span!("laser_scan").in_scope(|| laser_scan(&revolution, &config));
        publish(publisher, &scan, LASER_SCAN_SCHEMA).await;
    }
}

/// Pack SF45B samples and publish each full batch as a PointCloud2.
async fn run_sf45b(args: &Args, publisher: &Publisher<'_>) -> Result<(), Error> {
    let source = UdpSource::bind(&args.target).await?;
    info!("listening for LWNX packets on {}", source.local_addr()?);

    let driver = PointBatchPacker::new(args.batch_capacity())?;
    let mut reader = FrameReader::with_timeout(source, driver, args.packet_timeout());

    loop {
        let batch = reader.next_frame().await?;
        let msg = info_span!("point_cloud").in_scope(|| point_cloud(batch, &args.frame_id));
        publish(publisher, &msg, POINT_CLOUD_SCHEMA).await;
    }
}

/// Read ASCII lines on a blocking thread and publish each reading.
async fn run_ascii(args: &Args, publisher: &Publisher<'_>) -> Result<(), Error> {
    let mut port = serialport::new(&args.port, args.baudrate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(args.packet_timeout())
        .open()
        .map_err(|e| Error::Config(format!("{}: {}", args.port, e)))?;
    info!("reading ASCII distances from {} at {}", args.port, args.baudrate);

    let (tx, rx) = kanal::bounded(16);
    std::thread::Builder::new()
        .name("ascii".to_string())
        .spawn(move || {
            loop {
                match read_reading(&mut port) {
                    Ok(Some(distance)) => {
                        let time = timestamp_or_zero();
                        if tx.send((distance, time)).is_err() {
                            return;
                        }
                    }
                    // Publish nothing on a failed read, never a -1.0 range
                    Ok(None) => warn!("no reading after {} reads", MAX_READ_RETRIES),
                    Err(e) => {
                        error!("serial read error: {}", e);
                        return;
                    }
                }
            }
        })?;

    let rx = rx.to_async();
    let config = args.scan_config();
    while let Ok((distance, time)) = rx.recv().await {
        let scan = single_reading_scan(distance, time, args.scan_period, &config);
        publish(publisher, &scan, LASER_SCAN_SCHEMA).await;
    }

    Err(Error::Io(std::io::Error::new(
        std::io::ErrorKind::BrokenPipe,
        "serial reader stopped",
    )))
}

fn encode<T: Serialize>(msg: &T, schema: &str) -> Result<(ZBytes, Encoding), serde_cdr::Error> {
    let msg = ZBytes::from(serde_cdr::serialize(msg)?);
    let enc = Encoding::APPLICATION_CDR.with_schema(schema);
    Ok((msg, enc))
}

async fn publish<T: Serialize>(publisher: &Publisher<'_>, msg: &T, schema: &str) {
    let (msg, enc) = match encode(msg, schema) {
        Ok(v) => v,
        Err(e) => {
            error!("Could not encode {}: {:?}", schema, e);
            return;
        }
    };

    match publisher.put(msg).encoding(enc).await {
        Ok(_) => trace!("{} message sent", publisher.key_expr()),
        Err(e) => error!("{} message error: {:?}", publisher.key_expr(), e),
    }
}
