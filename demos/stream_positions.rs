//! Streams decoded position reports from a simulated sensor.
//!
//! Run with: `cargo run --example stream_positions`

use std::time::Duration;

use anyhow::Result;
use futures::StreamExt;
use navlink::transport::mock::{MockDiscovery, MockSensor};
use navlink::transport::InstanceHandle;
use navlink::{encode_frame, DriverConfig, FrameHeader, PositionRecord, SensorDriver};

fn simulated_frame(step: u32) -> Vec<u8> {
    let header = FrameHeader {
        header_len: 28,
        msg_id: 42,
        msg_type: 0,
        msg_len: 72,
        idle_time: 25,
        quality: 4,
        week: 2325,
        ms_of_week: 100_000 + step * 100,
        diff_age_sec: 0,
    };
    let record = PositionRecord {
        sol_status: 0,
        pos_type: 50,
        lat_deg: -33.865 + f64::from(step) * 1e-5,
        lon_deg: 151.209,
        height_m: 58.0,
        undulation: 22.0,
        datum_id: 61,
        lat_std: 0.4,
        lon_std: 0.4,
        height_std: 0.9,
        station_id: *b"0000",
        diff_age_s: 1.0,
        sol_age_s: 0.0,
        sats_tracked: 18,
        sats_in_solution: 15,
        ext_sol_status: 0,
        galileo_mask: 0x0F,
        signal_mask: 0x33,
        checksum: 0,
    };
    encode_frame(&header, &record)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let discovery = MockDiscovery::new();
    let sensor = MockSensor::new(1);
    discovery.register(sensor.clone());

    let driver = SensorDriver::bind(discovery.clone(), DriverConfig::default())?;

    // A real discovery runtime fires this on its own once the sensor is up.
    discovery.announce(&[InstanceHandle { instance_id: 1 }]);

    tokio::spawn(async move {
        for step in 0.. {
            let frame = simulated_frame(step);
            let len = frame.len();
            sensor.push_frame(frame, len);
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    });

    let mut reports = driver.reports().take(10);
    while let Some(report) = reports.next().await {
        println!(
            "week {} ms {:>9}  lat {:.6} lon {:.6} height {:.1}m  sats {}/{}",
            report.header.week,
            report.header.ms_of_week,
            report.record.lat_deg,
            report.record.lon_deg,
            report.record.height_m,
            report.record.sats_in_solution,
            report.record.sats_tracked,
        );
    }

    Ok(())
}
