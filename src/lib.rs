//! Async client driver for serial GNSS positioning sensors.
//!
//! Navlink talks to a positioning sensor exposed through a publish/subscribe
//! and request/response service interface: it discovers the sensor service,
//! subscribes to its bounded stream of binary measurement frames, decodes
//! them into structured position reports, and concurrently issues periodic
//! write commands with bounded-time acknowledgement.
//!
//! # Architecture
//!
//! - **frame** — byte-offset decoding of wire frames into
//!   [`FrameHeader`] + [`PositionRecord`], with sync and bounds validation
//! - **drain** — consume-once draining of the bounded inbound sample cache
//! - **command** — the periodic command/response cycle with timeout retry
//! - **binding** — idempotent service binding wiring both paths together
//! - **transport** — the traits an underlying service runtime implements,
//!   plus an in-memory mock for tests
//!
//! # Quick start
//!
//! ```rust,no_run
//! use navlink::{DriverConfig, SensorDriver};
//! use navlink::transport::mock::{MockDiscovery, MockSensor};
//! use navlink::transport::InstanceHandle;
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> navlink::Result<()> {
//!     let discovery = MockDiscovery::new();
//!     discovery.register(MockSensor::new(1));
//!
//!     let driver = SensorDriver::bind(discovery.clone(), DriverConfig::default())?;
//!     discovery.announce(&[InstanceHandle { instance_id: 1 }]);
//!
//!     let mut reports = driver.reports();
//!     while let Some(report) = reports.next().await {
//!         println!("lat {} lon {}", report.record.lat_deg, report.record.lon_deg);
//!     }
//!     Ok(())
//! }
//! ```

pub mod binding;
pub mod cache;
pub mod command;
pub mod config;
pub mod drain;
mod error;
pub mod frame;
pub mod transport;
pub mod types;

// Core exports
pub use binding::{ConnectionSlot, SensorDriver};
pub use cache::SampleCache;
pub use command::CommandCycle;
pub use config::{CommandConfig, DriverConfig};
pub use drain::{DrainOutcome, EventDrain, ReportSink};
pub use error::{DecodeError, Result, SensorError};
pub use frame::{
    decode, encode_frame, FrameHeader, PositionRecord, PositionReport, MIN_HEADER_LEN, RECORD_LEN,
    SYNC,
};
pub use types::{CommandAck, CommandPayload, PayloadPolicy, Sample};
