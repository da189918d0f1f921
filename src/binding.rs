//! Service binding: from availability notification to a wired driver.
//!
//! [`SensorDriver::bind`] registers an availability callback with the
//! discovery runtime. The first notification carrying at least one instance
//! handle constructs exactly one connection: the inbound event is subscribed
//! with a keep-newest cache and its receive handler triggers a drain pass,
//! while the command cycle starts on a dedicated tokio task. Every later
//! notification is logged and ignored — the binding is idempotent and never
//! reconnects on its own.
//!
//! The connection is the driver's single piece of shared mutable state. It
//! lives in a [`ConnectionSlot`], a set-at-most-once container; the
//! check-then-create step in the callback is additionally serialized by a
//! mutex so racing notifications cannot both construct.

use std::sync::{Arc, Mutex, PoisonError};

use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::command::CommandCycle;
use crate::config::DriverConfig;
use crate::drain::{DrainOutcome, EventDrain, ReportSink};
use crate::error::{Result, SensorError};
use crate::frame::PositionReport;
use crate::transport::{
    AvailabilityCallback, CachePolicy, SensorConnection, ServiceDiscovery,
};

/// Set-at-most-once holder for the active connection.
///
/// Once set, the connection is read-only for the life of the process; readers
/// clone the `Arc` without any lock.
#[derive(Default)]
pub struct ConnectionSlot {
    inner: std::sync::OnceLock<Arc<dyn SensorConnection>>,
}

impl ConnectionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the connection if the slot is still empty. Returns whether this
    /// call won.
    pub fn set(&self, conn: Arc<dyn SensorConnection>) -> bool {
        self.inner.set(conn).is_ok()
    }

    /// The bound connection, if any.
    pub fn get(&self) -> Option<Arc<dyn SensorConnection>> {
        self.inner.get().cloned()
    }

    /// Whether a connection has been bound.
    pub fn is_bound(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// Sink wired by the binding: logs every outcome and publishes decoded
/// reports to the watch channel subscribers read from.
struct WatchSink {
    tx: watch::Sender<Option<Arc<PositionReport>>>,
}

impl ReportSink for WatchSink {
    fn report(&self, outcome: DrainOutcome) {
        match outcome {
            DrainOutcome::Decoded { seq, report } => {
                debug!(
                    seq,
                    msg_id = report.header.msg_id,
                    pos_type = report.record.pos_type,
                    lat = report.record.lat_deg,
                    lon = report.record.lon_deg,
                    "decoded position frame"
                );
                // Send failures just mean no subscriber is listening right now.
                let _ = self.tx.send(Some(report));
            }
            DrainOutcome::Failed { seq, error } => {
                warn!(seq, %error, "discarding undecodable sample");
            }
        }
    }
}

/// Client driver for one positioning sensor service.
///
/// Construct with [`SensorDriver::bind`]; consume decoded frames through
/// [`SensorDriver::reports`]. Dropping the driver cancels its command cycle.
pub struct SensorDriver {
    slot: Arc<ConnectionSlot>,
    reports: watch::Receiver<Option<Arc<PositionReport>>>,
    cancel: CancellationToken,
}

impl SensorDriver {
    /// Register with discovery and return the driver.
    ///
    /// Returns immediately; the connection is established asynchronously when
    /// the service becomes available. Must be called within a tokio runtime —
    /// the command cycle task is spawned from the availability callback,
    /// which runs on the transport's dispatch context.
    pub fn bind(discovery: Arc<dyn ServiceDiscovery>, config: DriverConfig) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| SensorError::Runtime {
            context: format!("SensorDriver::bind requires a tokio runtime: {e}"),
        })?;

        let slot = Arc::new(ConnectionSlot::new());
        let (tx, rx) = watch::channel(None);
        let cancel = CancellationToken::new();

        let callback = Self::availability_callback(
            Arc::clone(&discovery),
            Arc::clone(&slot),
            config,
            WatchSink { tx },
            cancel.clone(),
            runtime,
        );
        discovery.start_find_service(callback, 1)?;

        Ok(Self { slot, reports: rx, cancel })
    }

    fn availability_callback(
        discovery: Arc<dyn ServiceDiscovery>,
        slot: Arc<ConnectionSlot>,
        config: DriverConfig,
        sink: WatchSink,
        cancel: CancellationToken,
        runtime: tokio::runtime::Handle,
    ) -> AvailabilityCallback {
        let bind_guard = Mutex::new(());
        let drain = Arc::new(EventDrain::new());
        let sink: Arc<dyn ReportSink> = Arc::new(sink);

        Box::new(move |handles| {
            info!(count = handles.len(), "sensor service availability notification");
            for handle in handles {
                debug!(instance_id = handle.instance_id, "sensor instance available");
            }
            let Some(first) = handles.first() else {
                return;
            };

            // Serialize check-then-create; the slot makes a second set
            // impossible, the guard makes a second connect attempt impossible.
            let _guard = bind_guard.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_bound() {
                debug!("connection already bound, ignoring notification");
                return;
            }

            let conn = match discovery.connect(first) {
                Ok(conn) => conn,
                Err(e) => {
                    error!(instance_id = first.instance_id, error = %e, "failed to connect");
                    return;
                }
            };
            info!(instance_id = first.instance_id, "bound sensor connection");

            // Inbound path: data-ready notifications trigger a drain pass.
            // The handler holds a weak reference so the connection does not
            // own a cycle back to itself.
            let weak = Arc::downgrade(&conn);
            let drain = Arc::clone(&drain);
            let sink = Arc::clone(&sink);
            conn.set_receive_handler(Box::new(move || {
                if let Some(conn) = weak.upgrade() {
                    drain.run(conn.as_ref(), sink.as_ref());
                }
            }));

            if let Err(e) = conn.subscribe(CachePolicy::KeepNewest, config.cache_capacity) {
                error!(error = %e, "inbound subscription failed");
                return;
            }

            if !slot.set(conn) {
                // Unreachable while the guard is held; worth a log if it ever fires.
                warn!("connection slot was filled concurrently");
                return;
            }

            // Outbound path: the command cycle owns its own task until the
            // driver is dropped.
            let cycle =
                CommandCycle::new(Arc::clone(&slot), config.command.clone(), cancel.child_token());
            runtime.spawn(cycle.run());
        })
    }

    /// Stream of decoded position reports, newest first on subscription.
    ///
    /// Backed by a watch channel: a slow consumer observes only the latest
    /// report, it never builds a backlog.
    pub fn reports(&self) -> impl Stream<Item = Arc<PositionReport>> + 'static {
        WatchStream::new(self.reports.clone()).filter_map(futures::future::ready)
    }

    /// Most recently decoded report, if any frame has arrived yet.
    pub fn latest(&self) -> Option<Arc<PositionReport>> {
        self.reports.borrow().clone()
    }

    /// Whether the service has been discovered and bound.
    pub fn is_bound(&self) -> bool {
        self.slot.is_bound()
    }

    /// The bound connection, for issuing ad-hoc commands.
    pub fn connection(&self) -> Option<Arc<dyn SensorConnection>> {
        self.slot.get()
    }
}

impl Drop for SensorDriver {
    fn drop(&mut self) {
        debug!("dropping sensor driver");
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockSensor;

    #[test]
    fn slot_sets_at_most_once() {
        let slot = ConnectionSlot::new();
        assert!(!slot.is_bound());

        let first = MockSensor::new(1);
        let second = MockSensor::new(2);
        assert!(slot.set(first));
        assert!(!slot.set(second));

        let bound = slot.get().expect("bound");
        assert_eq!(bound.instance().instance_id, 1);
    }
}
