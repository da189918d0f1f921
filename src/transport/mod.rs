//! Transport abstractions: discovery, connection, and the pending-reply handle.
//!
//! The driver core never talks to a wire directly. It is wired against two
//! object-safe traits — [`ServiceDiscovery`] and [`SensorConnection`] — that an
//! underlying service-communication runtime implements. The in-crate
//! [`mock`] module implements both for tests and demos.
//!
//! Contract highlights:
//!
//! - the availability callback may fire any number of times; the driver acts
//!   only on the first non-empty handle set,
//! - `take_cached_samples` removes a snapshot atomically, so the transport may
//!   keep appending concurrently,
//! - `submit` never blocks; the returned [`PendingReply`] is awaited with an
//!   explicit bound.

pub mod mock;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::error::{Result, SensorError};
use crate::types::{CommandAck, CommandPayload, Sample};

/// Opaque identifier for one discoverable sensor service instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle {
    pub instance_id: u16,
}

impl fmt::Display for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance {}", self.instance_id)
    }
}

/// Eviction policy for the inbound sample cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CachePolicy {
    /// Retain only the newest N samples; drop the oldest when full.
    KeepNewest,
}

/// Callback invoked when service availability changes.
///
/// Receives the currently available instance handles. Must be cheap: it runs
/// on the transport's dispatch context.
pub type AvailabilityCallback = Box<dyn FnMut(&[InstanceHandle]) + Send>;

/// Callback invoked when new inbound samples are ready to drain.
pub type ReceiveHandler = Box<dyn Fn() + Send + Sync>;

/// Discovery side of the service-communication runtime.
pub trait ServiceDiscovery: Send + Sync + 'static {
    /// Register `callback` for availability notifications, requesting at least
    /// `min_instances` handles per notification.
    fn start_find_service(
        &self,
        callback: AvailabilityCallback,
        min_instances: usize,
    ) -> Result<()>;

    /// Construct a connection to one discovered instance.
    fn connect(&self, handle: &InstanceHandle) -> Result<Arc<dyn SensorConnection>>;
}

/// One bound connection to a sensor service instance.
///
/// Couples the inbound event channel (subscribe / receive handler / cached
/// samples) with the outbound request/response method.
pub trait SensorConnection: Send + Sync + 'static {
    /// The instance this connection is bound to.
    fn instance(&self) -> InstanceHandle;

    /// Subscribe the inbound frame event with a bounded cache.
    fn subscribe(&self, policy: CachePolicy, capacity: usize) -> Result<()>;

    /// Install the data-ready callback. Replaces any previous handler.
    fn set_receive_handler(&self, handler: ReceiveHandler);

    /// Refresh the event cache from the transport.
    fn update(&self);

    /// Atomically remove and return all cached samples, oldest first.
    fn take_cached_samples(&self) -> Vec<Sample>;

    /// Release per-pass event resources after a drain.
    fn cleanup(&self);

    /// Submit a write command. Non-blocking: immediately yields a pending
    /// reply handle.
    fn submit(&self, payload: CommandPayload) -> Result<PendingReply>;
}

impl fmt::Debug for dyn SensorConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorConnection").field("instance", &self.instance()).finish()
    }
}

/// Pending acknowledgement for one submitted command.
#[derive(Debug)]
pub struct PendingReply {
    seq: u32,
    rx: oneshot::Receiver<CommandAck>,
}

impl PendingReply {
    /// Pair a reply handle with the sender the transport resolves it through.
    pub fn channel(seq: u32) -> (oneshot::Sender<CommandAck>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { seq, rx })
    }

    /// Sequence number of the command this reply belongs to.
    pub fn seq(&self) -> u32 {
        self.seq
    }

    /// Wait for the acknowledgement, bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// - [`SensorError::CommandTimeout`] if no reply arrives in time
    /// - [`SensorError::ReplyDropped`] if the transport dropped the reply
    ///   channel without answering
    pub async fn wait(self, timeout: Duration) -> Result<CommandAck> {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(Ok(ack)) => Ok(ack),
            Ok(Err(_)) => Err(SensorError::ReplyDropped { seq: self.seq }),
            Err(_) => Err(SensorError::CommandTimeout { seq: self.seq, timeout }),
        }
    }
}
