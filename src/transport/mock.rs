//! In-memory transport for testing and demos.
//!
//! [`MockDiscovery`] and [`MockSensor`] implement the transport traits over
//! the crate's own [`SampleCache`], letting tests script availability
//! notifications, inject wire frames, and control acknowledgement behavior
//! without a real sensor.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::trace;

use super::{
    AvailabilityCallback, CachePolicy, InstanceHandle, PendingReply, ReceiveHandler,
    SensorConnection, ServiceDiscovery,
};
use crate::cache::SampleCache;
use crate::error::{Result, SensorError};
use crate::types::{CommandAck, CommandPayload, Sample};

/// How the mock sensor answers submitted commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckBehavior {
    /// Acknowledge immediately with this result code.
    Reply(u8),
    /// Acknowledge with the code after the delay elapses.
    ReplyAfter(Duration, u8),
    /// Never acknowledge; the pending reply stays unresolved forever.
    Never,
}

/// Scriptable discovery: registered sensors become connectable, and
/// [`MockDiscovery::announce`] drives the availability callback by hand.
#[derive(Default)]
pub struct MockDiscovery {
    callback: Mutex<Option<AvailabilityCallback>>,
    sensors: Mutex<HashMap<u16, Arc<MockSensor>>>,
    connects: AtomicUsize,
}

impl MockDiscovery {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make a sensor reachable through [`ServiceDiscovery::connect`].
    pub fn register(&self, sensor: Arc<MockSensor>) {
        lock(&self.sensors).insert(sensor.instance().instance_id, sensor);
    }

    /// Fire the availability callback with the given handles.
    ///
    /// May be called any number of times, with any handle set, mirroring a
    /// real discovery runtime.
    pub fn announce(&self, handles: &[InstanceHandle]) {
        if let Some(callback) = lock(&self.callback).as_mut() {
            callback(handles);
        }
    }

    /// How many connections have been constructed so far.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl ServiceDiscovery for MockDiscovery {
    fn start_find_service(
        &self,
        callback: AvailabilityCallback,
        _min_instances: usize,
    ) -> Result<()> {
        *lock(&self.callback) = Some(callback);
        Ok(())
    }

    fn connect(&self, handle: &InstanceHandle) -> Result<Arc<dyn SensorConnection>> {
        let sensor = lock(&self.sensors)
            .get(&handle.instance_id)
            .cloned()
            .ok_or_else(|| SensorError::connection_failed(handle.instance_id, "unknown instance"))?;
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(sensor)
    }
}

/// One scriptable sensor endpoint.
pub struct MockSensor {
    handle: InstanceHandle,
    cache: Mutex<Option<Arc<SampleCache>>>,
    handler: Mutex<Option<ReceiveHandler>>,
    ack: Mutex<AckBehavior>,
    submitted: Mutex<Vec<CommandPayload>>,
    // Senders parked here keep `Never` replies pending instead of dropped.
    parked: Mutex<Vec<tokio::sync::oneshot::Sender<CommandAck>>>,
    next_seq: AtomicU64,
}

impl MockSensor {
    pub fn new(instance_id: u16) -> Arc<Self> {
        Arc::new(Self {
            handle: InstanceHandle { instance_id },
            cache: Mutex::new(None),
            handler: Mutex::new(None),
            ack: Mutex::new(AckBehavior::Reply(0)),
            submitted: Mutex::new(Vec::new()),
            parked: Mutex::new(Vec::new()),
            next_seq: AtomicU64::new(0),
        })
    }

    /// Script how subsequent commands are acknowledged.
    pub fn set_ack(&self, behavior: AckBehavior) {
        *lock(&self.ack) = behavior;
    }

    /// Deliver one wire frame: cache it and fire the receive handler, exactly
    /// like a transport dispatch would.
    pub fn push_frame(&self, bytes: Vec<u8>, valid_len: usize) {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let sample = Sample::new(bytes, valid_len, seq);

        if let Some(cache) = lock(&self.cache).as_ref() {
            cache.push(sample);
        } else {
            trace!(seq, "frame dropped: no subscription yet");
            return;
        }

        if let Some(handler) = lock(&self.handler).as_ref() {
            handler();
        }
    }

    /// Commands submitted so far, in order.
    pub fn submitted(&self) -> Vec<CommandPayload> {
        lock(&self.submitted).clone()
    }

    /// Number of commands submitted so far.
    pub fn submitted_count(&self) -> usize {
        lock(&self.submitted).len()
    }

    /// Whether `subscribe` has been called.
    pub fn is_subscribed(&self) -> bool {
        lock(&self.cache).is_some()
    }
}

impl SensorConnection for MockSensor {
    fn instance(&self) -> InstanceHandle {
        self.handle
    }

    fn subscribe(&self, _policy: CachePolicy, capacity: usize) -> Result<()> {
        *lock(&self.cache) = Some(Arc::new(SampleCache::new(capacity)));
        Ok(())
    }

    fn set_receive_handler(&self, handler: ReceiveHandler) {
        *lock(&self.handler) = Some(handler);
    }

    fn update(&self) {}

    fn take_cached_samples(&self) -> Vec<Sample> {
        match lock(&self.cache).as_ref() {
            Some(cache) => cache.take_snapshot(),
            None => Vec::new(),
        }
    }

    fn cleanup(&self) {}

    fn submit(&self, payload: CommandPayload) -> Result<PendingReply> {
        let seq = payload.seq;
        lock(&self.submitted).push(payload);

        let (tx, reply) = PendingReply::channel(seq);
        match *lock(&self.ack) {
            AckBehavior::Reply(code) => {
                let _ = tx.send(CommandAck { seq, code });
            }
            AckBehavior::ReplyAfter(delay, code) => {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(CommandAck { seq, code });
                });
            }
            AckBehavior::Never => {
                lock(&self.parked).push(tx);
            }
        }
        Ok(reply)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
