//! Consume-once draining of the inbound sample cache.
//!
//! A drain pass snapshots whatever samples are resident, decodes each one, and
//! reports every outcome — success or failure — to the [`ReportSink`]. The
//! snapshot is what makes the pass exactly-once: samples arriving while a pass
//! runs stay cached for the next pass, and nothing is decoded twice.
//!
//! A decode failure is reported and skipped; it never aborts the pass. A cache
//! that was partially overwritten between arrival and drain (fewer samples,
//! gaps or repeats in sequence numbers) is legal and at most worth a log line.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, trace};

use crate::error::DecodeError;
use crate::frame::{self, PositionReport};
use crate::transport::SensorConnection;
use crate::types::Sample;

/// One decode outcome from a drain pass.
#[derive(Debug, Clone)]
pub enum DrainOutcome {
    /// The sample decoded into a position report.
    Decoded { seq: u64, report: Arc<PositionReport> },
    /// The sample was malformed; the error says which check rejected it.
    Failed { seq: u64, error: DecodeError },
}

impl DrainOutcome {
    /// Arrival sequence number of the sample this outcome belongs to.
    pub fn seq(&self) -> u64 {
        match self {
            DrainOutcome::Decoded { seq, .. } | DrainOutcome::Failed { seq, .. } => *seq,
        }
    }
}

/// Receiver for drain outcomes.
///
/// The driver installs a sink that logs and publishes decoded reports; tests
/// install counting sinks.
pub trait ReportSink: Send + Sync {
    fn report(&self, outcome: DrainOutcome);
}

/// Decode the samples of one snapshot, oldest first.
///
/// The returned iterator is lazy, finite, and single-pass — each sample is
/// consumed as its outcome is produced.
pub fn outcomes(samples: Vec<Sample>) -> impl Iterator<Item = DrainOutcome> {
    samples.into_iter().map(|sample| {
        match frame::decode(&sample.data, sample.valid_len) {
            Ok(report) => DrainOutcome::Decoded { seq: sample.seq, report: Arc::new(report) },
            Err(error) => DrainOutcome::Failed { seq: sample.seq, error },
        }
    })
}

/// Drives drain passes over a connection's inbound event cache.
#[derive(Debug)]
pub struct EventDrain {
    in_progress: AtomicBool,
    last_seq: Mutex<Option<u64>>,
}

impl EventDrain {
    pub fn new() -> Self {
        Self { in_progress: AtomicBool::new(false), last_seq: Mutex::new(None) }
    }

    /// Run one drain pass: update, snapshot, decode and report, clean up.
    ///
    /// Re-entrant calls are logged no-ops — a pass already covers every sample
    /// resident at its start, and later arrivals belong to the next pass.
    pub fn run(&self, conn: &dyn SensorConnection, sink: &dyn ReportSink) {
        if self.in_progress.swap(true, Ordering::Acquire) {
            debug!("drain pass already in progress, skipping");
            return;
        }

        conn.update();
        let samples = conn.take_cached_samples();
        trace!(count = samples.len(), "draining inbound sample cache");

        self.note_sequence_anomalies(&samples);
        for outcome in outcomes(samples) {
            sink.report(outcome);
        }

        conn.cleanup();
        self.in_progress.store(false, Ordering::Release);
    }

    /// Duplicate or regressed sequence numbers indicate cache overwrites
    /// between arrival and drain. Informational only.
    fn note_sequence_anomalies(&self, samples: &[Sample]) {
        let mut last_seq = self.last_seq.lock().unwrap_or_else(|e| e.into_inner());
        for sample in samples {
            if let Some(last) = *last_seq {
                if sample.seq <= last {
                    debug!(seq = sample.seq, last, "non-monotonic sample sequence in cache");
                }
            }
            *last_seq = Some(sample.seq);
        }
    }
}

impl Default for EventDrain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{encode_frame, FrameHeader, PositionRecord, MIN_HEADER_LEN, RECORD_LEN};
    use crate::transport::mock::MockSensor;
    use crate::transport::{CachePolicy, SensorConnection};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct CollectingSink {
        outcomes: Mutex<Vec<DrainOutcome>>,
    }

    impl ReportSink for CollectingSink {
        fn report(&self, outcome: DrainOutcome) {
            self.outcomes.lock().unwrap().push(outcome);
        }
    }

    fn valid_frame() -> Vec<u8> {
        let header = FrameHeader {
            header_len: MIN_HEADER_LEN as u8,
            msg_id: 42,
            msg_type: 0,
            msg_len: 72,
            idle_time: 0,
            quality: 0,
            week: 2300,
            ms_of_week: 1000,
            diff_age_sec: 0,
        };
        let record = PositionRecord {
            sol_status: 0,
            pos_type: 16,
            lat_deg: 1.0,
            lon_deg: 2.0,
            height_m: 3.0,
            undulation: 0.0,
            datum_id: 61,
            lat_std: 0.1,
            lon_std: 0.1,
            height_std: 0.2,
            station_id: [0; 4],
            diff_age_s: 0.0,
            sol_age_s: 0.0,
            sats_tracked: 9,
            sats_in_solution: 8,
            ext_sol_status: 0,
            galileo_mask: 0,
            signal_mask: 0,
            checksum: 0,
        };
        encode_frame(&header, &record)
    }

    fn subscribed_sensor(capacity: usize) -> Arc<MockSensor> {
        let sensor = MockSensor::new(1);
        sensor.subscribe(CachePolicy::KeepNewest, capacity).expect("subscribe");
        sensor
    }

    #[test]
    fn drains_each_sample_exactly_once() {
        let sensor = subscribed_sensor(8);
        for _ in 0..3 {
            let frame = valid_frame();
            let len = frame.len();
            sensor.push_frame(frame, len);
        }

        let drain = EventDrain::new();
        let sink = CollectingSink::default();
        drain.run(sensor.as_ref(), &sink);

        assert_eq!(sink.outcomes.lock().unwrap().len(), 3);
        assert!(sensor.take_cached_samples().is_empty());

        // Second pass over an empty cache reports nothing further.
        drain.run(sensor.as_ref(), &sink);
        assert_eq!(sink.outcomes.lock().unwrap().len(), 3);
    }

    #[test]
    fn bad_sample_is_reported_and_pass_continues() {
        let sensor = subscribed_sensor(8);

        let frame = valid_frame();
        let len = frame.len();
        sensor.push_frame(frame.clone(), len);
        sensor.push_frame(vec![0xFF; 16], 16); // garbage
        sensor.push_frame(frame, len);

        let drain = EventDrain::new();
        let sink = CollectingSink::default();
        drain.run(sensor.as_ref(), &sink);

        let outcomes = sink.outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 3);
        assert!(matches!(outcomes[0], DrainOutcome::Decoded { .. }));
        assert!(matches!(outcomes[1], DrainOutcome::Failed { .. }));
        assert!(matches!(outcomes[2], DrainOutcome::Decoded { .. }));
    }

    #[test]
    fn truncated_sample_fails_with_payload_bounds() {
        let sensor = subscribed_sensor(8);
        let frame = valid_frame();
        sensor.push_frame(frame, MIN_HEADER_LEN + 10); // valid header, short payload

        let sink = CollectingSink::default();
        EventDrain::new().run(sensor.as_ref(), &sink);

        let outcomes = sink.outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            DrainOutcome::Failed { error, .. } => assert_eq!(
                *error,
                DecodeError::PayloadOutOfRange {
                    needed: MIN_HEADER_LEN + RECORD_LEN,
                    valid_len: MIN_HEADER_LEN + 10,
                }
            ),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn overflowed_cache_drains_only_survivors() {
        let sensor = subscribed_sensor(2);
        for _ in 0..5 {
            let frame = valid_frame();
            let len = frame.len();
            sensor.push_frame(frame, len);
        }

        let sink = CollectingSink::default();
        EventDrain::new().run(sensor.as_ref(), &sink);

        let outcomes = sink.outcomes.lock().unwrap();
        // keep-newest-2: only the last two survive eviction
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].seq(), 3);
        assert_eq!(outcomes[1].seq(), 4);
    }

    #[test]
    fn outcomes_iterator_is_lazy_and_ordered() {
        let frame = valid_frame();
        let len = frame.len();
        let samples = vec![
            crate::types::Sample::new(frame.clone(), len, 7),
            crate::types::Sample::new(frame, len, 8),
        ];

        let mut iter = outcomes(samples);
        assert_eq!(iter.next().map(|o| o.seq()), Some(7));
        assert_eq!(iter.next().map(|o| o.seq()), Some(8));
        assert!(iter.next().is_none());
    }
}
