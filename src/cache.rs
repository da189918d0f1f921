//! Bounded keep-newest sample cache.
//!
//! Single-writer (transport) / single-reader (drain) buffer between frame
//! arrival and decoding. Once `capacity` samples are resident, admitting a new
//! sample silently evicts the oldest undrained one — this is the driver's only
//! overload-handling mechanism, there is no end-to-end flow control.
//!
//! [`SampleCache::take_snapshot`] removes everything currently resident in one
//! atomic step, so a drain pass and concurrent appends never conflate: samples
//! arriving mid-drain simply wait for the next pass.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::types::Sample;

/// Bounded buffer holding undrained inbound samples.
#[derive(Debug)]
pub struct SampleCache {
    inner: Mutex<VecDeque<Sample>>,
    capacity: usize,
}

impl SampleCache {
    /// Create a cache retaining at most `capacity` samples (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { inner: Mutex::new(VecDeque::with_capacity(capacity)), capacity }
    }

    /// Admit a sample, evicting the oldest resident one when full.
    pub fn push(&self, sample: Sample) {
        let mut inner = self.lock();
        if inner.len() == self.capacity {
            if let Some(evicted) = inner.pop_front() {
                debug!(seq = evicted.seq, "cache full, dropping oldest undrained sample");
            }
        }
        inner.push_back(sample);
    }

    /// Remove and return every resident sample, oldest first.
    pub fn take_snapshot(&self) -> Vec<Sample> {
        self.lock().drain(..).collect()
    }

    /// Number of undrained samples.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when no samples are resident.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Configured retention bound.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Sample>> {
        // A poisoned cache still holds valid samples; keep serving them.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn sample(seq: u64) -> Sample {
        Sample::new(vec![0; 8], 8, seq)
    }

    #[test]
    fn keeps_newest_when_full() {
        let cache = SampleCache::new(3);
        for seq in 0..5 {
            cache.push(sample(seq));
        }

        let seqs: Vec<u64> = cache.take_snapshot().iter().map(|s| s.seq).collect();
        assert_eq!(seqs, vec![2, 3, 4]);
    }

    #[test]
    fn snapshot_drains_in_arrival_order_and_empties() {
        let cache = SampleCache::new(8);
        for seq in 10..13 {
            cache.push(sample(seq));
        }

        let snapshot = cache.take_snapshot();
        assert_eq!(snapshot.len(), 3);
        assert!(snapshot.windows(2).all(|w| w[0].seq < w[1].seq));
        assert!(cache.is_empty());
        assert!(cache.take_snapshot().is_empty());
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let cache = SampleCache::new(0);
        cache.push(sample(1));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn appends_during_drain_land_in_next_snapshot() {
        let cache = Arc::new(SampleCache::new(16));
        cache.push(sample(0));

        let first = cache.take_snapshot();
        // Writer appends after the snapshot was taken.
        cache.push(sample(1));

        assert_eq!(first.len(), 1);
        assert_eq!(first[0].seq, 0);
        let second = cache.take_snapshot();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].seq, 1);
    }

    #[test]
    fn concurrent_writers_never_exceed_capacity() {
        let cache = Arc::new(SampleCache::new(4));
        let mut handles = Vec::new();
        for t in 0..4u64 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                for i in 0..100 {
                    cache.push(Sample::new(vec![0; 4], 4, t * 1000 + i));
                }
            }));
        }
        for handle in handles {
            handle.join().expect("writer thread");
        }
        assert!(cache.len() <= 4);
    }
}
