//! Inbound sample type.

use std::sync::Arc;
use std::time::Instant;

/// One raw inbound frame as delivered by the transport.
///
/// This is the fundamental inbound unit: a byte buffer plus the metadata the
/// transport attaches on arrival. The cache owns a sample until a drain pass
/// consumes it; the decoder only borrows the buffer and never retains it.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Raw frame bytes (zero-copy via Arc).
    pub data: Arc<[u8]>,

    /// How many leading bytes of `data` the transport actually filled.
    pub valid_len: usize,

    /// Monotonically increasing arrival sequence number.
    pub seq: u64,

    /// When the transport received the frame.
    pub received_at: Instant,
}

impl Sample {
    /// Create a sample stamped with the current time.
    pub fn new(data: Vec<u8>, valid_len: usize, seq: u64) -> Self {
        debug_assert!(valid_len <= data.len(), "valid_len must not exceed the buffer");
        Self { data: data.into(), valid_len, seq, received_at: Instant::now() }
    }

    /// The trusted portion of the buffer.
    pub fn valid_bytes(&self) -> &[u8] {
        &self.data[..self.valid_len.min(self.data.len())]
    }
}
