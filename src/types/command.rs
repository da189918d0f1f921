//! Outbound command types and payload generation.

use serde::{Deserialize, Serialize};

/// Default length of the command data buffer.
pub const COMMAND_DATA_LEN: usize = 128;

/// One outbound write request.
///
/// Built fresh each command-cycle iteration and superseded by the next; no
/// history is retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPayload {
    /// Strictly increasing command sequence number.
    pub seq: u32,
    /// How many leading bytes of `data` are meaningful.
    pub valid_len: usize,
    /// Fixed-size data buffer.
    pub data: Vec<u8>,
}

/// Acknowledgement reported by the sensor for one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandAck {
    /// Sequence number of the acknowledged command.
    pub seq: u32,
    /// Sensor-side result code (0 = accepted).
    pub code: u8,
}

/// How successive command payloads evolve.
///
/// The sensor distinguishes repeated writes by content, so payloads must
/// advance deterministically between iterations. Whether a real checksum
/// belongs in the data is sensor-firmware specific; the policy hook keeps that
/// decision out of the cycle itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadPolicy {
    /// Start from `0, 1, 2, ..` and increment every byte (wrapping) each
    /// iteration. Matches the sensor vendor's loopback test pattern.
    RollingCounter,
    /// Send the same bytes every iteration.
    Fixed(Vec<u8>),
}

impl Default for PayloadPolicy {
    fn default() -> Self {
        PayloadPolicy::RollingCounter
    }
}

/// Produces the payload for each command-cycle iteration.
#[derive(Debug)]
pub struct PayloadGenerator {
    data: Vec<u8>,
    rolling: bool,
    seq: u32,
    valid_len: usize,
}

impl PayloadGenerator {
    /// Build a generator for `len`-byte payloads starting at `initial_seq`.
    pub fn new(policy: PayloadPolicy, len: usize, initial_seq: u32) -> Self {
        let (data, rolling) = match policy {
            PayloadPolicy::RollingCounter => {
                ((0..len).map(|i| i as u8).collect::<Vec<u8>>(), true)
            }
            PayloadPolicy::Fixed(mut bytes) => {
                bytes.resize(len, 0);
                (bytes, false)
            }
        };
        Self { data, rolling, seq: initial_seq, valid_len: len }
    }

    /// Next payload: sequence number advances, content per policy.
    pub fn next(&mut self) -> CommandPayload {
        self.seq = self.seq.wrapping_add(1);
        if self.rolling {
            for byte in &mut self.data {
                *byte = byte.wrapping_add(1);
            }
        }
        CommandPayload { seq: self.seq, valid_len: self.valid_len, data: self.data.clone() }
    }
}
