//! Error types for the sensor driver.
//!
//! Two layers of errors exist:
//!
//! - [`DecodeError`] — frame-level failures produced by the byte decoder.
//!   These are cheap, copyable values reported per sample; a bad frame never
//!   aborts a drain pass.
//! - [`SensorError`] — driver-level failures (discovery, connection,
//!   subscription, command acknowledgement). All errors implement
//!   `std::error::Error` and carry structured context.
//!
//! ## Recovery and retry
//!
//! Errors classify themselves via [`SensorError::is_retryable`]:
//!
//! ```rust
//! use navlink::SensorError;
//! use std::time::Duration;
//!
//! let error = SensorError::CommandTimeout { seq: 7, timeout: Duration::from_millis(500) };
//! assert!(error.is_retryable());
//! ```

use std::time::Duration;
use thiserror::Error;

/// Result type alias for driver operations.
pub type Result<T, E = SensorError> = std::result::Result<T, E>;

/// Frame-level decode failure.
///
/// Identifies which validation check rejected the buffer. The decoder returns
/// these instead of panicking on malformed input.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The declared valid length exceeds the buffer, or is too short to hold
    /// the minimum frame header.
    #[error("buffer truncated: valid length {valid_len}, buffer length {buffer_len}")]
    Truncated { valid_len: usize, buffer_len: usize },

    /// The first three bytes do not match the frame sync marker.
    #[error("sync marker mismatch: found {found:02x?}, expected [aa, 44, 12]")]
    BadSync { found: [u8; 3] },

    /// `header_len` lies outside `[MIN_HEADER_LEN, valid_len]`.
    #[error("header length {header_len} outside valid range (min {min}, valid length {valid_len})")]
    HeaderOutOfRange { header_len: usize, min: usize, valid_len: usize },

    /// The position record would extend past the valid region of the buffer.
    #[error("payload needs {needed} bytes but only {valid_len} are valid")]
    PayloadOutOfRange { needed: usize, valid_len: usize },
}

/// Main error type for driver operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SensorError {
    #[error("frame decode failed")]
    Decode {
        #[from]
        source: DecodeError,
    },

    #[error("service discovery failed: {reason}")]
    Discovery {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("failed to connect to sensor instance {instance_id}: {reason}")]
    Connection { instance_id: u16, reason: String },

    #[error("subscription failed: {reason}")]
    Subscribe { reason: String },

    #[error("no sensor connection bound")]
    NotBound,

    #[error("command {seq} timed out after {timeout:?}")]
    CommandTimeout { seq: u32, timeout: Duration },

    #[error("reply channel closed before command {seq} was acknowledged")]
    ReplyDropped { seq: u32 },

    #[error("no tokio runtime available: {context}")]
    Runtime { context: String },
}

impl SensorError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            SensorError::CommandTimeout { .. } => true,
            SensorError::Connection { .. } => true,
            SensorError::ReplyDropped { .. } => true,
            SensorError::Decode { .. } => false,
            SensorError::Discovery { .. } => false,
            SensorError::Subscribe { .. } => false,
            SensorError::NotBound => false,
            SensorError::Runtime { .. } => false,
        }
    }

    /// Helper constructor for discovery errors.
    pub fn discovery_failed(reason: impl Into<String>) -> Self {
        SensorError::Discovery { reason: reason.into(), source: None }
    }

    /// Helper constructor for discovery errors with a source.
    pub fn discovery_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        SensorError::Discovery { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for connection errors.
    pub fn connection_failed(instance_id: u16, reason: impl Into<String>) -> Self {
        SensorError::Connection { instance_id, reason: reason.into() }
    }

    /// Helper constructor for subscription errors.
    pub fn subscribe_failed(reason: impl Into<String>) -> Self {
        SensorError::Subscribe { reason: reason.into() }
    }
}
