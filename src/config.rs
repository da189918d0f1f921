//! Driver configuration.
//!
//! Plain data with sensible defaults; callers that want the stock sensor
//! behavior can use `DriverConfig::default()` untouched.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{PayloadPolicy, COMMAND_DATA_LEN};

/// Top-level driver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Inbound cache bound: keep the newest this-many undrained samples.
    pub cache_capacity: usize,

    /// Command cycle settings.
    pub command: CommandConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { cache_capacity: 8, command: CommandConfig::default() }
    }
}

/// Settings for the periodic command/response cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Pause between a successful acknowledgement and the next command.
    pub period: Duration,

    /// How long to wait for an acknowledgement before retrying.
    pub reply_timeout: Duration,

    /// Length of each command's data buffer.
    pub payload_len: usize,

    /// How payload content evolves between iterations.
    pub policy: PayloadPolicy,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(500),
            reply_timeout: Duration::from_millis(500),
            payload_len: COMMAND_DATA_LEN,
            policy: PayloadPolicy::default(),
        }
    }
}
