//! Periodic command/response cycle.
//!
//! Runs on its own tokio task for the life of the binding:
//!
//! ```text
//! Idle -> Sending -> AwaitingReply -> Succeeded -> (sleep period) -> Idle
//!                        |
//!                        +-> TimedOut -> Sending   (immediate retry)
//! ```
//!
//! Timeouts are recoverable and retried indefinitely at the fixed cadence with
//! no backoff. The only fatal start condition is a missing connection; other
//! submit/reply failures tolerate a bounded run of consecutive errors before
//! the task gives up. Cancellation is honored at every iteration boundary and
//! during both waits.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, trace, warn};

use crate::binding::ConnectionSlot;
use crate::config::CommandConfig;
use crate::error::SensorError;
use crate::types::PayloadGenerator;

/// Consecutive non-timeout failures tolerated before the cycle stops.
const MAX_ERRORS: u32 = 10;

/// The outbound half of the driver: builds a fresh payload each iteration,
/// submits it, and waits a bounded time for the acknowledgement.
pub struct CommandCycle {
    slot: Arc<ConnectionSlot>,
    config: CommandConfig,
    cancel: CancellationToken,
}

impl CommandCycle {
    pub fn new(slot: Arc<ConnectionSlot>, config: CommandConfig, cancel: CancellationToken) -> Self {
        Self { slot, config, cancel }
    }

    /// Run the cycle until cancelled.
    ///
    /// Returns `Err(SensorError::NotBound)` when started without a bound
    /// connection — fatal to this task only, the inbound path is unaffected.
    pub async fn run(self) -> Result<(), SensorError> {
        let Some(conn) = self.slot.get() else {
            error!("command cycle started without a bound connection");
            return Err(SensorError::NotBound);
        };

        let mut generator =
            PayloadGenerator::new(self.config.policy.clone(), self.config.payload_len, 0);
        let mut sent = 0u64;
        let mut acked = 0u64;
        let mut timeouts = 0u64;
        let mut error_count = 0u32;

        info!(
            period_ms = self.config.period.as_millis() as u64,
            timeout_ms = self.config.reply_timeout.as_millis() as u64,
            "command cycle started"
        );

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            // Idle -> Sending
            let payload = generator.next();
            let seq = payload.seq;
            trace!(seq, valid_len = payload.valid_len, "submitting command");

            let pending = match conn.submit(payload) {
                Ok(pending) => pending,
                Err(e) => {
                    error_count += 1;
                    warn!(seq, error = %e, "command submit failed ({error_count}/{MAX_ERRORS})");
                    if error_count >= MAX_ERRORS {
                        error!("too many consecutive command failures, stopping cycle");
                        return Err(e);
                    }
                    if self.sleep_period().await.is_err() {
                        break;
                    }
                    continue;
                }
            };
            sent += 1;

            // Sending -> AwaitingReply
            let result = tokio::select! {
                _ = self.cancel.cancelled() => break,
                result = pending.wait(self.config.reply_timeout) => result,
            };

            match result {
                // AwaitingReply -> Succeeded
                Ok(ack) => {
                    acked += 1;
                    error_count = 0;
                    info!(seq, code = ack.code, "command acknowledged");
                    if self.sleep_period().await.is_err() {
                        break;
                    }
                }
                // AwaitingReply -> TimedOut: re-enter the send path right
                // away; the reply wait itself provided the pacing.
                Err(SensorError::CommandTimeout { .. }) => {
                    timeouts += 1;
                    warn!(
                        seq,
                        timeout_ms = self.config.reply_timeout.as_millis() as u64,
                        "command reply timed out, retrying"
                    );
                }
                Err(e) => {
                    error_count += 1;
                    warn!(seq, error = %e, "command reply failed ({error_count}/{MAX_ERRORS})");
                    if error_count >= MAX_ERRORS {
                        error!("too many consecutive command failures, stopping cycle");
                        return Err(e);
                    }
                    if self.sleep_period().await.is_err() {
                        break;
                    }
                }
            }
        }

        info!(sent, acked, timeouts, "command cycle stopped");
        Ok(())
    }

    /// Inter-iteration sleep, interruptible by cancellation.
    async fn sleep_period(&self) -> Result<(), ()> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(()),
            _ = tokio::time::sleep(self.config.period) => Ok(()),
        }
    }
}
