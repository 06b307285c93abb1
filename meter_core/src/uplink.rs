//! Rate-limited uplink scheduling.

use crate::report::MeteringReport;
use meter_config::{PayloadMode, UplinkCfg};
use meter_traits::Radio;

/// Gates report transmission against a monotonic millisecond clock and
/// serializes reports into the configured payload encoding.
///
/// At most one attempt per interval, fire-and-forget: a rejected send is
/// logged and the next eligible tick tries again with a fresh report. There
/// is no payload queue and no retry backoff.
#[derive(Debug)]
pub struct UplinkScheduler {
    interval_ms: u64,
    priority: u8,
    mode: PayloadMode,
    /// Millisecond timestamp of the last attempt. Starts at 0, so the first
    /// send happens one full interval after the loop epoch (reference
    /// behavior).
    last_sent_ms: u64,
}

impl UplinkScheduler {
    pub fn new(cfg: &UplinkCfg) -> Self {
        Self {
            interval_ms: cfg.interval_ms,
            priority: cfg.priority,
            mode: cfg.payload,
            last_sent_ms: 0,
        }
    }

    /// Whether a transmission is due at `now_ms`. Strict inequality: exactly
    /// `interval_ms` after the previous attempt is still too early.
    pub fn due(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_sent_ms) > self.interval_ms
    }

    /// Timestamp of the last attempt (successful or not).
    pub fn last_sent_ms(&self) -> u64 {
        self.last_sent_ms
    }

    fn encode(&self, report: &MeteringReport) -> Vec<u8> {
        match self.mode {
            PayloadMode::Binary => report.to_binary().to_vec(),
            PayloadMode::Text => report.to_text().into_bytes(),
        }
    }

    /// Attempt a transmission if one is due. Returns whether an attempt was
    /// made; the timer advances on every attempt, success or failure, so a
    /// rejected frame is not retried within its interval.
    pub fn maybe_send<R: Radio>(
        &mut self,
        radio: &mut R,
        report: &MeteringReport,
        now_ms: u64,
    ) -> bool {
        if !self.due(now_ms) {
            return false;
        }
        let payload = self.encode(report);
        match radio.send_unconfirmed(&payload, self.priority) {
            Ok(()) => {
                tracing::info!(bytes = payload.len(), now_ms, "uplink sent");
            }
            Err(e) => {
                tracing::warn!(error = %e, now_ms, "uplink send failed");
            }
        }
        self.last_sent_ms = now_ms;
        true
    }
}
