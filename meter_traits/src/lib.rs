pub mod clock;

pub use clock::{Clock, MonotonicClock};

use std::time::Duration;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of one radio event-pump round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpEvent {
    /// Nothing pending; the pump slept out its budget.
    Idle,
    /// The session signalled downlink activity; `receive` may yield a frame.
    Activity,
}

/// Analog-to-digital converter servicing one multiplexed input at a time.
///
/// `select_channel` switches the active input; subsequent `read` calls
/// return raw conversions from that channel as fast as the converter allows.
pub trait Adc {
    fn select_channel(&mut self, channel: u8) -> Result<(), BoxError>;
    fn read(&mut self) -> Result<u16, BoxError>;
}

/// Opaque wide-area radio session (join handshake and frame transport live
/// behind this seam; the core only schedules against it).
pub trait Radio {
    fn join(&mut self) -> Result<(), BoxError>;
    fn is_joined(&self) -> bool;
    /// Non-blocking event pump; must return promptly.
    fn process(&mut self) -> Result<(), BoxError>;
    /// Event pump that may block up to `timeout`. The timeout doubles as the
    /// scheduler tick budget.
    fn process_with_timeout(&mut self, timeout: Duration) -> Result<PumpEvent, BoxError>;
    fn send_unconfirmed(&mut self, payload: &[u8], priority: u8) -> Result<(), BoxError>;
    /// Drain one pending downlink frame into `buf`. Returns the frame length
    /// and port, or `None` when nothing is pending.
    fn receive(&mut self, buf: &mut [u8]) -> Result<Option<(usize, u8)>, BoxError>;
}

/// Opaque text display canvas.
pub trait Canvas {
    fn clear(&mut self);
    fn draw_text(&mut self, text: &str, x: u8, y: u8);
    fn flush(&mut self) -> Result<(), BoxError>;
}
