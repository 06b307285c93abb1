use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum MeterError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("radio session not joined")]
    NotJoined,
    #[error("join attempts exhausted after {0} pump rounds")]
    JoinTimeout(u32),
    #[error("malformed payload: expected {expected} bytes, got {got}")]
    Payload { expected: usize, got: usize },
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("sample window must be > 0")]
    EmptyWindow,
    #[error("adc bit depth must be in 1..=31")]
    BitDepth,
    #[error("adc channels must be distinct")]
    ChannelClash,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

/// Map a boxed hardware error into a typed `MeterError`, downcasting the
/// concrete `HwError` when the `hardware-errors` feature is enabled.
pub(crate) fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> MeterError {
    #[cfg(feature = "hardware-errors")]
    if let Some(hw) = e.downcast_ref::<meter_hardware::error::HwError>() {
        return match hw {
            meter_hardware::error::HwError::NotJoined => MeterError::NotJoined,
            other => MeterError::Hardware(other.to_string()),
        };
    }
    MeterError::Hardware(e.to_string())
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
