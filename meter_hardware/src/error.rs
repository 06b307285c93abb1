use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("adc error: {0}")]
    Adc(String),
    #[error("radio error: {0}")]
    Radio(String),
    #[error("radio init failed: {0}")]
    InitFailed(String),
    #[error("radio session not joined")]
    NotJoined,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
