//! Application-wide error types.
//!
//! Backend transport failures are deliberately absent here: they are absorbed
//! at the adapter boundary and become safe error-text answers instead of
//! propagating (see `backends`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    /// Input rejected before any backend call. The message is surfaced to the
    /// caller verbatim as a refusal.
    #[error("{0}")]
    Validation(String),

    #[error("comms error: {0}")]
    Comms(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
