use thiserror::Error;

use setting_protocol::ProtocolError;

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;

/// Errors that can occur while constructing SDK handles
#[derive(Error, Debug)]
pub enum SdkError {
    /// The underlying synchronization protocol could not be started
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}
