use thiserror::Error as ThisError;

/// Failures reported by the pool controller client.
///
/// The refresh path treats every variant the same way: the fetch failed and
/// all tracked accessories become faulted.
#[derive(ThisError, Debug)]
pub enum ControllerError {
    #[error("Connection to pool controller failed: {0}")]
    Connection(String),

    #[error("Pool controller timed out: {0}")]
    Timeout(String),

    #[error("Pool controller protocol error: {0}")]
    Protocol(String),

    #[error("Status fetch ended without delivering a result")]
    Interrupted,
}

#[derive(ThisError, Debug)]
pub enum BridgeError {
    #[error("Unable to get pool config: {0}")]
    Discovery(#[source] ControllerError),

    #[error(transparent)]
    Controller(#[from] ControllerError),

    #[error("Accessory not found: {0}")]
    AccessoryNotFound(String),

    #[error("Accessory is read-only: {0}")]
    ReadOnlyAccessory(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
