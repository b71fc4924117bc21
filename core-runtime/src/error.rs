use bridge_traits::SdkError;
use thiserror::Error;

/// Setup-time failures. None of these are routed through interceptors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("{entity} does not exist, patching failed!")]
    MissingEntity { entity: String },

    #[error("{target}.{method} does not exist, patching failed!")]
    MissingMethod { target: String, method: String },

    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("SDK initialization failed: {0}")]
    Initialization(#[from] SdkError),
}

pub type Result<T> = std::result::Result<T, Error>;
