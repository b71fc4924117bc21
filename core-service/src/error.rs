use bridge_traits::CallError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Bridge setup failed: {0}")]
    Setup(#[from] core_runtime::Error),

    #[error("Call failed: {0}")]
    Call(#[from] CallError),

    #[error("Class error: {0}")]
    Class(#[from] core_enhance::EnhanceError),

    #[error("Enhancements are disabled; enable them with .enable_enhancements(true)")]
    EnhancementsDisabled,
}

pub type Result<T> = std::result::Result<T, ServiceError>;
