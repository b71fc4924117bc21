use thiserror::Error;

use crate::model::Receiver;

/// A rejection produced by the backend SDK.
///
/// `code` follows the SDK's numeric error catalogue; the most common codes are
/// exposed as associated constants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("SDK error {code}: {message}")]
pub struct SdkError {
    pub code: i32,
    pub message: String,
}

impl SdkError {
    pub const OTHER_CAUSE: i32 = -1;
    pub const INTERNAL_SERVER_ERROR: i32 = 1;
    pub const CONNECTION_FAILED: i32 = 100;
    pub const OBJECT_NOT_FOUND: i32 = 101;
    pub const INVALID_QUERY: i32 = 102;
    pub const INVALID_CLASS_NAME: i32 = 103;
    pub const MISSING_OBJECT_ID: i32 = 104;
    pub const INVALID_JSON: i32 = 107;
    pub const SCRIPT_FAILED: i32 = 141;
    pub const USERNAME_MISSING: i32 = 200;
    pub const PASSWORD_MISSING: i32 = 201;
    pub const USERNAME_TAKEN: i32 = 202;
    pub const EMAIL_NOT_FOUND: i32 = 205;
    pub const SESSION_MISSING: i32 = 206;
    pub const INVALID_SESSION_TOKEN: i32 = 209;

    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(Self::OTHER_CAUSE, message)
    }

    pub fn object_not_found(message: impl Into<String>) -> Self {
        Self::new(Self::OBJECT_NOT_FOUND, message)
    }

    /// A payload of the wrong shape reached a typed accessor.
    pub fn unexpected_payload(expected: &str, actual: &str) -> Self {
        Self::other(format!("expected {expected} payload, got {actual}"))
    }
}

/// A run-time failure of a bridged call, as seen by error interceptors and by
/// the original caller.
///
/// `object` is filled in by the error chain with the receiver of the failing
/// call so recovery handlers can retry against the source instance. It stays
/// `None` for rejections that never passed through the chain.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{error}")]
pub struct CallError {
    #[source]
    pub error: SdkError,
    pub object: Option<Receiver>,
}

impl CallError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        SdkError::new(code, message).into()
    }

    pub fn code(&self) -> i32 {
        self.error.code
    }

    pub fn message(&self) -> &str {
        &self.error.message
    }

    pub fn with_object(mut self, object: Receiver) -> Self {
        self.object = Some(object);
        self
    }
}

impl From<SdkError> for CallError {
    fn from(error: SdkError) -> Self {
        Self {
            error,
            object: None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SdkError>;

pub type CallResult<T> = std::result::Result<T, CallError>;
