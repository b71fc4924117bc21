use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnhanceError {
    #[error("Class name must not be empty")]
    EmptyClassName,

    #[error("{class}.prototype.{method} is not a function")]
    UnknownMethod { class: String, method: String },

    #[error("{method} expects an object of class {expected}, got {actual}")]
    WrongClass {
        method: String,
        expected: String,
        actual: String,
    },
}

pub type Result<T> = std::result::Result<T, EnhanceError>;
