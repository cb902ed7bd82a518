use bq_common::error::CommonError;
use thiserror::Error;

pub type DriverResult<T> = Result<T, DriverError>;

#[derive(Debug, Error)]
pub enum DriverError {
    /// The reroute sentinel was used without a well-formed nested payload
    /// or without a schema adaptor in the execution context.
    #[error("reroute protocol violation: {0}")]
    RerouteProtocolViolation(String),
    /// A failure reported by the warehouse query source.
    #[error("execution error: {0}")]
    ExecutionError(String),
    /// A column adaptor rejected a value.
    #[error("conversion error: {0}")]
    ConversionError(String),
    #[error("error in JSON serde: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("missing argument: {0}")]
    MissingArgument(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not supported: {0}")]
    NotSupported(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl DriverError {
    pub fn reroute(message: impl Into<String>) -> Self {
        DriverError::RerouteProtocolViolation(message.into())
    }

    pub fn execution(message: impl Into<String>) -> Self {
        DriverError::ExecutionError(message.into())
    }

    pub fn conversion(message: impl Into<String>) -> Self {
        DriverError::ConversionError(message.into())
    }

    pub fn missing(message: impl Into<String>) -> Self {
        DriverError::MissingArgument(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        DriverError::InvalidArgument(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        DriverError::NotSupported(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        DriverError::InternalError(message.into())
    }
}

impl From<CommonError> for DriverError {
    fn from(error: CommonError) -> Self {
        match error {
            CommonError::MissingArgument(message) => DriverError::MissingArgument(message),
            CommonError::InvalidArgument(message) => DriverError::InvalidArgument(message),
            CommonError::NotSupported(message) => DriverError::NotSupported(message),
            CommonError::InternalError(message) => DriverError::InternalError(message),
        }
    }
}
