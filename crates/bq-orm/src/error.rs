use bq_driver::error::DriverError;
use thiserror::Error;

pub type OrmResult<T> = Result<T, OrmError>;

#[derive(Debug, Error)]
pub enum OrmError {
    #[error("error in driver: {0}")]
    DriverError(#[from] DriverError),
    #[error("missing argument: {0}")]
    MissingArgument(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl OrmError {
    pub fn missing(message: impl Into<String>) -> Self {
        OrmError::MissingArgument(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        OrmError::InvalidArgument(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        OrmError::InternalError(message.into())
    }
}
