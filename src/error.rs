use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmqError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("filter is full ({capacity} slots in use)")]
    FilterFull { capacity: usize },
}

impl AmqError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        AmqError::InvalidArgument(message.into())
    }
}

pub type Result<T> = std::result::Result<T, AmqError>;
