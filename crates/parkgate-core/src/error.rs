use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Addressing errors
    #[error("Invalid channel: {0}")]
    InvalidChannel(String),

    #[error("Invalid relay endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Invalid channel vector: {0}")]
    InvalidChannelVector(String),

    #[error("Invalid gate action: {0}")]
    InvalidAction(String),

    // Billing errors
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
