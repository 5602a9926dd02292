use thiserror::Error;

/// Top-level error type for configuration and server startup.
///
/// Upstream model failures stay inside the chat crate as `ChatError`; they
/// never stop the server.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ZenError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server error: {0}")]
    Server(String),
}

impl From<toml::de::Error> for ZenError {
    fn from(err: toml::de::Error) -> Self {
        ZenError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ZenError {
    fn from(err: toml::ser::Error) -> Self {
        ZenError::Config(err.to_string())
    }
}

/// A specialized `Result` type for Zen operations.
pub type Result<T> = std::result::Result<T, ZenError>;
