use thiserror::Error;

/// Result type for gatekeeper operations
pub type Result<T> = std::result::Result<T, GatekeeperError>;

/// Gatekeeper error types
///
/// Admission decisions themselves never fail; these errors only surface while
/// loading configuration or starting the server.
#[derive(Error, Debug)]
pub enum GatekeeperError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
