use thiserror::Error;

/// Failures that end a scan. `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("Please enter a token contract address")]
    EmptyAddress,

    #[error("Invalid Solana address format")]
    InvalidAddress,

    /// The request never produced a response.
    #[error("{0}")]
    Transport(String),

    /// The server answered with an error message.
    #[error("{0}")]
    Server(String),

    #[error("{0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ScanError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ScanError::Transport("Request timed out".into())
        } else if e.is_connect() {
            ScanError::Transport(format!("Could not reach scanner service: {e}"))
        } else {
            ScanError::Transport(e.to_string())
        }
    }
}
