use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Connection error: {0}")]
    ConnectionError(String),
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Transfer error: {0}")]
    TransferError(String),
    #[error("Not a directory: {0}")]
    NotADirectory(String),
    #[error("Socket Error: {0}")]
    SocketError(#[from] std::io::Error),
}

impl From<russh::Error> for Error {
    fn from(err: russh::Error) -> Self {
        Error::ConnectionError(err.to_string())
    }
}

impl From<russh_sftp::client::error::Error> for Error {
    fn from(err: russh_sftp::client::error::Error) -> Self {
        Error::TransferError(err.to_string())
    }
}

/// A custom `Result` type for transfer operations.
pub type Result<T> = std::result::Result<T, Error>;
