use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Argument error: {0}")]
    ArgumentError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("Session error: {0}")]
    Session(#[from] xferrc::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
