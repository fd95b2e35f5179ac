use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Local storage unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::StoreUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
