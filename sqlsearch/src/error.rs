use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Compile error: {0}")]
    Compile(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Row shape error: {0}")]
    RowShape(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Invalid index name: {0}")]
    InvalidIndexName(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of [`Error`], for callers mapping errors to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Decode,
    Compile,
    Format,
    RowShape,
    Storage,
    IndexNotFound,
    InvalidIndexName,
    Template,
    Config,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(_) => ErrorKind::Decode,
            Self::Compile(_) => ErrorKind::Compile,
            Self::Format(_) => ErrorKind::Format,
            Self::RowShape(_) => ErrorKind::RowShape,
            Self::Storage(_) => ErrorKind::Storage,
            Self::IndexNotFound(_) => ErrorKind::IndexNotFound,
            Self::InvalidIndexName(_) => ErrorKind::InvalidIndexName,
            Self::Template(_) => ErrorKind::Template,
            Self::Config(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Self::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
