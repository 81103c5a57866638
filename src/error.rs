use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Classification of an [`Error`], preserved through context wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Module, path, package or license is absent
    NotFound,
    /// Caller misuse
    InvalidArgument,
    /// The data source cannot serve this operation
    Unsupported,
    /// Unexpected failure
    Internal,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("{context}: {inner}")]
    Wrapped { context: String, inner: Box<Error> },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::Unsupported(_) => ErrorKind::Unsupported,
            Error::Internal(_) | Error::InvalidResponse(_) => ErrorKind::Internal,
            Error::Network(e) => match e.status() {
                Some(StatusCode::NOT_FOUND | StatusCode::GONE) => ErrorKind::NotFound,
                _ => ErrorKind::Internal,
            },
            Error::Database(rusqlite::Error::QueryReturnedNoRows) => ErrorKind::NotFound,
            Error::Database(_) | Error::Io(_) | Error::Timeout(_) => ErrorKind::Internal,
            Error::Wrapped { inner, .. } => inner.kind(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_unsupported(&self) -> bool {
        self.kind() == ErrorKind::Unsupported
    }

    /// Wraps the error with operation context without changing its kind
    pub fn context(self, context: impl Into<String>) -> Self {
        Error::Wrapped {
            context: context.into(),
            inner: Box::new(self),
        }
    }

    /// Status a request layer should answer with for this error
    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::Unsupported => StatusCode::NOT_IMPLEMENTED,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub trait ResultExt<T> {
    fn context<C, F>(self, f: F) -> Result<T>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T> ResultExt<T> for Result<T> {
    fn context<C, F>(self, f: F) -> Result<T>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|e| e.context(f()))
    }
}
