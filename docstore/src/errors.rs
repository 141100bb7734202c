use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::{atomic, Atomic};

/// Error kinds for document store operations.
///
/// This enum represents all possible error types that can occur during document
/// store operations. Each error kind describes a specific category of failure,
/// enabling precise error handling.
///
/// Conflict outcomes (a failed conditional update, a create on an existing key)
/// are deliberately NOT errors; they are reported through [crate::UpdateResult]
/// and [crate::CreateResult] instead.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// Error during filter construction or compilation
    FilterError,
    /// The filter operator is not supported by the backend
    UnsupportedOperation,
    /// The operation is not valid in the current context
    InvalidOperation,
    /// The requested document or collection was not found
    NotFound,
    /// Generic IO error
    IOError,
    /// Error from the storage backend
    BackendError,
    /// Error encoding or decoding document data
    EncodingError,
    /// Generic validation error
    ValidationError,
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::FilterError => write!(f, "Filter error"),
            ErrorKind::UnsupportedOperation => write!(f, "Unsupported operation"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::BackendError => write!(f, "Backend error"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom document store error type.
///
/// `DocStoreError` encapsulates error information including the error message,
/// kind, and optional cause. It supports error chaining and backtraces for
/// debugging.
///
/// # Examples
///
/// ```rust,ignore
/// use docstore::errors::{DocStoreError, ErrorKind, DocStoreResult};
///
/// fn example() -> DocStoreResult<()> {
///     Err(DocStoreError::new("collection not found", ErrorKind::NotFound))
/// }
/// ```
#[derive(Clone)]
pub struct DocStoreError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<DocStoreError>>,
    backtrace: Atomic<Backtrace>,
}

impl DocStoreError {
    /// Creates a new `DocStoreError` with the specified message and error kind.
    ///
    /// # Arguments
    ///
    /// * `message` - A description of the error
    /// * `error_kind` - The category of error
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        DocStoreError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `DocStoreError` with a cause error.
    ///
    /// This creates an error chain where the cause error is preserved for
    /// debugging.
    ///
    /// # Arguments
    ///
    /// * `message` - A description of the error
    /// * `error_kind` - The category of error
    /// * `cause` - The underlying error that caused this error
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: DocStoreError) -> Self {
        DocStoreError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&DocStoreError> {
        self.cause.as_deref()
    }
}

impl Display for DocStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for DocStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for DocStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for document store operations.
///
/// `DocStoreResult<T>` is shorthand for `Result<T, DocStoreError>`.
/// All fallible document store operations return this type.
pub type DocStoreResult<T> = Result<T, DocStoreError>;

// From trait implementations for automatic error conversion
impl From<std::io::Error> for DocStoreError {
    fn from(err: std::io::Error) -> Self {
        let error_kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            _ => ErrorKind::IOError,
        };
        DocStoreError::new(&format!("IO error: {}", err), error_kind)
    }
}

impl From<serde_json::Error> for DocStoreError {
    fn from(err: serde_json::Error) -> Self {
        DocStoreError::new(&format!("JSON error: {}", err), ErrorKind::EncodingError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_new() {
        let err = DocStoreError::new("collection not found", ErrorKind::NotFound);
        assert_eq!(err.message(), "collection not found");
        assert_eq!(err.kind(), &ErrorKind::NotFound);
        assert!(err.cause().is_none());
    }

    #[test]
    fn test_error_with_cause() {
        let cause = DocStoreError::new("connection reset", ErrorKind::IOError);
        let err = DocStoreError::new_with_cause("upsert failed", ErrorKind::BackendError, cause);
        assert_eq!(err.kind(), &ErrorKind::BackendError);
        assert_eq!(err.cause().unwrap().kind(), &ErrorKind::IOError);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_display() {
        let err = DocStoreError::new("bad filter", ErrorKind::FilterError);
        assert_eq!(format!("{}", err), "bad filter");
        assert_eq!(format!("{}", ErrorKind::UnsupportedOperation), "Unsupported operation");
    }

    #[test]
    fn test_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: DocStoreError = io.into();
        assert_eq!(err.kind(), &ErrorKind::NotFound);
    }

    #[test]
    fn test_error_from_serde_json() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: DocStoreError = parse_err.into();
        assert_eq!(err.kind(), &ErrorKind::EncodingError);
    }
}
