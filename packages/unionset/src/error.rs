//! Error types for unionset

use std::fmt;
use thiserror::Error;

use crate::config::ConfigError;

/// Union error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid union setup (no sources, unprojectable source, bad config)
    Configuration,
    /// Invalid request arguments (stop before start, empty source list)
    Validation,
    /// Request shape the union cannot serve (stepped slices)
    UnsupportedOperation,
    /// Type tag without a registered bulk loader
    UnknownType,
    /// Query execution or row decoding failure
    Backend,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Validation => "validation",
            ErrorKind::UnsupportedOperation => "unsupported_operation",
            ErrorKind::UnknownType => "unknown_type",
            ErrorKind::Backend => "backend",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Union error type
#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct UnionError {
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    pub kind: ErrorKind,
    pub message: String,
}

impl UnionError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // Convenience constructors
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedOperation, message)
    }

    pub fn unknown_type(tag: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::UnknownType,
            format!("No bulk loader registered for type: {}", tag),
        )
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Backend, message)
    }

    pub fn is_kind(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

// SQLite error conversions
#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for UnionError {
    fn from(err: rusqlite::Error) -> Self {
        UnionError::backend(format!("SQLite error: {}", err)).with_source(err)
    }
}

// Mutex poison error (for Arc<Mutex<Connection>>)
impl<T> From<std::sync::PoisonError<T>> for UnionError {
    fn from(_err: std::sync::PoisonError<T>) -> Self {
        UnionError::backend("Connection mutex poisoned")
    }
}

impl From<ConfigError> for UnionError {
    fn from(err: ConfigError) -> Self {
        UnionError::configuration(format!("Invalid configuration: {}", err)).with_source(err)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, UnionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    // ═══════════════════════════════════════════════════════════════════════
    // Error Construction Tests
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_error_display() {
        let err = UnionError::unknown_type("blog.post");
        let msg = format!("{}", err);
        assert!(msg.contains("unknown_type"));
        assert!(msg.contains("blog.post"));
    }

    #[test]
    fn test_validation_error() {
        let err = UnionError::validation("stop (2) is before start (5)");
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.source.is_none());
        assert_eq!(
            format!("{}", err),
            "[validation] stop (2) is before start (5)"
        );
    }

    #[test]
    fn test_unsupported_error() {
        let err = UnionError::unsupported("Only simple slices supported");
        assert!(err.is_kind(ErrorKind::UnsupportedOperation));
        assert_eq!(
            format!("{}", err),
            "[unsupported_operation] Only simple slices supported"
        );
    }

    #[test]
    fn test_with_source() {
        use std::io;

        let io_err = io::Error::new(io::ErrorKind::NotFound, "db file not found");
        let err = UnionError::backend("Cannot open database").with_source(io_err);

        assert_eq!(err.kind, ErrorKind::Backend);
        let source = err.source().unwrap();
        assert!(source.to_string().contains("db file not found"));
    }

    #[test]
    fn test_config_error_conversion() {
        let err: UnionError = ConfigError::MissingVersion.into();
        assert_eq!(err.kind, ErrorKind::Configuration);
        assert!(err.source.is_some());
    }

    #[test]
    fn test_poison_error_conversion() {
        use std::sync::{Arc, Mutex};

        let lock = Arc::new(Mutex::new(0));
        let poisoner = Arc::clone(&lock);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison");
        })
        .join();

        let err: UnionError = lock.lock().unwrap_err().into();
        assert_eq!(err.kind, ErrorKind::Backend);
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_from_rusqlite_error() {
        let err: UnionError = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(err.kind, ErrorKind::Backend);
        assert!(err.message.contains("SQLite error"));
        assert!(err.source.is_some());
    }

    // ═══════════════════════════════════════════════════════════════════════
    // ErrorKind Tests
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_error_kind_as_str() {
        assert_eq!(ErrorKind::Configuration.as_str(), "configuration");
        assert_eq!(ErrorKind::Validation.as_str(), "validation");
        assert_eq!(
            ErrorKind::UnsupportedOperation.as_str(),
            "unsupported_operation"
        );
        assert_eq!(ErrorKind::UnknownType.as_str(), "unknown_type");
        assert_eq!(ErrorKind::Backend.as_str(), "backend");
    }

    #[test]
    fn test_result_propagation() {
        fn inner() -> Result<()> {
            Err(UnionError::configuration("Union should be non-empty"))
        }

        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }

        let err = outer().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
