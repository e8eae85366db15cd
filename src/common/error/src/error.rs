//! Core error types for Tally.

use thiserror::Error;

/// Result type alias using `TallyError`.
pub type TallyResult<T> = std::result::Result<T, TallyError>;

/// Core error type for Tally operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TallyError {
    /// Type mismatch between a column and the expected Arrow type.
    #[error("TypeError: {0}")]
    TypeError(String),

    /// Invalid value provided.
    #[error("ValueError: {0}")]
    ValueError(String),

    /// Schema-related error (wrong column layout, mismatched batch).
    #[error("SchemaError: {0}")]
    SchemaError(String),

    /// Required column not present in the input.
    #[error("ColumnNotFound: {0}")]
    ColumnNotFound(String),

    /// A field of the input file could not be parsed.
    #[error("ParseError: line {line}: {message}")]
    ParseError {
        /// 1-based line number in the input file (header is line 1).
        line: u64,
        /// What went wrong.
        message: String,
    },

    /// The input file could not be loaded.
    #[error("LoadError: {0}")]
    LoadError(String),

    /// Aggregation or filtering failed.
    #[error("ExecutionError: {0}")]
    ExecutionError(String),

    /// Configuration could not be read or is inconsistent.
    #[error("ConfigError: {0}")]
    ConfigError(String),

    /// Internal error (bug in Tally).
    #[error("InternalError: {0}")]
    InternalError(String),

    /// IO error.
    #[error("IoError: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV reader error.
    #[error("CsvError: {0}")]
    CsvError(#[from] csv::Error),

    /// Arrow error.
    #[error("ArrowError: {0}")]
    ArrowError(#[from] arrow_schema::ArrowError),

    /// JSON serialization error.
    #[error("SerdeJsonError: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    /// Invalid parameter provided.
    #[error("InvalidParameter: {0}")]
    InvalidParameter(String),
}

impl TallyError {
    /// Create a new `TypeError`.
    pub fn type_error<S: Into<String>>(msg: S) -> Self {
        Self::TypeError(msg.into())
    }

    /// Create a new `ValueError`.
    pub fn value_error<S: Into<String>>(msg: S) -> Self {
        Self::ValueError(msg.into())
    }

    /// Create a new `SchemaError`.
    pub fn schema_error<S: Into<String>>(msg: S) -> Self {
        Self::SchemaError(msg.into())
    }

    /// Create a new `ColumnNotFound` error.
    pub fn column_not_found<S: Into<String>>(name: S) -> Self {
        Self::ColumnNotFound(name.into())
    }

    /// Create a new `ParseError` for the given input line.
    pub fn parse<S: Into<String>>(line: u64, msg: S) -> Self {
        Self::ParseError {
            line,
            message: msg.into(),
        }
    }

    /// Create a new `LoadError`.
    pub fn load<S: Into<String>>(msg: S) -> Self {
        Self::LoadError(msg.into())
    }

    /// Create a new `ExecutionError`.
    pub fn execution<S: Into<String>>(msg: S) -> Self {
        Self::ExecutionError(msg.into())
    }

    /// Create a new `ConfigError`.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a new `InternalError`.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::InternalError(msg.into())
    }

    /// Create a new `InvalidParameter` error.
    pub fn invalid_parameter<S: Into<String>>(msg: S) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Whether this error happened while reading the input file.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Self::LoadError(_)
                | Self::ParseError { .. }
                | Self::ColumnNotFound(_)
                | Self::IoError(_)
                | Self::CsvError(_)
        )
    }
}

/// Ensure a condition holds, returning an `ExecutionError` (or the named
/// variant) if not.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $variant:ident: $($msg:tt)*) => {
        if !$cond {
            return Err($crate::TallyError::$variant(format!($($msg)*)));
        }
    };
    ($cond:expr, $msg:expr) => {
        if !$cond {
            return Err($crate::TallyError::ExecutionError($msg.to_string()));
        }
    };
}

/// Return early with a `ValueError`.
#[macro_export]
macro_rules! value_err {
    ($($arg:tt)*) => {
        return Err($crate::TallyError::ValueError(format!($($arg)*)))
    };
}
