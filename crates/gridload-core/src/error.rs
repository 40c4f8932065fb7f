//! Unified error type for the gridload workspace
//!
//! Each pipeline crate keeps its own detailed error enum (`LoadError`,
//! `ProfileError`, `GridError`) and converts into [`GridLoadError`] at the
//! API boundary, so callers that drive several stages can handle failures
//! uniformly.
//!
//! # Example
//!
//! ```ignore
//! use gridload_core::{GridLoadError, GridLoadResult};
//!
//! fn clean(path: &str) -> GridLoadResult<()> {
//!     let lines = read_raw_lines(path)?;
//!     resolve_lines(&lines, SplitPolicy::default(), &NullProgress)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Unified error type for all gridload operations.
#[derive(Error, Debug)]
pub enum GridLoadError {
    /// I/O errors (file access, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid or incomplete configuration, raised before any data is touched
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// A failure inside a pipeline stage, pinned to the offending record
    #[error("{stage} failed at record {index}: {message}")]
    Stage {
        stage: &'static str,
        index: usize,
        message: String,
    },

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using GridLoadError.
pub type GridLoadResult<T> = Result<T, GridLoadError>;

impl GridLoadError {
    pub fn stage(stage: &'static str, index: usize, message: impl Into<String>) -> Self {
        GridLoadError::Stage {
            stage,
            index,
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for GridLoadError {
    fn from(err: anyhow::Error) -> Self {
        GridLoadError::Other(err.to_string())
    }
}

impl From<String> for GridLoadError {
    fn from(s: String) -> Self {
        GridLoadError::Other(s)
    }
}

impl From<&str> for GridLoadError {
    fn from(s: &str) -> Self {
        GridLoadError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for GridLoadError {
    fn from(err: serde_json::Error) -> Self {
        GridLoadError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GridLoadError::Config("sector STR has no source".into());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("STR"));
    }

    #[test]
    fn test_stage_error_names_record() {
        let err = GridLoadError::stage("grid voltage resolver", 17, "bad voltage '11o000'");
        let text = err.to_string();
        assert!(text.starts_with("grid voltage resolver failed at record 17"));
        assert!(text.contains("11o000"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GridLoadError = io_err.into();
        assert!(matches!(err, GridLoadError::Io(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> GridLoadResult<()> {
            Err(GridLoadError::Validation("empty table".into()))
        }

        fn outer() -> GridLoadResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
