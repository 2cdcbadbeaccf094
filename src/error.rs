//! Error handling for mpegflow-rs
//!
//! This module defines the crate-level error type and a Result alias. The
//! graph engine and the codec keep their own narrower error enums; both
//! convert into [`Error`] with `?`.

use crate::codec::CodecError;
use crate::pipeline::GraphError;
use thiserror::Error;

/// Main error type for mpegflow-rs operations
#[derive(Error, Debug)]
pub enum Error {
    /// Graph wiring and configuration errors
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Malformed or unencodable channel streams
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for mpegflow-rs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Config("missing defaults table".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing defaults table");
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::Serialization("test".to_string());
        let with_ctx = err.with_context("Failed to parse graph");
        assert!(with_ctx.to_string().contains("Failed to parse graph"));
    }

    #[test]
    fn test_codec_error_converts() {
        let result: std::result::Result<(), CodecError> =
            Err(CodecError::TruncatedHeader { len: 4 });
        let err = result.context("Reading stream.bin").unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("Reading stream.bin: Codec error"));
        assert!(text.contains("found 4"));
    }
}
