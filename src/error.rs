//! Error types for lcfind
//!
//! Every failure falls into one of two kinds: the caller handed us bad
//! parameters, or the launch configuration inventory could not be read.

use thiserror::Error;

/// Message reported when a slice bound cannot be parsed as an integer.
pub const NUMERIC_BOUNDS_MESSAGE: &str = "supply numeric values for sort_start and/or sort_end";

#[derive(Error, Debug)]
pub enum LcFindError {
    /// Caller-supplied parameters are malformed
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The inventory fetch failed or returned unparseable data
    #[error("External source error: {source_name} - {message}")]
    ExternalSource {
        source_name: String,
        message: String,
    },
}

impl LcFindError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn external(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalSource {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

pub type LcFindResult<T> = Result<T, LcFindError>;
