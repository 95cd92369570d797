//! Error types for the Shapeshift core library
//!
//! This module defines the error handling system for the mapping engine,
//! using thiserror for ergonomic error definitions and anyhow for flexible
//! error contexts coming out of user-supplied closures.

use crate::types::TypeRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for Shapeshift operations
#[derive(Error, Debug)]
pub enum Error {
    /// Illegal customization, reported before any mapping executes
    #[error("Setup error ({source_type} -> {target_type}): {message}")]
    Setup {
        message: String,
        source_type: String,
        target_type: String,
    },

    /// A compiled mapper could not be constructed for a type pair
    #[error("Build error ({source_type} -> {target_type}): {message}")]
    Build {
        message: String,
        source_type: String,
        target_type: String,
    },

    /// A single value failed to convert while mapping
    #[error("Conversion failed: cannot convert {value} from {from} to {to}: {message}")]
    Conversion {
        value: String,
        from: String,
        to: String,
        message: String,
    },

    /// A live value did not match the type it was declared as
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// Diagnostics-mode wrapper carrying the expression labels of a failed step
    #[error("Mapping {source_label} ({source_type}) to {target_label} ({target_type}) failed: {source}")]
    Runtime {
        source_label: String,
        target_label: String,
        source_type: String,
        target_type: String,
        #[source]
        source: Box<Error>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`] by the phase that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Registration and declaration problems
    Setup,
    /// Compiled mapper construction problems
    Build,
    /// Failures while a compiled mapper executes
    Runtime,
    /// Configuration, IO and serialization problems outside the engine proper
    Environment,
}

impl Error {
    /// Create a setup error for a type pair
    pub fn setup(message: impl Into<String>, source: &TypeRef, target: &TypeRef) -> Self {
        Error::Setup {
            message: message.into(),
            source_type: source.to_string(),
            target_type: target.to_string(),
        }
    }

    /// Create a build error for a type pair
    pub fn build(message: impl Into<String>, source: &TypeRef, target: &TypeRef) -> Self {
        Error::Build {
            message: message.into(),
            source_type: source.to_string(),
            target_type: target.to_string(),
        }
    }

    /// Create a type mismatch error
    pub fn mismatch(expected: impl fmt::Display, found: impl Into<String>) -> Self {
        Error::TypeMismatch {
            expected: expected.to_string(),
            found: found.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Setup { .. } => ErrorKind::Setup,
            Error::Build { .. } => ErrorKind::Build,
            Error::Conversion { .. } | Error::TypeMismatch { .. } | Error::Runtime { .. } => {
                ErrorKind::Runtime
            }
            Error::Configuration { .. }
            | Error::Json { .. }
            | Error::Io { .. }
            | Error::Internal { .. } => ErrorKind::Environment,
        }
    }

    /// Strip diagnostics wrappers and return the innermost error
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Runtime { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Setup => write!(f, "setup"),
            ErrorKind::Build => write!(f, "build"),
            ErrorKind::Runtime => write!(f, "runtime"),
            ErrorKind::Environment => write!(f, "environment"),
        }
    }
}

// Conversion implementations
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}
