//! Error taxonomy shared by the Storage Locator and Session Store.
//!
//! One enum per the error kinds named in the spec's error-handling design,
//! in the style of the teacher's `domain::errors::WorkflowError`.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by the Storage Locator and Session Store.
///
/// These never unwind past the store's API boundary; callers (tool handlers,
/// HTTP handlers) convert them into their own transport's error shape.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid id: {id}")]
    InvalidId { id: String },

    #[error("invalid path: {attempted} escapes containment root")]
    InvalidPath { attempted: PathBuf },

    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("already exists: {what}")]
    AlreadyExists { what: String },

    #[error("parse error in {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("io error on {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Short kind name, used in `{success:false, error}` envelopes returned
    /// by the Session Store (spec §7's "kinds, not types").
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidId { .. } => "InvalidId",
            Self::InvalidPath { .. } => "InvalidPath",
            Self::NotFound { .. } => "NotFound",
            Self::AlreadyExists { .. } => "AlreadyExists",
            Self::ParseError { .. } => "ParseError",
            Self::IoError { .. } => "IOError",
        }
    }
}

/// Errors surfaced by tool handlers before they are converted into a
/// JSON-RPC `isError` text envelope.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Parameter {name} is required")]
    MissingParameter { name: String },

    #[error("{message}")]
    ParameterError { message: String },

    #[error("tool not found or not enabled")]
    NotFound,

    #[error("timeout")]
    Timeout,

    #[error(transparent)]
    Store(#[from] StoreError),
}
