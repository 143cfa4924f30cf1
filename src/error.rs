//! Error types for kable operations.
//!
//! This module defines [`KableError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `KableError` for the domain failures a caller can act on
//! - Collaborator failures ([`FetchError`], [`ExpandError`]) are wrapped by
//!   the core kind that reports them
//! - Use `anyhow::Error` (via `KableError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

use crate::repositories::fetch::FetchError;
use crate::render::expand::ExpandError;

/// Core error type for kable operations.
#[derive(Debug, Error)]
pub enum KableError {
    /// A concept identifier could not be parsed.
    #[error("Invalid concept identifier '{input}': {reason}")]
    InvalidIdentifier { input: String, reason: String },

    /// A raw input decoded to a JSON kind with no matching value variant.
    #[error("Unsupported type for input '{name}': {kind}")]
    UnsupportedValueType { name: String, kind: String },

    /// Username and password must be given together.
    #[error("Invalid credentials for {url}: {reason}")]
    InvalidCredentials { url: String, reason: String },

    /// The identifier names a source that is not registered.
    #[error("Unknown source: {name}")]
    UnknownSource { name: String },

    /// The concept directory does not exist or is not a concept.
    #[error("Concept not found at {path}: {reason}")]
    ConceptNotFound { path: PathBuf, reason: String },

    /// Checking out a source failed.
    #[error("Failed to fetch source '{name}': {source}")]
    SourceFetchFailed {
        name: String,
        #[source]
        source: FetchError,
    },

    /// Template expansion failed or the target format is not supported.
    #[error("Failed to render concept '{concept}': {source}")]
    RenderFailed {
        concept: String,
        #[source]
        source: ExpandError,
    },

    /// A registry batch was rejected; no modification in it took effect.
    #[error("Registry update failed: {message}")]
    RegistryApplyFailed { message: String },

    /// Failed to parse a configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for kable operations.
pub type Result<T> = std::result::Result<T, KableError>;
