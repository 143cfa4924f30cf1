//! Fetching source contents.
//!
//! The resolver only needs "check out this url at this ref and give me a
//! directory". [`SourceFetcher`] is that seam; [`GitFetcher`] implements it
//! with the `git` command line client.

pub mod git;

use std::path::PathBuf;
use thiserror::Error;

use super::source::AuthPair;

pub use git::GitFetcher;

/// A checked-out source tree.
#[derive(Debug, Clone)]
pub struct FetchedTree {
    /// Root of the checkout.
    pub local_path: PathBuf,
    /// Commit the checkout is at.
    pub commit_sha: String,
}

/// Why a fetch failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("authentication failed for {url}")]
    AuthFailed { url: String },

    #[error("ref '{git_ref}' not found")]
    RefNotFound { git_ref: String },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Checks out a source at a ref.
pub trait SourceFetcher: Send + Sync {
    fn fetch(
        &self,
        url: &str,
        git_ref: Option<&str>,
        auth: Option<&AuthPair>,
    ) -> Result<FetchedTree, FetchError>;
}
