//! Deferred registry changes.
//!
//! A [`Modification`] describes one change without performing it. Callers
//! collect modifications from several places and hand the whole batch to
//! [`Registry::apply`](super::Registry::apply), which commits all of them or
//! none.

use super::source::{AuthPair, SourceDescriptor};
use super::store::{RegistryEntry, RegistryState};
use crate::error::{KableError, Result};

/// A single pending change to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modification {
    /// Insert or overwrite the entry registered under `name`.
    AddSource { name: String, entry: RegistryEntry },
    /// Insert or overwrite the credentials stored for `url`.
    StoreCredentials { url: String, auth: AuthPair },
}

/// Build a modification that registers `source` under its name.
///
/// Credentials on the descriptor are not part of this modification; see
/// [`store_credentials`].
pub fn add_source(source: &SourceDescriptor) -> Modification {
    Modification::AddSource {
        name: source.name.clone(),
        entry: RegistryEntry {
            url: source.url.clone(),
            git_ref: source.git_ref.clone().filter(|r| !r.is_empty()),
        },
    }
}

/// Build a modification that stores credentials for `url`.
///
/// Credentials are keyed by url, so every source name pointing at the same
/// url shares them.
pub fn store_credentials(url: &str, auth: AuthPair) -> Result<Modification> {
    check_credentials(url, &auth)?;
    Ok(Modification::StoreCredentials {
        url: url.to_string(),
        auth,
    })
}

fn check_credentials(url: &str, auth: &AuthPair) -> Result<()> {
    if auth.is_partial() {
        return Err(KableError::InvalidCredentials {
            url: url.to_string(),
            reason: "username and password must be given together".to_string(),
        });
    }
    Ok(())
}

impl Modification {
    /// Human readable summary for logs. Never includes secrets.
    pub fn describe(&self) -> String {
        match self {
            Self::AddSource { name, entry } => format!(
                "add source '{}' -> {}@{}",
                name,
                entry.url,
                entry.git_ref.as_deref().unwrap_or("HEAD")
            ),
            Self::StoreCredentials { url, auth } => {
                format!("store credentials for {} (user '{}')", url, auth.username)
            }
        }
    }

    /// Apply this modification to a working copy of the registry state.
    pub(crate) fn apply_to(&self, state: &mut RegistryState) -> Result<()> {
        match self {
            Self::AddSource { name, entry } => {
                if name.is_empty() {
                    return Err(rejected(self, "source name is empty"));
                }
                if entry.url.is_empty() {
                    return Err(rejected(self, "source url is empty"));
                }
                state.sources.insert(name.clone(), entry.clone());
            }
            Self::StoreCredentials { url, auth } => {
                if url.is_empty() {
                    return Err(rejected(self, "credential url is empty"));
                }
                if auth.is_partial() || auth.is_empty() {
                    return Err(rejected(self, "username and password must both be set"));
                }
                state.auth.insert(url.clone(), auth.clone());
            }
        }
        Ok(())
    }
}

fn rejected(modification: &Modification, reason: &str) -> KableError {
    KableError::RegistryApplyFailed {
        message: format!("{}: {}", modification.describe(), reason),
    }
}
