//! The source registry.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::modification::Modification;
use super::source::AuthPair;
use super::store::{RegistryEntry, RegistryState, RegistryStore};
use crate::error::{KableError, Result};

/// Named template sources and the credentials for their urls.
///
/// All changes go through [`Registry::apply`]. Applies are serialized
/// against each other and against readers, so a lookup observes either the
/// state before a batch or the state after it.
///
/// # Example
///
/// ```
/// use kable::repositories::{add_source, Registry, SourceDescriptor};
///
/// let registry = Registry::in_memory();
/// let demo = SourceDescriptor::new("demo", "https://example/demo-concepts");
/// registry.apply(vec![add_source(&demo)]).unwrap();
///
/// assert_eq!(registry.lookup("demo").unwrap().url, "https://example/demo-concepts");
/// ```
#[derive(Debug)]
pub struct Registry {
    state: RwLock<RegistryState>,
    store: Option<RegistryStore>,
}

impl Registry {
    /// A registry that lives only for this process.
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            store: None,
        }
    }

    /// Open the durable registry stored in `dir`.
    pub fn open(dir: impl Into<std::path::PathBuf>) -> Result<Self> {
        let store = RegistryStore::new(dir);
        let state = store.load()?;
        tracing::debug!(
            "Loaded registry from {} ({} sources)",
            store.dir().display(),
            state.sources.len()
        );
        Ok(Self {
            state: RwLock::new(state),
            store: Some(store),
        })
    }

    /// Apply a batch of modifications, all or nothing.
    ///
    /// Modifications are applied in order to a copy of the current state, so
    /// a later modification touching the same name or url wins. The copy is
    /// persisted and then published; if any modification is invalid or the
    /// write fails, the registry is left exactly as it was.
    pub fn apply(&self, modifications: impl IntoIterator<Item = Modification>) -> Result<()> {
        let mut guard = self.write();
        let mut next = guard.clone();

        let mut count = 0usize;
        for modification in modifications {
            tracing::debug!("Registry: {}", modification.describe());
            modification.apply_to(&mut next)?;
            count += 1;
        }

        if next == *guard {
            tracing::debug!("Registry unchanged after {} modifications", count);
            return Ok(());
        }

        if let Some(store) = &self.store {
            store.save(&next).map_err(|e| KableError::RegistryApplyFailed {
                message: format!("could not persist registry: {}", e),
            })?;
        }

        *guard = next;
        tracing::info!("Applied {} registry modifications", count);
        Ok(())
    }

    /// Get the entry registered under `name`.
    pub fn lookup(&self, name: &str) -> Result<RegistryEntry> {
        self.read()
            .sources
            .get(name)
            .cloned()
            .ok_or_else(|| KableError::UnknownSource {
                name: name.to_string(),
            })
    }

    /// Credentials stored for `url`, if any.
    pub fn credentials_for(&self, url: &str) -> Option<AuthPair> {
        self.read().auth.get(url).cloned()
    }

    /// All registered sources, sorted by name.
    pub fn sources(&self) -> Vec<(String, RegistryEntry)> {
        self.read()
            .sources
            .iter()
            .map(|(name, entry)| (name.clone(), entry.clone()))
            .collect()
    }

    pub fn is_durable(&self) -> bool {
        self.store.is_some()
    }

    // A panic while holding the lock cannot leave a half-applied batch,
    // because the state is only replaced wholesale.
    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::in_memory()
    }
}
