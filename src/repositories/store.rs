//! Persistent registry storage.
//!
//! The registry is kept as two YAML files in the kable home directory:
//! `repositories.yml` maps source names to their url and ref, `auth.yml`
//! maps urls to credentials.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use super::source::AuthPair;
use crate::error::Result;

/// A registered source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub url: String,

    /// Branch, tag or commit. `None` follows the default branch.
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
}

/// Complete registry contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryState {
    pub sources: BTreeMap<String, RegistryEntry>,
    pub auth: BTreeMap<String, AuthPair>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RepositoriesFile {
    #[serde(default)]
    repositories: BTreeMap<String, RegistryEntry>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AuthFile {
    #[serde(default)]
    auth: BTreeMap<String, AuthPair>,
}

/// On-disk location of a durable registry.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    dir: PathBuf,
}

impl RegistryStore {
    pub const REPOSITORIES_FILE: &'static str = "repositories.yml";
    pub const AUTH_FILE: &'static str = "auth.yml";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn repositories_file(&self) -> PathBuf {
        self.dir.join(Self::REPOSITORIES_FILE)
    }

    pub fn auth_file(&self) -> PathBuf {
        self.dir.join(Self::AUTH_FILE)
    }

    /// Load the registry. Missing files mean an empty registry.
    pub fn load(&self) -> Result<RegistryState> {
        let repositories: RepositoriesFile = read_yaml(&self.repositories_file())?;
        let auth: AuthFile = read_yaml(&self.auth_file())?;

        Ok(RegistryState {
            sources: repositories.repositories,
            auth: auth.auth,
        })
    }

    /// Save the registry using atomic writes.
    ///
    /// Both files are fully written to temporaries before either is renamed
    /// into place, so a serialization or write failure leaves the previous
    /// registry intact. The credentials temporary is never readable by
    /// other users, not even briefly.
    pub fn save(&self, state: &RegistryState) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let repositories = serde_yaml::to_string(&RepositoriesFile {
            repositories: state.sources.clone(),
        })
        .context("Failed to serialize repositories")?;
        let auth = serde_yaml::to_string(&AuthFile {
            auth: state.auth.clone(),
        })
        .context("Failed to serialize credentials")?;

        let repositories_path = self.repositories_file();
        let auth_path = self.auth_file();
        let repositories_tmp = write_temp(&repositories_path, &repositories, false)?;
        let auth_tmp = match write_temp(&auth_path, &auth, true) {
            Ok(tmp) => tmp,
            Err(e) => {
                let _ = fs::remove_file(&repositories_tmp);
                return Err(e);
            }
        };

        fs::rename(&repositories_tmp, &repositories_path)?;
        fs::rename(&auth_tmp, &auth_path)?;

        Ok(())
    }
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Write `contents` to a fresh temporary next to `target`.
///
/// The name is unique per process and call, so concurrent saves never
/// share a temporary. A `private` file is created with mode 0600.
fn write_temp(target: &Path, contents: &str, private: bool) -> Result<PathBuf> {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = target.with_file_name(format!(
        ".{}.{}-{}.tmp",
        name,
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    if private {
        owner_only(&mut options);
    }

    let written = options
        .open(&tmp)
        .and_then(|mut file| {
            file.write_all(contents.as_bytes())?;
            file.sync_all()
        })
        .with_context(|| format!("Failed to write {}", tmp.display()));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(tmp)
}

#[cfg(unix)]
fn owner_only(options: &mut fs::OpenOptions) {
    use std::os::unix::fs::OpenOptionsExt;
    options.mode(0o600);
}

#[cfg(not(unix))]
fn owner_only(_options: &mut fs::OpenOptions) {}

fn read_yaml<T: Default + for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    let parsed = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse registry file {}", path.display()))?;
    Ok(parsed)
}
