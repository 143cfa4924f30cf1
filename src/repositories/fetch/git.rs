//! Git source fetching.
//!
//! Clones repositories into a cache directory and exports the requested
//! commit into an immutable snapshot directory. Existing clones are updated
//! in place, so the content always reflects the ref at the time of the call.
//!
//! ```text
//! <clone_dir>/
//!   <hash of url#ref>/     git data, never checked out
//!   trees/<commit sha>/    exported file tree, read-only once published
//! ```

use base64::Engine;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::{FetchError, FetchedTree, SourceFetcher};
use crate::repositories::source::AuthPair;
use crate::secrets::Redactor;

/// Directory under the clone dir holding exported snapshots.
const TREES_DIR: &str = "trees";

static STAGING_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Fetches sources from git repositories.
///
/// Fetches of the same url and ref are serialized; fetches of different
/// repositories run in parallel. Snapshots are published by rename and
/// never modified afterwards, so a tree handed to one caller is not touched
/// by later fetches.
#[derive(Debug, Clone)]
pub struct GitFetcher {
    /// Directory for cloned repositories.
    clone_dir: PathBuf,
    locks: Arc<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>>,
}

impl GitFetcher {
    /// Create a new git fetcher.
    pub fn new(clone_dir: impl Into<PathBuf>) -> Self {
        Self {
            clone_dir: clone_dir.into(),
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Get the clone directory.
    pub fn clone_dir(&self) -> &Path {
        &self.clone_dir
    }

    /// Get the local path for a repository at a ref.
    ///
    /// Uses a hash of the url and ref so that two refs of the same
    /// repository never share a clone.
    pub fn repo_path(&self, url: &str, git_ref: Option<&str>) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        hasher.update(b"#");
        hasher.update(git_ref.unwrap_or("HEAD").as_bytes());
        let hash = hasher.finalize();
        self.clone_dir.join(hex::encode(&hash[..8]))
    }

    /// Snapshot directory for a commit.
    pub fn tree_path(&self, commit_sha: &str) -> PathBuf {
        self.clone_dir.join(TREES_DIR).join(commit_sha)
    }

    fn lock_for(&self, repo_path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(repo_path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn clone_repo(&self, git: &GitCommand, url: &str, path: &Path) -> Result<(), FetchError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let created = !path.exists();
        tracing::debug!("Cloning {} into {}", url, path.display());
        let output = git.run(None, &["clone", "--no-checkout", url, &path.to_string_lossy()])?;
        if !output.status.success() {
            // A failed clone can leave a partial directory behind.
            if created {
                let _ = std::fs::remove_dir_all(path);
            }
            return Err(git.classify(url, &output));
        }
        Ok(())
    }

    fn update_repo(&self, git: &GitCommand, url: &str, path: &Path) -> Result<(), FetchError> {
        tracing::debug!("Updating clone of {} at {}", url, path.display());
        let output = git.run(Some(path), &["fetch", "--tags", "--force", "--prune", "origin"])?;
        if !output.status.success() {
            return Err(git.classify(url, &output));
        }

        // Follow a changed default branch. Failure only means origin/HEAD
        // stays where it was.
        let _ = git.run(Some(path), &["remote", "set-head", "origin", "--auto"]);
        Ok(())
    }

    fn resolve_commit(
        &self,
        git: &GitCommand,
        path: &Path,
        git_ref: Option<&str>,
    ) -> Result<String, FetchError> {
        let candidates = match git_ref {
            None => vec!["origin/HEAD".to_string()],
            Some(r) => vec![format!("origin/{r}"), format!("refs/tags/{r}"), r.to_string()],
        };

        for candidate in &candidates {
            let spec = format!("{candidate}^{{commit}}");
            let output = git.run(Some(path), &["rev-parse", "--verify", "--quiet", &spec])?;
            if output.status.success() {
                return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
            }
        }

        Err(FetchError::RefNotFound {
            git_ref: git_ref.unwrap_or("HEAD").to_string(),
        })
    }

    /// Export `sha` from the clone at `path` into its snapshot directory.
    ///
    /// The tree is written to a private staging directory with a private
    /// index and renamed into place. A snapshot that already exists is
    /// reused as is.
    fn export_tree(&self, git: &GitCommand, path: &Path, sha: &str) -> Result<PathBuf, FetchError> {
        let tree = self.tree_path(sha);
        if tree.is_dir() {
            return Ok(tree);
        }

        let trees = self.clone_dir.join(TREES_DIR);
        std::fs::create_dir_all(&trees)?;
        // git runs inside the clone, so its paths must not be relative.
        let trees = std::path::absolute(&trees)?;
        let unique = format!(
            ".{}-{}-{}",
            sha,
            std::process::id(),
            STAGING_COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        let staging = trees.join(&unique);
        let index = trees.join(format!("{unique}.index"));
        std::fs::create_dir_all(&staging)?;

        let result = self.write_tree(git, path, sha, &staging, &index);
        let _ = std::fs::remove_file(&index);
        if let Err(e) = result {
            let _ = std::fs::remove_dir_all(&staging);
            return Err(e);
        }

        if let Err(e) = std::fs::rename(&staging, &tree) {
            let _ = std::fs::remove_dir_all(&staging);
            // Another process published the same commit first.
            if !tree.is_dir() {
                return Err(e.into());
            }
        }
        Ok(tree)
    }

    fn write_tree(
        &self,
        git: &GitCommand,
        path: &Path,
        sha: &str,
        staging: &Path,
        index: &Path,
    ) -> Result<(), FetchError> {
        let index = index.to_string_lossy();
        let prefix = format!("--prefix={}/", staging.to_string_lossy());
        let steps: [&[&str]; 2] = [
            &["read-tree", sha],
            &["checkout-index", "--all", "--force", &prefix],
        ];

        for args in steps {
            let output = git.run_with_index(path, &index, args)?;
            if !output.status.success() {
                return Err(FetchError::Network {
                    message: git.redactor.mask(&format!(
                        "git {} failed: {}",
                        args[0],
                        String::from_utf8_lossy(&output.stderr).trim()
                    )),
                });
            }
        }
        Ok(())
    }
}

impl SourceFetcher for GitFetcher {
    fn fetch(
        &self,
        url: &str,
        git_ref: Option<&str>,
        auth: Option<&AuthPair>,
    ) -> Result<FetchedTree, FetchError> {
        let git = GitCommand::new(auth);
        let repo_path = self.repo_path(url, git_ref);

        let lock = self.lock_for(&repo_path);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        if repo_path.join(".git").exists() {
            self.update_repo(&git, url, &repo_path)?;
        } else {
            self.clone_repo(&git, url, &repo_path)?;
        }

        let commit_sha = self.resolve_commit(&git, &repo_path, git_ref)?;
        let local_path = self.export_tree(&git, &repo_path, &commit_sha)?;
        tracing::info!(
            "Checked out {}@{} at {}",
            url,
            git_ref.unwrap_or("HEAD"),
            &commit_sha[..commit_sha.len().min(12)]
        );

        Ok(FetchedTree {
            local_path,
            commit_sha,
        })
    }
}

/// Runs git with credentials supplied through the environment.
struct GitCommand {
    env: Vec<(String, String)>,
    redactor: Redactor,
}

impl GitCommand {
    fn new(auth: Option<&AuthPair>) -> Self {
        let mut env = vec![("GIT_TERMINAL_PROMPT".to_string(), "0".to_string())];
        let mut redactor = Redactor::new();

        if let Some(auth) = auth.filter(|a| !a.is_empty()) {
            let token = base64::engine::general_purpose::STANDARD
                .encode(format!("{}:{}", auth.username, auth.password));
            env.extend([
                ("GIT_CONFIG_COUNT".to_string(), "1".to_string()),
                ("GIT_CONFIG_KEY_0".to_string(), "http.extraHeader".to_string()),
                (
                    "GIT_CONFIG_VALUE_0".to_string(),
                    format!("Authorization: Basic {token}"),
                ),
            ]);
            redactor.add_secret(auth.password.clone());
            redactor.add_secret(token);
        }

        Self { env, redactor }
    }

    fn run(&self, dir: Option<&Path>, args: &[&str]) -> Result<Output, FetchError> {
        let mut cmd = Command::new("git");
        cmd.args(args);
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        Ok(cmd.output()?)
    }

    /// Run git in `dir` against a private index file.
    fn run_with_index(&self, dir: &Path, index: &str, args: &[&str]) -> Result<Output, FetchError> {
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(dir).env("GIT_INDEX_FILE", index);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        Ok(cmd.output()?)
    }

    fn classify(&self, url: &str, output: &Output) -> FetchError {
        let stderr = self.redactor.mask(String::from_utf8_lossy(&output.stderr).trim());
        let lower = stderr.to_lowercase();

        if lower.contains("authentication failed")
            || lower.contains("could not read username")
            || lower.contains("could not read password")
            || lower.contains("403")
            || lower.contains("401")
        {
            return FetchError::AuthFailed {
                url: url.to_string(),
            };
        }

        FetchError::Network { message: stderr }
    }
}
