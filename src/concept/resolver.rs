//! Concept resolution.
//!
//! Turns a [`ConceptIdentifier`] into a directory holding the concept:
//! either a local directory named by the identifier path, or a subdirectory
//! of a registered source checked out at its ref.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::identifier::ConceptIdentifier;
use super::manifest::ConceptManifest;
use crate::error::{KableError, Result};
use crate::repositories::{GitFetcher, Registry, SourceFetcher};

/// Where resolved concept content came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContentOrigin {
    Local,
    Source {
        name: String,
        url: String,
        commit: String,
    },
}

/// Whether a sourceless identifier may be read from the local filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolveMode {
    Local,
    #[default]
    Registry,
}

/// Handle over a resolved concept's file tree.
#[derive(Debug, Clone)]
pub struct ConceptContent {
    pub identifier: ConceptIdentifier,
    pub root: PathBuf,
    pub manifest: ConceptManifest,
    pub origin: ContentOrigin,
}

impl ConceptContent {
    /// Open a concept directory.
    pub fn open(
        identifier: ConceptIdentifier,
        root: impl Into<PathBuf>,
        origin: ContentOrigin,
    ) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(KableError::ConceptNotFound {
                path: root,
                reason: "not a directory".to_string(),
            });
        }
        let manifest = ConceptManifest::load(&root)?;
        Ok(Self {
            identifier,
            root,
            manifest,
            origin,
        })
    }

    pub fn template_root(&self) -> PathBuf {
        self.manifest.template_root(&self.root)
    }

    /// Template files under the template root, sorted by relative path.
    pub fn template_files(&self) -> std::io::Result<Vec<PathBuf>> {
        let root = self.template_root();
        let mut files = Vec::new();
        collect_templates(&root, &mut files)?;
        files.sort_by(|a, b| a.strip_prefix(&root).ok().cmp(&b.strip_prefix(&root).ok()));
        Ok(files)
    }

    /// Commit the content was read at, for source-backed concepts.
    pub fn commit(&self) -> Option<&str> {
        match &self.origin {
            ContentOrigin::Source { commit, .. } => Some(commit),
            ContentOrigin::Local => None,
        }
    }
}

fn collect_templates(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_templates(&path, files)?;
        } else if path
            .extension()
            .map(|e| e == "yml" || e == "yaml")
            .unwrap_or(false)
        {
            files.push(path);
        }
    }
    Ok(())
}

/// Locates concept content locally or inside registered sources.
#[derive(Clone)]
pub struct ConceptResolver {
    fetcher: Arc<dyn SourceFetcher>,
}

impl ConceptResolver {
    pub fn new(fetcher: Arc<dyn SourceFetcher>) -> Self {
        Self { fetcher }
    }

    /// Resolver backed by git, cloning into `clone_dir`.
    pub fn with_git(clone_dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(GitFetcher::new(clone_dir)))
    }

    /// Resolve `identifier` to concept content.
    ///
    /// Sourceless identifiers are only accepted in [`ResolveMode::Local`].
    pub fn resolve(
        &self,
        identifier: &ConceptIdentifier,
        registry: &Registry,
        mode: ResolveMode,
    ) -> Result<ConceptContent> {
        match (&identifier.source, mode) {
            (None, ResolveMode::Local) => self.resolve_local(identifier),
            (None, ResolveMode::Registry) => Err(KableError::InvalidIdentifier {
                input: identifier.to_string(),
                reason: "no source given; use '<path>@<source>' or local mode".to_string(),
            }),
            (Some(source), _) => self.resolve_source(identifier, source, registry),
        }
    }

    fn resolve_local(&self, identifier: &ConceptIdentifier) -> Result<ConceptContent> {
        let path = PathBuf::from(&identifier.path);
        tracing::debug!("Resolving local concept at {}", path.display());
        if !path.exists() {
            return Err(KableError::ConceptNotFound {
                path,
                reason: "path does not exist".to_string(),
            });
        }
        ConceptContent::open(identifier.clone(), path, ContentOrigin::Local)
    }

    fn resolve_source(
        &self,
        identifier: &ConceptIdentifier,
        source: &str,
        registry: &Registry,
    ) -> Result<ConceptContent> {
        let relative = identifier.path.trim_start_matches('/');
        if Path::new(relative)
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(KableError::InvalidIdentifier {
                input: identifier.to_string(),
                reason: "path must stay inside the source".to_string(),
            });
        }

        let entry = registry.lookup(source)?;
        let auth = registry.credentials_for(&entry.url);
        tracing::debug!(
            "Resolving {} from {} (ref {}, auth: {})",
            identifier,
            entry.url,
            entry.git_ref.as_deref().unwrap_or("HEAD"),
            auth.is_some()
        );

        let tree = self
            .fetcher
            .fetch(&entry.url, entry.git_ref.as_deref(), auth.as_ref())
            .map_err(|e| KableError::SourceFetchFailed {
                name: source.to_string(),
                source: e,
            })?;

        let root = tree.local_path.join(relative);
        if !root.is_dir() {
            return Err(KableError::ConceptNotFound {
                path: PathBuf::from(&identifier.path),
                reason: format!("not present in source '{}'", source),
            });
        }

        ConceptContent::open(
            identifier.clone(),
            root,
            ContentOrigin::Source {
                name: source.to_string(),
                url: entry.url,
                commit: tree.commit_sha,
            },
        )
    }
}

impl std::fmt::Debug for ConceptResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConceptResolver").finish_non_exhaustive()
    }
}
