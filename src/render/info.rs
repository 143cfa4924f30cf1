//! Render info records.
//!
//! When asked to, the engine records what was rendered from where. Only
//! non-sensitive values are recorded. Recording is best effort: a failing
//! sink never fails the render.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::format::TargetFormat;
use crate::concept::ContentOrigin;
use crate::values::Value;

/// What a single render produced.
#[derive(Debug, Clone, Serialize)]
pub struct RenderInfo {
    pub identifier: String,
    pub origin: ContentOrigin,
    pub target: TargetFormat,
    pub identity: String,
    pub values: BTreeMap<String, Value>,
    pub rendered_at: DateTime<Utc>,
}

/// Receives render info records.
pub trait RenderInfoSink: Send + Sync {
    fn record(&self, info: &RenderInfo) -> anyhow::Result<()>;
}

/// Writes each record as a YAML file named after the render identity.
#[derive(Debug, Clone)]
pub struct FileRenderInfoSink {
    dir: PathBuf,
}

impl FileRenderInfoSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, identity: &str) -> PathBuf {
        let prefix = &identity[..identity.len().min(16)];
        self.dir.join(format!("renderinfo-{prefix}.yml"))
    }
}

impl RenderInfoSink for FileRenderInfoSink {
    fn record(&self, info: &RenderInfo) -> anyhow::Result<()> {
        use anyhow::Context;

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create render info directory {:?}", self.dir))?;
        let yaml = serde_yaml::to_string(info)?;
        let path = self.path_for(&info.identity);
        fs::write(&path, yaml).with_context(|| format!("Failed to write {:?}", path))?;
        tracing::debug!("Wrote render info to {}", path.display());
        Ok(())
    }
}
