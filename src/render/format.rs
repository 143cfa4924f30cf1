//! Output serializations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::expand::ExpandError;

/// Serialization of rendered documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    #[default]
    Yaml,
    /// One compact JSON document per line.
    Json,
}

impl TargetFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetFormat::Yaml => "yaml",
            TargetFormat::Json => "json",
        }
    }

    /// Text placed between two documents.
    pub fn separator(&self) -> &'static str {
        match self {
            TargetFormat::Yaml => "---\n",
            TargetFormat::Json => "",
        }
    }

    /// Join document bodies with the format's multi-document separator.
    ///
    /// Bodies are expected to end with a newline. Nothing is emitted before
    /// the first or after the last document.
    ///
    /// # Example
    ///
    /// ```
    /// use kable::render::TargetFormat;
    ///
    /// let joined = TargetFormat::Yaml.join(&["kind: A\n", "kind: B\n"]);
    /// assert_eq!(joined, "kind: A\n---\nkind: B\n");
    /// ```
    pub fn join<S: AsRef<str>>(&self, documents: &[S]) -> String {
        let mut out = String::new();
        for (i, doc) in documents.iter().enumerate() {
            if i > 0 {
                out.push_str(self.separator());
            }
            out.push_str(doc.as_ref());
        }
        out
    }

    /// Serialize one expanded YAML document in this format.
    pub fn serialize_document(&self, document: &serde_yaml::Value) -> anyhow::Result<String> {
        let mut text = match self {
            TargetFormat::Yaml => serde_yaml::to_string(document)?,
            TargetFormat::Json => serde_json::to_string(document)?,
        };
        if !text.ends_with('\n') {
            text.push('\n');
        }
        Ok(text)
    }
}

impl FromStr for TargetFormat {
    type Err = ExpandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "yaml" | "yml" => Ok(TargetFormat::Yaml),
            "json" => Ok(TargetFormat::Json),
            other => Err(ExpandError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
