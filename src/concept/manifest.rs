//! Concept manifest schema.
//!
//! Every concept directory carries a `concept.yaml` describing its inputs
//! and where its templates live:
//!
//! ```yaml
//! name: grafana
//! description: Grafana deployment with a service
//! templates: templates
//! inputs:
//!   instanceName:
//!     type: string
//!     required: true
//!   nameSelection:
//!     type: select
//!     options: ["Option 1", "Option 2"]
//!   replicas:
//!     type: int
//!     default: 2
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{KableError, Result};
use crate::render::expand::ExpandError;
use crate::values::Value;

/// File names accepted for the manifest, in lookup order.
pub const MANIFEST_FILES: [&str; 2] = ["concept.yaml", "concept.yml"];

/// A concept's manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptManifest {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Template root, relative to the concept directory.
    #[serde(default = "default_templates")]
    pub templates: String,

    #[serde(default)]
    pub inputs: BTreeMap<String, InputSpec>,
}

fn default_templates() -> String {
    "templates".to_string()
}

/// Declared type of a concept input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    String,
    Bool,
    Int,
    Map,
    /// A string restricted to `options`.
    Select,
}

/// Input contract for one concept input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSpec {
    #[serde(rename = "type")]
    pub input_type: InputType,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub required: bool,

    /// Default value if not provided.
    pub default: Option<serde_yaml::Value>,

    /// Valid values for select inputs.
    #[serde(default)]
    pub options: Vec<String>,
}

impl InputSpec {
    /// Check a provided value and return the value expansion should use.
    ///
    /// Returns `Ok(None)` for an optional input without a default that was
    /// not provided.
    pub fn effective_value(
        &self,
        name: &str,
        provided: Option<&Value>,
    ) -> std::result::Result<Option<Value>, ExpandError> {
        let value = match provided {
            Some(v) => v.clone(),
            None => match &self.default {
                Some(default) => serde_yaml::from_value::<Value>(default.clone()).map_err(|_| {
                    ExpandError::TypeMismatch {
                        name: name.to_string(),
                        expected: self.type_name(),
                        found: "unsupported default".to_string(),
                    }
                })?,
                None if self.required => {
                    return Err(ExpandError::MissingInput {
                        name: name.to_string(),
                    })
                }
                None => return Ok(None),
            },
        };

        self.check_type(name, &value)?;
        Ok(Some(value))
    }

    fn check_type(&self, name: &str, value: &Value) -> std::result::Result<(), ExpandError> {
        let matches = match (self.input_type, value) {
            (InputType::String, Value::String(_))
            | (InputType::Bool, Value::Bool(_))
            | (InputType::Int, Value::Int(_))
            | (InputType::Map, Value::Map(_)) => true,
            (InputType::Select, Value::String(s)) => {
                if !self.options.contains(s) {
                    return Err(ExpandError::TypeMismatch {
                        name: name.to_string(),
                        expected: format!("one of [{}]", self.options.join(", ")),
                        found: format!("'{s}'"),
                    });
                }
                true
            }
            _ => false,
        };

        if matches {
            Ok(())
        } else {
            Err(ExpandError::TypeMismatch {
                name: name.to_string(),
                expected: self.type_name(),
                found: value.kind().to_string(),
            })
        }
    }

    fn type_name(&self) -> String {
        match self.input_type {
            InputType::String => "string",
            InputType::Bool => "bool",
            InputType::Int => "int",
            InputType::Map => "map",
            InputType::Select => "select",
        }
        .to_string()
    }
}

impl ConceptManifest {
    /// Find the manifest file inside `dir`.
    pub fn locate(dir: &Path) -> Option<PathBuf> {
        MANIFEST_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Load the manifest of the concept in `dir`.
    ///
    /// A directory without a readable manifest or without its template
    /// root is not a concept.
    pub fn load(dir: &Path) -> Result<Self> {
        let not_found = |reason: String| KableError::ConceptNotFound {
            path: dir.to_path_buf(),
            reason,
        };

        let path = Self::locate(dir).ok_or_else(|| {
            not_found(format!("no {} in concept directory", MANIFEST_FILES[0]))
        })?;
        let content = fs::read_to_string(&path)?;
        let manifest: Self = if content.trim().is_empty() {
            serde_yaml::from_str("{}")
        } else {
            serde_yaml::from_str(&content)
        }
        .map_err(|e| not_found(format!("invalid {}: {}", path.display(), e)))?;

        let root = manifest.template_root(dir);
        if !root.is_dir() {
            return Err(not_found(format!(
                "template root '{}' is missing",
                manifest.templates
            )));
        }

        Ok(manifest)
    }

    pub fn template_root(&self, dir: &Path) -> PathBuf {
        dir.join(&self.templates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn spec(yaml: &str) -> InputSpec {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn parses_full_manifest() {
        let yaml = r#"
name: grafana
description: Grafana
inputs:
  instanceName:
    type: string
    required: true
  nameSelection:
    type: select
    options: ["Option 1", "Option 2"]
  replicas:
    type: int
    default: 2
"#;
        let manifest: ConceptManifest = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(manifest.name, "grafana");
        assert_eq!(manifest.templates, "templates");
        assert_eq!(manifest.inputs.len(), 3);
        assert_eq!(manifest.inputs["nameSelection"].input_type, InputType::Select);
    }

    #[test]
    fn required_input_without_default_is_missing() {
        let input = spec("type: string\nrequired: true");
        assert!(matches!(
            input.effective_value("instanceName", None),
            Err(ExpandError::MissingInput { .. })
        ));
    }

    #[test]
    fn default_fills_absent_input() {
        let input = spec("type: int\ndefault: 2");
        assert_eq!(input.effective_value("replicas", None).unwrap(), Some(Value::Int(2)));
    }

    #[test]
    fn optional_input_may_be_absent() {
        let input = spec("type: bool");
        assert_eq!(input.effective_value("debug", None).unwrap(), None);
    }

    #[test]
    fn wrong_variant_is_type_mismatch() {
        let input = spec("type: int");
        let err = input
            .effective_value("replicas", Some(&Value::String("two".into())))
            .unwrap_err();
        assert!(matches!(err, ExpandError::TypeMismatch { .. }));
    }

    #[test]
    fn select_checks_options() {
        let input = spec("type: select\noptions: [\"Option 1\"]");
        assert!(input
            .effective_value("sel", Some(&Value::String("Option 1".into())))
            .is_ok());
        assert!(matches!(
            input.effective_value("sel", Some(&Value::String("Option 3".into()))),
            Err(ExpandError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn float_default_is_rejected() {
        let input = spec("type: int\ndefault: 1.5");
        assert!(input.effective_value("ratio", None).is_err());
    }

    #[test]
    fn load_requires_manifest() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("templates")).unwrap();
        assert!(matches!(
            ConceptManifest::load(temp.path()),
            Err(KableError::ConceptNotFound { .. })
        ));
    }

    #[test]
    fn load_requires_template_root() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("concept.yaml"), "name: x\n").unwrap();
        assert!(matches!(
            ConceptManifest::load(temp.path()),
            Err(KableError::ConceptNotFound { .. })
        ));
    }

    #[test]
    fn load_accepts_custom_template_root() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("concept.yml"), "templates: manifests\n").unwrap();
        fs::create_dir_all(temp.path().join("manifests")).unwrap();
        let manifest = ConceptManifest::load(temp.path()).unwrap();
        assert_eq!(manifest.template_root(temp.path()), temp.path().join("manifests"));
    }
}
