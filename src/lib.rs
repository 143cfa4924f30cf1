//! Kable - Render Kubernetes concepts from git-backed repositories.
//!
//! A concept is a directory holding a `concept.yaml` manifest and a tree of
//! YAML templates. Kable locates a concept by identifier, fetches the
//! repository it lives in, expands its templates with typed input values
//! and returns the rendered documents together with a content identity.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`concept`] - Concept identifiers, manifests and resolution
//! - [`config`] - Home directory and `config.yml` loading
//! - [`error`] - Error types and result aliases
//! - [`render`] - Template expansion, document framing and identity
//! - [`repositories`] - Source registry, credentials and git fetching
//! - [`secrets`] - Masking of credentials in command output
//! - [`values`] - Input value coercion and merging
//!
//! # Example
//!
//! ```
//! use kable::values::{coerce, Value};
//!
//! // Raw inputs are decoded as JSON when they parse, strings otherwise
//! assert_eq!(coerce("flag", "true").unwrap(), Value::Bool(true));
//! assert_eq!(coerce("name", "Option 1").unwrap(), Value::String("Option 1".into()));
//! ```
//!
//! For end-to-end rendering, see [`Kable`] and the integration tests.

pub mod cli;
pub mod concept;
pub mod config;
pub mod error;
pub mod kable;
pub mod render;
pub mod repositories;
pub mod secrets;
pub mod values;

pub use error::{KableError, Result};
pub use kable::{Kable, RenderRequest};
