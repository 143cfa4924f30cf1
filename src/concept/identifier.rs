//! Concept addressing.
//!
//! A concept is addressed as `<path>` or `<path>@<source>`. The path is
//! relative to the root of the named source; an identifier without a source
//! names a directory on the local filesystem.

use std::fmt;
use std::str::FromStr;

use crate::error::{KableError, Result};

/// Address of a concept, optionally inside a registered source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConceptIdentifier {
    pub path: String,
    pub source: Option<String>,
}

impl ConceptIdentifier {
    /// Identifier for a concept inside a registered source.
    pub fn new(path: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: Some(source.into()),
        }
    }

    /// Identifier for a concept directory on the local filesystem.
    pub fn local(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: None,
        }
    }

    /// Parse `path` or `path@source`.
    ///
    /// The separator splits once from the right, so paths may themselves
    /// contain `@`.
    ///
    /// # Example
    ///
    /// ```
    /// use kable::concept::ConceptIdentifier;
    ///
    /// let id = ConceptIdentifier::parse("apps/grafana@demo").unwrap();
    /// assert_eq!(id.path, "apps/grafana");
    /// assert_eq!(id.source.as_deref(), Some("demo"));
    /// assert_eq!(id.to_string(), "apps/grafana@demo");
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(invalid(input, "identifier is empty"));
        }

        let (path, source) = match input.rsplit_once('@') {
            Some((path, source)) => {
                if source.is_empty() {
                    return Err(invalid(input, "source name after '@' is empty"));
                }
                (path, Some(source.to_string()))
            }
            None => (input, None),
        };

        if path.is_empty() {
            return Err(invalid(input, "path is empty"));
        }

        Ok(Self {
            path: path.to_string(),
            source,
        })
    }

    pub fn is_local(&self) -> bool {
        self.source.is_none()
    }
}

fn invalid(input: &str, reason: &str) -> KableError {
    KableError::InvalidIdentifier {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

impl FromStr for ConceptIdentifier {
    type Err = KableError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ConceptIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}@{}", self.path, source),
            None => f.write_str(&self.path),
        }
    }
}
