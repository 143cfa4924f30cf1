//! Masking of secret values in text that leaves the crate.
//!
//! Collaborators (git, template expansion) report errors as free text that
//! may echo credentials or sensitive inputs back. Everything such text goes
//! through a [`Redactor`] before it is logged or wrapped in an error.

use std::collections::BTreeSet;

use crate::values::REDACTED;

/// Replaces registered secret values with a mask.
///
/// # Example
///
/// ```
/// use kable::secrets::Redactor;
///
/// let mut redactor = Redactor::new();
/// redactor.add_secret("super-secret-value");
///
/// let output = redactor.mask("The key is super-secret-value here");
/// assert_eq!(output, "The key is [REDACTED] here");
/// ```
#[derive(Debug, Clone)]
pub struct Redactor {
    // Ordered longest first so a secret containing another is masked whole.
    secrets: BTreeSet<(std::cmp::Reverse<usize>, String)>,
}

impl Redactor {
    pub fn new() -> Self {
        Self {
            secrets: BTreeSet::new(),
        }
    }

    /// Register a secret value to be masked. Empty strings are ignored.
    pub fn add_secret(&mut self, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            self.secrets.insert((std::cmp::Reverse(value.len()), value));
        }
    }

    pub fn add_secrets(&mut self, values: impl IntoIterator<Item = impl Into<String>>) {
        for value in values {
            self.add_secret(value);
        }
    }

    pub fn mask(&self, input: &str) -> String {
        let mut result = input.to_string();
        for (_, secret) in &self.secrets {
            result = result.replace(secret.as_str(), REDACTED);
        }
        result
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new()
    }
}
