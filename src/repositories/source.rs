//! Source descriptors and credentials.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::modification::{add_source, store_credentials, Modification};
use crate::error::Result;

/// Username and password for an authenticated source.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPair {
    pub username: String,
    pub password: String,
}

impl AuthPair {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both fields empty means "no authentication".
    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && self.password.is_empty()
    }

    /// Exactly one field set.
    pub fn is_partial(&self) -> bool {
        self.username.is_empty() != self.password.is_empty()
    }
}

impl fmt::Debug for AuthPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthPair")
            .field("username", &self.username)
            .field("password", &crate::values::REDACTED)
            .finish()
    }
}

/// A template source as supplied by the caller for one request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Unique key within the registry.
    pub name: String,

    /// Repository URL.
    pub url: String,

    /// Branch, tag or commit. `None` follows the default branch.
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthPair>,
}

impl SourceDescriptor {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    /// Pin the source to a ref. An empty ref keeps the default branch.
    pub fn with_ref(mut self, git_ref: impl Into<String>) -> Self {
        let git_ref = git_ref.into();
        self.git_ref = (!git_ref.is_empty()).then_some(git_ref);
        self
    }

    /// Attach credentials. Two empty strings mean no credentials.
    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        let auth = AuthPair::new(username, password);
        self.auth = (!auth.is_empty()).then_some(auth);
        self
    }

    /// The registry modifications needed to register this source.
    ///
    /// Fails up front when only half of a credential pair is present.
    pub fn modifications(&self) -> Result<Vec<Modification>> {
        let mut mods = vec![add_source(self)];
        if let Some(auth) = &self.auth {
            mods.push(store_credentials(&self.url, auth.clone())?);
        }
        Ok(mods)
    }
}
