//! Source registry for kable.
//!
//! This module keeps track of the repositories concepts are fetched from:
//! - Named sources with a url and an optional ref
//! - Credentials, stored per url and shared by every source using it
//! - Deferred [`Modification`]s, committed in atomic batches
//!
//! # Example
//!
//! ```
//! use kable::repositories::{add_source, store_credentials, AuthPair, Registry, SourceDescriptor};
//!
//! let registry = Registry::in_memory();
//! let source = SourceDescriptor::new("private", "https://example/private-concepts");
//!
//! let mods = vec![
//!     add_source(&source),
//!     store_credentials(&source.url, AuthPair::new("bot", "token")).unwrap(),
//! ];
//! registry.apply(mods).unwrap();
//!
//! assert!(registry.credentials_for("https://example/private-concepts").is_some());
//! ```

pub mod fetch;
pub mod modification;
pub mod registry;
pub mod source;
pub mod store;

pub use fetch::{FetchError, FetchedTree, GitFetcher, SourceFetcher};
pub use modification::{add_source, store_credentials, Modification};
pub use registry::Registry;
pub use source::{AuthPair, SourceDescriptor};
pub use store::{RegistryEntry, RegistryState, RegistryStore};
