//! Configuration for kable.
//!
//! kable keeps its state in a home directory (`--home`, `KABLE_HOME`, or
//! `~/.kable`):
//!
//! ```text
//! ~/.kable/
//!   config.yml         optional settings, see [`KableConfig`]
//!   repositories.yml   registered sources
//!   auth.yml           credentials per url
//!   repos/             source checkouts
//!   renderinfo/        render info records
//! ```
//!
//! # Example
//!
//! ```
//! use kable::config::{load_config, KablePaths};
//! use tempfile::TempDir;
//!
//! let home = TempDir::new().unwrap();
//! let config = load_config(home.path()).unwrap();
//! let paths = KablePaths::new(home.path(), &config);
//! assert_eq!(paths.clone_dir, home.path().join("repos"));
//! ```

pub mod loader;
pub mod schema;

pub use loader::{load_config, parse_config, resolve_home, CONFIG_FILE, HOME_ENV};
pub use schema::{KableConfig, KablePaths};
