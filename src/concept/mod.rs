//! Concepts and how they are found.
//!
//! - [`identifier`] - the `<path>[@<source>]` addressing grammar
//! - [`manifest`] - the `concept.yaml` schema and input contracts
//! - [`resolver`] - locating concept content locally or in a source

pub mod identifier;
pub mod manifest;
pub mod resolver;

pub use identifier::ConceptIdentifier;
pub use manifest::{ConceptManifest, InputSpec, InputType};
pub use resolver::{ConceptContent, ConceptResolver, ContentOrigin, ResolveMode};
