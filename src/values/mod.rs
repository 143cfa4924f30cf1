//! Typed input values.
//!
//! Every template input reaches kable as a raw string. This module coerces
//! those strings into a closed set of [`Value`] variants and merges plain
//! and sensitive inputs into one [`ValueMap`].

pub mod map;
pub mod value;

pub use map::{InputValue, ValueMap, REDACTED};
pub use value::{coerce, Value};
