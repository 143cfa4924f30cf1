//! Concept rendering.
//!
//! - [`expand`] - the template expansion seam and the bundled expander
//! - [`format`] - output serializations and document framing
//! - [`engine`] - expansion, framing and content identity
//! - [`info`] - optional render info records

pub mod engine;
pub mod expand;
pub mod format;
pub mod info;

pub use engine::{identity, Document, RenderEngine, RenderOptions, RenderedOutput};
pub use expand::{ExpandError, InterpolationExpander, TemplateExpander};
pub use format::TargetFormat;
pub use info::{FileRenderInfoSink, RenderInfo, RenderInfoSink};
