//! The rendering engine.

use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use super::expand::{InterpolationExpander, TemplateExpander};
use super::format::TargetFormat;
use super::info::{RenderInfo, RenderInfoSink};
use crate::concept::ConceptContent;
use crate::error::{KableError, Result};
use crate::secrets::Redactor;
use crate::values::ValueMap;

/// Switches for a single render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    /// Read the concept from a local directory instead of a source.
    pub local: bool,
    /// Join all documents into one.
    pub single: bool,
    /// Emit a render info record.
    pub write_render_info: bool,
}

/// One rendered document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub content: String,
    pub format: TargetFormat,
}

/// The result of a render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedOutput {
    pub documents: Vec<Document>,
    /// Lowercase hex SHA-256 of [`RenderedOutput::print`].
    pub identity: String,
}

impl RenderedOutput {
    fn new(documents: Vec<Document>, format: TargetFormat) -> Self {
        let identity = identity(format.join(&contents(&documents)).as_bytes());
        Self {
            documents,
            identity,
        }
    }

    /// All documents joined with their format's separator.
    pub fn print(&self) -> String {
        match self.documents.first() {
            Some(first) => first.format.join(&contents(&self.documents)),
            None => String::new(),
        }
    }
}

fn contents(documents: &[Document]) -> Vec<&str> {
    documents.iter().map(|d| d.content.as_str()).collect()
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn identity(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Expands concepts and frames the resulting documents.
///
/// The engine holds no per-render state; one instance may serve concurrent
/// renders.
#[derive(Clone)]
pub struct RenderEngine {
    expander: Arc<dyn TemplateExpander>,
    sink: Option<Arc<dyn RenderInfoSink>>,
}

impl RenderEngine {
    pub fn new(expander: Arc<dyn TemplateExpander>) -> Self {
        Self {
            expander,
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn RenderInfoSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Render `content` with `values`.
    ///
    /// Either the full output is returned or an error; a failing render
    /// info sink is logged and ignored. Sensitive input values are masked
    /// in expansion errors.
    pub fn render(
        &self,
        content: &ConceptContent,
        values: &ValueMap,
        format: TargetFormat,
        options: &RenderOptions,
    ) -> Result<RenderedOutput> {
        let bodies = self
            .expander
            .expand(content, values, format)
            .map_err(|e| {
                let mut redactor = Redactor::new();
                redactor.add_secrets(values.sensitive_strings());
                KableError::RenderFailed {
                    concept: content.identifier.to_string(),
                    source: e.redact(&redactor),
                }
            })?;

        let documents = if options.single {
            vec![Document {
                content: format.join(&bodies),
                format,
            }]
        } else {
            bodies
                .into_iter()
                .map(|content| Document { content, format })
                .collect()
        };

        let output = RenderedOutput::new(documents, format);
        tracing::info!(
            "Rendered {} ({} documents, identity {})",
            content.identifier,
            output.documents.len(),
            &output.identity[..12]
        );

        if options.write_render_info {
            self.record_info(content, values, format, &output);
        }

        Ok(output)
    }

    fn record_info(
        &self,
        content: &ConceptContent,
        values: &ValueMap,
        format: TargetFormat,
        output: &RenderedOutput,
    ) {
        let Some(sink) = &self.sink else {
            tracing::debug!("Render info requested but no sink is configured");
            return;
        };

        let info = RenderInfo {
            identifier: content.identifier.to_string(),
            origin: content.origin.clone(),
            target: format,
            identity: output.identity.clone(),
            values: values.non_sensitive(),
            rendered_at: Utc::now(),
        };

        if let Err(e) = sink.record(&info) {
            tracing::warn!("Failed to record render info for {}: {:#}", info.identifier, e);
        }
    }
}

impl Default for RenderEngine {
    fn default() -> Self {
        Self::new(Arc::new(InterpolationExpander::new()))
    }
}

impl std::fmt::Debug for RenderEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderEngine")
            .field("sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::{ConceptIdentifier, ContentOrigin};
    use crate::render::expand::ExpandError;
    use crate::render::info::FileRenderInfoSink;
    use crate::values::Value;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FixedExpander(Vec<&'static str>);

    impl TemplateExpander for FixedExpander {
        fn expand(
            &self,
            _content: &ConceptContent,
            _values: &ValueMap,
            _format: TargetFormat,
        ) -> std::result::Result<Vec<String>, ExpandError> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    struct FailingExpander;

    impl TemplateExpander for FailingExpander {
        fn expand(
            &self,
            _content: &ConceptContent,
            _values: &ValueMap,
            _format: TargetFormat,
        ) -> std::result::Result<Vec<String>, ExpandError> {
            Err(ExpandError::MissingInput {
                name: "instanceName".into(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<RenderInfo>>);

    impl RenderInfoSink for RecordingSink {
        fn record(&self, info: &RenderInfo) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(info.clone());
            Ok(())
        }
    }

    struct BrokenSink;

    impl RenderInfoSink for BrokenSink {
        fn record(&self, _info: &RenderInfo) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    fn content() -> (TempDir, ConceptContent) {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("concept.yaml"), "name: x\n").unwrap();
        fs::create_dir_all(temp.path().join("templates")).unwrap();
        let content = ConceptContent::open(
            ConceptIdentifier::local("x"),
            temp.path(),
            ContentOrigin::Local,
        )
        .unwrap();
        (temp, content)
    }

    fn engine(docs: Vec<&'static str>) -> RenderEngine {
        RenderEngine::new(Arc::new(FixedExpander(docs)))
    }

    const SINGLE: RenderOptions = RenderOptions {
        local: false,
        single: true,
        write_render_info: false,
    };

    #[test]
    fn single_joins_documents() {
        let (_temp, content) = content();
        let output = engine(vec!["kind: A\n", "kind: B\n"])
            .render(&content, &ValueMap::new(), TargetFormat::Yaml, &SINGLE)
            .unwrap();

        assert_eq!(output.documents.len(), 1);
        assert_eq!(output.documents[0].content, "kind: A\n---\nkind: B\n");
        assert_eq!(output.print(), "kind: A\n---\nkind: B\n");
    }

    #[test]
    fn split_keeps_documents_distinct() {
        let (_temp, content) = content();
        let output = engine(vec!["kind: A\n", "kind: B\n"])
            .render(
                &content,
                &ValueMap::new(),
                TargetFormat::Yaml,
                &RenderOptions::default(),
            )
            .unwrap();

        assert_eq!(output.documents.len(), 2);
        assert_eq!(output.print(), "kind: A\n---\nkind: B\n");
    }

    #[test]
    fn identity_is_sha256_of_printed_output() {
        let (_temp, content) = content();
        let output = engine(vec!["kind: A\n", "kind: B\n"])
            .render(&content, &ValueMap::new(), TargetFormat::Yaml, &SINGLE)
            .unwrap();

        assert_eq!(output.identity, identity(output.print().as_bytes()));
        assert_eq!(output.identity.len(), 64);
        assert!(output
            .identity
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn identity_does_not_depend_on_framing() {
        let (_temp, content) = content();
        let engine = engine(vec!["kind: A\n", "kind: B\n"]);
        let single = engine
            .render(&content, &ValueMap::new(), TargetFormat::Yaml, &SINGLE)
            .unwrap();
        let split = engine
            .render(
                &content,
                &ValueMap::new(),
                TargetFormat::Yaml,
                &RenderOptions::default(),
            )
            .unwrap();
        assert_eq!(single.identity, split.identity);
    }

    #[test]
    fn known_identity() {
        assert_eq!(
            identity(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn expansion_failure_is_render_failed() {
        let (_temp, content) = content();
        let err = RenderEngine::new(Arc::new(FailingExpander))
            .render(&content, &ValueMap::new(), TargetFormat::Yaml, &SINGLE)
            .unwrap_err();
        assert!(matches!(err, KableError::RenderFailed { .. }));
    }

    #[test]
    fn sensitive_values_are_masked_in_render_errors() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("concept.yaml"),
            "name: x\ninputs:\n  mode:\n    type: select\n    options: [\"a\", \"b\"]\n",
        )
        .unwrap();
        fs::create_dir_all(temp.path().join("templates")).unwrap();
        fs::write(temp.path().join("templates/a.yaml"), "mode: ${mode}\n").unwrap();
        let content = ConceptContent::open(
            ConceptIdentifier::local("x"),
            temp.path(),
            ContentOrigin::Local,
        )
        .unwrap();
        let mut values = ValueMap::new();
        values.insert_sensitive("mode", Value::String("hunter2-secret".into()));

        let err = RenderEngine::default()
            .render(&content, &values, TargetFormat::Yaml, &SINGLE)
            .unwrap_err();

        let KableError::RenderFailed { source, .. } = &err else {
            panic!("expected RenderFailed, got {err:?}");
        };
        assert!(matches!(source, ExpandError::TypeMismatch { .. }));
        assert!(!format!("{err} {source} {err:?}").contains("hunter2-secret"));
        assert!(source.to_string().contains("[REDACTED]"));
    }

    #[test]
    fn records_non_sensitive_render_info() {
        let (_temp, content) = content();
        let sink = Arc::new(RecordingSink::default());
        let engine = engine(vec!["kind: A\n"]).with_sink(sink.clone());
        let mut values = ValueMap::new();
        values.insert("shown", Value::Int(1));
        values.insert_sensitive("hidden", Value::String("s3cr3t".into()));

        let output = engine
            .render(
                &content,
                &values,
                TargetFormat::Yaml,
                &RenderOptions {
                    write_render_info: true,
                    ..SINGLE
                },
            )
            .unwrap();

        let records = sink.0.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identity, output.identity);
        assert!(records[0].values.contains_key("shown"));
        assert!(!records[0].values.contains_key("hidden"));
    }

    #[test]
    fn no_render_info_unless_requested() {
        let (_temp, content) = content();
        let sink = Arc::new(RecordingSink::default());
        engine(vec!["kind: A\n"])
            .with_sink(sink.clone())
            .render(&content, &ValueMap::new(), TargetFormat::Yaml, &SINGLE)
            .unwrap();
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[test]
    fn sink_failure_does_not_fail_render() {
        let (_temp, content) = content();
        let result = engine(vec!["kind: A\n"]).with_sink(Arc::new(BrokenSink)).render(
            &content,
            &ValueMap::new(),
            TargetFormat::Yaml,
            &RenderOptions {
                write_render_info: true,
                ..SINGLE
            },
        );
        assert!(result.is_ok());
    }

    #[test]
    fn file_sink_writes_under_identity() {
        let (temp, content) = content();
        let sink = FileRenderInfoSink::new(temp.path().join("info"));
        let output = engine(vec!["kind: A\n"])
            .with_sink(Arc::new(sink.clone()))
            .render(
                &content,
                &ValueMap::new(),
                TargetFormat::Yaml,
                &RenderOptions {
                    write_render_info: true,
                    ..SINGLE
                },
            )
            .unwrap();
        assert!(sink.path_for(&output.identity).exists());
    }
}
