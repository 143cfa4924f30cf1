//! Template expansion.
//!
//! [`TemplateExpander`] is the seam between the rendering engine and the
//! template language. The bundled [`InterpolationExpander`] reads the YAML
//! files under a concept's template root, parses each document and
//! substitutes `${variable}` references in the parsed tree.
//!
//! A scalar that is exactly one reference takes the value with its type, so
//! `replicas: ${replicas}` yields an integer. References inside longer text
//! always produce a string.
//!
//! # Syntax
//!
//! - `${name}` - replaced with the value of input `name`
//! - `${name.key}` - a key inside a map input
//! - `$${escaped}` - produces literal `${escaped}` in output
//!
//! # Example
//!
//! ```yaml
//! metadata:
//!   name: ${instanceName}
//!   labels: ${labels}
//! ```

use serde_yaml::Value as Yaml;
use std::collections::BTreeMap;
use thiserror::Error;

use super::format::TargetFormat;
use crate::concept::ConceptContent;
use crate::secrets::Redactor;
use crate::values::{Value, ValueMap};

/// Why expansion failed.
#[derive(Debug, Error)]
pub enum ExpandError {
    #[error("missing required input '{name}'")]
    MissingInput { name: String },

    #[error("template syntax error in {file}: {message}")]
    TemplateSyntax { file: String, message: String },

    #[error("input '{name}' must be {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: String,
        found: String,
    },

    #[error("unsupported target format '{format}'")]
    UnsupportedFormat { format: String },

    #[error("failed to read templates: {0}")]
    Io(#[from] std::io::Error),
}

impl ExpandError {
    /// Mask registered secrets in every text field.
    pub fn redact(self, redactor: &Redactor) -> Self {
        match self {
            ExpandError::MissingInput { name } => ExpandError::MissingInput {
                name: redactor.mask(&name),
            },
            ExpandError::TemplateSyntax { file, message } => ExpandError::TemplateSyntax {
                file: redactor.mask(&file),
                message: redactor.mask(&message),
            },
            ExpandError::TypeMismatch {
                name,
                expected,
                found,
            } => ExpandError::TypeMismatch {
                name: redactor.mask(&name),
                expected: redactor.mask(&expected),
                found: redactor.mask(&found),
            },
            ExpandError::UnsupportedFormat { format } => ExpandError::UnsupportedFormat {
                format: redactor.mask(&format),
            },
            ExpandError::Io(e) => ExpandError::Io(e),
        }
    }
}

/// Expands a concept's templates into document bodies.
pub trait TemplateExpander: Send + Sync {
    /// Produce the ordered document bodies for `content`.
    fn expand(
        &self,
        content: &ConceptContent,
        values: &ValueMap,
        format: TargetFormat,
    ) -> Result<Vec<String>, ExpandError>;
}

/// A segment of a template line.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text
    Literal(String),
    /// Variable reference: ${name} or ${name.key}
    Variable(String),
}

/// Parse a string containing `${var}` interpolations.
///
/// Fails on an unterminated or empty reference.
pub fn parse_interpolation(input: &str) -> Result<Vec<Segment>, String> {
    let mut segments = Vec::new();
    let mut chars = input.chars().peekable();
    let mut current_literal = String::new();

    while let Some(c) = chars.next() {
        if c != '$' {
            current_literal.push(c);
            continue;
        }

        match chars.peek() {
            Some('$') => {
                // Escaped: $$ becomes $
                chars.next();
                if chars.peek() == Some(&'{') {
                    // $${...} -> literal ${...}
                    chars.next();
                    current_literal.push_str("${");
                    for c in chars.by_ref() {
                        current_literal.push(c);
                        if c == '}' {
                            break;
                        }
                    }
                } else {
                    current_literal.push('$');
                }
            }
            Some('{') => {
                chars.next();

                if !current_literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut current_literal)));
                }

                let mut var_name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    var_name.push(c);
                }

                if !closed {
                    return Err(format!("unterminated reference '${{{var_name}'"));
                }
                let var_name = var_name.trim().to_string();
                if var_name.is_empty() {
                    return Err("empty reference '${}'".to_string());
                }
                segments.push(Segment::Variable(var_name));
            }
            _ => current_literal.push(c),
        }
    }

    if !current_literal.is_empty() {
        segments.push(Segment::Literal(current_literal));
    }

    Ok(segments)
}

/// Expander for YAML templates with `${variable}` interpolation.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpolationExpander;

impl InterpolationExpander {
    pub fn new() -> Self {
        Self
    }

    /// Provided values checked against the manifest, with defaults filled in.
    fn effective_values(
        &self,
        content: &ConceptContent,
        values: &ValueMap,
    ) -> Result<BTreeMap<String, Value>, ExpandError> {
        let inputs = &content.manifest.inputs;
        let mut effective = BTreeMap::new();

        for (name, value) in values.iter() {
            if !inputs.contains_key(name) {
                tracing::debug!("Input '{}' is not declared by {}", name, content.identifier);
            }
            effective.insert(name.to_string(), value.clone());
        }

        for (name, spec) in inputs {
            match spec.effective_value(name, values.get(name))? {
                Some(value) => {
                    effective.insert(name.clone(), value);
                }
                None => {
                    effective.remove(name);
                }
            }
        }

        Ok(effective)
    }

    /// Check every line for malformed references so errors carry a line
    /// number.
    fn check_syntax(&self, source: &str, display: &str) -> Result<(), ExpandError> {
        for (lineno, line) in source.lines().enumerate() {
            parse_interpolation(line).map_err(|message| ExpandError::TemplateSyntax {
                file: format!("{}:{}", display, lineno + 1),
                message,
            })?;
        }
        Ok(())
    }
}

/// Replace references inside a parsed YAML node.
///
/// A scalar that is exactly one `${ref}` takes the typed value. A reference
/// embedded in longer text is spliced into the string, which stays a
/// string. Mapping keys are always strings.
fn substitute(
    node: &mut Yaml,
    values: &BTreeMap<String, Value>,
    file: &str,
) -> Result<(), ExpandError> {
    match node {
        Yaml::String(text) => {
            if let Some(replacement) = expand_scalar(text, values, file)? {
                *node = replacement;
            }
        }
        Yaml::Sequence(items) => {
            for item in items {
                substitute(item, values, file)?;
            }
        }
        Yaml::Mapping(mapping) => {
            for (key, mut value) in std::mem::take(mapping) {
                let key = match key {
                    Yaml::String(text) => Yaml::String(interpolate(&text, values, file)?),
                    other => other,
                };
                substitute(&mut value, values, file)?;
                mapping.insert(key, value);
            }
        }
        Yaml::Tagged(tagged) => substitute(&mut tagged.value, values, file)?,
        Yaml::Null | Yaml::Bool(_) | Yaml::Number(_) => {}
    }
    Ok(())
}

fn expand_scalar(
    text: &str,
    values: &BTreeMap<String, Value>,
    file: &str,
) -> Result<Option<Yaml>, ExpandError> {
    if !text.contains('$') {
        return Ok(None);
    }
    let segments = segments(text, file)?;
    if let [Segment::Variable(name)] = segments.as_slice() {
        let value = resolve(name, values)?;
        let typed = serde_yaml::to_value(value).map_err(|e| ExpandError::TemplateSyntax {
            file: file.to_string(),
            message: e.to_string(),
        })?;
        return Ok(Some(typed));
    }
    Ok(Some(Yaml::String(join_segments(segments, values)?)))
}

fn interpolate(
    text: &str,
    values: &BTreeMap<String, Value>,
    file: &str,
) -> Result<String, ExpandError> {
    if !text.contains('$') {
        return Ok(text.to_string());
    }
    join_segments(segments(text, file)?, values)
}

fn segments(text: &str, file: &str) -> Result<Vec<Segment>, ExpandError> {
    parse_interpolation(text).map_err(|message| ExpandError::TemplateSyntax {
        file: file.to_string(),
        message,
    })
}

fn join_segments(
    segments: Vec<Segment>,
    values: &BTreeMap<String, Value>,
) -> Result<String, ExpandError> {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Literal(text) => out.push_str(&text),
            Segment::Variable(name) => out.push_str(&resolve(&name, values)?.to_string()),
        }
    }
    Ok(out)
}

fn resolve<'a>(name: &str, values: &'a BTreeMap<String, Value>) -> Result<&'a Value, ExpandError> {
    let mut parts = name.split('.');
    let missing = || ExpandError::MissingInput {
        name: name.to_string(),
    };
    let root = parts.next().ok_or_else(missing)?;
    let rest: Vec<&str> = parts.collect();
    values
        .get(root)
        .and_then(|value| value.lookup(&rest))
        .ok_or_else(missing)
}

/// Split expanded text into YAML documents on `---` lines.
///
/// Documents holding only blank lines or comments are dropped.
pub fn split_documents(text: &str) -> Vec<String> {
    let mut documents = Vec::new();
    let mut current = String::new();

    for line in text.split_inclusive('\n') {
        if line.trim_end() == "---" {
            documents.push(std::mem::take(&mut current));
        } else {
            current.push_str(line);
        }
    }
    documents.push(current);

    documents
        .into_iter()
        .filter(|doc| {
            doc.lines().any(|l| {
                let l = l.trim();
                !l.is_empty() && !l.starts_with('#')
            })
        })
        .collect()
}

impl TemplateExpander for InterpolationExpander {
    fn expand(
        &self,
        content: &ConceptContent,
        values: &ValueMap,
        format: TargetFormat,
    ) -> Result<Vec<String>, ExpandError> {
        let effective = self.effective_values(content, values)?;
        let template_root = content.template_root();
        let mut documents = Vec::new();

        for path in content.template_files()? {
            let display = path
                .strip_prefix(&template_root)
                .unwrap_or(&path)
                .display()
                .to_string();
            let source = std::fs::read_to_string(&path)?;
            self.check_syntax(&source, &display)?;

            for doc in split_documents(&source) {
                let syntax = |message: String| ExpandError::TemplateSyntax {
                    file: display.clone(),
                    message,
                };
                let mut parsed: Yaml =
                    serde_yaml::from_str(&doc).map_err(|e| syntax(e.to_string()))?;
                substitute(&mut parsed, &effective, &display)?;
                let body = format
                    .serialize_document(&parsed)
                    .map_err(|e| syntax(format!("{e:#}")))?;
                documents.push(body);
            }
        }

        tracing::debug!(
            "Expanded {} into {} documents",
            content.identifier,
            documents.len()
        );
        Ok(documents)
    }
}
