//! The render entry points.
//!
//! [`Kable`] wires the registry, the resolver and the engine together and
//! turns the raw fields of a render request into rendered output.

use std::path::Path;
use std::sync::Arc;

use crate::concept::{ConceptIdentifier, ConceptResolver, ResolveMode};
use crate::config::{KableConfig, KablePaths};
use crate::error::{KableError, Result};
use crate::render::{FileRenderInfoSink, RenderEngine, RenderOptions, RenderedOutput, TargetFormat};
use crate::repositories::{Registry, SourceDescriptor};
use crate::values::ValueMap;

/// Raw fields of one render call.
#[derive(Debug, Clone, Default)]
pub struct RenderRequest {
    /// `<path>[@<source>]`, or a directory when rendering locally.
    pub identifier: String,
    pub inputs: Vec<(String, String)>,
    pub sensitive_inputs: Vec<(String, String)>,
    /// `yaml` or `json`. Empty selects the configured default.
    pub target: String,
    /// Sources registered before the concept is resolved.
    pub repositories: Vec<SourceDescriptor>,
    pub options: RenderOptions,
}

impl RenderRequest {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Default::default()
        }
    }

    pub fn input(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.inputs.push((name.into(), value.into()));
        self
    }

    pub fn sensitive_input(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.sensitive_inputs.push((name.into(), value.into()));
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn repository(mut self, source: SourceDescriptor) -> Self {
        self.repositories.push(source);
        self
    }

    pub fn options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }
}

/// Renders concepts against a registry.
///
/// # Example
///
/// ```no_run
/// use kable::{Kable, RenderRequest};
/// use kable::repositories::SourceDescriptor;
///
/// let kable = Kable::in_memory("/tmp/kable-repos");
/// let request = RenderRequest::new("apps/grafana@demo")
///     .repository(SourceDescriptor::new("demo", "https://example/demo-concepts"))
///     .input("instanceName", "test");
/// let output = kable.render_concept(&request).unwrap();
/// println!("{}", output.print());
/// ```
#[derive(Debug)]
pub struct Kable {
    registry: Registry,
    resolver: ConceptResolver,
    engine: RenderEngine,
    default_target: TargetFormat,
    always_record: bool,
}

impl Kable {
    pub fn new(registry: Registry, resolver: ConceptResolver, engine: RenderEngine) -> Self {
        Self {
            registry,
            resolver,
            engine,
            default_target: TargetFormat::default(),
            always_record: false,
        }
    }

    /// Non-persistent registry, git checkouts under `clone_dir`.
    pub fn in_memory(clone_dir: impl AsRef<Path>) -> Self {
        Self::new(
            Registry::in_memory(),
            ConceptResolver::with_git(clone_dir.as_ref()),
            RenderEngine::default(),
        )
    }

    /// Open the registry in the home directory and apply the config.
    pub fn open(paths: &KablePaths, config: &KableConfig) -> Result<Self> {
        let registry = Registry::open(&paths.registry_dir)?;
        let engine = RenderEngine::default()
            .with_sink(Arc::new(FileRenderInfoSink::new(&paths.render_info_dir)));

        Ok(Self::new(registry, ConceptResolver::with_git(&paths.clone_dir), engine)
            .with_default_target(config.default_target)
            .record_every_render(config.write_render_info))
    }

    pub fn with_default_target(mut self, target: TargetFormat) -> Self {
        self.default_target = target;
        self
    }

    /// Write render info even when a request does not ask for it.
    pub fn record_every_render(mut self, enabled: bool) -> Self {
        self.always_record = enabled;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render a concept.
    ///
    /// The request's sources are registered in one batch before resolution.
    /// Any failure aborts the call with no partial output.
    pub fn render_concept(&self, request: &RenderRequest) -> Result<RenderedOutput> {
        let mode = if request.options.local {
            ResolveMode::Local
        } else {
            ResolveMode::Registry
        };
        let identifier = if request.options.local {
            ConceptIdentifier::local(&request.identifier)
        } else {
            ConceptIdentifier::parse(&request.identifier)?
        };
        let format = self.target_format(&identifier, &request.target)?;
        // Inputs are checked before the registry is touched.
        let values = ValueMap::from_raw(&request.inputs, &request.sensitive_inputs)?;

        let mut modifications = Vec::new();
        for source in &request.repositories {
            modifications.extend(source.modifications()?);
        }
        self.registry.apply(modifications)?;
        tracing::debug!("Rendering {} with {:?}", identifier, values);

        let content = self.resolver.resolve(&identifier, &self.registry, mode)?;

        let mut options = request.options;
        options.write_render_info |= self.always_record;
        self.engine.render(&content, &values, format, &options)
    }

    /// Render the concept in directory `path` as a single document.
    pub fn render_local_concept(
        &self,
        path: impl AsRef<Path>,
        inputs: &[(String, String)],
        sensitive_inputs: &[(String, String)],
        target: &str,
    ) -> Result<RenderedOutput> {
        let request = RenderRequest {
            identifier: path.as_ref().to_string_lossy().into_owned(),
            inputs: inputs.to_vec(),
            sensitive_inputs: sensitive_inputs.to_vec(),
            target: target.to_string(),
            repositories: Vec::new(),
            options: RenderOptions {
                local: true,
                single: true,
                write_render_info: false,
            },
        };
        self.render_concept(&request)
    }

    fn target_format(&self, identifier: &ConceptIdentifier, target: &str) -> Result<TargetFormat> {
        if target.trim().is_empty() {
            return Ok(self.default_target);
        }
        target.parse().map_err(|e| KableError::RenderFailed {
            concept: identifier.to_string(),
            source: e,
        })
    }
}
