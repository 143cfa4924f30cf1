//! Configuration schema.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::render::TargetFormat;

/// Contents of `<home>/config.yml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KableConfig {
    /// Target format when a request does not name one.
    pub default_target: TargetFormat,

    /// Where sources are cloned. Relative paths are taken from the home dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clone_dir: Option<PathBuf>,

    /// Where render info records are written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_info_dir: Option<PathBuf>,

    /// Record render info for every render.
    pub write_render_info: bool,
}

/// Directories derived from the home dir and the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KablePaths {
    pub home: PathBuf,
    /// Holds `repositories.yml` and `auth.yml`.
    pub registry_dir: PathBuf,
    pub clone_dir: PathBuf,
    pub render_info_dir: PathBuf,
}

impl KablePaths {
    pub fn new(home: impl Into<PathBuf>, config: &KableConfig) -> Self {
        let home = home.into();
        let under_home = |p: &Option<PathBuf>, default: &str| match p {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => home.join(p),
            None => home.join(default),
        };

        Self {
            registry_dir: home.clone(),
            clone_dir: under_home(&config.clone_dir, "repos"),
            render_info_dir: under_home(&config.render_info_dir, "renderinfo"),
            home,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: KableConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, KableConfig::default());
        assert_eq!(config.default_target, TargetFormat::Yaml);
    }

    #[test]
    fn parses_all_fields() {
        let yaml = r#"
default_target: json
clone_dir: /var/cache/kable
render_info_dir: info
write_render_info: true
"#;
        let config: KableConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.default_target, TargetFormat::Json);
        assert!(config.write_render_info);
    }

    #[test]
    fn paths_default_under_home() {
        let paths = KablePaths::new("/home/me/.kable", &KableConfig::default());
        assert_eq!(paths.registry_dir, PathBuf::from("/home/me/.kable"));
        assert_eq!(paths.clone_dir, PathBuf::from("/home/me/.kable/repos"));
        assert_eq!(paths.render_info_dir, PathBuf::from("/home/me/.kable/renderinfo"));
    }

    #[test]
    fn relative_and_absolute_overrides() {
        let config = KableConfig {
            clone_dir: Some(PathBuf::from("/var/cache/kable")),
            render_info_dir: Some(PathBuf::from("info")),
            ..Default::default()
        };
        let paths = KablePaths::new("/home/me/.kable", &config);
        assert_eq!(paths.clone_dir, PathBuf::from("/var/cache/kable"));
        assert_eq!(paths.render_info_dir, PathBuf::from("/home/me/.kable/info"));
    }
}
