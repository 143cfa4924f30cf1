//! Configuration discovery and loading.

use std::fs;
use std::path::{Path, PathBuf};

use super::schema::KableConfig;
use crate::error::{KableError, Result};

/// Environment variable overriding the home directory.
pub const HOME_ENV: &str = "KABLE_HOME";

/// Name of the config file inside the home directory.
pub const CONFIG_FILE: &str = "config.yml";

/// Find the kable home directory.
///
/// Resolution order:
/// 1. An explicit path (the `--home` flag)
/// 2. `KABLE_HOME`
/// 3. `~/.kable`
pub fn resolve_home(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(env) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(env);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".kable")
}

/// Load `<home>/config.yml`. A missing file yields the defaults.
pub fn load_config(home: &Path) -> Result<KableConfig> {
    let path = home.join(CONFIG_FILE);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(KableConfig::default()),
        Err(e) => return Err(KableError::Io(e)),
    };

    parse_config(&content, &path)
}

/// Parse YAML content into a [`KableConfig`].
pub fn parse_config(content: &str, source_path: &Path) -> Result<KableConfig> {
    if content.trim().is_empty() {
        return Ok(KableConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| KableError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::TargetFormat;
    use tempfile::TempDir;

    #[test]
    fn explicit_home_wins() {
        assert_eq!(
            resolve_home(Some(Path::new("/opt/kable"))),
            PathBuf::from("/opt/kable")
        );
    }

    #[test]
    fn missing_config_is_default() {
        let temp = TempDir::new().unwrap();
        assert_eq!(load_config(temp.path()).unwrap(), KableConfig::default());
    }

    #[test]
    fn empty_config_is_default() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "\n").unwrap();
        assert_eq!(load_config(temp.path()).unwrap(), KableConfig::default());
    }

    #[test]
    fn loads_config_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "default_target: json\n").unwrap();
        assert_eq!(
            load_config(temp.path()).unwrap().default_target,
            TargetFormat::Json
        );
    }

    #[test]
    fn invalid_config_reports_path() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "default_target: toml\n").unwrap();
        let err = load_config(temp.path()).unwrap_err();
        assert!(matches!(err, KableError::ConfigParseError { .. }));
        assert!(err.to_string().contains("config.yml"));
    }
}
