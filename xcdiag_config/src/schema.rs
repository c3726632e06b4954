use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use xcdiag_extract::{DEFAULT_LOG_EXTENSION, ExtractionConfig};

/// `xcdiag init` output. Must stay equal to `Config::default()`.
pub const CONFIG_TEMPLATE: &str = r#"{
  "derived_data": {
    "path": "~/Library/Developer/Xcode/DerivedData",
    "log_extension": "xcactivitylog"
  },
  "extraction": {
    "max_entries": 500,
    "max_context_lines": 12,
    "debug_info": true,
    "concurrency_context_lines": 20,
    "extra_rules": []
  },
  "logging": {
    "level": "info"
  }
}"#;

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub derived_data: DerivedDataConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct DerivedDataConfig {
    /// Root holding one `Name-<hash>` directory per project; `~` is expanded.
    #[serde(default = "DerivedDataConfig::default_path")]
    pub path: String,
    #[serde(default = "DerivedDataConfig::default_log_extension")]
    pub log_extension: String,
}

impl Default for DerivedDataConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
            log_extension: Self::default_log_extension(),
        }
    }
}

impl DerivedDataConfig {
    fn default_path() -> String {
        "~/Library/Developer/Xcode/DerivedData".to_string()
    }

    fn default_log_extension() -> String {
        DEFAULT_LOG_EXTENSION.to_string()
    }

    pub fn root(&self) -> anyhow::Result<PathBuf> {
        expand_tilde(&self.path)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
    /// Append logs here instead of stderr.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            file: None,
        }
    }
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

/// Replace a leading `~` with the home directory.
pub fn expand_tilde(path: &str) -> anyhow::Result<PathBuf> {
    let home = || dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot find home directory"));
    if path == "~" {
        return home();
    }
    match path.strip_prefix("~/") {
        Some(rest) => Ok(home()?.join(rest)),
        None => Ok(PathBuf::from(path)),
    }
}

impl Config {
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("xcdiag"))
    }

    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load `~/xcdiag/config.json`, falling back to defaults when it does not
    /// exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from(&config_path)
    }

    /// Load an explicit config file. Unlike [`Config::load`], a missing file
    /// is an error.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            anyhow::bail!("Config file not found at: {}", path.display());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {e}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    /// Write [`CONFIG_TEMPLATE`] to `~/xcdiag/config.json`.
    pub fn create_config() -> anyhow::Result<PathBuf> {
        let config_path = Self::ensure_config_dir()?.join("config.json");
        Self::create_config_at(&config_path)?;
        Ok(config_path)
    }

    /// Write [`CONFIG_TEMPLATE`] to `path`, refusing to overwrite.
    pub fn create_config_at(path: &Path) -> anyhow::Result<()> {
        if path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                path.display()
            );
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, CONFIG_TEMPLATE)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("xcdiag_config_{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn template_matches_defaults() {
        let parsed: Config = serde_json::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let parsed: Config =
            serde_json::from_str(r#"{"extraction": {"max_entries": 50}}"#).unwrap();
        assert_eq!(parsed.extraction.max_entries, 50);
        assert_eq!(parsed.extraction.max_context_lines, 12);
        assert_eq!(parsed.derived_data.log_extension, "xcactivitylog");
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn extra_rules_deserialize() {
        let parsed: Config = serde_json::from_str(
            r#"{"extraction": {"extra_rules": [
                {"name": "linker", "pattern": "^ld: (?P<msg>.+)$", "kind": "error", "category": "linker"}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(parsed.extraction.extra_rules.len(), 1);
        assert_eq!(parsed.extraction.extra_rules[0].name, "linker");
    }

    #[test]
    fn create_refuses_to_overwrite() {
        let dir = temp_dir();
        let path = dir.join("config.json");
        Config::create_config_at(&path).unwrap();
        assert!(Config::create_config_at(&path).is_err());
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_from_missing_file_fails() {
        let dir = temp_dir();
        assert!(Config::load_from(&dir.join("absent.json")).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn tilde_is_expanded() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_tilde("~/x").unwrap(), home.join("x"));
        assert_eq!(expand_tilde("~").unwrap(), home);
        assert_eq!(expand_tilde("/abs/path").unwrap(), PathBuf::from("/abs/path"));
    }
}
