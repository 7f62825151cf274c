use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::highlight::DEFAULT_SYNTAX_THEME;
use crate::throttle::DEFAULT_THROTTLE_INTERVAL;
use crate::widgets::code_block::DEFAULT_COPIED_DURATION;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub throttle_interval_ms: u64,
    pub copied_duration_ms: u64,
    pub tool_results_expanded: bool,
    pub rule_width: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub name: String,
    pub syntax_theme: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            throttle_interval_ms: DEFAULT_THROTTLE_INTERVAL.as_millis() as u64,
            copied_duration_ms: DEFAULT_COPIED_DURATION.as_millis() as u64,
            tool_results_expanded: true,
            rule_width: 80,
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            syntax_theme: DEFAULT_SYNTAX_THEME.to_string(),
        }
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "threadview").ok_or_else(|| {
            Error::Generic("Could not determine config directory".to_string())
        })?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load the config from disk, or return defaults if not found
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)?;
        match toml::from_str(&contents) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse config file at {:?}: {}. Using defaults.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Load a config file given explicitly; parse failures are errors.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.render.throttle_interval_ms)
    }

    pub fn copied_duration(&self) -> Duration {
        Duration::from_millis(self.render.copied_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.throttle_interval(), Duration::from_millis(100));
        assert_eq!(config.copied_duration(), Duration::from_millis(3000));
        assert!(config.render.tool_results_expanded);
        assert_eq!(config.render.rule_width, 80);
        assert_eq!(config.theme.name, "default");
        assert_eq!(config.theme.syntax_theme, "base16-ocean.dark");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[render]\nthrottle_interval_ms = 250\n\n[theme]\nname = \"one-dark\"\n",
        )
        .unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.throttle_interval(), Duration::from_millis(250));
        assert_eq!(config.copied_duration(), Duration::from_millis(3000));
        assert!(config.render.tool_results_expanded);
        assert_eq!(config.theme.name, "one-dark");
        assert_eq!(config.theme.syntax_theme, "base16-ocean.dark");
    }

    #[test]
    fn explicit_path_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[render\nthrottle_interval_ms = ").unwrap();

        assert!(matches!(
            Config::load_from_path(&path),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::load_from_path(&dir.path().join("missing.toml")),
            Err(Error::Io(_))
        ));
    }
}
