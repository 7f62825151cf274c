//! Theme loading functionality

use super::{RawTheme, Theme, ThemeError};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Bundled themes included with the application
const BUNDLED_THEMES: &[(&str, &str)] = &[
    ("one-dark", include_str!("../../themes/one-dark.toml")),
    (
        "github-light",
        include_str!("../../themes/github-light.toml"),
    ),
];

/// Theme loader responsible for finding and loading theme files
pub struct ThemeLoader {
    search_paths: Vec<PathBuf>,
}

impl ThemeLoader {
    /// Create a new theme loader with default search paths
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        if let Some(proj_dirs) = ProjectDirs::from("", "", "threadview") {
            // e.g. ~/.config/threadview/themes on Linux
            search_paths.push(proj_dirs.config_dir().join("themes"));
            search_paths.push(proj_dirs.data_dir().join("themes"));
        }

        Self { search_paths }
    }

    /// Add a custom search path
    pub fn add_search_path(&mut self, path: PathBuf) {
        self.search_paths.push(path);
    }

    /// Load a theme by name. `default` is the built-in theme.
    pub fn load_theme(&self, name: &str) -> Result<Theme, ThemeError> {
        if name == "default" {
            return Ok(Theme::default());
        }

        if let Some((_, content)) = BUNDLED_THEMES.iter().find(|(bundled, _)| *bundled == name) {
            let raw_theme: RawTheme = toml::from_str(content)?;
            return raw_theme.into_theme();
        }

        let theme_file = self.find_theme_file(name)?;
        debug!(target: "threadview.theme", path = %theme_file.display(), "Loading theme file");

        let content = fs::read_to_string(&theme_file)?;
        let raw_theme: RawTheme = toml::from_str(&content)?;

        if raw_theme.name.to_lowercase() != name.to_lowercase() {
            return Err(ThemeError::Validation(format!(
                "Theme name mismatch: expected '{}', found '{}'",
                name, raw_theme.name
            )));
        }

        raw_theme.into_theme()
    }

    /// Load a theme from a specific file path
    pub fn load_theme_from_path(&self, path: &Path) -> Result<Theme, ThemeError> {
        let content = fs::read_to_string(path)?;
        let raw_theme: RawTheme = toml::from_str(&content)?;
        raw_theme.into_theme()
    }

    /// List all available themes
    pub fn list_themes(&self) -> Vec<String> {
        let mut themes: Vec<String> = std::iter::once("default")
            .chain(BUNDLED_THEMES.iter().map(|(name, _)| *name))
            .map(str::to_string)
            .collect();

        for search_path in &self.search_paths {
            let Ok(entries) = fs::read_dir(search_path) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_file() || path.extension().is_none_or(|ext| ext != "toml") {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if !themes.iter().any(|t| t == stem) {
                        themes.push(stem.to_string());
                    }
                }
            }
        }

        themes.sort();
        themes
    }

    fn find_theme_file(&self, name: &str) -> Result<PathBuf, ThemeError> {
        let filename = format!("{name}.toml");

        self.search_paths
            .iter()
            .map(|dir| dir.join(&filename))
            .find(|path| path.exists())
            .ok_or_else(|| {
                ThemeError::Validation(format!(
                    "Theme '{name}' not found in bundled themes or filesystem"
                ))
            })
    }
}

impl Default for ThemeLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Component;
    use ratatui::style::Color;
    use tempfile::TempDir;

    #[test]
    fn test_load_theme_from_search_path() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("test-theme.toml"),
            r##"
name = "test-theme"

[palette]
background = "#282828"
foreground = "#ebdbb2"

[components]
markdown_paragraph = { fg = "foreground" }
"##,
        )
        .unwrap();

        let mut loader = ThemeLoader::new();
        loader.add_search_path(temp_dir.path().to_path_buf());

        let theme = loader.load_theme("test-theme").unwrap();
        assert_eq!(theme.name, "test-theme");
        assert_eq!(
            theme.style(Component::MarkdownParagraph).fg,
            Some(Color::Rgb(0xeb, 0xdb, 0xb2))
        );
    }

    #[test]
    fn test_name_mismatch_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("mine.toml"), "name = \"other\"\n").unwrap();

        let mut loader = ThemeLoader::new();
        loader.add_search_path(temp_dir.path().to_path_buf());

        assert!(matches!(
            loader.load_theme("mine"),
            Err(ThemeError::Validation(_))
        ));
    }

    #[test]
    fn test_bundled_themes_compile_with_critical_components() {
        let loader = ThemeLoader::new();
        let critical = [
            Component::ToolCallHeader,
            Component::ToolResultHeader,
            Component::MarkdownCodeHeader,
            Component::MarkdownCodeCopied,
            Component::MarkdownTableBorder,
            Component::ErrorText,
        ];

        for (name, content) in BUNDLED_THEMES {
            let raw: RawTheme = toml::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse theme '{name}': {e}"));
            assert!(
                raw.palette.contains_key("background"),
                "Theme '{name}' missing 'background' in palette"
            );

            let theme = loader
                .load_theme(name)
                .unwrap_or_else(|e| panic!("Failed to load theme '{name}': {e}"));
            for component in critical {
                assert!(
                    theme.styles.contains_key(&component),
                    "Theme '{name}' missing critical component: {component:?}"
                );
            }
        }
    }

    #[test]
    fn test_list_themes_includes_filesystem_and_bundled() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("theme1.toml"), "name = \"theme1\"\n").unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), "not a theme").unwrap();

        let mut loader = ThemeLoader::new();
        loader.add_search_path(temp_dir.path().to_path_buf());

        let themes = loader.list_themes();
        assert!(themes.contains(&"theme1".to_string()));
        assert!(themes.contains(&"one-dark".to_string()));
        assert!(themes.contains(&"default".to_string()));
        assert!(!themes.contains(&"notes".to_string()));
    }

    #[test]
    fn test_theme_not_found() {
        let loader = ThemeLoader::new();
        assert!(matches!(
            loader.load_theme("non-existent-theme"),
            Err(ThemeError::Validation(_))
        ));
    }
}
