use async_trait::async_trait;
use eyre::Result;
use std::path::Path;
use threadview_tui::config::Config;
use threadview_tui::highlight::SyntectHighlighter;
use threadview_tui::theme::{Theme, ThemeLoader};
use tracing::debug;

use crate::error::Error;

pub mod copy;
pub mod render;
pub mod replay;
pub mod themes;

#[async_trait]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// Settings shared by every command: the loaded config plus global overrides.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub config: Config,
    pub theme_override: Option<String>,
}

impl Settings {
    /// Load the config from `path` if given, otherwise from the user config
    /// directory.
    pub fn load(path: Option<&Path>, theme_override: Option<String>) -> Result<Self, Error> {
        let config = match path {
            Some(path) => Config::load_from_path(path)
                .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?,
            None => Config::load()?,
        };
        debug!(target: "threadview::commands", ?config, "Loaded config");
        Ok(Self {
            config,
            theme_override,
        })
    }

    pub fn theme_name(&self) -> &str {
        self.theme_override
            .as_deref()
            .unwrap_or(&self.config.theme.name)
    }

    pub fn theme(&self) -> Result<Theme, Error> {
        let name = self.theme_name();
        ThemeLoader::new()
            .load_theme(name)
            .map_err(|e| Error::Config(format!("Failed to load theme '{name}': {e}")))
    }

    pub fn highlighter(&self) -> SyntectHighlighter {
        SyntectHighlighter::new(&self.config.theme.syntax_theme)
    }

    /// Width to render at: the explicit value, the terminal width, or the
    /// configured rule width when stdout is not a terminal.
    pub fn width(&self, explicit: Option<u16>) -> u16 {
        explicit
            .or_else(|| ratatui::crossterm::terminal::size().ok().map(|(cols, _)| cols))
            .filter(|cols| *cols > 0)
            .unwrap_or(self.config.render.rule_width)
    }
}
