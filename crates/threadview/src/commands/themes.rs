use super::{Command, Settings};
use async_trait::async_trait;
use eyre::Result;
use std::io::Write;
use threadview_tui::highlight::SyntectHighlighter;
use threadview_tui::theme::ThemeLoader;

pub struct ThemesCommand {
    pub settings: Settings,
}

#[async_trait]
impl Command for ThemesCommand {
    async fn execute(&self) -> Result<()> {
        let current = self.settings.theme_name();
        let mut stdout = std::io::stdout().lock();

        writeln!(stdout, "Themes:")?;
        for name in ThemeLoader::new().list_themes() {
            let marker = if name == current { "*" } else { " " };
            writeln!(stdout, "{marker} {name}")?;
        }

        writeln!(stdout, "\nSyntax themes:")?;
        let mut syntax_themes = SyntectHighlighter::available_themes();
        syntax_themes.sort();
        for name in syntax_themes {
            let marker = if name == self.settings.config.theme.syntax_theme {
                "*"
            } else {
                " "
            };
            writeln!(stdout, "{marker} {name}")?;
        }
        Ok(())
    }
}
