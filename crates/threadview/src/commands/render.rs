use super::{Command, Settings};
use crate::output::write_lines;
use async_trait::async_trait;
use eyre::{Result, WrapErr};
use std::path::PathBuf;
use std::time::Instant;
use threadview_tui::Transcript;
use threadview_tui::highlight::{Highlighter, PlainHighlighter};
use threadview_tui::widgets::{MarkdownStyles, RenderContext, TranscriptView};
use tracing::debug;

pub struct RenderCommand {
    pub settings: Settings,
    pub transcript: PathBuf,
    pub collapsed: bool,
    pub plain: bool,
    pub width: Option<u16>,
}

#[async_trait]
impl Command for RenderCommand {
    async fn execute(&self) -> Result<()> {
        let transcript = Transcript::load(&self.transcript)
            .wrap_err_with(|| format!("Failed to load {}", self.transcript.display()))?;

        let mut render_config = self.settings.config.render.clone();
        if self.collapsed {
            render_config.tool_results_expanded = false;
        }

        let theme = self.settings.theme()?;
        let styles = MarkdownStyles::from_theme(&theme);
        let syntect = self.settings.highlighter();
        let highlighter: &dyn Highlighter = if self.plain {
            &PlainHighlighter
        } else {
            &syntect
        };
        let ctx = RenderContext::new(&styles, highlighter);
        let width = self.settings.width(self.width);

        let view = TranscriptView::new(transcript, &render_config);
        let lines = view.render(&ctx, &theme, width, Instant::now());
        debug!(
            target: "threadview::render",
            messages = view.transcript().len(),
            lines = lines.len(),
            width,
            "Rendered transcript"
        );

        let mut stdout = std::io::stdout().lock();
        write_lines(&mut stdout, &lines, !self.plain)?;
        Ok(())
    }
}
