use super::{Command, Settings};
use async_trait::async_trait;
use eyre::{Result, WrapErr};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::text::{Line, Text};
use ratatui::widgets::{Paragraph, Widget};
use ratatui::{Terminal, TerminalOptions, Viewport};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use threadview_tui::highlight::SyntectHighlighter;
use threadview_tui::theme::Theme;
use threadview_tui::widgets::helpers::wrap_marked_text;
use threadview_tui::widgets::{MarkdownStyles, RenderContext, markdown};
use threadview_tui::{Message, ThrottledText, Transcript};
use tracing::{debug, info};

pub struct ReplayCommand {
    pub settings: Settings,
    pub transcript: PathBuf,
    pub chunk_size: usize,
    pub chunk_delay_ms: u64,
    pub height: u16,
}

/// Counts for one replayed message.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    /// Values pushed into the throttle.
    pub updates: usize,
    /// Redraws caused by throttled emissions.
    pub renders: usize,
}

impl std::ops::AddAssign for ReplayStats {
    fn add_assign(&mut self, other: Self) {
        self.updates += other.updates;
        self.renders += other.renders;
    }
}

/// Markdown rendering for the live viewport.
pub struct MessageRenderer {
    styles: MarkdownStyles,
    highlighter: SyntectHighlighter,
}

impl MessageRenderer {
    pub fn new(theme: &Theme, highlighter: SyntectHighlighter) -> Self {
        Self {
            styles: MarkdownStyles::from_theme(theme),
            highlighter,
        }
    }

    pub fn lines(&self, text: &str, width: u16) -> Vec<Line<'static>> {
        let ctx = RenderContext::new(&self.styles, &self.highlighter).with_width(Some(width));
        wrap_marked_text(markdown::render(text, &ctx), width)
    }

    /// Draw the tail of `text` that fits the viewport.
    pub fn draw<B: Backend>(&self, terminal: &mut Terminal<B>, text: &str) -> io::Result<()> {
        terminal.draw(|frame| {
            let area = frame.area();
            let lines = self.lines(text, area.width);
            let skip = lines.len().saturating_sub(usize::from(area.height));
            let visible: Vec<Line<'static>> = lines.into_iter().skip(skip).collect();
            frame.render_widget(Paragraph::new(Text::from(visible)), area);
        })?;
        Ok(())
    }
}

#[async_trait]
impl Command for ReplayCommand {
    async fn execute(&self) -> Result<()> {
        let transcript = Transcript::load(&self.transcript)
            .wrap_err_with(|| format!("Failed to load {}", self.transcript.display()))?;
        let contents = assistant_contents(&transcript);
        if contents.is_empty() {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "No assistant messages to replay")?;
            return Ok(());
        }

        let renderer = MessageRenderer::new(&self.settings.theme()?, self.settings.highlighter());
        let mut terminal = Terminal::with_options(
            CrosstermBackend::new(io::stdout()),
            TerminalOptions {
                viewport: Viewport::Inline(self.height.max(1)),
            },
        )?;

        let mut totals = ReplayStats::default();
        for (idx, content) in contents.iter().enumerate() {
            let stats = self.replay_message(&mut terminal, &renderer, content).await?;
            let summary = format!(
                "message {}: {} updates, {} renders",
                idx + 1,
                stats.updates,
                stats.renders
            );
            terminal.insert_before(1, |buf| {
                Paragraph::new(summary.as_str()).render(buf.area, buf);
            })?;
            totals += stats;
        }
        terminal.clear()?;
        drop(terminal);

        info!(
            target: "threadview::replay",
            updates = totals.updates,
            renders = totals.renders,
            "Replay finished"
        );
        let mut stdout = io::stdout().lock();
        writeln!(
            stdout,
            "Replayed {} messages: {} updates, {} renders",
            contents.len(),
            totals.updates,
            totals.renders
        )?;
        Ok(())
    }
}

impl ReplayCommand {
    /// Stream `content` in chunks through a throttle, redrawing on every
    /// throttled emission until the full content is on screen.
    pub async fn replay_message<B: Backend + Send>(
        &self,
        terminal: &mut Terminal<B>,
        renderer: &MessageRenderer,
        content: &str,
    ) -> Result<ReplayStats> {
        let text = ThrottledText::spawn("", self.settings.config.throttle_interval());
        let mut displayed = text.subscribe();
        let mut chunks = chunk_text(content, self.chunk_size).into_iter();
        let mut ticker = tokio::time::interval(Duration::from_millis(self.chunk_delay_ms.max(1)));

        let mut stats = ReplayStats::default();
        let mut streamed = String::new();
        let mut shown = String::new();
        let mut sending = true;

        while sending || shown != content {
            tokio::select! {
                _ = ticker.tick(), if sending => {
                    match chunks.next() {
                        Some(chunk) => {
                            streamed.push_str(chunk);
                            text.update(streamed.clone());
                            stats.updates += 1;
                        }
                        None => sending = false,
                    }
                }
                changed = displayed.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    shown = displayed.borrow_and_update().clone();
                    renderer.draw(terminal, &shown)?;
                    stats.renders += 1;
                }
            }
        }

        text.dispose();
        debug!(
            target: "threadview::replay",
            updates = stats.updates,
            renders = stats.renders,
            "Replayed message"
        );
        Ok(stats)
    }
}

fn assistant_contents(transcript: &Transcript) -> Vec<&str> {
    transcript
        .messages
        .iter()
        .filter(|message| matches!(message, Message::Ai(_)))
        .map(Message::content)
        .filter(|content| !content.is_empty())
        .collect()
}

/// Split `text` into pieces of `size` characters, never inside a code point.
pub fn chunk_text(text: &str, size: usize) -> Vec<&str> {
    let size = size.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    for (count, (idx, _)) in text.char_indices().enumerate() {
        if count > 0 && count % size == 0 {
            chunks.push(&text[start..idx]);
            start = idx;
        }
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    #[test]
    fn chunks_respect_char_boundaries() {
        assert_eq!(chunk_text("abcdefg", 3), vec!["abc", "def", "g"]);
        assert_eq!(chunk_text("héllo", 2), vec!["hé", "ll", "o"]);
        assert_eq!(chunk_text("ab", 0), vec!["a", "b"]);
        assert!(chunk_text("", 4).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn replay_converges_with_fewer_renders_than_updates() {
        let command = ReplayCommand {
            settings: Settings::default(),
            transcript: PathBuf::from("unused.json"),
            chunk_size: 2,
            chunk_delay_ms: 5,
            height: 10,
        };
        let renderer = MessageRenderer::new(&Theme::default(), SyntectHighlighter::default());
        let mut terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
        let content = "Streaming **markdown** text arrives in small pieces.";

        let stats = command
            .replay_message(&mut terminal, &renderer, content)
            .await
            .unwrap();

        assert_eq!(stats.updates, chunk_text(content, 2).len());
        assert!(stats.renders >= 1);
        assert!(stats.renders < stats.updates);

        let buffer = terminal.backend().buffer();
        let screen: String = (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n");
        assert!(screen.contains("pieces."));
    }

    #[test]
    fn only_non_empty_assistant_messages_replay() {
        let transcript = Transcript::from_json(
            r#"[
                {"type": "human", "content": "hi"},
                {"type": "ai", "content": "", "tool_calls": [{"name": "t", "args": {}}]},
                {"type": "ai", "content": "done"}
            ]"#,
        )
        .unwrap();
        assert_eq!(assistant_contents(&transcript), vec!["done"]);
    }
}
