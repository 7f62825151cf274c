//! Whole-thread rendering.

use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use ratatui::text::{Line, Span};
use tracing::debug;

use crate::clipboard::ClipboardWriter;
use crate::config::RenderConfig;
use crate::content::classify_result;
use crate::model::{Message, Transcript};
use crate::theme::{Component, Theme};
use crate::widgets::code_block::{CopyButton, CopyOutcome, IgnoreReason};
use crate::widgets::helpers::{indent_lines, separator_line, wrap_marked_text};
use crate::widgets::markdown::{self, CodeBlock, RenderContext};
use crate::widgets::tool_calls::ToolCallsView;
use crate::widgets::tool_result::ToolResultView;

const BODY_INDENT: usize = 2;

/// A rendered conversation with per-message UI state.
///
/// Tool result expand state and copy buttons are keyed by message position.
#[derive(Debug)]
pub struct TranscriptView {
    transcript: Transcript,
    default_expanded: bool,
    expanded: HashMap<usize, bool>,
    copy_buttons: HashMap<(usize, usize), CopyButton>,
    copied_duration: Duration,
}

impl TranscriptView {
    pub fn new(transcript: Transcript, config: &RenderConfig) -> Self {
        Self {
            transcript,
            default_expanded: config.tool_results_expanded,
            expanded: HashMap::new(),
            copy_buttons: HashMap::new(),
            copied_duration: Duration::from_millis(config.copied_duration_ms),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_expanded(&self, position: usize) -> bool {
        self.expanded
            .get(&position)
            .copied()
            .unwrap_or(self.default_expanded)
    }

    /// Toggle the tool result at `position`. Returns the new state, or `None`
    /// when that message is not a tool result.
    pub fn toggle_tool_result(&mut self, position: usize) -> Option<bool> {
        let record = match self.transcript.messages.get(position)? {
            Message::Tool(record) => record.clone(),
            _ => return None,
        };
        let mut view = ToolResultView::with_expanded(record, self.is_expanded(position));
        let expanded = view.toggle();
        self.expanded.insert(position, expanded);
        Some(expanded)
    }

    /// Copyable code blocks in the message at `position`.
    ///
    /// For tool results only the currently visible prose counts.
    pub fn code_blocks(&self, position: usize) -> Vec<CodeBlock> {
        match self.transcript.messages.get(position) {
            None => Vec::new(),
            Some(Message::Tool(record)) => {
                classify_result(&record.content, self.is_expanded(position))
                    .text()
                    .map(markdown::extract_code_blocks)
                    .unwrap_or_default()
            }
            Some(message) => markdown::extract_code_blocks(message.content()),
        }
    }

    pub fn copy_code_block(
        &mut self,
        position: usize,
        block: usize,
        clipboard: &mut dyn ClipboardWriter,
        now: Instant,
    ) -> CopyOutcome {
        let Some(code_block) = self.code_blocks(position).into_iter().nth(block) else {
            debug!(target: "threadview.copy", position, block, "No such code block");
            return CopyOutcome::Ignored(IgnoreReason::UnknownBlock);
        };
        let duration = self.copied_duration;
        self.copy_buttons
            .entry((position, block))
            .or_insert_with(|| CopyButton::new(duration))
            .activate(&code_block.code, clipboard, now)
    }

    fn copied_blocks(&self, position: usize, now: Instant) -> BTreeSet<usize> {
        self.copy_buttons
            .iter()
            .filter(|((pos, _), button)| *pos == position && button.is_copied(now))
            .map(|((_, block), _)| *block)
            .collect()
    }

    /// Render every message for a terminal of `width` columns.
    pub fn render(
        &self,
        ctx: &RenderContext<'_>,
        theme: &Theme,
        width: u16,
        now: Instant,
    ) -> Vec<Line<'static>> {
        let inner_width = width.saturating_sub(BODY_INDENT as u16);
        let mut lines = Vec::new();

        for (position, message) in self.transcript.messages.iter().enumerate() {
            if position > 0 {
                lines.push(separator_line(usize::from(width), theme.dim_text()));
            }

            let body = match message {
                Message::Tool(record) => {
                    lines.push(Self::role_line("Tool", Component::SystemMessageRole, theme));
                    let copied = self.copied_blocks(position, now);
                    let view =
                        ToolResultView::with_expanded(record.clone(), self.is_expanded(position));
                    view.render(&ctx.with_copied_blocks(&copied), theme, inner_width)
                }
                Message::Human(_) => {
                    lines.push(Self::role_line("You", Component::UserMessageRole, theme));
                    self.markdown_body(position, message.content(), ctx, inner_width, now)
                }
                Message::System(_) => {
                    lines.push(Self::role_line("System", Component::SystemMessageRole, theme));
                    self.markdown_body(position, message.content(), ctx, inner_width, now)
                }
                Message::Ai(_) => {
                    lines.push(Self::role_line(
                        "Assistant",
                        Component::AssistantMessageRole,
                        theme,
                    ));
                    let mut body =
                        self.markdown_body(position, message.content(), ctx, inner_width, now);
                    let calls = message.tool_calls();
                    if !calls.is_empty() && !body.is_empty() {
                        body.push(Line::default());
                    }
                    body.extend(ToolCallsView::render(Some(calls), theme, inner_width));
                    body
                }
            };

            lines.extend(indent_lines(body, BODY_INDENT));
        }

        lines
    }

    fn markdown_body(
        &self,
        position: usize,
        content: &str,
        ctx: &RenderContext<'_>,
        width: u16,
        now: Instant,
    ) -> Vec<Line<'static>> {
        if content.trim().is_empty() {
            return Vec::new();
        }
        let copied = self.copied_blocks(position, now);
        let ctx = ctx.with_copied_blocks(&copied).with_width(Some(width));
        wrap_marked_text(markdown::render(content, &ctx), width)
    }

    fn role_line(label: &'static str, component: Component, theme: &Theme) -> Line<'static> {
        Line::from(Span::styled(label, theme.style(component)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::highlight::PlainHighlighter;
    use crate::widgets::code_block::{COPIED_LABEL, COPY_LABEL};
    use crate::widgets::helpers::line_text;
    use crate::widgets::markdown::MarkdownStyles;
    use crate::widgets::tool_result::EXPAND_LABEL;
    use serde_json::json;

    fn transcript() -> Transcript {
        Transcript::from_json(
            &json!([
                {"type": "human", "content": "Show me the numbers"},
                {
                    "type": "ai",
                    "content": "Fetching.\n\n```python\nprint(list(range(8)))\n```",
                    "tool_calls": [{"name": "numbers", "args": {}, "id": "call_1"}]
                },
                {"type": "tool", "name": "numbers", "tool_call_id": "call_1", "content": "[0,1,2,3,4,5,6,7]"}
            ])
            .to_string(),
        )
        .unwrap()
    }

    fn render_texts(view: &TranscriptView, now: Instant) -> Vec<String> {
        let theme = Theme::default();
        let styles = MarkdownStyles::from_theme(&theme);
        let ctx = RenderContext::new(&styles, &PlainHighlighter);
        view.render(&ctx, &theme, 60, now)
            .iter()
            .map(line_text)
            .collect()
    }

    #[test]
    fn renders_roles_bodies_calls_and_results() {
        let view = TranscriptView::new(transcript(), &RenderConfig::default());
        let lines = render_texts(&view, Instant::now());

        assert_eq!(lines[0], "You");
        assert_eq!(lines[1], "  Show me the numbers");
        assert!(lines.contains(&"Assistant".to_string()));
        assert!(lines.contains(&"  ⚙ numbers  call_1".to_string()));
        assert!(lines.contains(&"    {}".to_string()));
        assert!(lines.contains(&"  Tool Result:  numbers   call_1".to_string()));
        assert!(lines.contains(&"    7  7".to_string()));
        assert_eq!(lines.iter().filter(|line| line.starts_with('─')).count(), 2);
    }

    #[test]
    fn collapsed_config_starts_results_collapsed() {
        let config = RenderConfig {
            tool_results_expanded: false,
            ..RenderConfig::default()
        };
        let mut view = TranscriptView::new(transcript(), &config);
        let now = Instant::now();

        let lines = render_texts(&view, now);
        assert!(!lines.contains(&"    7  7".to_string()));
        assert!(lines.contains(&format!("    {EXPAND_LABEL}")));

        assert_eq!(view.toggle_tool_result(2), Some(true));
        assert!(render_texts(&view, now).contains(&"    7  7".to_string()));
        assert_eq!(view.toggle_tool_result(0), None);
        assert_eq!(view.toggle_tool_result(99), None);
    }

    #[test]
    fn copy_marks_only_that_block() {
        let mut view = TranscriptView::new(transcript(), &RenderConfig::default());
        let mut clipboard = MemoryClipboard::default();
        let now = Instant::now();

        assert_eq!(view.code_blocks(1).len(), 1);
        assert!(view.code_blocks(2).is_empty());
        assert!(matches!(
            view.copy_code_block(1, 0, &mut clipboard, now),
            CopyOutcome::Copied { .. }
        ));
        assert_eq!(clipboard.contents.as_deref(), Some("print(list(range(8)))"));
        assert_eq!(
            view.copy_code_block(0, 0, &mut clipboard, now),
            CopyOutcome::Ignored(IgnoreReason::UnknownBlock)
        );

        let lines = render_texts(&view, now);
        assert!(lines.iter().any(|line| line.contains(COPIED_LABEL)));

        let later = render_texts(&view, now + Duration::from_secs(4));
        assert!(later.iter().any(|line| line.contains(COPY_LABEL)));
    }

    #[test]
    fn tool_result_code_blocks_are_copyable() {
        let transcript = Transcript::from_json(
            &json!([{
                "type": "tool",
                "name": "build",
                "content": "Output:\n\n```rust\nfn main() {}\n```"
            }])
            .to_string(),
        )
        .unwrap();
        let mut view = TranscriptView::new(transcript, &RenderConfig::default());
        let mut clipboard = MemoryClipboard::default();
        let now = Instant::now();

        let lines = render_texts(&view, now);
        assert!(lines.iter().any(|line| line.contains(COPY_LABEL)));
        assert_eq!(view.code_blocks(0).len(), 1);

        assert!(matches!(
            view.copy_code_block(0, 0, &mut clipboard, now),
            CopyOutcome::Copied { .. }
        ));
        assert_eq!(clipboard.contents.as_deref(), Some("fn main() {}"));

        let lines = render_texts(&view, now);
        assert!(lines.iter().any(|line| line.contains(COPIED_LABEL)));
    }
}
