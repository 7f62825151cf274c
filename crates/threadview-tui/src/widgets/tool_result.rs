use ratatui::text::{Line, Span};
use tracing::debug;

use crate::content::{DisplayDecision, VisibleSlice, classify_result};
use crate::model::ToolResultRecord;
use crate::theme::{Component, Theme};
use crate::widgets::helpers::{indent_lines, key_value_rows, wrap_marked_text};
use crate::widgets::markdown::{self, RenderContext};

const BODY_INDENT: usize = 2;
pub const COLLAPSE_LABEL: &str = "▲ collapse";
pub const EXPAND_LABEL: &str = "▼ expand";

/// One tool result and its expanded/collapsed state.
///
/// The visible slice is recomputed from the raw content on every call, so
/// toggling back and forth always returns the same slices.
#[derive(Debug, Clone)]
pub struct ToolResultView {
    record: ToolResultRecord,
    expanded: bool,
}

impl ToolResultView {
    /// Results start expanded.
    pub fn new(record: ToolResultRecord) -> Self {
        Self::with_expanded(record, true)
    }

    pub fn with_expanded(record: ToolResultRecord, expanded: bool) -> Self {
        Self { record, expanded }
    }

    pub fn record(&self) -> &ToolResultRecord {
        &self.record
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Flip between expanded and collapsed; returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.expanded = !self.expanded;
        debug!(
            target: "threadview.tool_result",
            tool_call_id = self.record.tool_call_id.as_deref().unwrap_or(""),
            expanded = self.expanded,
            "Toggled tool result"
        );
        self.expanded
    }

    pub fn decision(&self) -> DisplayDecision {
        classify_result(&self.record.content, self.expanded)
    }

    pub fn render(&self, ctx: &RenderContext<'_>, theme: &Theme, width: u16) -> Vec<Line<'static>> {
        let decision = self.decision();
        let inner_width = width.saturating_sub(BODY_INDENT as u16);

        let mut lines = vec![self.header(theme)];

        let body = match &decision.visible {
            VisibleSlice::Rows(rows) => key_value_rows(rows, theme, inner_width),
            VisibleSlice::Text(text) => {
                let ctx = ctx.with_width(Some(inner_width));
                wrap_marked_text(markdown::render(text, &ctx), inner_width)
            }
        };
        lines.extend(indent_lines(body, BODY_INDENT));

        if decision.show_toggle {
            let label = if self.expanded {
                COLLAPSE_LABEL
            } else {
                EXPAND_LABEL
            };
            lines.push(Line::from(vec![
                Span::raw(" ".repeat(BODY_INDENT)),
                Span::styled(label, theme.style(Component::ToolResultToggle)),
            ]));
        }

        lines
    }

    fn header(&self, theme: &Theme) -> Line<'static> {
        let header_style = theme.style(Component::ToolResultHeader);
        let mut spans = match &self.record.name {
            Some(name) => vec![
                Span::styled("Tool Result: ", header_style),
                Span::styled(format!(" {name} "), theme.style(Component::ToolResultName)),
            ],
            None => vec![Span::styled("Tool Result", header_style)],
        };
        if let Some(id) = &self.record.tool_call_id {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(id.clone(), theme.style(Component::ToolCallId)));
        }
        Line::from(spans)
    }
}
