use ratatui::text::{Line, Span};

use crate::content::TableRow;
use crate::model::ToolCallRecord;
use crate::theme::{Component, Theme};
use crate::widgets::helpers::{indent_lines, key_value_rows};

const ARGS_INDENT: usize = 2;
pub const EMPTY_ARGS: &str = "{}";

/// Renders the tool calls requested by one assistant message.
pub struct ToolCallsView;

impl ToolCallsView {
    /// Lines for every call in order; nothing for an absent or empty list.
    pub fn render(
        tool_calls: Option<&[ToolCallRecord]>,
        theme: &Theme,
        width: u16,
    ) -> Vec<Line<'static>> {
        let Some(tool_calls) = tool_calls else {
            return Vec::new();
        };

        let mut lines = Vec::new();
        for (idx, call) in tool_calls.iter().enumerate() {
            if idx > 0 {
                lines.push(Line::default());
            }
            lines.extend(Self::render_call(call, theme, width));
        }
        lines
    }

    fn render_call(call: &ToolCallRecord, theme: &Theme, width: u16) -> Vec<Line<'static>> {
        let mut header = vec![Span::styled(
            format!("⚙ {}", call.name),
            theme.style(Component::ToolCallHeader),
        )];
        if let Some(id) = &call.id {
            header.push(Span::raw("  "));
            header.push(Span::styled(id.clone(), theme.style(Component::ToolCallId)));
        }

        let mut lines = vec![Line::from(header)];

        if call.args.is_empty() {
            lines.push(Line::from(vec![
                Span::raw(" ".repeat(ARGS_INDENT)),
                Span::styled(EMPTY_ARGS, theme.style(Component::ToolEmptyArgs)),
            ]));
            return lines;
        }

        let rows: Vec<TableRow> = call
            .args
            .iter()
            .map(|(key, value)| TableRow::new(key.as_str(), value))
            .collect();
        let inner_width = width.saturating_sub(ARGS_INDENT as u16);
        lines.extend(indent_lines(
            key_value_rows(&rows, theme, inner_width),
            ARGS_INDENT,
        ));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::helpers::line_text;
    use serde_json::json;

    fn call(value: serde_json::Value) -> ToolCallRecord {
        serde_json::from_value(value).unwrap()
    }

    fn texts(lines: &[Line<'_>]) -> Vec<String> {
        lines.iter().map(line_text).collect()
    }

    #[test]
    fn absent_or_empty_list_renders_nothing() {
        let theme = Theme::default();
        assert!(ToolCallsView::render(None, &theme, 80).is_empty());
        assert!(ToolCallsView::render(Some(&[][..]), &theme, 80).is_empty());
    }

    #[test]
    fn empty_args_show_indicator_instead_of_table() {
        let calls = vec![call(json!({"name": "get_time", "args": {}, "id": "call_9"}))];
        let lines = ToolCallsView::render(Some(calls.as_slice()), &Theme::default(), 80);

        assert_eq!(texts(&lines), vec!["⚙ get_time  call_9", "  {}"]);
        assert_eq!(
            lines[1].spans[1].style,
            Theme::default().style(Component::ToolEmptyArgs)
        );
    }

    #[test]
    fn args_render_as_rows_in_key_order() {
        let calls = vec![
            call(json!({
                "name": "search",
                "args": {"query": "rust", "filters": "{\"lang\": \"en\"}", "limit": 5}
            })),
            call(json!({"name": "noop", "args": null})),
        ];
        let lines = ToolCallsView::render(Some(calls.as_slice()), &Theme::default(), 80);

        assert_eq!(
            texts(&lines),
            vec![
                "⚙ search",
                "  query    rust",
                "  filters  {",
                "             \"lang\": \"en\"",
                "           }",
                "  limit    5",
                "",
                "⚙ noop",
                "  {}",
            ]
        );
    }
}
