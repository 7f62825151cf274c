use ratatui::{
    style::Style,
    text::{Line, Span},
};
use unicode_width::UnicodeWidthStr;

use crate::content::{CellDecision, TableRow};
use crate::theme::{Component, Theme};
use crate::widgets::markdown::MarkedText;

/// Unstyled content of a line.
pub fn line_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|span| span.content.as_ref()).collect()
}

/// Create a separator line
pub fn separator_line(width: usize, style: Style) -> Line<'static> {
    Line::from(Span::styled("─".repeat(width), style))
}

/// Wrap a styled line while preserving span styles.
///
/// Breaks at spaces. Continuation lines are indented by `indent` columns so
/// they line up with text after a list marker.
pub fn style_wrap_with_indent(line: Line<'_>, max_width: u16, indent: usize) -> Vec<Line<'static>> {
    let max_width = usize::from(max_width.max(1));
    let indent = if indent >= max_width { 0 } else { indent };
    let line_style = line.style;

    let mut output_lines = Vec::new();
    let mut current_spans: Vec<Span<'static>> = Vec::new();
    let mut current_width = 0;
    // Width already taken before the first word of the current line.
    let mut line_start = 0;

    for span in line.spans {
        let style = span.style;
        for word in span.content.as_ref().split_inclusive(' ') {
            let word_width = word.width();

            if current_width > line_start && current_width + word_width > max_width {
                output_lines.push(Line::from(std::mem::take(&mut current_spans)).style(line_style));
                current_spans.push(Span::raw(" ".repeat(indent)));
                current_width = indent;
                line_start = indent;
            }

            current_spans.push(Span::styled(word.to_string(), style));
            current_width += word_width;
        }
    }

    if !current_spans.is_empty() {
        output_lines.push(Line::from(current_spans).style(line_style));
    }

    if output_lines.is_empty() {
        output_lines.push(Line::default().style(line_style));
    }

    output_lines
}

/// Lay out rendered markdown for a given width. Code lines are never wrapped.
pub fn wrap_marked_text(marked: MarkedText, width: u16) -> Vec<Line<'static>> {
    let mut lines = Vec::with_capacity(marked.lines.len());
    for marked_line in marked.lines {
        if marked_line.no_wrap {
            lines.push(marked_line.line);
        } else {
            lines.extend(style_wrap_with_indent(
                marked_line.line,
                width,
                marked_line.indent_level,
            ));
        }
    }
    lines
}

/// Prefix every line with `indent` spaces.
pub fn indent_lines(lines: Vec<Line<'static>>, indent: usize) -> Vec<Line<'static>> {
    if indent == 0 {
        return lines;
    }
    lines
        .into_iter()
        .map(|mut line| {
            line.spans.insert(0, Span::raw(" ".repeat(indent)));
            line
        })
        .collect()
}

/// Render key/value rows as two aligned columns.
///
/// Scalar values wrap within the value column; JSON blocks keep their own
/// line structure and are indented under the value column.
pub fn key_value_rows(rows: &[TableRow], theme: &Theme, width: u16) -> Vec<Line<'static>> {
    let key_style = theme.style(Component::ToolArgKey);
    let value_style = theme.style(Component::ToolArgValue);
    let json_style = theme.style(Component::ToolArgJson);

    let key_width = rows.iter().map(|row| row.key.width()).max().unwrap_or(0);
    let value_column = key_width + 2;
    let value_width = usize::from(width).saturating_sub(value_column).max(8);
    let pad = " ".repeat(value_column);

    let mut lines = Vec::new();
    for row in rows {
        let key = format!("{:<width$}  ", row.key, width = key_width);
        let (chunks, style): (Vec<String>, Style) = match &row.value {
            CellDecision::Scalar(text) => (wrap_scalar(text, value_width), value_style),
            CellDecision::JsonBlock(json) => (json.split('\n').map(str::to_string).collect(), json_style),
        };

        for (idx, chunk) in chunks.into_iter().enumerate() {
            let lead = if idx == 0 {
                Span::styled(key.clone(), key_style)
            } else {
                Span::raw(pad.clone())
            };
            lines.push(Line::from(vec![lead, Span::styled(chunk, style)]));
        }
    }
    lines
}

fn wrap_scalar(text: &str, width: usize) -> Vec<String> {
    let wrapped: Vec<String> = text
        .split('\n')
        .flat_map(|line| {
            if line.is_empty() {
                vec![String::new()]
            } else {
                textwrap::wrap(line, width)
                    .into_iter()
                    .map(|s| s.into_owned())
                    .collect()
            }
        })
        .collect();
    if wrapped.is_empty() {
        vec![String::new()]
    } else {
        wrapped
    }
}
