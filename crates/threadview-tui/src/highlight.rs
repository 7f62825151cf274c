//! Syntax highlighting for fenced code blocks.

use once_cell::sync::Lazy;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme as SyntaxTheme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use tracing::warn;

pub const DEFAULT_SYNTAX_THEME: &str = "base16-ocean.dark";

/// Lazy-loaded syntax set for highlighting
static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

/// Turns source text into styled lines, one per source line.
pub trait Highlighter {
    fn highlight(&self, code: &str, language: &str) -> Vec<Line<'static>>;
}

/// Convert a syntect style to ratatui style
fn syntect_style_to_ratatui(syntect_style: syntect::highlighting::Style) -> Style {
    let fg = Color::Rgb(
        syntect_style.foreground.r,
        syntect_style.foreground.g,
        syntect_style.foreground.b,
    );
    Style::default().fg(fg)
}

fn plain_lines(code: &str) -> Vec<Line<'static>> {
    code.split('\n')
        .map(|line| Line::from(line.to_string()))
        .collect()
}

/// Highlighter backed by syntect's bundled grammars and themes.
pub struct SyntectHighlighter {
    theme: SyntaxTheme,
}

impl SyntectHighlighter {
    /// Unknown theme names fall back to [`DEFAULT_SYNTAX_THEME`].
    pub fn new(theme_name: &str) -> Self {
        let theme = THEME_SET
            .themes
            .get(theme_name)
            .or_else(|| {
                warn!(
                    target: "threadview.highlight",
                    "Unknown syntax theme '{}', using {}", theme_name, DEFAULT_SYNTAX_THEME
                );
                THEME_SET.themes.get(DEFAULT_SYNTAX_THEME)
            })
            .cloned()
            .unwrap_or_default();
        Self { theme }
    }

    pub fn available_themes() -> Vec<String> {
        THEME_SET.themes.keys().cloned().collect()
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new(DEFAULT_SYNTAX_THEME)
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, language: &str) -> Vec<Line<'static>> {
        let Some(syntax) = SYNTAX_SET
            .find_syntax_by_token(language)
            .or_else(|| SYNTAX_SET.find_syntax_by_extension(language))
        else {
            return plain_lines(code);
        };

        let mut highlighter = HighlightLines::new(syntax, &self.theme);
        let mut lines = Vec::new();

        for line in LinesWithEndings::from(code) {
            let spans = match highlighter.highlight_line(line, &SYNTAX_SET) {
                Ok(ranges) => ranges
                    .into_iter()
                    .map(|(style, text)| {
                        Span::styled(
                            text.trim_end_matches(['\n', '\r']).to_string(),
                            syntect_style_to_ratatui(style),
                        )
                    })
                    .filter(|span| !span.content.is_empty())
                    .collect(),
                Err(e) => {
                    warn!(target: "threadview.highlight", "Highlighting failed: {}", e);
                    vec![Span::raw(line.trim_end_matches(['\n', '\r']).to_string())]
                }
            };
            lines.push(Line::from(spans));
        }

        // A trailing newline in the source leaves one empty final line.
        if code.is_empty() || code.ends_with('\n') {
            lines.push(Line::default());
        }

        lines
    }
}

/// Highlighter that returns the code unstyled.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn highlight(&self, code: &str, _language: &str) -> Vec<Line<'static>> {
        plain_lines(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn highlights_known_language_line_by_line() {
        let highlighter = SyntectHighlighter::default();
        let lines = highlighter.highlight("fn main() {\n    println!(\"hi\");\n}", "rust");

        assert_eq!(lines.len(), 3);
        assert_eq!(text(&lines[0]), "fn main() {");
        assert_eq!(text(&lines[1]), "    println!(\"hi\");");
        assert!(
            lines[0].spans.iter().any(|span| span.style.fg.is_some()),
            "expected colored spans"
        );
    }

    #[test]
    fn unknown_language_falls_back_to_plain() {
        let highlighter = SyntectHighlighter::default();
        let lines = highlighter.highlight("a\nb", "definitely-not-a-language");

        assert_eq!(lines.len(), 2);
        assert_eq!(text(&lines[1]), "b");
        assert!(lines[0].spans.iter().all(|span| span.style == Style::default()));
    }

    #[test]
    fn line_counts_match_between_highlighters() {
        let code = "x = 1\n\ny = 2\n";
        let syntect = SyntectHighlighter::new("no-such-theme").highlight(code, "py");
        let plain = PlainHighlighter.highlight(code, "py");

        assert_eq!(syntect.len(), plain.len());
        assert_eq!(plain.len(), 4);
    }
}
