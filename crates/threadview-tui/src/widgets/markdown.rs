//! Theme-aware markdown renderer
//!
//! Markdown is turned into styled ratatui lines with wrap metadata. Every
//! element kind maps to a fixed style from [`MarkdownStyles`]; fenced code
//! blocks that name a language are the one special case and get a header
//! bar with a copy label plus syntax highlighted lines.

use std::collections::BTreeSet;

use itertools::{Itertools, Position};
use once_cell::sync::Lazy;
use pulldown_cmark::{Alignment, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use regex::Regex;
use tracing::{debug, instrument};
use unicode_width::UnicodeWidthStr;

use crate::highlight::Highlighter;
use crate::theme::{Component, Theme};
use crate::widgets::code_block;

/// Width of horizontal rules when the caller gives none.
pub const DEFAULT_RULE_WIDTH: u16 = 80;

static LANGUAGE_TAG: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^(\w+)").ok());

static NO_COPIED_BLOCKS: BTreeSet<usize> = BTreeSet::new();

/// A line with metadata about how it should be rendered
#[derive(Debug, Clone)]
pub struct MarkedLine {
    pub line: Line<'static>,
    pub no_wrap: bool,       // If true, this line should not be wrapped
    pub indent_level: usize, // Number of spaces to indent when wrapping
}

impl MarkedLine {
    pub fn new(line: Line<'static>) -> Self {
        Self {
            line,
            no_wrap: false,
            indent_level: 0,
        }
    }

    pub fn new_no_wrap(line: Line<'static>) -> Self {
        Self {
            line,
            no_wrap: true,
            indent_level: 0,
        }
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent_level = indent;
        self
    }
}

/// A fenced code block that carries a language and can be copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub index: usize,
    pub language: String,
    pub code: String,
}

/// Markdown text with metadata
#[derive(Debug, Default)]
pub struct MarkedText {
    pub lines: Vec<MarkedLine>,
    /// Copyable code blocks in document order.
    pub code_blocks: Vec<CodeBlock>,
}

impl MarkedText {
    pub fn height(&self) -> usize {
        self.lines.len()
    }

    /// Unstyled text of every line.
    pub fn plain_lines(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|marked| {
                marked
                    .line
                    .spans
                    .iter()
                    .map(|span| span.content.as_ref())
                    .collect()
            })
            .collect()
    }
}

/// Markdown styles that can be customized via the theme
#[derive(Debug, Clone)]
pub struct MarkdownStyles {
    pub h1: Style,
    pub h2: Style,
    pub h3: Style,
    pub h4: Style,
    pub h5: Style,
    pub h6: Style,
    pub paragraph: Style,
    pub emphasis: Style,
    pub strong: Style,
    pub strikethrough: Style,
    pub superscript: Style,
    pub subscript: Style,
    pub blockquote: Style,
    pub code: Style,
    pub code_block: Style,
    pub code_header: Style,
    pub code_copy: Style,
    pub code_copied: Style,
    pub math: Style,
    pub link: Style,
    pub list_marker: Style,
    pub list_number: Style,
    pub rule: Style,
    pub table_border: Style,
    pub table_header: Style,
    pub table_cell: Style,
    pub task_checked: Style,
    pub task_unchecked: Style,
}

impl MarkdownStyles {
    /// Create markdown styles from a theme
    pub fn from_theme(theme: &Theme) -> Self {
        Self {
            // Headings - add semantic modifiers on top of theme colors
            h1: theme
                .style(Component::MarkdownH1)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED),
            h2: theme
                .style(Component::MarkdownH2)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            h3: theme
                .style(Component::MarkdownH3)
                .add_modifier(Modifier::BOLD),
            h4: theme
                .style(Component::MarkdownH4)
                .add_modifier(Modifier::UNDERLINED),
            h5: theme
                .style(Component::MarkdownH5)
                .add_modifier(Modifier::ITALIC),
            h6: theme
                .style(Component::MarkdownH6)
                .add_modifier(Modifier::ITALIC),
            paragraph: theme.style(Component::MarkdownParagraph),

            // Text modifiers are purely semantic
            emphasis: Style::default().add_modifier(Modifier::ITALIC),
            strong: Style::default().add_modifier(Modifier::BOLD),
            strikethrough: Style::default().add_modifier(Modifier::CROSSED_OUT),
            superscript: theme.style(Component::MarkdownSuperscript),
            subscript: theme
                .style(Component::MarkdownSuperscript)
                .add_modifier(Modifier::DIM),

            blockquote: theme
                .style(Component::MarkdownBlockquote)
                .add_modifier(Modifier::ITALIC),
            code: theme.style(Component::MarkdownCode),
            code_block: theme.style(Component::MarkdownCodeBlock),
            code_header: theme.style(Component::MarkdownCodeHeader),
            code_copy: theme.style(Component::MarkdownCodeCopy),
            code_copied: theme.style(Component::MarkdownCodeCopied),
            math: theme.style(Component::MarkdownMath),
            link: theme
                .style(Component::MarkdownLink)
                .add_modifier(Modifier::UNDERLINED),
            list_marker: theme.style(Component::MarkdownListBullet),
            list_number: theme.style(Component::MarkdownListNumber),
            rule: theme.style(Component::MarkdownRule),
            table_border: theme.style(Component::MarkdownTableBorder),
            table_header: theme.style(Component::MarkdownTableHeader),
            table_cell: theme.style(Component::MarkdownTableCell),
            task_checked: theme.style(Component::MarkdownTaskChecked),
            task_unchecked: theme.style(Component::MarkdownTaskUnchecked),
        }
    }
}

/// Everything the renderer reads besides the markdown text itself.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub styles: &'a MarkdownStyles,
    pub highlighter: &'a dyn Highlighter,
    /// Indices of code blocks whose copy label should read "copied".
    pub copied_blocks: &'a BTreeSet<usize>,
    /// Width used for full-width elements like rules and code headers.
    pub width: Option<u16>,
}

impl<'a> RenderContext<'a> {
    pub fn new(styles: &'a MarkdownStyles, highlighter: &'a dyn Highlighter) -> Self {
        Self {
            styles,
            highlighter,
            copied_blocks: &NO_COPIED_BLOCKS,
            width: None,
        }
    }

    pub fn with_width(mut self, width: Option<u16>) -> Self {
        self.width = width;
        self
    }

    pub fn with_copied_blocks(mut self, copied_blocks: &'a BTreeSet<usize>) -> Self {
        self.copied_blocks = copied_blocks;
        self
    }
}

/// The language named by a fence info string: the leading word characters
/// of its first word. `rust,ignore` gives `rust`, `{.py}` gives nothing.
pub fn language_tag(info: &str) -> Option<String> {
    let first_word = info.split_whitespace().next()?;
    LANGUAGE_TAG
        .as_ref()?
        .captures(first_word)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_MATH);
    options.insert(Options::ENABLE_SUPERSCRIPT);
    options.insert(Options::ENABLE_SUBSCRIPT);
    options
}

pub fn render(input: &str, ctx: &RenderContext<'_>) -> MarkedText {
    let parser = Parser::new_ext(input, parser_options());
    let mut writer = TextWriter::new(parser, ctx);
    writer.run();
    writer.marked_text
}

/// The copyable code blocks of `input`, without rendering anything.
///
/// Indices match the `code_blocks` of [`render`] for the same input.
pub fn extract_code_blocks(input: &str) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<(String, String)> = None;

    for event in Parser::new_ext(input, parser_options()) {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                current = language_tag(&info).map(|language| (language, String::new()));
            }
            Event::Text(text) => {
                if let Some((_, code)) = current.as_mut() {
                    code.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((language, mut code)) = current.take() {
                    if code.ends_with('\n') {
                        code.pop();
                    }
                    blocks.push(CodeBlock {
                        index: blocks.len(),
                        language,
                        code,
                    });
                }
            }
            _ => {}
        }
    }

    blocks
}

struct TextWriter<'a, 'c, I> {
    /// Iterator supplying events.
    iter: I,

    /// Text to write to.
    marked_text: MarkedText,

    /// Stack of inline styles, with the top style being the current style.
    inline_styles: Vec<Style>,

    /// Prefix to add to the start of the each line.
    line_prefixes: Vec<Span<'a>>,

    /// Stack of line styles.
    line_styles: Vec<Style>,

    /// Current list index as a stack of indices.
    list_indices: Vec<Option<u64>>,

    /// A link which will be appended to the current line when the link tag is closed.
    link: Option<CowStr<'a>>,

    needs_newline: bool,

    ctx: &'c RenderContext<'c>,

    table_alignments: Vec<Alignment>,
    table_rows: Vec<Vec<Vec<Span<'a>>>>, // rows of cells, each cell is a vec of spans

    /// Set after a list item starts, until its marker is written.
    in_list_item_start: bool,

    /// Set after a footnote definition starts, until its first paragraph.
    in_footnote_start: bool,

    in_code_block: bool,
    code_block_language: Option<String>,
    code_buffer: String,

    /// Current list item indent level (for wrapping)
    list_item_indent: usize,
}

impl<'a, 'c, I> TextWriter<'a, 'c, I>
where
    I: Iterator<Item = Event<'a>>,
{
    fn new(iter: I, ctx: &'c RenderContext<'c>) -> Self {
        Self {
            iter,
            marked_text: MarkedText::default(),
            inline_styles: vec![],
            line_styles: vec![],
            line_prefixes: vec![],
            list_indices: vec![],
            needs_newline: false,
            link: None,
            ctx,
            table_alignments: Vec::new(),
            table_rows: Vec::new(),
            in_list_item_start: false,
            in_footnote_start: false,
            in_code_block: false,
            code_block_language: None,
            code_buffer: String::new(),
            list_item_indent: 0,
        }
    }

    fn styles(&self) -> &'c MarkdownStyles {
        self.ctx.styles
    }

    fn run(&mut self) {
        while let Some(event) = self.iter.next() {
            self.handle_event(event);
        }
        debug!(
            target: "threadview.markdown",
            lines = self.marked_text.lines.len(),
            code_blocks = self.marked_text.code_blocks.len(),
            "Rendered markdown"
        );
    }

    fn handle_event(&mut self, event: Event<'a>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(text),
            Event::Code(code) => self.code(code),
            Event::InlineMath(tex) => self.inline_math(tex),
            Event::DisplayMath(tex) => self.display_math(tex),
            Event::Html(html) | Event::InlineHtml(html) => self.text(html),
            Event::FootnoteReference(label) => self.footnote_reference(label),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => self.hard_break(),
            Event::Rule => self.rule(),
            Event::TaskListMarker(checked) => self.task_list_marker(checked),
        }
    }

    fn start_tag(&mut self, tag: Tag<'a>) {
        match tag {
            Tag::Paragraph => self.start_paragraph(),
            Tag::Heading { level, .. } => self.start_heading(level),
            Tag::BlockQuote(_) => self.start_blockquote(),
            Tag::CodeBlock(kind) => self.start_codeblock(kind),
            Tag::List(start_index) => self.start_list(start_index),
            Tag::Item => self.start_item(),
            Tag::FootnoteDefinition(label) => self.start_footnote_definition(label),
            Tag::Table(alignments) => self.start_table(alignments),
            Tag::TableHead => self.start_table_head(),
            Tag::TableRow => self.start_table_row(),
            Tag::TableCell => self.start_table_cell(),
            Tag::Emphasis => self.start_inline(self.styles().emphasis),
            Tag::Strong => self.start_inline(self.styles().strong),
            Tag::Strikethrough => self.start_inline(self.styles().strikethrough),
            Tag::Superscript => {
                self.start_inline(self.styles().superscript);
                self.push_span(Span::styled("^", self.styles().superscript));
            }
            Tag::Subscript => {
                self.start_inline(self.styles().subscript);
                self.push_span(Span::styled("_", self.styles().subscript));
            }
            Tag::Link { dest_url, .. } => {
                self.flush_list_marker();
                self.push_link(dest_url);
            }
            // Images show their alt text, which arrives as text events.
            Tag::Image { .. } => self.flush_list_marker(),
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.end_paragraph(),
            TagEnd::Heading(_) => self.end_heading(),
            TagEnd::BlockQuote(_) => self.end_blockquote(),
            TagEnd::CodeBlock => self.end_codeblock(),
            TagEnd::List(_) => self.end_list(),
            TagEnd::Item => self.end_item(),
            TagEnd::FootnoteDefinition => self.needs_newline = true,
            TagEnd::Table => self.end_table(),
            TagEnd::TableHead | TagEnd::TableRow | TagEnd::TableCell => {}
            TagEnd::Emphasis
            | TagEnd::Strong
            | TagEnd::Strikethrough
            | TagEnd::Superscript
            | TagEnd::Subscript => self.pop_inline_style(),
            TagEnd::Link => self.pop_link(),
            _ => {}
        }
    }

    /// Write a pending list marker before inline content of a fresh item.
    fn flush_list_marker(&mut self) {
        if self.in_list_item_start {
            self.push_list_marker();
            self.in_list_item_start = false;
        }
    }

    fn start_inline(&mut self, style: Style) {
        self.flush_list_marker();
        self.push_inline_style(style);
    }

    fn start_paragraph(&mut self) {
        if self.in_footnote_start {
            // The paragraph continues the "[^label]: " line.
            self.in_footnote_start = false;
            self.needs_newline = false;
            return;
        }
        if self.in_list_item_start {
            // Loose list item: the paragraph starts on the item's own line.
            return;
        }
        // Insert an empty line between paragraphs if there is at least one line of text already.
        if self.needs_newline {
            self.push_line(Line::default());
        }
        self.push_line(Line::default());
        self.needs_newline = false;
    }

    fn end_paragraph(&mut self) {
        self.needs_newline = true;
    }

    fn start_heading(&mut self, level: HeadingLevel) {
        if self.needs_newline {
            self.push_line(Line::default());
        }
        let styles = self.styles();
        let style = match level {
            HeadingLevel::H1 => styles.h1,
            HeadingLevel::H2 => styles.h2,
            HeadingLevel::H3 => styles.h3,
            HeadingLevel::H4 => styles.h4,
            HeadingLevel::H5 => styles.h5,
            HeadingLevel::H6 => styles.h6,
        };
        self.push_inline_style(style);

        let content = format!("{} ", "#".repeat(level as usize));
        self.push_line(Line::styled(content, style));
        self.needs_newline = false;
    }

    fn end_heading(&mut self) {
        self.pop_inline_style();
        self.needs_newline = true;
    }

    fn start_blockquote(&mut self) {
        if self.needs_newline {
            self.push_line(Line::default());
            self.needs_newline = false;
        }
        self.line_prefixes.push(Span::from("│"));
        self.line_styles.push(self.styles().blockquote);
    }

    fn end_blockquote(&mut self) {
        self.line_prefixes.pop();
        self.line_styles.pop();
        self.needs_newline = true;
    }

    fn start_footnote_definition(&mut self, label: CowStr<'a>) {
        if self.needs_newline {
            self.push_line(Line::default());
        }
        let marker = format!("[^{label}]: ");
        self.push_line(Line::from(Span::styled(marker, self.styles().superscript)));
        self.in_footnote_start = true;
        self.needs_newline = false;
    }

    fn footnote_reference(&mut self, label: CowStr<'a>) {
        self.flush_list_marker();
        let reference = format!("[^{label}]");
        self.push_span(Span::styled(reference, self.styles().superscript));
    }

    fn text(&mut self, text: CowStr<'a>) {
        if self.in_code_block {
            self.code_buffer.push_str(&text);
            return;
        }

        self.flush_list_marker();

        let style = self
            .inline_styles
            .last()
            .copied()
            .unwrap_or(self.styles().paragraph);

        if self.in_table_cell() {
            self.push_span(Span::styled(text.to_string(), style));
            return;
        }

        for (position, line) in text.lines().with_position() {
            if self.needs_newline {
                self.push_line(Line::default());
                self.needs_newline = false;
            }
            if matches!(position, Position::Middle | Position::Last) {
                self.push_line(Line::default());
            }

            self.push_span(Span::styled(line.to_owned(), style));
        }
        self.needs_newline = false;
    }

    fn code(&mut self, code: CowStr<'a>) {
        self.flush_list_marker();
        let span = Span::styled(code, self.styles().code);
        self.push_span(span);
    }

    fn inline_math(&mut self, tex: CowStr<'a>) {
        self.flush_list_marker();
        self.push_span(Span::styled(format!("${tex}$"), self.styles().math));
    }

    fn display_math(&mut self, tex: CowStr<'a>) {
        let style = self.styles().math;
        self.push_line(Line::styled("$$", style));
        for line in tex.trim_matches('\n').lines() {
            self.push_line(Line::styled(line.to_string(), style));
        }
        self.push_line(Line::styled("$$", style));
        // Text after the block starts on a fresh line.
        self.needs_newline = true;
    }

    fn hard_break(&mut self) {
        self.push_line(Line::default());
    }

    fn soft_break(&mut self) {
        // Soft breaks keep the author's line structure.
        self.push_line(Line::default());
    }

    fn start_list(&mut self, index: Option<u64>) {
        if self.list_indices.is_empty() && self.needs_newline {
            self.push_line(Line::default());
        }
        self.list_indices.push(index);
    }

    fn end_list(&mut self) {
        self.list_indices.pop();
        self.needs_newline = true;
    }

    fn start_item(&mut self) {
        self.push_line(Line::default());
        // The marker waits for a possible task list marker.
        self.in_list_item_start = true;
        self.list_item_indent = 0;
        self.needs_newline = false;
    }

    fn end_item(&mut self) {
        // Empty list items still get their marker.
        self.flush_list_marker();
    }

    fn start_codeblock(&mut self, kind: CodeBlockKind<'a>) {
        self.flush_list_marker();
        if !self.marked_text.lines.is_empty() {
            self.push_line(Line::default());
        }

        self.in_code_block = true;
        self.code_buffer.clear();
        self.code_block_language = match kind {
            CodeBlockKind::Fenced(info) => language_tag(&info),
            CodeBlockKind::Indented => None,
        };

        self.line_styles.push(self.styles().code_block);
        self.needs_newline = false;
    }

    fn end_codeblock(&mut self) {
        let mut code = std::mem::take(&mut self.code_buffer);
        if code.ends_with('\n') {
            code.pop();
        }

        match self.code_block_language.take() {
            Some(language) => self.highlighted_block(language, code),
            None => self.plain_block(&code),
        }

        self.in_code_block = false;
        self.needs_newline = true;
        self.line_styles.pop();
    }

    #[instrument(level = "trace", skip(self, code))]
    fn highlighted_block(&mut self, language: String, code: String) {
        let index = self.marked_text.code_blocks.len();
        let styles = self.styles();
        let copied = self.ctx.copied_blocks.contains(&index);
        let label_style = if copied {
            styles.code_copied
        } else {
            styles.code_copy
        };

        self.push_line(code_block::header_line(
            &language,
            copied,
            self.ctx.width,
            styles.code_header,
            label_style,
        ));

        let base = styles.code_block;
        for line in self.ctx.highlighter.highlight(&code, &language) {
            let spans: Vec<Span<'a>> = line
                .spans
                .into_iter()
                .map(|span| Span::styled(span.content, base.patch(span.style)))
                .collect();
            self.push_line(Line::from(spans));
        }

        self.marked_text.code_blocks.push(CodeBlock {
            index,
            language,
            code,
        });
    }

    fn plain_block(&mut self, code: &str) {
        let style = self.styles().code_block;
        for line in code.split('\n') {
            self.push_line(Line::from(Span::styled(line.to_string(), style)));
        }
    }

    #[instrument(level = "trace", skip(self))]
    fn push_inline_style(&mut self, style: Style) {
        let current_style = self.inline_styles.last().copied().unwrap_or_default();
        let style = current_style.patch(style);
        self.inline_styles.push(style);
    }

    #[instrument(level = "trace", skip(self))]
    fn pop_inline_style(&mut self) {
        self.inline_styles.pop();
    }

    fn push_line(&mut self, line: Line<'a>) {
        let style = self.line_styles.last().copied().unwrap_or_default();
        let mut line = line.patch_style(style);

        // Add line prefixes to the start of the line.
        let has_prefixes = !self.line_prefixes.is_empty();
        if has_prefixes {
            line.spans.insert(0, " ".into());
        }
        for prefix in self.line_prefixes.iter().rev().cloned() {
            line.spans.insert(0, prefix);
        }

        let static_line = Line::from(
            line.spans
                .into_iter()
                .map(|span| Span::styled(span.content.into_owned(), span.style))
                .collect::<Vec<_>>(),
        );

        let marked_line = if self.in_code_block {
            MarkedLine::new_no_wrap(static_line)
        } else {
            let indent = if !self.list_indices.is_empty() && !has_prefixes {
                self.list_item_indent
            } else {
                0
            };
            MarkedLine::new(static_line).with_indent(indent)
        };

        self.marked_text.lines.push(marked_line);
    }

    fn in_table_cell(&self) -> bool {
        self.table_rows.last().is_some_and(|row| !row.is_empty())
    }

    fn push_span(&mut self, span: Span<'a>) {
        if let Some(cell) = self.table_rows.last_mut().and_then(|row| row.last_mut()) {
            cell.push(span);
        } else if let Some(marked_line) = self.marked_text.lines.last_mut() {
            let static_span = Span::styled(span.content.into_owned(), span.style);
            marked_line.line.push_span(static_span);
        } else {
            self.push_line(Line::from(vec![span]));
        }
    }

    /// Store the link to be appended to the link text
    fn push_link(&mut self, dest_url: CowStr<'a>) {
        self.link = Some(dest_url);
    }

    /// Append the link to the current line
    fn pop_link(&mut self) {
        if let Some(link) = self.link.take() {
            let style = self.styles().link;
            self.push_span(" (".into());
            self.push_span(Span::styled(link, style));
            self.push_span(")".into());
        }
    }

    fn start_table(&mut self, alignments: Vec<Alignment>) {
        if self.needs_newline {
            self.push_line(Line::default());
        }
        self.table_alignments = alignments;
        self.table_rows.clear();
        self.needs_newline = false;
    }

    fn end_table(&mut self) {
        self.render_table();
        self.table_alignments.clear();
        self.table_rows.clear();
        self.needs_newline = true;
    }

    fn start_table_head(&mut self) {
        self.table_rows.push(Vec::new());
    }

    fn start_table_row(&mut self) {
        self.table_rows.push(Vec::new());
    }

    fn start_table_cell(&mut self) {
        if let Some(current_row) = self.table_rows.last_mut() {
            current_row.push(Vec::new());
        }
    }

    /// Render the accumulated table with proper alignment
    fn render_table(&mut self) {
        if self.table_rows.is_empty() {
            return;
        }

        let rows = std::mem::take(&mut self.table_rows);
        let alignments = std::mem::take(&mut self.table_alignments);
        let num_cols = alignments.len();

        let mut col_widths = vec![0; num_cols];
        for row in &rows {
            for (width, cell) in col_widths.iter_mut().zip(row) {
                let cell_width = cell
                    .iter()
                    .map(|span| span.content.as_ref().width())
                    .sum::<usize>();
                *width = (*width).max(cell_width);
            }
        }

        // One space of padding on each side
        for width in &mut col_widths {
            *width += 2;
        }

        let styles = self.styles();
        let border_style = styles.table_border;

        self.render_table_border(&col_widths, '┌', '┬', '┐', border_style);

        for (row_idx, row) in rows.iter().enumerate() {
            let is_header = row_idx == 0 && rows.len() > 1;
            let style = if is_header {
                styles.table_header
            } else {
                styles.table_cell
            };
            let mut line_spans = vec![Span::styled("│", border_style)];

            for ((cell, &width), &alignment) in row.iter().zip(&col_widths).zip(&alignments) {
                let cell_text: String = cell.iter().map(|span| span.content.as_ref()).collect();
                line_spans.push(Span::styled(align_text(&cell_text, width, alignment), style));
                line_spans.push(Span::styled("│", border_style));
            }

            self.push_line(Line::from(line_spans));

            if is_header {
                self.render_table_border(&col_widths, '├', '┼', '┤', border_style);
            }
        }

        self.render_table_border(&col_widths, '└', '┴', '┘', border_style);
    }

    fn render_table_border(
        &mut self,
        col_widths: &[usize],
        left: char,
        mid: char,
        right: char,
        style: Style,
    ) {
        let inner = col_widths
            .iter()
            .map(|&width| "─".repeat(width))
            .join(&mid.to_string());
        self.push_line(Line::from(Span::styled(format!("{left}{inner}{right}"), style)));
    }

    /// Render a horizontal rule
    fn rule(&mut self) {
        if self.needs_newline {
            self.push_line(Line::default());
        }

        let width = usize::from(self.ctx.width.unwrap_or(DEFAULT_RULE_WIDTH));
        self.push_line(Line::from(Span::styled("─".repeat(width), self.styles().rule)));

        self.needs_newline = true;
    }

    /// Push the appropriate list marker (bullet or number)
    fn push_list_marker(&mut self) {
        let depth = self.list_indices.len();
        let indent_str = " ".repeat(depth.saturating_sub(1).saturating_mul(4));
        let styles = self.styles();

        let Some(last_index) = self.list_indices.last_mut() else {
            return;
        };

        let span = match last_index {
            None => Span::styled(format!("{indent_str}• "), styles.list_marker),
            Some(index) => {
                let marker = format!("{indent_str}{index}. ");
                *index += 1;
                Span::styled(marker, styles.list_number)
            }
        };

        // Wrapped lines align with the text after the marker
        self.list_item_indent = span.content.width();
        if let Some(current_line) = self.marked_text.lines.last_mut() {
            current_line.indent_level = self.list_item_indent;
        }
        self.push_span(span);
    }

    /// Render a task list marker (checkbox)
    fn task_list_marker(&mut self, checked: bool) {
        if self.list_indices.is_empty() {
            return;
        }

        let depth = self.list_indices.len();
        let indent_str = " ".repeat(depth.saturating_sub(1).saturating_mul(4));
        let styles = self.styles();
        let (checkbox, style) = if checked {
            ("[✓] ", styles.task_checked)
        } else {
            ("[ ] ", styles.task_unchecked)
        };

        // Numbered task items keep their number.
        let prefix = match self.list_indices.last_mut() {
            Some(Some(index)) => {
                let number = format!("{index}. ");
                *index += 1;
                number
            }
            _ => "• ".to_string(),
        };

        let full_marker = format!("{indent_str}{prefix}{checkbox}");
        self.list_item_indent = full_marker.width();
        if let Some(current_line) = self.marked_text.lines.last_mut() {
            current_line.indent_level = self.list_item_indent;
        }
        self.push_span(Span::styled(full_marker, style));

        self.in_list_item_start = false;
    }
}

/// Align text within a given width based on alignment
fn align_text(text: &str, width: usize, alignment: Alignment) -> String {
    let total_padding = width.saturating_sub(text.width());

    match alignment {
        Alignment::None | Alignment::Left => {
            let right_padding = total_padding.saturating_sub(1);
            format!(" {}{}", text, " ".repeat(right_padding))
        }
        Alignment::Center => {
            let left_padding = total_padding / 2;
            let right_padding = total_padding - left_padding;
            format!(
                "{}{}{}",
                " ".repeat(left_padding),
                text,
                " ".repeat(right_padding)
            )
        }
        Alignment::Right => {
            let left_padding = total_padding.saturating_sub(1);
            format!("{}{} ", " ".repeat(left_padding), text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::{PlainHighlighter, SyntectHighlighter};
    use ratatui::style::Color;
    use std::cell::RefCell;

    /// Records every highlight request and returns the code unstyled.
    #[derive(Default)]
    struct RecordingHighlighter {
        calls: RefCell<Vec<(String, String)>>,
    }

    impl Highlighter for RecordingHighlighter {
        fn highlight(&self, code: &str, language: &str) -> Vec<Line<'static>> {
            self.calls
                .borrow_mut()
                .push((code.to_string(), language.to_string()));
            PlainHighlighter.highlight(code, language)
        }
    }

    fn render_plain(markdown: &str) -> (MarkedText, Vec<String>) {
        let styles = MarkdownStyles::from_theme(&Theme::default());
        let ctx = RenderContext::new(&styles, &PlainHighlighter);
        let rendered = render(markdown, &ctx);
        let lines = rendered.plain_lines();
        (rendered, lines)
    }

    #[test]
    fn test_language_tag_extraction() {
        assert_eq!(language_tag("rust"), Some("rust".to_string()));
        assert_eq!(language_tag("rust,ignore"), Some("rust".to_string()));
        assert_eq!(language_tag("Python title=\"x.py\""), Some("Python".to_string()));
        assert_eq!(language_tag("c++"), Some("c".to_string()));
        assert_eq!(language_tag("{.python}"), None);
        assert_eq!(language_tag(""), None);
        assert_eq!(language_tag("   "), None);
    }

    #[test]
    fn test_fenced_block_with_language_gets_header_and_highlighting() {
        let styles = MarkdownStyles::from_theme(&Theme::default());
        let highlighter = RecordingHighlighter::default();
        let ctx = RenderContext::new(&styles, &highlighter);

        let rendered = render("Intro\n\n```Rust\nfn main() {}\nlet x = 1;\n```\n", &ctx);
        let lines = rendered.plain_lines();

        assert_eq!(
            *highlighter.calls.borrow(),
            vec![("fn main() {}\nlet x = 1;".to_string(), "Rust".to_string())]
        );
        let header = lines
            .iter()
            .position(|line| line.contains("⧉ copy"))
            .unwrap();
        assert!(lines[header].starts_with(" rust "));
        assert_eq!(lines[header + 1], "fn main() {}");
        assert_eq!(lines[header + 2], "let x = 1;");
        assert_eq!(lines.len(), header + 3);
        assert!(rendered.lines[header + 1].no_wrap);

        assert_eq!(
            rendered.code_blocks,
            vec![CodeBlock {
                index: 0,
                language: "Rust".to_string(),
                code: "fn main() {}\nlet x = 1;".to_string(),
            }]
        );
    }

    #[test]
    fn test_code_without_language_has_no_header() {
        let (rendered, lines) = render_plain("Use `cargo` here.\n\n```\nplain text\n```\n\n    indented\n");

        assert!(rendered.code_blocks.is_empty());
        assert!(lines.iter().all(|line| !line.contains("copy")));
        assert!(lines.contains(&"Use cargo here.".to_string()));
        assert!(lines.contains(&"plain text".to_string()));
        assert!(lines.contains(&"indented".to_string()));

        let inline = rendered.lines[0]
            .line
            .spans
            .iter()
            .find(|span| span.content == "cargo")
            .unwrap();
        assert_eq!(inline.style, MarkdownStyles::from_theme(&Theme::default()).code);
    }

    #[test]
    fn test_copied_blocks_change_the_label() {
        let styles = MarkdownStyles::from_theme(&Theme::default());
        let copied = BTreeSet::from([1]);
        let ctx = RenderContext::new(&styles, &PlainHighlighter).with_copied_blocks(&copied);

        let rendered = render("```sh\nls\n```\n\n```py\nprint(1)\n```\n", &ctx);
        let headers: Vec<String> = rendered
            .plain_lines()
            .into_iter()
            .filter(|line| line.contains("⧉ copy") || line.contains("✓ copied"))
            .collect();

        assert_eq!(headers.len(), 2);
        assert!(headers[0].contains("⧉ copy"));
        assert!(headers[1].contains("✓ copied"));
        assert_eq!(rendered.code_blocks[1].code, "print(1)");
    }

    #[test]
    fn test_only_one_trailing_newline_is_stripped() {
        let styles = MarkdownStyles::from_theme(&Theme::default());
        let highlighter = RecordingHighlighter::default();
        let ctx = RenderContext::new(&styles, &highlighter);

        let rendered = render("```js\nconst a = 1;\n\n```\n", &ctx);

        assert_eq!(rendered.code_blocks[0].code, "const a = 1;\n");
        assert_eq!(highlighter.calls.borrow()[0].0, "const a = 1;\n");
    }

    #[test]
    fn test_syntect_highlighting_colors_code_lines() {
        let styles = MarkdownStyles::from_theme(&Theme::default());
        let highlighter = SyntectHighlighter::default();
        let ctx = RenderContext::new(&styles, &highlighter);

        let rendered = render("```rust\nfn main() {}\n```", &ctx);
        let code_line = rendered.lines.last().unwrap();

        assert!(code_line.no_wrap);
        assert!(
            code_line
                .line
                .spans
                .iter()
                .any(|span| matches!(span.style.fg, Some(Color::Rgb(..))))
        );
    }

    #[test]
    fn test_headings_links_and_blockquotes() {
        let (_, lines) = render_plain(
            "# Title\n\nSee [docs](https://example.com) now.\n\n> quoted\n\n---\n\nafter",
        );

        assert_eq!(lines[0], "# Title");
        assert!(lines.contains(&"See docs (https://example.com) now.".to_string()));
        assert!(lines.contains(&"│ quoted".to_string()));
        assert!(lines.iter().any(|line| line == &"─".repeat(80)));
        assert_eq!(lines.last().map(String::as_str), Some("after"));
    }

    #[test]
    fn test_rule_uses_context_width() {
        let styles = MarkdownStyles::from_theme(&Theme::default());
        let ctx = RenderContext::new(&styles, &PlainHighlighter).with_width(Some(12));

        let rendered = render("---", &ctx);
        assert_eq!(rendered.plain_lines(), vec!["─".repeat(12)]);
    }

    #[test]
    fn test_table_rendering_with_alignment() {
        let (_, lines) = render_plain(
            "| Left | Center | Right |\n|:-----|:------:|------:|\n| L | C | R |\n| Long Left | Mid | 10 |",
        );

        assert_eq!(lines[0], "┌───────────┬────────┬───────┐");
        assert_eq!(lines[1], "│ Left      │ Center │ Right │");
        assert_eq!(lines[2], "├───────────┼────────┼───────┤");
        assert_eq!(lines[3], "│ L         │   C    │     R │");
        assert_eq!(lines[4], "│ Long Left │  Mid   │    10 │");
        assert_eq!(lines[5], "└───────────┴────────┴───────┘");
    }

    #[test]
    fn test_table_with_wide_characters_and_empty_cells() {
        let (_, lines) = render_plain("| A | B |\n|---|---|\n| 你好 | |\n");

        let widths: Vec<usize> = lines.iter().map(|line| line.width()).collect();
        assert!(widths.windows(2).all(|pair| pair[0] == pair[1]), "{lines:?}");
    }

    #[test]
    fn test_lists_and_task_lists() {
        let (_, lines) = render_plain(
            "- [x] done\n- [ ] todo\n\n1. first\n2. second\n   - nested\n\n3. [ ] numbered task",
        );

        assert!(lines.contains(&"• [✓] done".to_string()));
        assert!(lines.contains(&"• [ ] todo".to_string()));
        assert!(lines.contains(&"1. first".to_string()));
        assert!(lines.contains(&"2. second".to_string()));
        assert!(lines.contains(&"    • nested".to_string()));
        assert!(lines.iter().any(|line| line.ends_with("[ ] numbered task")));
    }

    #[test]
    fn test_loose_list_items_keep_marker_on_text_line() {
        let (_, lines) = render_plain("- one\n\n- two\n\n1. first\n\n2. second\n");
        assert_eq!(lines, vec!["• one", "• two", "", "1. first", "2. second"]);
    }

    #[test]
    fn test_empty_list_items_keep_markers() {
        let (rendered, lines) = render_plain("- \n- Item\n-\n");
        assert!(!rendered.lines.is_empty());
        assert_eq!(lines.iter().filter(|line| line.starts_with('•')).count(), 3);
    }

    #[test]
    fn test_list_items_carry_wrap_indent() {
        let (rendered, _) = render_plain("- a fairly long item");
        assert_eq!(rendered.lines[0].indent_level, 2);
        assert!(!rendered.lines[0].no_wrap);
    }

    #[test]
    fn test_math_rendering() {
        let (_, lines) = render_plain("Sum: $a + b = c$\n\n$$\nx + y\n$$\n");

        assert_eq!(lines[0], "Sum: $a + b = c$");
        let open = lines.iter().position(|line| line == "$$").unwrap();
        assert_eq!(lines[open + 1], "x + y");
        assert_eq!(lines[open + 2], "$$");
    }

    #[test]
    fn test_superscript_strikethrough_and_footnotes() {
        let (rendered, lines) = render_plain("E = mc^2^ and ~~old~~ text[^1]\n\n[^1]: A note.");

        assert!(lines[0].contains("mc^2"));
        assert!(lines[0].contains("[^1]"));
        let old = rendered.lines[0]
            .line
            .spans
            .iter()
            .find(|span| span.content == "old")
            .unwrap();
        assert!(old.style.add_modifier.contains(Modifier::CROSSED_OUT));
        assert!(lines.iter().any(|line| line == "[^1]: A note."));
    }

    #[test]
    fn test_soft_breaks_images_and_html() {
        let (_, lines) = render_plain("line one\nline two\n\n![a diagram](d.png) <b>bold</b>");

        assert_eq!(lines[0], "line one");
        assert_eq!(lines[1], "line two");
        assert!(lines.iter().any(|line| line.contains("a diagram") && line.contains("<b>")));
    }

    #[test]
    fn test_extracted_blocks_match_rendered_blocks() {
        let input = "```\nbare\n```\n\n- item\n\n  ```toml\n  a = 1\n  ```\n\n> ```sh\n> echo hi\n> ```\n";
        let (rendered, _) = render_plain(input);

        assert_eq!(extract_code_blocks(input), rendered.code_blocks);
        assert_eq!(rendered.code_blocks.len(), 2);
        assert_eq!(rendered.code_blocks[0].code, "a = 1");
        assert_eq!(rendered.code_blocks[1].language, "sh");
    }

    #[test]
    fn test_empty_input_renders_nothing() {
        let (rendered, _) = render_plain("");
        assert_eq!(rendered.height(), 0);
        assert!(rendered.code_blocks.is_empty());
    }
}
