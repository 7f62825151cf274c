//! Shape inspection for tool arguments and tool result content.
//!
//! Tool payloads are arbitrary JSON, or text that may itself be JSON. The
//! functions here decide how a payload is shown: as key/value rows, as an
//! indented JSON block inside a cell, as a bare scalar, or as markdown prose
//! that may be truncated until the user expands it.

use itertools::Itertools;
use serde_json::{Map, Value};
use strum::Display;

/// Prose longer than this many lines is truncated when collapsed.
pub const PROSE_MAX_LINES: usize = 4;
/// Prose longer than this many characters is truncated when collapsed.
pub const PROSE_MAX_CHARS: usize = 500;
/// Rows of an array result shown while collapsed.
pub const ARRAY_PREVIEW_ROWS: usize = 5;
pub const ELLIPSIS: &str = "...";

/// A decoded JSON value reduced to the three shapes the presenters care about.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentValue {
    Scalar(Value),
    Sequence(Vec<Value>),
    Mapping(Map<String, Value>),
}

impl From<Value> for ContentValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => ContentValue::Sequence(items),
            Value::Object(map) => ContentValue::Mapping(map),
            scalar => ContentValue::Scalar(scalar),
        }
    }
}

impl ContentValue {
    /// Decode text as JSON, treating anything unparseable as an opaque string.
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => value.into(),
            Err(_) => ContentValue::Scalar(Value::String(text.to_string())),
        }
    }

    pub fn is_complex(&self) -> bool {
        !matches!(self, ContentValue::Scalar(_))
    }
}

/// True for arrays and objects, false for every scalar including `null`.
pub fn is_complex_value(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum DisplayMode {
    Table,
    JsonBlock,
    Scalar,
    MarkdownProse,
}

/// How a single value inside a key/value row is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellDecision {
    Scalar(String),
    JsonBlock(String),
}

impl CellDecision {
    pub fn mode(&self) -> DisplayMode {
        match self {
            CellDecision::Scalar(_) => DisplayMode::Scalar,
            CellDecision::JsonBlock(_) => DisplayMode::JsonBlock,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            CellDecision::Scalar(text) | CellDecision::JsonBlock(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub key: String,
    pub value: CellDecision,
}

impl TableRow {
    pub fn new(key: impl Into<String>, value: &Value) -> Self {
        Self {
            key: key.into(),
            value: classify_argument(value),
        }
    }

    /// A row of tool result content. String cells are shown as written.
    pub fn result(key: impl Into<String>, value: &Value) -> Self {
        Self {
            key: key.into(),
            value: classify_result_cell(value),
        }
    }
}

/// The part of a payload that is visible for the current expanded state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibleSlice {
    Rows(Vec<TableRow>),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayDecision {
    pub mode: DisplayMode,
    /// Content is currently cut short.
    pub truncated: bool,
    /// The payload is large enough that an expand/collapse control applies.
    pub show_toggle: bool,
    pub visible: VisibleSlice,
}

impl DisplayDecision {
    pub fn rows(&self) -> &[TableRow] {
        match &self.visible {
            VisibleSlice::Rows(rows) => rows,
            VisibleSlice::Text(_) => &[],
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.visible {
            VisibleSlice::Text(text) => Some(text),
            VisibleSlice::Rows(_) => None,
        }
    }
}

/// Decide how one tool argument value is shown in its table cell.
///
/// Strings are decoded as JSON first; a string holding an object or array is
/// shown as that structure.
pub fn classify_argument(value: &Value) -> CellDecision {
    match value {
        Value::String(text) => match ContentValue::parse(text) {
            ContentValue::Sequence(items) => CellDecision::JsonBlock(pretty_json(&Value::Array(items))),
            ContentValue::Mapping(map) => CellDecision::JsonBlock(pretty_json(&Value::Object(map))),
            ContentValue::Scalar(_) => CellDecision::Scalar(text.clone()),
        },
        complex if is_complex_value(complex) => CellDecision::JsonBlock(pretty_json(complex)),
        scalar => CellDecision::Scalar(scalar_text(scalar)),
    }
}

/// Decide how one cell of a tool result table is shown.
pub fn classify_result_cell(value: &Value) -> CellDecision {
    if is_complex_value(value) {
        CellDecision::JsonBlock(pretty_json(value))
    } else {
        CellDecision::Scalar(scalar_text(value))
    }
}

/// Decide how tool result content is shown.
pub fn classify_result(content: &str, expanded: bool) -> DisplayDecision {
    match ContentValue::parse(content) {
        ContentValue::Mapping(map) => DisplayDecision {
            mode: DisplayMode::Table,
            truncated: false,
            show_toggle: false,
            visible: VisibleSlice::Rows(
                map.iter()
                    .map(|(key, value)| TableRow::result(key.as_str(), value))
                    .collect(),
            ),
        },
        ContentValue::Sequence(items) => {
            let oversized = items.len() > ARRAY_PREVIEW_ROWS;
            let shown = if expanded {
                items.len()
            } else {
                items.len().min(ARRAY_PREVIEW_ROWS)
            };
            DisplayDecision {
                mode: DisplayMode::Table,
                truncated: oversized && !expanded,
                show_toggle: oversized,
                visible: VisibleSlice::Rows(
                    items
                        .iter()
                        .take(shown)
                        .enumerate()
                        .map(|(idx, value)| TableRow::result(idx.to_string(), value))
                        .collect(),
                ),
            }
        }
        ContentValue::Scalar(_) => {
            let (text, should_truncate) = truncate_prose(content, expanded);
            DisplayDecision {
                mode: DisplayMode::MarkdownProse,
                truncated: should_truncate && !expanded,
                show_toggle: should_truncate,
                visible: VisibleSlice::Text(text),
            }
        }
    }
}

/// Slice free text for display.
///
/// Returns the visible text and whether the content is long enough to be
/// truncated at all.
pub fn truncate_prose(content: &str, expanded: bool) -> (String, bool) {
    let line_count = content.split('\n').count();
    let char_count = content.chars().count();
    let should_truncate = line_count > PROSE_MAX_LINES || char_count > PROSE_MAX_CHARS;

    if expanded || !should_truncate {
        return (content.to_string(), should_truncate);
    }

    let visible = if char_count > PROSE_MAX_CHARS {
        let head: String = content.chars().take(PROSE_MAX_CHARS).collect();
        format!("{head}{ELLIPSIS}")
    } else {
        let head = content.split('\n').take(PROSE_MAX_LINES).join("\n");
        format!("{head}\n{ELLIPSIS}")
    };
    (visible, should_truncate)
}

/// Stringify a scalar the way it reads in a UI: strings without quotes,
/// everything else as its JSON text.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Two-space indented JSON.
pub fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}
