//! Theme system for threadview
//!
//! Themes map every styled part of a rendered thread to a ratatui [`Style`].
//! They are loaded from TOML files so the look can change without
//! recompiling.

use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

mod loader;

pub use loader::ThemeLoader;

/// Errors that can occur during theme operations
#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Color not found in palette: {0}")]
    ColorNotFound(String),

    #[error("Invalid color value: {0}")]
    InvalidColor(String),
}

/// A palette reference or a direct color (`#rrggbb` or a named color)
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct ColorValue(pub String);

impl ColorValue {
    fn as_str(&self) -> &str {
        &self.0
    }
}

/// Style definition for a component
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentStyle {
    pub fg: Option<ColorValue>,
    pub bg: Option<ColorValue>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underlined: bool,
}

/// Raw theme as loaded from TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct RawTheme {
    pub name: String,
    #[serde(default)]
    pub palette: HashMap<String, RgbColor>,
    #[serde(default)]
    pub components: HashMap<Component, ComponentStyle>,
}

pub type Theme = CompiledTheme;

/// RGB color deserialized from a `#rrggbb` hex string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor(pub u8, pub u8, pub u8);

impl<'de> Deserialize<'de> for RgbColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_hex(&s)
            .map(|(r, g, b)| RgbColor(r, g, b))
            .ok_or_else(|| serde::de::Error::custom(format!("Invalid hex color: {s}")))
    }
}

impl From<RgbColor> for Color {
    fn from(rgb: RgbColor) -> Self {
        Color::Rgb(rgb.0, rgb.1, rgb.2)
    }
}

/// All themeable parts of a rendered thread
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    // Message roles
    UserMessageRole,
    AssistantMessageRole,
    SystemMessageRole,

    // Tool calls
    ToolCallHeader,
    ToolCallId,
    ToolArgKey,
    ToolArgValue,
    ToolArgJson,
    ToolEmptyArgs,

    // Tool results
    ToolResultHeader,
    ToolResultName,
    ToolResultToggle,
    ToolOutput,

    // General
    DimText,
    ErrorText,

    // Markdown elements
    MarkdownH1,
    MarkdownH2,
    MarkdownH3,
    MarkdownH4,
    MarkdownH5,
    MarkdownH6,
    MarkdownParagraph,
    MarkdownLink,
    MarkdownBlockquote,
    MarkdownListBullet,
    MarkdownListNumber,
    MarkdownRule,
    MarkdownSuperscript,
    MarkdownMath,
    MarkdownCode,
    MarkdownCodeBlock,
    MarkdownCodeHeader,
    MarkdownCodeCopy,
    MarkdownCodeCopied,
    MarkdownTaskChecked,
    MarkdownTaskUnchecked,

    // Markdown table elements
    MarkdownTableBorder,
    MarkdownTableHeader,
    MarkdownTableCell,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Compiled theme ready for rendering
#[derive(Debug, Clone)]
pub struct CompiledTheme {
    pub name: String,
    pub styles: HashMap<Component, Style>,
    pub background_color: Option<Color>,
}

impl RawTheme {
    /// Compile the theme into a usable format
    pub fn into_theme(self) -> Result<Theme, ThemeError> {
        let mut styles = HashMap::new();
        let background_color = self.palette.get("background").map(|&rgb| rgb.into());

        for (component, style_def) in &self.components {
            let mut style = Style::default();

            if let Some(fg) = &style_def.fg {
                style = style.fg(self.resolve_color(fg)?);
            }
            if let Some(bg) = &style_def.bg {
                style = style.bg(self.resolve_color(bg)?);
            }

            if style_def.bold {
                style = style.add_modifier(Modifier::BOLD);
            }
            if style_def.italic {
                style = style.add_modifier(Modifier::ITALIC);
            }
            if style_def.underlined {
                style = style.add_modifier(Modifier::UNDERLINED);
            }

            styles.insert(*component, style);
        }

        Ok(Theme {
            name: self.name,
            styles,
            background_color,
        })
    }

    /// Palette names win over direct colors of the same spelling.
    fn resolve_color(&self, color_value: &ColorValue) -> Result<Color, ThemeError> {
        let name = color_value.as_str();
        if let Some(&rgb) = self.palette.get(name) {
            return Ok(rgb.into());
        }
        match parse_direct_color(name) {
            Ok(color) => Ok(color),
            Err(_) if !name.starts_with('#') => Err(ThemeError::ColorNotFound(name.to_string())),
            Err(err) => Err(err),
        }
    }
}

fn parse_hex(s: &str) -> Option<(u8, u8, u8)> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Parse a direct color string (hex or named)
fn parse_direct_color(color_str: &str) -> Result<Color, ThemeError> {
    if let Some((r, g, b)) = parse_hex(color_str) {
        return Ok(Color::Rgb(r, g, b));
    }

    match color_str.to_lowercase().as_str() {
        "black" => Ok(Color::Black),
        "red" => Ok(Color::Red),
        "green" => Ok(Color::Green),
        "yellow" => Ok(Color::Yellow),
        "blue" => Ok(Color::Blue),
        "magenta" => Ok(Color::Magenta),
        "cyan" => Ok(Color::Cyan),
        "white" => Ok(Color::White),
        "gray" | "grey" => Ok(Color::Gray),
        "darkgray" | "darkgrey" | "dark_gray" | "dark_grey" => Ok(Color::DarkGray),
        "lightred" | "light_red" => Ok(Color::LightRed),
        "lightgreen" | "light_green" => Ok(Color::LightGreen),
        "lightyellow" | "light_yellow" => Ok(Color::LightYellow),
        "lightblue" | "light_blue" => Ok(Color::LightBlue),
        "lightmagenta" | "light_magenta" => Ok(Color::LightMagenta),
        "lightcyan" | "light_cyan" => Ok(Color::LightCyan),
        "reset" => Ok(Color::Reset),
        _ => Err(ThemeError::InvalidColor(color_str.to_string())),
    }
}

impl CompiledTheme {
    /// Get a style for a component, falling back to default if not found
    pub fn style(&self, component: Component) -> Style {
        self.styles.get(&component).copied().unwrap_or_default()
    }

    pub fn dim_text(&self) -> Style {
        self.style(Component::DimText)
    }
}

impl Default for CompiledTheme {
    fn default() -> Self {
        create_default_theme()
    }
}

fn create_default_theme() -> CompiledTheme {
    let mut styles = HashMap::new();

    // Roles
    styles.insert(
        Component::UserMessageRole,
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
    );
    styles.insert(
        Component::AssistantMessageRole,
        Style::default()
            .fg(Color::Blue)
            .add_modifier(Modifier::BOLD),
    );
    styles.insert(
        Component::SystemMessageRole,
        Style::default().fg(Color::Yellow),
    );

    // Tool calls
    styles.insert(
        Component::ToolCallHeader,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    styles.insert(Component::ToolCallId, Style::default().fg(Color::DarkGray));
    styles.insert(
        Component::ToolArgKey,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );
    styles.insert(Component::ToolArgValue, Style::default().fg(Color::Gray));
    styles.insert(Component::ToolArgJson, Style::default().fg(Color::LightYellow));
    styles.insert(Component::ToolEmptyArgs, Style::default().fg(Color::DarkGray));

    // Tool results
    styles.insert(
        Component::ToolResultHeader,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    styles.insert(
        Component::ToolResultName,
        Style::default().fg(Color::White).bg(Color::DarkGray),
    );
    styles.insert(Component::ToolResultToggle, Style::default().fg(Color::DarkGray));
    styles.insert(Component::ToolOutput, Style::default());

    // General
    styles.insert(Component::DimText, Style::default().fg(Color::DarkGray));
    styles.insert(Component::ErrorText, Style::default().fg(Color::Red));

    // Markdown
    styles.insert(Component::MarkdownH1, Style::default().fg(Color::Cyan));
    styles.insert(Component::MarkdownH2, Style::default().fg(Color::Cyan));
    styles.insert(Component::MarkdownH3, Style::default().fg(Color::Cyan));
    styles.insert(Component::MarkdownH4, Style::default().fg(Color::LightCyan));
    styles.insert(Component::MarkdownH5, Style::default().fg(Color::LightCyan));
    styles.insert(Component::MarkdownH6, Style::default().fg(Color::Gray));
    styles.insert(Component::MarkdownParagraph, Style::default());
    styles.insert(Component::MarkdownLink, Style::default().fg(Color::Blue));
    styles.insert(
        Component::MarkdownBlockquote,
        Style::default().fg(Color::Green),
    );
    styles.insert(
        Component::MarkdownListBullet,
        Style::default().fg(Color::Gray),
    );
    styles.insert(
        Component::MarkdownListNumber,
        Style::default().fg(Color::LightBlue),
    );
    styles.insert(Component::MarkdownRule, Style::default().fg(Color::DarkGray));
    styles.insert(
        Component::MarkdownSuperscript,
        Style::default().fg(Color::LightBlue),
    );
    styles.insert(Component::MarkdownMath, Style::default().fg(Color::LightMagenta));
    styles.insert(
        Component::MarkdownCode,
        Style::default().fg(Color::White).bg(Color::Black),
    );
    styles.insert(
        Component::MarkdownCodeBlock,
        Style::default().bg(Color::Black),
    );
    styles.insert(
        Component::MarkdownCodeHeader,
        Style::default()
            .fg(Color::White)
            .bg(Color::DarkGray),
    );
    styles.insert(
        Component::MarkdownCodeCopy,
        Style::default().fg(Color::Gray).bg(Color::DarkGray),
    );
    styles.insert(
        Component::MarkdownCodeCopied,
        Style::default().fg(Color::Green).bg(Color::DarkGray),
    );
    styles.insert(
        Component::MarkdownTaskChecked,
        Style::default().fg(Color::Green),
    );
    styles.insert(
        Component::MarkdownTaskUnchecked,
        Style::default().fg(Color::Gray),
    );

    // Tables
    styles.insert(
        Component::MarkdownTableBorder,
        Style::default().fg(Color::DarkGray),
    );
    styles.insert(
        Component::MarkdownTableHeader,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    styles.insert(Component::MarkdownTableCell, Style::default());

    CompiledTheme {
        name: "default".to_string(),
        styles,
        background_color: None,
    }
}
