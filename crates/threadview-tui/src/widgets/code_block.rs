//! Header bar and copy control for fenced code blocks.

use std::time::{Duration, Instant};

use ratatui::style::Style;
use ratatui::text::{Line, Span};
use tracing::{debug, warn};
use unicode_width::UnicodeWidthStr;

use crate::clipboard::ClipboardWriter;

/// How long the "copied" indicator stays on after a successful copy.
pub const DEFAULT_COPIED_DURATION: Duration = Duration::from_millis(3000);

pub const COPY_LABEL: &str = "⧉ copy";
pub const COPIED_LABEL: &str = "✓ copied";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyCode,
    AlreadyCopied,
    UnknownBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied { until: Instant },
    Ignored(IgnoreReason),
    Failed,
}

/// Copy-to-clipboard state for one code block.
///
/// Time is passed in explicitly; the indicator reverts on its own once
/// `copied_until` is in the past, so there is no timer to cancel.
#[derive(Debug, Clone)]
pub struct CopyButton {
    duration: Duration,
    copied_until: Option<Instant>,
}

impl Default for CopyButton {
    fn default() -> Self {
        Self::new(DEFAULT_COPIED_DURATION)
    }
}

impl CopyButton {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            copied_until: None,
        }
    }

    /// Write `code` to the clipboard and start the copied window.
    ///
    /// Empty code and activations inside the copied window do nothing. A
    /// failed write leaves the indicator unset.
    pub fn activate(
        &mut self,
        code: &str,
        clipboard: &mut dyn ClipboardWriter,
        now: Instant,
    ) -> CopyOutcome {
        if code.is_empty() {
            return CopyOutcome::Ignored(IgnoreReason::EmptyCode);
        }
        if self.is_copied(now) {
            return CopyOutcome::Ignored(IgnoreReason::AlreadyCopied);
        }

        match clipboard.write_text(code) {
            Ok(()) => {
                let until = now + self.duration;
                self.copied_until = Some(until);
                debug!(target: "threadview.copy", bytes = code.len(), "Copied code block");
                CopyOutcome::Copied { until }
            }
            Err(e) => {
                warn!(target: "threadview.copy", "Clipboard write failed: {}", e);
                CopyOutcome::Failed
            }
        }
    }

    pub fn is_copied(&self, now: Instant) -> bool {
        self.copied_until.is_some_and(|until| now < until)
    }

    pub fn copied_until(&self) -> Option<Instant> {
        self.copied_until
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn label(&self, now: Instant) -> &'static str {
        copy_label(self.is_copied(now))
    }
}

pub fn copy_label(copied: bool) -> &'static str {
    if copied { COPIED_LABEL } else { COPY_LABEL }
}

/// Header line for a code block: the lowercased language on the left, the
/// copy label on the right when `width` leaves room for padding.
pub fn header_line(
    language: &str,
    copied: bool,
    width: Option<u16>,
    header_style: Style,
    label_style: Style,
) -> Line<'static> {
    let language = format!(" {} ", language.to_lowercase());
    let label = format!(" {} ", copy_label(copied));
    let used = language.width() + label.width();
    let gap = width
        .map(|w| usize::from(w).saturating_sub(used))
        .unwrap_or(1)
        .max(1);

    Line::from(vec![
        Span::styled(language, header_style),
        Span::styled(" ".repeat(gap), header_style),
        Span::styled(label, label_style),
    ])
}
