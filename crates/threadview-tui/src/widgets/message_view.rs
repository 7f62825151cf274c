//! A single streamed markdown message.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use crate::clipboard::ClipboardWriter;
use crate::throttle::{Throttle, ThrottleOutcome};
use crate::widgets::code_block::{CopyButton, CopyOutcome, IgnoreReason};
use crate::widgets::markdown::{self, MarkedText, RenderContext};

/// Markdown content that is still being streamed.
///
/// Incoming content goes through a [`Throttle`]; rendering always uses the
/// throttled value. Each copyable code block gets its own [`CopyButton`].
#[derive(Debug)]
pub struct MarkdownMessageView {
    throttle: Throttle,
    copy_buttons: Vec<CopyButton>,
    copied_duration: Duration,
}

impl MarkdownMessageView {
    pub fn new(
        initial: impl Into<String>,
        interval: Duration,
        copied_duration: Duration,
        now: Instant,
    ) -> Self {
        Self {
            throttle: Throttle::new(initial, interval, now),
            copy_buttons: Vec::new(),
            copied_duration,
        }
    }

    /// Feed the full content received so far.
    pub fn push_content(&mut self, content: impl Into<String>, now: Instant) -> ThrottleOutcome {
        self.throttle.on_value_changed(content, now)
    }

    /// Fire a due deferred update. Returns true when the displayed text changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let before = self.throttle.emissions();
        self.throttle.poll(now);
        self.throttle.emissions() != before
    }

    pub fn displayed(&self) -> &str {
        self.throttle.displayed()
    }

    pub fn throttle(&self) -> &Throttle {
        &self.throttle
    }

    /// Earliest instant at which the view needs another tick or redraw: a
    /// pending throttle emission or a copy label reverting.
    pub fn next_deadline(&self, now: Instant) -> Option<Instant> {
        self.copy_buttons
            .iter()
            .filter_map(CopyButton::copied_until)
            .filter(|until| *until > now)
            .chain(self.throttle.pending_deadline())
            .min()
    }

    /// Indices of code blocks currently showing the copied label.
    pub fn copied_blocks(&self, now: Instant) -> BTreeSet<usize> {
        self.copy_buttons
            .iter()
            .enumerate()
            .filter(|(_, button)| button.is_copied(now))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Render the displayed text.
    pub fn render(&self, ctx: &RenderContext<'_>, now: Instant) -> MarkedText {
        let copied = self.copied_blocks(now);
        let ctx = ctx.with_copied_blocks(&copied);
        markdown::render(self.displayed(), &ctx)
    }

    /// Copy code block `index` of the displayed text.
    pub fn copy_code_block(
        &mut self,
        index: usize,
        clipboard: &mut dyn ClipboardWriter,
        now: Instant,
    ) -> CopyOutcome {
        let blocks = markdown::extract_code_blocks(self.displayed());
        let Some(block) = blocks.get(index) else {
            return CopyOutcome::Ignored(IgnoreReason::UnknownBlock);
        };

        if self.copy_buttons.len() <= index {
            let duration = self.copied_duration;
            self.copy_buttons
                .resize_with(index + 1, || CopyButton::new(duration));
        }
        match self.copy_buttons.get_mut(index) {
            Some(button) => button.activate(&block.code, clipboard, now),
            None => CopyOutcome::Ignored(IgnoreReason::UnknownBlock),
        }
    }

    /// Cancel any pending update. Later content is ignored.
    pub fn dispose(&mut self) {
        self.throttle.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::highlight::PlainHighlighter;
    use crate::theme::Theme;
    use crate::widgets::code_block::{COPIED_LABEL, COPY_LABEL};
    use crate::widgets::markdown::MarkdownStyles;

    const INTERVAL: Duration = Duration::from_millis(100);
    const COPIED: Duration = Duration::from_millis(3000);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn streamed_content_is_throttled() {
        let start = Instant::now();
        let mut view = MarkdownMessageView::new("", INTERVAL, COPIED, start);

        view.push_content("Hel", start + ms(10));
        view.push_content("Hello", start + ms(20));
        assert_eq!(view.displayed(), "");
        assert_eq!(view.next_deadline(start + ms(20)), Some(start + ms(100)));

        assert!(!view.tick(start + ms(99)));
        assert!(view.tick(start + ms(100)));
        assert_eq!(view.displayed(), "Hello");
        assert_eq!(view.next_deadline(start + ms(100)), None);
    }

    #[test]
    fn copy_uses_displayed_code_and_flips_label() {
        let start = Instant::now();
        let content = "Run:\n\n```bash\ncargo test\n```\n";
        let mut view = MarkdownMessageView::new(content, INTERVAL, COPIED, start);
        let mut clipboard = MemoryClipboard::default();

        let outcome = view.copy_code_block(0, &mut clipboard, start);
        assert_eq!(outcome, CopyOutcome::Copied { until: start + COPIED });
        assert_eq!(clipboard.contents.as_deref(), Some("cargo test"));
        assert_eq!(view.next_deadline(start), Some(start + COPIED));

        let theme = Theme::default();
        let styles = MarkdownStyles::from_theme(&theme);
        let ctx = RenderContext::new(&styles, &PlainHighlighter);

        let during = view.render(&ctx, start + ms(10)).plain_lines();
        assert!(during.iter().any(|line| line.contains(COPIED_LABEL)));

        let after = view.render(&ctx, start + COPIED).plain_lines();
        assert!(after.iter().any(|line| line.contains(COPY_LABEL)));
        assert_eq!(view.next_deadline(start + COPIED), None);
    }

    #[test]
    fn copy_of_missing_block_is_ignored() {
        let start = Instant::now();
        let mut view = MarkdownMessageView::new("no code here", INTERVAL, COPIED, start);
        let mut clipboard = MemoryClipboard::default();

        assert_eq!(
            view.copy_code_block(0, &mut clipboard, start),
            CopyOutcome::Ignored(IgnoreReason::UnknownBlock)
        );
        assert_eq!(clipboard.writes, 0);
    }

    #[test]
    fn dispose_drops_pending_update() {
        let start = Instant::now();
        let mut view = MarkdownMessageView::new("a", INTERVAL, COPIED, start);

        view.push_content("ab", start + ms(50));
        view.dispose();

        assert!(!view.tick(start + ms(200)));
        assert_eq!(view.displayed(), "a");
        assert_eq!(
            view.push_content("abc", start + ms(300)),
            ThrottleOutcome::Disposed
        );
    }
}
