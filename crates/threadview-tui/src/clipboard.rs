//! Clipboard access for code-block copy actions.

use arboard::Clipboard;
use tracing::debug;

use crate::error::{Error, Result};

/// Destination for copied text.
pub trait ClipboardWriter {
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// The system clipboard.
///
/// The underlying handle is opened on first use so that headless sessions
/// only fail when a copy is actually requested.
#[derive(Default)]
pub struct SystemClipboard {
    clipboard: Option<Clipboard>,
    wait_for_handoff: bool,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clipboard whose writes outlive this process.
    ///
    /// On Linux the owning process serves the selection, so each write blocks
    /// until another application takes the clipboard over.
    pub fn persistent() -> Self {
        Self {
            clipboard: None,
            wait_for_handoff: true,
        }
    }

    pub fn waits_for_handoff(&self) -> bool {
        self.wait_for_handoff
    }

    fn handle(&mut self) -> Result<&mut Clipboard> {
        if self.clipboard.is_none() {
            debug!(target: "threadview.clipboard", "Opening system clipboard");
            self.clipboard = Some(Clipboard::new()?);
        }
        self.clipboard
            .as_mut()
            .ok_or_else(|| Error::Clipboard("Clipboard unavailable".to_string()))
    }
}

impl ClipboardWriter for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        let wait = self.wait_for_handoff;
        set_text(self.handle()?, text, wait)?;
        Ok(())
    }
}

#[cfg(target_os = "linux")]
fn set_text(
    clipboard: &mut Clipboard,
    text: &str,
    wait: bool,
) -> std::result::Result<(), arboard::Error> {
    use arboard::SetExtLinux;

    if wait {
        debug!(target: "threadview.clipboard", "Serving clipboard until replaced");
        clipboard.set().wait().text(text)
    } else {
        clipboard.set_text(text)
    }
}

#[cfg(not(target_os = "linux"))]
fn set_text(
    clipboard: &mut Clipboard,
    text: &str,
    _wait: bool,
) -> std::result::Result<(), arboard::Error> {
    clipboard.set_text(text)
}

/// In-memory clipboard, used when no system clipboard should be touched.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    pub contents: Option<String>,
    pub writes: usize,
}

impl ClipboardWriter for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        self.contents = Some(text.to_string());
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistent_clipboard_waits_without_opening_early() {
        let clipboard = SystemClipboard::persistent();
        assert!(clipboard.waits_for_handoff());
        assert!(clipboard.clipboard.is_none());
        assert!(!SystemClipboard::new().waits_for_handoff());
    }
}
