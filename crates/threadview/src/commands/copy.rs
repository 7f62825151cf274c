use super::{Command, Settings};
use crate::error::Error;
use async_trait::async_trait;
use eyre::{Result, WrapErr};
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;
use threadview_tui::Transcript;
use threadview_tui::clipboard::{ClipboardWriter, SystemClipboard};
use threadview_tui::widgets::{CopyOutcome, IgnoreReason, TranscriptView};

pub struct CopyCommand {
    pub settings: Settings,
    pub transcript: PathBuf,
    pub message: usize,
    pub block: usize,
}

#[async_trait]
impl Command for CopyCommand {
    async fn execute(&self) -> Result<()> {
        let transcript = Transcript::load(&self.transcript)
            .wrap_err_with(|| format!("Failed to load {}", self.transcript.display()))?;
        let mut clipboard = Self::clipboard();
        if clipboard.waits_for_handoff() && cfg!(target_os = "linux") {
            writeln!(
                std::io::stderr(),
                "Holding the clipboard until another application takes it over"
            )?;
        }
        let summary = self.copy(transcript, &mut clipboard)?;

        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{summary}")?;
        Ok(())
    }
}

impl CopyCommand {
    /// The copied text has to outlive this process.
    fn clipboard() -> SystemClipboard {
        SystemClipboard::persistent()
    }

    /// Copy the selected block and describe what was copied.
    pub fn copy(
        &self,
        transcript: Transcript,
        clipboard: &mut dyn ClipboardWriter,
    ) -> Result<String, Error> {
        if self.message >= transcript.len() {
            return Err(Error::MissingMessage(self.message));
        }

        let mut view = TranscriptView::new(transcript, &self.settings.config.render);
        let block = view
            .code_blocks(self.message)
            .into_iter()
            .nth(self.block)
            .ok_or(Error::MissingCodeBlock {
                message: self.message,
                block: self.block,
            })?;

        match view.copy_code_block(self.message, self.block, clipboard, Instant::now()) {
            CopyOutcome::Copied { .. } => Ok(format!(
                "Copied {} block ({} lines) from message {}",
                block.language,
                block.code.lines().count(),
                self.message
            )),
            CopyOutcome::Ignored(IgnoreReason::EmptyCode) => Ok(format!(
                "{} block in message {} is empty; nothing copied",
                block.language, self.message
            )),
            CopyOutcome::Ignored(IgnoreReason::UnknownBlock) => Err(Error::MissingCodeBlock {
                message: self.message,
                block: self.block,
            }),
            CopyOutcome::Ignored(IgnoreReason::AlreadyCopied) => Ok("Already copied".to_string()),
            CopyOutcome::Failed => Err(Error::Copy(
                "the system clipboard rejected the write".to_string(),
            )),
        }
    }
}
