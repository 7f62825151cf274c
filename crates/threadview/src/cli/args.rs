use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// View agent chat transcripts in the terminal.
#[derive(Parser)]
#[command(version, about, long_about = None, author)]
pub struct Cli {
    /// Path to a config file (defaults to the user config directory)
    #[arg(long, env = "THREADVIEW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Theme to use (overrides the config file)
    #[arg(long)]
    pub theme: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Print a transcript
    Render {
        /// JSON transcript: an array of messages or an object with `messages`
        transcript: PathBuf,
        /// Start tool results collapsed
        #[arg(long)]
        collapsed: bool,
        /// Print text without colors or styles
        #[arg(long)]
        plain: bool,
        /// Output width in columns (defaults to the terminal width)
        #[arg(long)]
        width: Option<u16>,
    },
    /// Stream each assistant message through the throttle and redraw it live
    Replay {
        transcript: PathBuf,
        /// Characters per streamed chunk
        #[arg(long, default_value = "4")]
        chunk_size: usize,
        /// Delay between chunks in milliseconds
        #[arg(long, default_value = "5")]
        chunk_delay_ms: u64,
        /// Height of the live viewport in rows
        #[arg(long, default_value = "16")]
        height: u16,
    },
    /// Copy a code block to the system clipboard
    Copy {
        transcript: PathBuf,
        /// Message position, starting at 0
        #[arg(long)]
        message: usize,
        /// Code block within the message, starting at 0
        #[arg(long, default_value = "0")]
        block: usize,
    },
    /// List available themes
    Themes,
}
