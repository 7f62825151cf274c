use clap::Parser;
use eyre::Result;

use threadview::cli::{Cli, Commands};
use threadview::commands::{
    Command, Settings, copy::CopyCommand, render::RenderCommand, replay::ReplayCommand,
    themes::ThemesCommand,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Install color-eyre for better error reports
    color_eyre::install()?;

    let cli = Cli::parse();

    // Level configured via RUST_LOG
    threadview::logging::init_tracing(cli.log_file.as_deref())?;

    let settings = Settings::load(cli.config.as_deref(), cli.theme.clone())?;

    let command: Box<dyn Command> = match cli.command {
        Commands::Render {
            transcript,
            collapsed,
            plain,
            width,
        } => Box::new(RenderCommand {
            settings,
            transcript,
            collapsed,
            plain,
            width,
        }),
        Commands::Replay {
            transcript,
            chunk_size,
            chunk_delay_ms,
            height,
        } => Box::new(ReplayCommand {
            settings,
            transcript,
            chunk_size,
            chunk_delay_ms,
            height,
        }),
        Commands::Copy {
            transcript,
            message,
            block,
        } => Box::new(CopyCommand {
            settings,
            transcript,
            message,
            block,
        }),
        Commands::Themes => Box::new(ThemesCommand { settings }),
    };

    command.execute().await
}
