use std::io;
use std::path::Path;

use tracing_appender::rolling;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

const DEFAULT_FILTER: &str = "warn";

/// Initialize tracing. Filtering comes from `RUST_LOG` and defaults to warnings.
///
/// With a log file, output is appended there without ANSI colors; otherwise
/// it goes to stderr so it never mixes with rendered output.
pub fn init_tracing(log_file: Option<&Path>) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let result = match log_file {
        Some(path) => {
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => std::env::current_dir()?,
            };
            std::fs::create_dir_all(&dir)?;
            let file_name = path
                .file_name()
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "log file has no name"))?;
            let file_appender = rolling::never(dir, file_name);

            tracing_subscriber::registry()
                .with(
                    fmt::Layer::new()
                        .with_writer(file_appender)
                        .with_ansi(false)
                        .with_span_events(FmtSpan::CLOSE)
                        .with_file(true)
                        .with_line_number(true),
                )
                .with(filter)
                .try_init()
        }
        None => tracing_subscriber::registry()
            .with(
                fmt::Layer::default()
                    .with_writer(io::stderr)
                    .with_target(true),
            )
            .with(filter)
            .try_init(),
    };

    result.map_err(|e| io::Error::other(e.to_string()))?;

    tracing::debug!(
        target: "threadview::logging",
        log_file = ?log_file,
        "Tracing initialized"
    );
    Ok(())
}
