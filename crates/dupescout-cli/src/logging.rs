use std::env;
use std::path::PathBuf;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Pretty stdout layer plus a non-blocking plain-text file layer. The filter
/// comes from `TRACING_LEVEL` (any `EnvFilter` directive), the log file from
/// `LOG_FILE_PATH`. The returned guard must stay alive until exit or buffered
/// file output is lost.
pub fn init_logger() -> impl Drop {
    let filter_layer = env::var("TRACING_LEVEL")
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let log_path = PathBuf::from(
        env::var("LOG_FILE_PATH").unwrap_or_else(|_| "./logs/dupescout.log".to_string()),
    );
    let log_dir = log_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let log_name = log_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "dupescout.log".into());

    let file_appender = tracing_appender::rolling::never(log_dir, log_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .pretty()
                .with_file(false)
                .without_time()
                .with_ansi(true),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(filter_layer)
        .init();

    guard
}
