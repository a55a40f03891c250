use std::fs::OpenOptions;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the subscriber: stderr always, plus an optional append-only
/// log file. The returned guard must be held for the life of the process
/// so the file writer flushes on shutdown.
pub fn init(log_file: Option<&Path>) -> Option<WorkerGuard> {
    let _ = tracing_log::LogTracer::init();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr));

    if let Some(path) = log_file {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            let _ = std::fs::create_dir_all(parent);
        }
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                let (writer, guard) = tracing_appender::non_blocking(file);
                let _ = registry
                    .with(fmt::layer().with_writer(writer).with_ansi(false))
                    .try_init();
                return Some(guard);
            }
            Err(err) => {
                eprintln!("could not open log file {}: {}", path.display(), err);
            }
        }
    }

    let _ = registry.try_init();
    None
}
