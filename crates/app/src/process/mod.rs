pub mod utils;

use std::path::Path;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use common::workspace::{WorkspaceConfig, WorkspaceContext};

const LOG_FILE_PREFIX: &str = "postgate.log";

/// Level for the console from config and `-v` flags
fn console_level(config: &WorkspaceConfig, verbose: u8) -> LevelFilter {
    let configured = config.log_level.parse().unwrap_or(LevelFilter::WARN);
    let requested = match verbose {
        0 => LevelFilter::OFF,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    configured.max(requested)
}

/// Initialize logging and the panic handler.
///
/// Logs go to stderr so command output on stdout stays clean. Returns guards
/// that must be kept alive until the process exits.
pub fn init_logging(root: &Path, verbose: u8) -> Vec<tracing_appender::non_blocking::WorkerGuard> {
    // an unreadable or missing workspace still gets default logging; the
    // command itself reports the problem
    let config = WorkspaceContext::load(root)
        .map(|ws| ws.config)
        .unwrap_or_default();

    let mut guards = Vec::new();
    let level = console_level(&config, verbose);

    let (stderr_writer, stderr_guard) = tracing_appender::non_blocking(std::io::stderr());
    guards.push(stderr_guard);

    let stderr_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .without_time()
        .with_target(false)
        .with_writer(stderr_writer)
        .with_filter(stderr_filter);

    if let Some(log_dir) = &config.log_dir {
        let log_dir = root.join(log_dir);
        if let Err(e) = std::fs::create_dir_all(&log_dir) {
            eprintln!(
                "Warning: Failed to create log directory {:?}: {}",
                log_dir, e
            );
        }

        let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
        let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
        guards.push(file_guard);

        // the file keeps the audit trail of transitions even when the
        // console is quiet
        let file_filter = EnvFilter::builder()
            .with_default_directive(level.max(LevelFilter::INFO).into())
            .from_env_lossy();

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_writer)
            .with_ansi(false)
            .with_filter(file_filter);

        tracing_subscriber::registry()
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry().with(stderr_layer).init();
    }

    utils::register_panic_logger();
    utils::report_build_info();

    guards
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_console_level() {
        let mut config = WorkspaceConfig::default();
        assert_eq!(console_level(&config, 0), LevelFilter::WARN);
        assert_eq!(console_level(&config, 2), LevelFilter::DEBUG);

        config.log_level = "info".into();
        assert_eq!(console_level(&config, 0), LevelFilter::INFO);

        config.log_level = "loud".into();
        assert_eq!(console_level(&config, 0), LevelFilter::WARN);
    }
}
