use std::{
    fs,
    path::Path,
    time::{Duration, SystemTime},
};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_MAX_AGE: Duration = Duration::from_secs(60 * 60 * 24 * 3);

#[allow(dead_code)]
pub struct LoggerGuard(Option<WorkerGuard>);

fn normalize_level(level: &str) -> Option<&'static str> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}

/// Console + daily rolling file logging. `RUST_LOG` overrides `level`.
///
/// When the log directory cannot be created the file layer is skipped and
/// only the console is used.
pub fn init_logging(log_dir: impl AsRef<Path>, prefix: &str, level: &str) -> LoggerGuard {
    let log_dir = log_dir.as_ref();
    let default_level = normalize_level(level).unwrap_or("info");

    let builder = EnvFilter::builder().with_default_directive(
        default_level
            .parse()
            .unwrap_or_else(|_| tracing::level_filters::LevelFilter::INFO.into()),
    );
    let rust_log = std::env::var("RUST_LOG").unwrap_or_default();
    let console_filter = builder.clone().parse_lossy(&rust_log);
    let file_filter = builder.parse_lossy(&rust_log);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_filter(console_filter);

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(log_dir);

    let (file_layer, guard, appender_error) = match file_appender {
        Ok(appender) => {
            let (non_blocking, guard) = NonBlocking::new(appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(file_filter);
            (Some(layer), Some(guard), None)
        }
        Err(e) => (None, None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stdout_layer)
        .init();

    if normalize_level(level).is_none() {
        tracing::warn!("Invalid log level '{}', defaulting to 'info'", level);
    }
    match appender_error {
        Some(e) => tracing::warn!("File logging disabled, cannot use {:?}: {}", log_dir, e),
        None => {
            if let Err(e) = cleanup_old_logs(log_dir, prefix, LOG_MAX_AGE) {
                tracing::warn!("Failed to delete old log file: {}", e);
            }
        }
    }

    LoggerGuard(guard)
}

fn cleanup_old_logs(log_dir: &Path, prefix: &str, max_age: Duration) -> std::io::Result<usize> {
    let now = SystemTime::now();
    let mut deleted = 0;

    for entry in fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();

        if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
            if file_name.starts_with(prefix) && file_name.ends_with(".log") {
                let metadata = fs::metadata(&path)?;
                if let Ok(modified) = metadata.modified() {
                    if now.duration_since(modified).unwrap_or_default() > max_age {
                        fs::remove_file(&path)?;
                        deleted += 1;
                        tracing::info!("Old log file deleted: {}", file_name);
                    }
                }
            }
        }
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_level() {
        assert_eq!(normalize_level("DEBUG"), Some("debug"));
        assert_eq!(normalize_level("warn"), Some("warn"));
        assert_eq!(normalize_level("verbose"), None);
    }

    #[test]
    fn test_cleanup_removes_only_stale_logs() {
        let dir = std::env::temp_dir().join(format!("iss-tracker-logs-{}", uuid::Uuid::now_v7()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("iss-tracker.2026-01-01.log"), "fresh").unwrap();
        fs::write(dir.join("other.log"), "unrelated").unwrap();

        let deleted = cleanup_old_logs(&dir, "iss-tracker", LOG_MAX_AGE).unwrap();
        assert_eq!(deleted, 0);
        assert!(dir.join("iss-tracker.2026-01-01.log").exists());

        let stale = dir.join("iss-tracker.2025-12-01.log");
        fs::write(&stale, "stale").unwrap();
        fs::File::options()
            .write(true)
            .open(&stale)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(60 * 60 * 24 * 10))
            .unwrap();

        let deleted = cleanup_old_logs(&dir, "iss-tracker", LOG_MAX_AGE).unwrap();
        assert_eq!(deleted, 1);
        assert!(!stale.exists());
        assert!(dir.join("other.log").exists());

        let _ = fs::remove_dir_all(&dir);
    }
}
