use std::any::Any;
use std::path::PathBuf;
use std::sync::OnceLock;

static ACTIVE_LOG_DIR: OnceLock<PathBuf> = OnceLock::new();

pub const LOG_FILE_PREFIX: &str = "marketdesk";
pub const LOG_DIR_ENV: &str = "MARKETDESK_LOG_DIR";
pub const LOG_FILTER_ENV: &str = "MARKETDESK_LOG";
const DEFAULT_FILTER: &str = "error,marketdesk=debug";
const MAX_LOG_FILES: usize = 5;

/// Per-OS log directory, `None` when the platform reports no home.
pub fn default_log_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        dirs::home_dir().map(|home| home.join("Library/Logs/MarketDesk"))
    }
    #[cfg(target_os = "windows")]
    {
        dirs::data_local_dir().map(|dir| dir.join("MarketDesk\\Logs"))
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        dirs::data_local_dir()
            .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
            .map(|dir| dir.join("marketdesk/logs"))
    }
}

fn fallback_log_dir() -> PathBuf {
    std::env::temp_dir().join("marketdesk").join("logs")
}

/// Override, per-OS default, temp dir; in that order.
fn log_dir_candidates() -> Vec<PathBuf> {
    crate::path_env::dir_override(LOG_DIR_ENV)
        .into_iter()
        .chain(default_log_dir())
        .chain(std::iter::once(fallback_log_dir()))
        .collect()
}

#[must_use]
pub fn active_log_dir() -> PathBuf {
    ACTIVE_LOG_DIR.get().cloned().unwrap_or_else(|| {
        log_dir_candidates()
            .into_iter()
            .next()
            .unwrap_or_else(fallback_log_dir)
    })
}

/// Installs the file subscriber. The returned guard flushes the non-blocking writer on drop
/// and must live until the process exits.
pub fn init() -> anyhow::Result<impl Any> {
    use anyhow::Context;
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let log_dir = crate::path_env::first_writable(&log_dir_candidates())
        .unwrap_or_else(fallback_log_dir);
    let _ = ACTIVE_LOG_DIR.set(log_dir.clone());

    let writer = RollingFileAppender::builder()
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .rotation(Rotation::DAILY)
        .build(&log_dir)
        .with_context(|| format!("cannot open log directory {}", log_dir.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(writer);

    let timer = fmt::time::OffsetTime::new(
        crate::helper::clock::local_offset(),
        time::format_description::well_known::Rfc3339,
    );
    let file_line = cfg!(debug_assertions);

    let subscriber = fmt::layer()
        .with_ansi(false)
        .with_timer(timer)
        .with_thread_ids(true)
        .with_file(file_line)
        .with_line_number(file_line)
        .with_writer(writer);

    let filter = std::env::var(LOG_FILTER_ENV).unwrap_or_else(|_| DEFAULT_FILTER.to_string());
    let subscriber = subscriber.with_filter(tracing_subscriber::EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(subscriber)
        .try_init()
        .context("a global tracing subscriber is already installed")?;
    Ok(guard)
}
