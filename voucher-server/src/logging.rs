//! Logging Infrastructure
//!
//! Initialized once from `main`. Console output always; when a log directory
//! is configured, a daily rolling file written through a non-blocking
//! appender. The returned guard must live until shutdown so buffered lines
//! are flushed.

use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "voucher_server=info,security=info,tower_http=info,sqlx=warn";

/// Build the env filter, falling back to [`DEFAULT_FILTER`]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize the global subscriber.
///
/// * `json_format` - JSON lines instead of human-readable output
/// * `log_dir` - optional directory for `app.YYYY-MM-DD` rolling files
pub fn init(json_format: bool, log_dir: Option<&str>) -> anyhow::Result<Option<WorkerGuard>> {
    let console = if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .boxed()
    } else {
        fmt::layer().with_target(true).boxed()
    };

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let dir = Path::new(dir);
            fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "app");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_target(true)
                .with_ansi(false)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter())
        .with(console)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

/// Security event on the `security` target (auth failures, guard refusals)
///
/// ```ignore
/// security_log!(WARN, "auth_failed", error = %e, uri = %req.uri());
/// ```
#[macro_export]
macro_rules! security_log {
    (WARN, $event:expr $(, $($arg:tt)*)?) => {
        tracing::warn!(target: "security", event = $event $(, $($arg)*)?)
    };
    (INFO, $event:expr $(, $($arg:tt)*)?) => {
        tracing::info!(target: "security", event = $event $(, $($arg)*)?)
    };
}
