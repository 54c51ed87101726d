//! Suite logging configuration.
//!
//! Installs a `tracing` subscriber writing to both the suite log file and
//! stderr, filtered by the `ESPERAR_LOG` environment variable (default
//! `info`). The log file lives next to the run directories:
//! `<logs-root>/<suite>_<timestamp>_test_suite.log`.

use crate::result::{Error, Result};
use chrono::Local;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable controlling log verbosity
pub const LOG_ENV_VAR: &str = "ESPERAR_LOG";

/// Timestamped log file path for a suite run
#[must_use]
pub fn suite_log_path(logs_root: &Path, suite_name: &str) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S%.3f");
    logs_root.join(format!("{suite_name}_{stamp}_test_suite.log"))
}

/// Install the global subscriber writing to `log_file` and stderr.
///
/// Must be called at most once per process; a second call reports
/// [`Error::Config`].
pub fn init(log_file: &Path) -> Result<()> {
    if let Some(parent) = log_file.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(log_file)?;
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|err| Error::Config {
            message: format!("failed to install log subscriber: {err}"),
        })
}
