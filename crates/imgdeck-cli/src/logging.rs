//! Tracing setup.
//!
//! Logs go to a file so they never interleave with command output: the path
//! given with `--log-file`, else `imgdeck.log` in the platform cache
//! directory. The filter comes from `IMGDECK_LOG` (for example
//! `IMGDECK_LOG=imgdeck_core=debug`) and defaults to `info`.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_ENV: &str = "IMGDECK_LOG";
const DEFAULT_FILTER: &str = "info";

/// `<platform cache dir>/imgdeck.log`, if a home directory is known.
pub fn default_log_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "imgdeck")
        .map(|dirs| dirs.cache_dir().join("imgdeck.log"))
}

/// Installs the global subscriber.
///
/// Falls back to stderr, with warnings only, when no log file location is
/// known.
pub fn init(log_file: Option<&Path>) -> anyhow::Result<()> {
    let path = log_file.map(Path::to_path_buf).or_else(default_log_path);

    let file_layer = match &path {
        Some(path) => {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };
    let stderr_layer = file_layer
        .is_none()
        .then(|| fmt::layer().with_writer(std::io::stderr));

    let default = if file_layer.is_some() { DEFAULT_FILTER } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();
    Ok(())
}
