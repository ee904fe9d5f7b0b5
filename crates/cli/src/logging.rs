use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::settings::kubefirst_dir;

const DEFAULT_FILTER: &str = "kubefirst_harvester=info,orchestrator=info,cluster=info,edge=info";

/// Send logs to a fresh file under `~/.kubefirst/logs/`, and to stderr too
/// when running in CI. Returns the log file path.
pub fn init(ci: bool) -> Result<PathBuf> {
    let dir = kubefirst_dir()
        .context("Could not determine the home directory")?
        .join("logs");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let path = dir.join(format!(
        "log_{}.log",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    ));
    let file = File::create(&path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
        .with(ci.then(|| fmt::layer().with_writer(std::io::stderr)))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .init();

    Ok(path)
}
