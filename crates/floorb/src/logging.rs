use anyhow::Result;
use std::fs::{self, File};
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber: always a plain-text file layer, plus a
/// pretty stdout layer when `with_stdout` is set. `RUST_LOG`, when set,
/// replaces the level-derived filter.
pub fn setup_global_logging(
    log_path: impl AsRef<Path>,
    log_level: &tracing::Level,
    with_stdout: bool,
) -> Result<()> {
    let log_path = log_path.as_ref();

    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = File::options().create(true).append(true).open(log_path)?;
    let file_layer = fmt::layer()
        .with_writer(std::sync::Mutex::new(file))
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true)
        .with_ansi(false)
        .with_filter(build_filter(log_level)?);

    if with_stdout {
        let stdout_layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(true)
            .with_ansi(true)
            .pretty()
            .with_filter(build_filter(log_level)?);

        tracing_subscriber::registry()
            .with(file_layer)
            .with(stdout_layer)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    } else {
        tracing_subscriber::registry()
            .with(file_layer)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    }

    Ok(())
}

/// Directives used when `RUST_LOG` is not set, e.g.
/// `warn,floorb=debug,floorb_server=debug`.
pub fn default_directives(log_level: &tracing::Level) -> String {
    format!(
        "warn,floorb={level},floorb_server={level}",
        level = log_level.as_str().to_lowercase()
    )
}

fn build_filter(log_level: &tracing::Level) -> Result<EnvFilter> {
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return EnvFilter::try_from_default_env()
            .map_err(|e| anyhow::anyhow!("Invalid {}: {}", EnvFilter::DEFAULT_ENV, e));
    }
    Ok(EnvFilter::builder().parse(default_directives(log_level))?)
}
