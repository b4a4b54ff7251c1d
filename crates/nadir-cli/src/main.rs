//! nadir: RECIST v1.1 tumour-response derivation
//! Entry point for the batch binary.

mod config;
mod pipeline;

use nadir_common::study_config::LoggingConfig;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Config supplies the log filter, so it is read before the subscriber exists.
    let path = config::config_path();
    let loaded = config::load_from(&path);
    let filter = match &loaded {
        Ok(l) => l.config.logging.filter.clone(),
        Err(_) => LoggingConfig::default().filter,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    info!("nadir starting up");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let loaded = loaded?;
    match &loaded.source {
        Some(source) => info!(
            path = %source.display(),
            excluded = loaded.config.exclusions.patients.len(),
            output = %loaded.config.output.dir.display(),
            "Configuration loaded"
        ),
        None => {
            warn!(path = %path.display(), "Config file not found, using built-in defaults");
            warn!("Copy nadir.example.toml to nadir.toml and edit it.");
        }
    }

    let summary = pipeline::run(&loaded.config, loaded.source.as_deref())?;
    for (kind, count) in &summary.anomalies {
        warn!(kind = kind.as_str(), count, "Anomalies need manual review");
    }
    info!(
        run_id = %summary.run_id,
        files = summary.files.len(),
        "Outputs written to {}",
        loaded.config.output.dir.display()
    );
    Ok(())
}
