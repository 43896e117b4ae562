//! Mutabor CLI - deterministic source-mutation runs from a TOML config.
//!
//! Argument contract:
//! - no arguments: read the config from the default location
//! - one argument: read the config from the given path
//! - config path plus `undo`: wipe the configured output directory and exit
//! - anything else: warn and exit without running

use std::path::{Path, PathBuf};

use clap::Parser;
use mutabor_engine::{ConfigurationError, Engine, RunConfig};
use mutabor_lang::LangProvider;
use mutabor_manifest::{ManifestSink, SqliteManifestSink, IN_MEMORY_TARGET};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod error;

use error::CliResult;

const DEFAULT_CONFIG_PATH: &str = "./mutabor.toml";
const UNDO_KEYWORD: &str = "undo";

/// Mutabor CLI application
#[derive(Parser)]
#[command(name = "mutabor")]
#[command(about = "Mutate source corpora into labelled variants", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the run configuration file
    config: Option<PathBuf>,

    /// Optional action keyword; `undo` wipes the configured output directory
    action: Option<String>,
}

#[tokio::main]
async fn main() -> CliResult<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    info!("starting mutabor");
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => {
            info!("no config argument, looking at the default location {DEFAULT_CONFIG_PATH}");
            PathBuf::from(DEFAULT_CONFIG_PATH)
        }
    };

    if let Some(action) = &cli.action {
        if action.eq_ignore_ascii_case(UNDO_KEYWORD) {
            info!("undo requested, cleaning the output directory and stopping after");
            let config = RunConfig::load(&config_path)?;
            undo(&config)?;
            return Ok(());
        }
        warn!(action = %action, "unknown action, not starting");
        return Ok(());
    }

    let config = RunConfig::load(&config_path)?;
    let mut engine = build_engine(&config).await?;
    let summary = engine.run().await?;
    info!(
        units = summary.units,
        applied = summary.applied,
        files = summary.files_written,
        "everything done, closing mutabor"
    );
    Ok(())
}

/// Wire the provider and the manifest sink into a configured engine.
///
/// Configuration failures surface before any file is touched; the manifest
/// target is only opened once the configuration has validated.
async fn build_engine(config: &RunConfig) -> CliResult<Engine> {
    let output_dir = validated_output_dir(config)?;
    config.quota()?;
    config.strategy()?;

    let target = config.manifest_target(Path::new(&output_dir));
    let target_string = target.to_string_lossy().into_owned();
    if target_string != IN_MEMORY_TARGET {
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let sink: Box<dyn ManifestSink> = match &config.manifest_schema {
        Some(schema_path) => Box::new(
            SqliteManifestSink::create_with_schema_file(Path::new(schema_path), &target_string)
                .await?,
        ),
        None => Box::new(SqliteManifestSink::create(&target_string).await?),
    };

    Ok(Engine::from_config(
        config,
        Box::new(LangProvider::new()),
        sink,
    )?)
}

fn validated_output_dir(config: &RunConfig) -> Result<String, ConfigurationError> {
    config
        .output_dir
        .clone()
        .filter(|dir| !dir.trim().is_empty())
        .ok_or(ConfigurationError::BlankOutputDir)
}

/// Wipe the configured output directory so a run can be repeated. Input
/// directories, the configuration and the schema are left alone.
fn undo(config: &RunConfig) -> CliResult<()> {
    let output_dir = validated_output_dir(config)?;
    let path = Path::new(&output_dir);
    if path.exists() {
        std::fs::remove_dir_all(path)?;
        info!(output = %output_dir, "output directory removed");
    } else {
        info!(output = %output_dir, "output directory does not exist, nothing to undo");
    }
    Ok(())
}
