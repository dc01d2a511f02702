//! Configuration loading for the CLI
//!
//! Layers, lowest to highest: built-in defaults, config file, `GRIDQ__*`
//! environment variables. Command-line flags are applied by the caller.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{ConfigBuilder, Environment, File};
use gridq_core::Config;

/// Default file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "gridq.toml";

/// Load configuration from file and environment
pub fn load(explicit: Option<&Path>) -> Result<(Config, Option<PathBuf>)> {
    let config_path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(),
    };

    let mut builder = ConfigBuilder::<config::builder::DefaultState>::default();

    // Add config file if it exists
    if let Some(path) = &config_path {
        tracing::info!("Loading config from: {:?}", path);
        builder = builder.add_source(File::from(path.clone()).required(explicit.is_some()));
    } else {
        tracing::info!("No config file found, using defaults");
    }

    // Add environment variables, e.g. GRIDQ__TRAINING__NUM_EPISODES=500
    builder = builder.add_source(
        Environment::with_prefix("GRIDQ")
            .separator("__")
            .try_parsing(true),
    );

    let config: Config = builder
        .build()
        .context("Failed to read configuration")?
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    Ok((config, config_path))
}

/// Find the configuration file
pub fn find_config_file() -> Option<PathBuf> {
    // Check in order: GRIDQ_CONFIG env, ./gridq.toml, ~/.config/gridq/gridq.toml
    if let Ok(path) = std::env::var("GRIDQ_CONFIG") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }

    if let Some(home) = dirs::home_dir() {
        let user_config = home.join(".config").join("gridq").join(CONFIG_FILE_NAME);
        if user_config.exists() {
            return Some(user_config);
        }
    }

    None
}
