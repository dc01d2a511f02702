//! Configuration management commands

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use gridq_core::Config;

use crate::settings::{self, CONFIG_FILE_NAME};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show {
        /// Config file to read instead of the default lookup
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Initialize configuration file
    Init {
        /// Where to write the file
        #[arg(long, default_value = CONFIG_FILE_NAME)]
        path: PathBuf,
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn run(cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Show { config } => show(config.as_deref()).await,
        ConfigCommands::Init { path, force } => init(&path, force).await,
    }
}

async fn show(explicit: Option<&Path>) -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    let (config, source) = settings::load(explicit)?;
    match source {
        Some(path) => println!("Config file: {}\n", path.display()),
        None => println!("No configuration file found. Using defaults.\n"),
    }

    println!("{}", toml::to_string_pretty(&config)?);

    if let Err(e) = config.validate() {
        println!("Warning: configuration is invalid: {e}");
    }
    Ok(())
}

async fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("Configuration file already exists: {}", path.display());
        println!("Use --force to overwrite");
        return Ok(());
    }

    std::fs::write(path, default_config_text()?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Configuration file created: {}", path.display());

    Ok(())
}

fn default_config_text() -> Result<String> {
    let body = toml::to_string_pretty(&Config::default())?;
    Ok(format!(
        "# GridQ configuration\n\
         # goal.mode: fixed | random_per_episode | manual\n\
         # Environment overrides use GRIDQ__SECTION__KEY, e.g. GRIDQ__TRAINING__NUM_EPISODES=500\n\n\
         {body}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_text_parses_back() {
        let text = default_config_text().unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[tokio::test]
    async fn test_init_respects_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        std::fs::write(&path, "# custom\n").unwrap();
        init(&path, false).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# custom\n");

        init(&path, true).await.unwrap();
        let (config, _) = settings::load(Some(&path)).unwrap();
        assert_eq!(config, Config::default());
    }
}
