use crate::cli::ConfigCommands;
use crate::config::{ConciergeConfig, API_KEY_ENV};
use anyhow::Result;
use std::path::Path;

pub async fn run(cmd: ConfigCommands, config_path: &Path) -> Result<()> {
    match cmd {
        ConfigCommands::Validate => validate(config_path),
        ConfigCommands::Show => show(config_path),
    }
}

fn validate(config_path: &Path) -> Result<()> {
    match ConciergeConfig::load(config_path) {
        Ok(config) => {
            let errors = config.validate();
            if errors.is_empty() {
                println!("✅ {} is valid.", config_path.display());
                if config.resolved_api_key().is_none() {
                    println!("⚠️  No API key found; set {} for the llm strategy.", API_KEY_ENV);
                }
            } else {
                println!("❌ Validation errors in {}:", config_path.display());
                for e in &errors {
                    println!("  - {}", e);
                }
                std::process::exit(1);
            }
        }
        Err(e) => {
            println!("❌ Failed to parse {}: {}", config_path.display(), e);
            std::process::exit(1);
        }
    }
    Ok(())
}

/// Effective configuration. Never prints the API key.
fn show(config_path: &Path) -> Result<()> {
    let mut config = ConciergeConfig::load_or_default(config_path);
    config.completion.api_key = None;
    match toml::to_string_pretty(&config) {
        Ok(s) => println!("{}", s),
        Err(e) => anyhow::bail!("Failed to serialize config: {}", e),
    }
    Ok(())
}
