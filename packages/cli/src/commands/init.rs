use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use raqam_engine::{EngineConfig, DEFAULT_CONFIG_NAME};
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    let config_json = serde_json::to_string_pretty(&EngineConfig::default())?;
    fs::write(&config_path, config_json)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("Next steps:");
    println!("  1. Add your own opt-out classes to {}", DEFAULT_CONFIG_NAME);
    println!("  2. Run: raqam convert page.json --format html");

    Ok(())
}
