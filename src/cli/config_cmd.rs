use std::path::Path;

use anyhow::{Context, Result};

use catstats::core::config::OverlayConfig;

use crate::cli::output::OutputOptions;

pub fn init(path: &Path, _opts: &OutputOptions) -> Result<()> {
    if path.exists() {
        eprintln!("Config file already exists at {}", path.display());
        eprintln!("Remove it first if you want to regenerate.");
        return Ok(());
    }
    let path = OverlayConfig::default()
        .save(path)
        .context("Failed to write config")?;
    println!("Generated config at {}", path.display());
    Ok(())
}

pub fn check(path: &Path, _opts: &OutputOptions) -> Result<()> {
    if !path.exists() {
        eprintln!("No config file found at {}", path.display());
        eprintln!("Run `catstats config init --path {}` to create one.", path.display());
        return Ok(());
    }

    let config = OverlayConfig::load(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    let issues = config.validate();
    if issues.is_empty() {
        println!("Config OK: {}", path.display());
        Ok(())
    } else {
        eprintln!("Config issues found in {}:", path.display());
        for issue in &issues {
            eprintln!("  - {}", issue);
        }
        anyhow::bail!("{} config issue(s)", issues.len())
    }
}
