use super::Overrides;
use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use hydepark_core::config::{DeployConfig, WarnLevel};
use hydepark_core::io;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective config (file plus flag overrides)
    Show,

    /// Write a config file with every default spelled out
    Init {
        /// Destination; left untouched if it already exists
        path: PathBuf,
    },

    /// Validate the config for common mistakes
    Validate,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(overrides: &Overrides, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(overrides, json),
        ConfigSubcommand::Init { path } => init(&path, json),
        ConfigSubcommand::Validate => validate(overrides, json),
    }
}

fn show(overrides: &Overrides, json: bool) -> anyhow::Result<()> {
    let config = overrides.load()?;
    if json {
        print_json(&config)?;
    } else {
        print!("{}", serde_yaml::to_string(&config)?);
    }
    Ok(())
}

fn init(path: &Path, json: bool) -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(&DeployConfig::default())?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        io::ensure_dir(parent)?;
    }
    let created = io::write_if_missing(path, yaml.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;

    if json {
        print_json(&serde_json::json!({
            "path": path,
            "created": created,
        }))?;
    } else if created {
        println!("Wrote default config to {}", path.display());
    } else {
        println!("{} already exists; left unchanged", path.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(overrides: &Overrides, json: bool) -> anyhow::Result<()> {
    let config = overrides.load()?;
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    let has_errors = warnings.iter().any(|w| w.level == WarnLevel::Error);
    if has_errors {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}
