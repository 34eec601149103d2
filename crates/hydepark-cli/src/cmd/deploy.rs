use super::Overrides;
use crate::output::{print_banner, print_json, print_section, print_table};
use anyhow::Context;
use hydepark_core::deploy::{invoking_user, DeployMode, DeploySummary, Deployer};
use hydepark_core::host::SystemHost;
use hydepark_core::step::StepStatus;
use std::path::Path;

/// `hydepark-deploy deploy`: full provisioning, or a quick update with `-u`.
pub fn run(overrides: &Overrides, source: &Path, update: bool, json: bool) -> anyhow::Result<()> {
    let config = overrides.load()?;
    let mode = if update {
        DeployMode::QuickUpdate
    } else {
        DeployMode::Full
    };

    let host = SystemHost::new();
    let deployer = Deployer::new(&host, &config, source, invoking_user());
    let summary = deployer.run(mode).context("deployment failed")?;

    if json {
        print_json(&summary)?;
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &DeploySummary) {
    let title = match (summary.mode, summary.warnings.is_empty()) {
        (DeployMode::Full, true) => "Deployment complete",
        (DeployMode::Full, false) => "Deployment complete (with warnings)",
        (DeployMode::QuickUpdate, true) => "Update complete",
        (DeployMode::QuickUpdate, false) => "Update complete (with warnings)",
    };
    print_banner(title);

    let rows: Vec<Vec<String>> = summary
        .steps
        .iter()
        .map(|s| {
            let status = match s.status {
                StepStatus::Ok => "ok",
                StepStatus::Skipped => "skipped",
                StepStatus::Warning => "WARN",
            };
            vec![
                s.name.clone(),
                status.to_string(),
                s.detail.clone().unwrap_or_default(),
            ]
        })
        .collect();
    println!();
    print_table(&["STEP", "STATUS", "DETAIL"], &rows);

    print_section("Warnings", &summary.warnings);
    print_section("Dashboard", &summary.urls);
    print_section(
        "Default login (change it)",
        &[
            format!("username: {}", summary.credentials.username),
            format!("password: {}", summary.credentials.password),
        ],
    );
    print_section("Useful commands", &summary.hints);

    if !summary.service_status.trim().is_empty() {
        println!("\nService status:\n{}", summary.service_status.trim_end());
    }
    println!(
        "\nInstalled to {} in {}s",
        summary.install_dir.display(),
        (summary.finished_at - summary.started_at).num_seconds()
    );
}
