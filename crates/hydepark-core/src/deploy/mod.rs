//! Deployment orchestrator.
//!
//! A full deploy is destructive: the previous installation, unit file and
//! port holder are removed unconditionally before anything is installed.
//! Nothing is rolled back on failure; whatever was applied is left in place
//! for inspection.

mod cleanup;
mod packages;
mod preflight;
mod python;
mod report;
mod service;
mod staging;

use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;

use crate::config::{DeployConfig, WarnLevel};
use crate::error::{DeployError, Result};
use crate::host::Host;
use crate::step::StepRunner;

pub use report::{Credentials, DeploySummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployMode {
    Full,
    /// Refresh application files and restart; no provisioning.
    QuickUpdate,
}

/// Runs on the target host as root; every privileged file and service
/// change is made directly by this process.
pub struct Deployer<'a, H: Host + ?Sized> {
    host: &'a H,
    config: &'a DeployConfig,
    source: PathBuf,
    user: String,
}

impl<'a, H: Host + ?Sized> Deployer<'a, H> {
    pub fn new(
        host: &'a H,
        config: &'a DeployConfig,
        source: impl Into<PathBuf>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            host,
            config,
            source: source.into(),
            user: user.into(),
        }
    }

    /// Refuses to start when the config has validation errors; nothing on
    /// the host is touched in that case.
    pub fn run(&self, mode: DeployMode) -> Result<DeploySummary> {
        let errors: Vec<String> = self
            .config
            .validate()
            .into_iter()
            .filter(|w| w.level == WarnLevel::Error)
            .map(|w| w.message)
            .collect();
        if !errors.is_empty() {
            return Err(DeployError::InvalidConfig(errors));
        }

        tracing::info!(
            ?mode,
            service = %self.config.service.name,
            install_dir = %self.config.layout.install_dir.display(),
            source = %self.source.display(),
            user = %self.user,
            "deploy starting"
        );
        match mode {
            DeployMode::Full => self.full(),
            DeployMode::QuickUpdate => self.quick_update(),
        }
    }

    fn full(&self) -> Result<DeploySummary> {
        let started_at = Utc::now();
        let mut steps = StepRunner::new();

        steps.fatal("preflight", || self.preflight())?;
        steps.advisory("internet connectivity", || self.check_connectivity());
        steps.fatal("cleanup", || self.cleanup())?;
        steps.fatal("system packages", || self.install_system_packages())?;
        steps.advisory("firewall", || self.open_firewall());
        steps.fatal("application staging", || self.stage_application())?;
        steps.fatal("python environment", || self.provision_python())?;
        steps.fatal("data layout", || self.lay_out_data())?;
        steps.fatal("service registration", || self.register_service())?;
        steps.fatal("service start", || self.start_service())?;
        steps.advisory("http probe", || self.probe_http());

        Ok(self.summary(DeployMode::Full, started_at, steps))
    }

    fn quick_update(&self) -> Result<DeploySummary> {
        let started_at = Utc::now();
        let install_dir = &self.config.layout.install_dir;
        if !install_dir.is_dir() {
            return Err(DeployError::NotInstalled(install_dir.clone()));
        }
        self.require_root()?;

        let mut steps = StepRunner::new();
        steps.advisory("stop service", || self.stop_service());
        steps.fatal("refresh application files", || self.refresh_application())?;
        steps.fatal("restart service", || self.restart_service())?;

        Ok(self.summary(DeployMode::QuickUpdate, started_at, steps))
    }
}

/// The user that should own the installation: the account that invoked
/// `sudo`, else the current user.
pub fn invoking_user() -> String {
    ["SUDO_USER", "USER"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "root".to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
