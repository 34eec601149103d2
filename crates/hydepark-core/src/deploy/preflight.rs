use std::path::{Path, PathBuf};

use super::Deployer;
use crate::error::{DeployError, Result};
use crate::host::{run_checked, Host};
use crate::network;
use crate::step::StepOutcome;

impl<H: Host + ?Sized> Deployer<'_, H> {
    /// Supported package manager present, running as root, and the source
    /// tree safely outside the directory cleanup is about to delete.
    pub(super) fn preflight(&self) -> Result<StepOutcome> {
        let manager = &self.config.packages.manager;
        if !self.host.has_program(manager) {
            return Err(DeployError::UnsupportedHost(manager.clone()));
        }
        self.require_root()?;

        let install_dir = &self.config.layout.install_dir;
        if is_within(&self.source, install_dir) {
            return Err(DeployError::SourceInsideInstall {
                source_dir: self.source.clone(),
                install_dir: install_dir.clone(),
            });
        }
        Ok(StepOutcome::Done)
    }

    /// Unit files, `/opt` and the package manager all need uid 0.
    pub(super) fn require_root(&self) -> Result<()> {
        let out = run_checked(self.host, "id", &["-u"])?;
        let uid = out.stdout.trim();
        if uid != "0" {
            return Err(DeployError::NotRoot {
                uid: uid.to_string(),
            });
        }
        Ok(())
    }

    pub(super) fn check_connectivity(&self) -> Result<StepOutcome> {
        let target = &self.config.network.connectivity_host;
        if network::has_internet(self.host, target) {
            Ok(StepOutcome::Done)
        } else {
            Ok(StepOutcome::Warned(format!(
                "{target} unreachable; package downloads may fail"
            )))
        }
    }
}

fn is_within(path: &Path, dir: &Path) -> bool {
    let path = canonical_or_self(path);
    let dir = canonical_or_self(dir);
    path.starts_with(dir)
}

fn canonical_or_self(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
