//! Virtual environment and Python dependency installation.
//!
//! Order matters: the numeric foundation must be importable before the
//! face-recognition stack compiles against it, and the model data package
//! is only useful once `face_recognition` is present.

use super::Deployer;
use crate::error::{DeployError, Result};
use crate::host::{run_checked, Host};
use crate::step::StepOutcome;

impl<H: Host + ?Sized> Deployer<'_, H> {
    pub(super) fn provision_python(&self) -> Result<StepOutcome> {
        let layout = &self.config.layout;
        let packages = &self.config.packages;
        let venv = layout.venv_path().display().to_string();
        let mut warnings = Vec::new();

        run_checked(self.host, "python3", &["-m", "venv", &venv])?;

        if let Err(e) = self.pip(&["--upgrade", "pip"]) {
            warnings.push(format!("pip self-upgrade failed: {e}"));
        }

        for package in &packages.foundation {
            self.pip(&[package.as_str()])?;
        }
        for package in &packages.face_stack {
            self.pip(&[package.as_str()])?;
        }

        match self.install_model_data() {
            Some(source) => tracing::info!(%source, "face recognition model data installed"),
            None => warnings.push(format!(
                "face recognition model data unavailable from all {} sources; \
                 face matching will not work until it is installed",
                packages.model_data_sources.len()
            )),
        }

        for package in &packages.vision {
            self.pip(&[package.as_str()])?;
        }

        let requirements = layout.install_dir.join(&packages.requirements);
        let requirements = requirements.display().to_string();
        self.pip(&["-r", &requirements])?;

        self.verify_imports()?;

        if warnings.is_empty() {
            Ok(StepOutcome::Done)
        } else {
            Ok(StepOutcome::Warned(warnings.join("; ")))
        }
    }

    fn pip(&self, args: &[&str]) -> Result<()> {
        let pip = self.config.layout.venv_pip().display().to_string();
        let mut full = vec!["install"];
        full.extend_from_slice(args);
        run_checked(self.host, &pip, &full)?;
        Ok(())
    }

    /// Try each source in order; the first that installs wins.
    fn install_model_data(&self) -> Option<&str> {
        for source in &self.config.packages.model_data_sources {
            match self.pip(&[source.as_str()]) {
                Ok(()) => return Some(source.as_str()),
                Err(e) => tracing::warn!(%source, error = %e, "model data source failed"),
            }
        }
        None
    }

    fn verify_imports(&self) -> Result<()> {
        let python = self.config.layout.venv_python().display().to_string();
        for module in &self.config.packages.verify_imports {
            let stmt = format!("import {module}");
            let out = self.host.run(&python, &["-c", &stmt])?;
            if !out.success() {
                return Err(DeployError::ImportFailed {
                    module: module.clone(),
                    detail: out.detail(),
                });
            }
        }
        tracing::info!(modules = ?self.config.packages.verify_imports, "imports verified");
        Ok(())
    }
}
