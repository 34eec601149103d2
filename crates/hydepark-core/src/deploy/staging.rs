use std::path::PathBuf;

use super::Deployer;
use crate::error::{DeployError, Result};
use crate::host::{run_checked, Host};
use crate::io;
use crate::step::StepOutcome;

const EMPTY_STORE: &[u8] = b"[]";

impl<H: Host + ?Sized> Deployer<'_, H> {
    pub(super) fn stage_application(&self) -> Result<StepOutcome> {
        let layout = &self.config.layout;
        self.require_sources(&layout.staged_dirs, &layout.staged_files)?;

        io::ensure_dir(&layout.install_dir)?;
        self.chown_install_dir()?;
        self.copy_items(&layout.staged_dirs, &layout.staged_files)?;
        tracing::info!(
            dirs = layout.staged_dirs.len(),
            files = layout.staged_files.len(),
            "application staged"
        );
        Ok(StepOutcome::Done)
    }

    /// Overwrite the quick-update subset in place. Never touches `data/`.
    pub(super) fn refresh_application(&self) -> Result<StepOutcome> {
        let layout = &self.config.layout;
        self.require_sources(&layout.update_dirs, &layout.update_files)?;
        self.copy_items(&layout.update_dirs, &layout.update_files)?;
        Ok(StepOutcome::Done)
    }

    /// Empty JSON stores and their directories. Directories get
    /// `dir_mode`, files `file_mode`.
    pub(super) fn lay_out_data(&self) -> Result<StepOutcome> {
        let layout = &self.config.layout;
        let data = layout.data_path();

        io::ensure_dir(&data)?;
        io::set_mode(&data, layout.dir_mode.bits())?;
        for sub in &layout.data_subdirs {
            let dir = data.join(sub);
            io::ensure_dir(&dir)?;
            io::set_mode(&dir, layout.dir_mode.bits())?;
        }
        for file in &layout.data_files {
            let path = data.join(file);
            io::atomic_write(&path, EMPTY_STORE)?;
            io::set_mode(&path, layout.file_mode.bits())?;
        }

        // venv and data were created by this process; hand them over too
        self.chown_install_dir()?;
        Ok(StepOutcome::Done)
    }

    fn require_sources(&self, dirs: &[String], files: &[String]) -> Result<()> {
        let missing = dirs
            .iter()
            .map(|d| (self.source.join(d), true))
            .chain(files.iter().map(|f| (self.source.join(f), false)))
            .find(|(path, is_dir)| if *is_dir { !path.is_dir() } else { !path.is_file() });
        match missing {
            Some((path, _)) => Err(DeployError::MissingSource(path)),
            None => Ok(()),
        }
    }

    fn copy_items(&self, dirs: &[String], files: &[String]) -> Result<()> {
        let install_dir = &self.config.layout.install_dir;
        for dir in dirs {
            io::copy_tree(&self.source.join(dir), &install_dir.join(dir))?;
        }
        for file in files {
            let to: PathBuf = install_dir.join(file);
            std::fs::copy(self.source.join(file), &to)?;
        }
        Ok(())
    }

    fn chown_install_dir(&self) -> Result<()> {
        let owner = format!("{0}:{0}", self.user);
        let dir = self.config.layout.install_dir.display().to_string();
        run_checked(self.host, "chown", &["-R", &owner, &dir])?;
        Ok(())
    }
}
