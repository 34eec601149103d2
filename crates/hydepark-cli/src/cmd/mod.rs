pub mod config;
pub mod deploy;
pub mod verify;

use anyhow::Context;
use hydepark_core::config::DeployConfig;
use std::path::PathBuf;

/// Global flags that shape the effective [`DeployConfig`].
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub install_dir: Option<PathBuf>,
    pub port: Option<u16>,
}

impl Overrides {
    /// Load the config file (or defaults) and apply single-field overrides.
    pub fn load(&self) -> anyhow::Result<DeployConfig> {
        let mut config = match &self.config {
            Some(path) => DeployConfig::load(Some(path))
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => DeployConfig::default(),
        };
        if let Some(dir) = &self.install_dir {
            config.layout.install_dir = dir.clone();
        }
        if let Some(port) = self.port {
            config.network.port = port;
        }
        Ok(config)
    }
}
