use super::Deployer;
use crate::config::Firewall;
use crate::error::Result;
use crate::host::{run_checked, succeeds, Host};
use crate::step::StepOutcome;

impl<H: Host + ?Sized> Deployer<'_, H> {
    /// Refresh the package index and install the OS package list. Both are
    /// fatal: a half-provisioned host cannot build the Python stack.
    pub(super) fn install_system_packages(&self) -> Result<StepOutcome> {
        let manager = self.config.packages.manager.as_str();
        run_checked(self.host, manager, &["update"])?;

        let packages = &self.config.packages.system;
        if packages.is_empty() {
            return Ok(StepOutcome::Skipped("no system packages configured".to_string()));
        }
        let mut args = vec!["install", "-y"];
        args.extend(packages.iter().map(String::as_str));
        run_checked(self.host, manager, &args)?;
        tracing::info!(count = packages.len(), "system packages installed");
        Ok(StepOutcome::Done)
    }

    /// Allow the service port through every installed, active firewall
    /// manager. Inactive or absent managers are skipped silently.
    pub(super) fn open_firewall(&self) -> Result<StepOutcome> {
        let rule = format!("{}/tcp", self.config.network.port);
        let mut opened = Vec::new();

        for firewall in &self.config.network.firewalls {
            if !self.firewall_active(*firewall) {
                tracing::debug!(firewall = firewall.name(), "not active, skipping");
                continue;
            }
            match firewall {
                Firewall::Ufw => {
                    run_checked(self.host, "ufw", &["allow", &rule])?;
                    run_checked(self.host, "ufw", &["reload"])?;
                }
                Firewall::Firewalld => {
                    let port_arg = format!("--add-port={rule}");
                    run_checked(self.host, "firewall-cmd", &["--permanent", &port_arg])?;
                    run_checked(self.host, "firewall-cmd", &["--reload"])?;
                }
            }
            tracing::info!(firewall = firewall.name(), %rule, "port opened");
            opened.push(firewall.name());
        }

        if opened.is_empty() {
            Ok(StepOutcome::Skipped("no active firewall manager".to_string()))
        } else {
            Ok(StepOutcome::Done)
        }
    }

    fn firewall_active(&self, firewall: Firewall) -> bool {
        match firewall {
            Firewall::Ufw => {
                self.host.has_program("ufw")
                    && self
                        .host
                        .run("ufw", &["status"])
                        .map(|out| out.success() && out.stdout.contains("Status: active"))
                        .unwrap_or(false)
            }
            Firewall::Firewalld => {
                self.host.has_program("firewall-cmd")
                    && succeeds(self.host, "systemctl", &["is-active", "--quiet", "firewalld"])
            }
        }
    }
}
