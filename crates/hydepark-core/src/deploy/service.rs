use std::borrow::Cow;
use std::time::Duration;

use super::Deployer;
use crate::error::{DeployError, Result};
use crate::host::{run_checked, Host};
use crate::network::{self, HttpCheck};
use crate::poll::{poll_until, PollOutcome, PollPolicy};
use crate::step::StepOutcome;
use crate::{io, systemd};

const UNIT_FILE_MODE: u32 = 0o644;

impl<H: Host + ?Sized> Deployer<'_, H> {
    /// Render the unit file, install it and enable it at boot.
    pub(super) fn register_service(&self) -> Result<StepOutcome> {
        let service = &self.config.service;
        let template = self.unit_template()?;
        let unit = systemd::render_unit(
            &template,
            &service.user_placeholder,
            &self.user,
            &self.config.layout.install_dir,
        );

        let path = service.unit_path();
        io::atomic_write(&path, unit.as_bytes())?;
        io::set_mode(&path, UNIT_FILE_MODE)?;
        tracing::info!(path = %path.display(), "unit file written");

        run_checked(self.host, "systemctl", &["daemon-reload"])?;
        run_checked(self.host, "systemctl", &["enable", &service.name])?;
        Ok(StepOutcome::Done)
    }

    fn unit_template(&self) -> Result<Cow<'static, str>> {
        let path = self.source.join(&self.config.service.unit_template);
        if path.is_file() {
            Ok(Cow::Owned(std::fs::read_to_string(&path)?))
        } else {
            tracing::info!(path = %path.display(), "no unit template in source, using built-in unit");
            Ok(Cow::Borrowed(systemd::BUILTIN_UNIT))
        }
    }

    /// Start the unit, confirm it stays active, then wait for the port.
    pub(super) fn start_service(&self) -> Result<StepOutcome> {
        let name = self.config.service.name.as_str();
        let readiness = &self.config.readiness;
        let port = self.config.network.port;

        let started = self.host.run("systemctl", &["start", name])?;
        if !started.success() {
            tracing::error!(service = name, detail = %started.detail(), "systemctl start failed");
            return Err(DeployError::ServiceInactive {
                service: name.to_string(),
                logs: self.recent_logs(),
            });
        }
        self.host
            .sleep(Duration::from_secs(readiness.start_settle_secs));

        if !systemd::is_active(self.host, name) {
            return Err(DeployError::ServiceInactive {
                service: name.to_string(),
                logs: self.recent_logs(),
            });
        }

        self.host
            .sleep(Duration::from_secs(readiness.listen_settle_secs));
        let policy = PollPolicy::new(
            readiness.port_attempts,
            Duration::from_secs(readiness.port_interval_secs),
        );
        tracing::info!(port, budget_secs = policy.budget().as_secs(), "waiting for port");
        match poll_until(self.host, policy, |_| network::is_listening(self.host, port)) {
            PollOutcome::Ready { attempt } => {
                tracing::info!(port, attempt, "service listening");
                Ok(StepOutcome::Done)
            }
            PollOutcome::TimedOut { attempts } => Err(DeployError::PortNotListening {
                port,
                attempts,
                logs: self.recent_logs(),
            }),
        }
    }

    pub(super) fn probe_http(&self) -> Result<StepOutcome> {
        let readiness = &self.config.readiness;
        if !readiness.http_probe {
            return Ok(StepOutcome::Skipped("http probe disabled".to_string()));
        }
        let url = self.config.network.local_url();
        let status = match self
            .host
            .http_status(&url, Duration::from_secs(readiness.http_timeout_secs))
        {
            Ok(status) => status,
            Err(e) => return Ok(StepOutcome::Skipped(e.to_string())),
        };
        let check = HttpCheck::classify(status, &readiness.accepted_statuses);
        if check.is_accepted() {
            tracing::info!(%url, result = %check.describe(), "dashboard responded");
            Ok(StepOutcome::Done)
        } else {
            Ok(StepOutcome::Warned(format!(
                "{} from {url}; service may still be initializing",
                check.describe()
            )))
        }
    }

    pub(super) fn stop_service(&self) -> Result<StepOutcome> {
        run_checked(self.host, "systemctl", &["stop", &self.config.service.name])?;
        Ok(StepOutcome::Done)
    }

    pub(super) fn restart_service(&self) -> Result<StepOutcome> {
        run_checked(self.host, "systemctl", &["restart", &self.config.service.name])?;
        Ok(StepOutcome::Done)
    }

    fn recent_logs(&self) -> String {
        let service = &self.config.service;
        systemd::journal_tail(self.host, &service.name, service.log_lines)
    }
}
