//! Read-only health verification of an installed deployment.
//!
//! Every check runs regardless of earlier failures so the operator sees the
//! whole picture in one pass. Nothing here changes host state.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use crate::config::DeployConfig;
use crate::host::{succeeds, Host};
use crate::network::{self, HttpCheck};
use crate::systemd;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
    /// Precondition not met; not evaluated.
    Skip,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub detail: String,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            detail: detail.into(),
        }
    }

    fn from_bool(name: &str, ok: bool, pass: impl Into<String>, fail: impl Into<String>) -> Self {
        if ok {
            Self::new(name, CheckStatus::Pass, pass)
        } else {
            Self::new(name, CheckStatus::Fail, fail)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub service: String,
    pub checks: Vec<CheckResult>,
    /// Commands worth running when something failed. Empty on success.
    pub remediation: Vec<String>,
}

impl VerifyReport {
    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| c.status == CheckStatus::Fail)
    }

    pub fn passed(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            0
        } else {
            1
        }
    }

    pub fn count(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }
}

pub struct HealthVerifier<'a, H: Host + ?Sized> {
    host: &'a H,
    config: &'a DeployConfig,
}

impl<'a, H: Host + ?Sized> HealthVerifier<'a, H> {
    pub fn new(host: &'a H, config: &'a DeployConfig) -> Self {
        Self { host, config }
    }

    pub fn run(&self) -> VerifyReport {
        let checks = vec![
            self.service_active(),
            self.port_listening(),
            self.process_running(),
            self.data_store(),
            self.config_file(),
            self.virtualenv(),
            self.http_response(),
        ];
        for check in &checks {
            match check.status {
                CheckStatus::Fail => tracing::warn!(check = %check.name, "{}", check.detail),
                _ => tracing::debug!(check = %check.name, status = ?check.status, "{}", check.detail),
            }
        }

        let mut report = VerifyReport {
            service: self.config.service.name.clone(),
            checks,
            remediation: Vec::new(),
        };
        if !report.passed() {
            report.remediation = remediation(self.config);
        }
        report
    }

    fn service_active(&self) -> CheckResult {
        let name = &self.config.service.name;
        CheckResult::from_bool(
            "service active",
            systemd::is_active(self.host, name),
            format!("{name} is active"),
            format!("{name} is not active"),
        )
    }

    fn port_listening(&self) -> CheckResult {
        let port = self.config.network.port;
        CheckResult::from_bool(
            "port listening",
            network::is_listening(self.host, port),
            format!("port {port} is listening"),
            format!("nothing listening on port {port}"),
        )
    }

    fn process_running(&self) -> CheckResult {
        let layout = &self.config.layout;
        let entry = layout.install_dir.join(&layout.entry_point);
        let pattern = entry.display().to_string();
        CheckResult::from_bool(
            "process running",
            succeeds(self.host, "pgrep", &["-f", &pattern]),
            format!("{pattern} process found"),
            format!("no process running {pattern}"),
        )
    }

    fn data_store(&self) -> CheckResult {
        const NAME: &str = "data store";
        let layout = &self.config.layout;
        let data = layout.data_path();
        if !data.is_dir() {
            return CheckResult::new(NAME, CheckStatus::Fail, format!("{} missing", data.display()));
        }
        let Some(workers) = layout.workers_store() else {
            return CheckResult::new(NAME, CheckStatus::Pass, format!("{} present", data.display()));
        };
        match read_json_array(&workers) {
            Ok(len) => CheckResult::new(
                NAME,
                CheckStatus::Pass,
                format!("{} holds {len} record(s)", workers.display()),
            ),
            Err(why) => CheckResult::new(NAME, CheckStatus::Fail, format!("{}: {why}", workers.display())),
        }
    }

    fn config_file(&self) -> CheckResult {
        let path = self.config.layout.config_path();
        CheckResult::from_bool(
            "application config",
            path.is_file(),
            format!("{} present", path.display()),
            format!("{} missing", path.display()),
        )
    }

    fn virtualenv(&self) -> CheckResult {
        let layout = &self.config.layout;
        let venv = layout.venv_path();
        let python = layout.venv_python();
        let detail = if !venv.is_dir() {
            Some(format!("{} missing", venv.display()))
        } else if !python.exists() {
            Some(format!("{} missing", python.display()))
        } else {
            None
        };
        match detail {
            None => CheckResult::new("virtualenv", CheckStatus::Pass, format!("{} present", python.display())),
            Some(why) => CheckResult::new("virtualenv", CheckStatus::Fail, why),
        }
    }

    fn http_response(&self) -> CheckResult {
        const NAME: &str = "http response";
        let readiness = &self.config.readiness;
        if !readiness.http_probe {
            return CheckResult::new(NAME, CheckStatus::Skip, "http probe disabled");
        }
        let url = self.config.network.local_url();
        let status = match self
            .host
            .http_status(&url, Duration::from_secs(readiness.http_timeout_secs))
        {
            Ok(status) => status,
            Err(e) => return CheckResult::new(NAME, CheckStatus::Skip, e.to_string()),
        };
        let check = HttpCheck::classify(status, &readiness.accepted_statuses);
        CheckResult::from_bool(
            NAME,
            check.is_accepted(),
            format!("{} from {url}", check.describe()),
            format!("{} from {url}", check.describe()),
        )
    }
}

/// Convenience wrapper for [`HealthVerifier::run`].
pub fn verify<H: Host + ?Sized>(host: &H, config: &DeployConfig) -> VerifyReport {
    HealthVerifier::new(host, config).run()
}

fn read_json_array(path: &Path) -> Result<usize, String> {
    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(serde_json::Value::Array(items)) => Ok(items.len()),
        Ok(_) => Err("not a JSON array".to_string()),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}

/// Commands that usually explain a failed verification.
pub fn remediation(config: &DeployConfig) -> Vec<String> {
    let service = &config.service;
    let layout = &config.layout;
    vec![
        format!("systemctl status {}", service.name),
        format!("journalctl -u {} -n {}", service.name, service.log_lines),
        format!(
            "cd {} && {} {}",
            layout.install_dir.display(),
            layout.venv_python().display(),
            layout.entry_point
        ),
    ]
}
