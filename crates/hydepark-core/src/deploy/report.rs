use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{DeployMode, Deployer};
use crate::host::Host;
use crate::step::{StepRecord, StepRunner};
use crate::{network, systemd};

/// Dashboard login the application ships with.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Everything the operator needs after a successful deploy.
#[derive(Debug, Clone, Serialize)]
pub struct DeploySummary {
    pub mode: DeployMode,
    pub service: String,
    pub install_dir: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub urls: Vec<String>,
    pub credentials: Credentials,
    pub service_status: String,
    pub hints: Vec<String>,
    pub steps: Vec<StepRecord>,
    pub warnings: Vec<String>,
}

impl<H: Host + ?Sized> Deployer<'_, H> {
    pub(super) fn summary(
        &self,
        mode: DeployMode,
        started_at: DateTime<Utc>,
        steps: StepRunner,
    ) -> DeploySummary {
        let service = &self.config.service.name;
        let warnings = steps.warnings();
        let summary = DeploySummary {
            mode,
            service: service.clone(),
            install_dir: self.config.layout.install_dir.clone(),
            started_at,
            finished_at: Utc::now(),
            urls: network::reachable_urls(self.host, self.config.network.port),
            credentials: Credentials {
                username: self.config.dashboard.username.clone(),
                password: self.config.dashboard.password.clone(),
            },
            service_status: systemd::status_text(self.host, service),
            hints: hints(service),
            steps: steps.into_records(),
            warnings,
        };
        tracing::info!(
            ?mode,
            warnings = summary.warnings.len(),
            elapsed_secs = (summary.finished_at - summary.started_at).num_seconds(),
            "deploy finished"
        );
        summary
    }
}

fn hints(service: &str) -> Vec<String> {
    vec![
        format!("systemctl status {service}"),
        format!("systemctl restart {service}"),
        format!("journalctl -u {service} -f"),
        "hydepark-deploy deploy --update".to_string(),
        "hydepark-deploy verify".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::super::tests::fixture;
    use super::*;
    use crate::host::CommandOutput;
    use crate::step::StepOutcome;
    use crate::testing::FakeHost;

    #[test]
    fn summary_serializes_for_json_output() {
        let fx = fixture();
        let host = FakeHost::new();
        host.respond("hostname -I", CommandOutput::ok("192.168.1.20 fe80::1\n"));
        host.respond("systemctl status", CommandOutput::ok("Active: active (running)"));

        let mut steps = StepRunner::new();
        steps.advisory("firewall", || Ok(StepOutcome::Skipped("none".into())));
        let summary = Deployer::new(&host, &fx.config, &fx.source, "ubuntu").summary(
            DeployMode::QuickUpdate,
            Utc::now(),
            steps,
        );

        assert_eq!(
            summary.urls,
            vec!["http://localhost:8080", "http://192.168.1.20:8080"]
        );
        assert!(summary.hints.iter().any(|h| h == "journalctl -u hydepark-sync -f"));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["mode"], "quick_update");
        assert_eq!(json["credentials"]["password"], "123456");
        assert_eq!(json["service_status"], "Active: active (running)");
        assert_eq!(json["steps"][0]["status"], "skipped");
        assert!(json["warnings"].as_array().unwrap().is_empty());
    }
}
