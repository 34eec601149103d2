use std::time::Duration;

use super::Deployer;
use crate::error::Result;
use crate::host::{command_line, Host};
use crate::step::StepOutcome;
use crate::{io, network, systemd};

impl<H: Host + ?Sized> Deployer<'_, H> {
    /// Tear down whatever a previous deploy left behind. Every part is a
    /// no-op when there is nothing to remove; failing commands are logged
    /// and skipped. Only filesystem removal errors abort.
    pub(super) fn cleanup(&self) -> Result<StepOutcome> {
        let unit = self.config.service.name.as_str();
        let mut removed = Vec::new();

        if systemd::is_active(self.host, unit) {
            self.tolerate("systemctl", &["stop", unit]);
            removed.push("stopped service");
        }
        if systemd::is_enabled(self.host, unit) {
            self.tolerate("systemctl", &["disable", unit]);
            removed.push("disabled service");
        }

        let port = self.config.network.port;
        let holders = network::port_holders(self.host, port);
        if !holders.is_empty() {
            for pid in &holders {
                tracing::info!(pid, port, "killing port holder");
                self.tolerate("kill", &["-9", &pid.to_string()]);
            }
            self.host
                .sleep(Duration::from_secs(self.config.readiness.kill_wait_secs));
            removed.push("freed port");
        }

        if io::remove_tree_if_exists(&self.config.layout.install_dir)? {
            removed.push("removed install dir");
        }
        if io::remove_file_if_exists(&self.config.service.unit_path())? {
            self.tolerate("systemctl", &["daemon-reload"]);
            removed.push("removed unit file");
        }

        if removed.is_empty() {
            Ok(StepOutcome::Skipped("nothing to clean".to_string()))
        } else {
            tracing::info!(actions = ?removed, "previous installation cleaned");
            Ok(StepOutcome::Done)
        }
    }

    fn tolerate(&self, program: &str, args: &[&str]) {
        match self.host.run(program, args) {
            Ok(out) if out.success() => {}
            Ok(out) => tracing::warn!(
                command = %command_line(program, args),
                "ignored failure: {}",
                out.detail()
            ),
            Err(e) => tracing::warn!(command = %command_line(program, args), "ignored: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::fixture;
    use super::*;
    use crate::host::CommandOutput;
    use crate::testing::FakeHost;

    fn clean_host() -> FakeHost {
        let host = FakeHost::new();
        host.fail("systemctl is-active");
        host.fail("systemctl is-enabled");
        host.respond("lsof -t", CommandOutput::failed(1, ""));
        host
    }

    #[test]
    fn nothing_to_clean_is_a_noop() {
        let fx = fixture();
        let host = clean_host();
        let deployer = Deployer::new(&host, &fx.config, &fx.source, "ubuntu");

        let first = deployer.cleanup().unwrap();
        let second = deployer.cleanup().unwrap();
        assert_eq!(first, StepOutcome::Skipped("nothing to clean".into()));
        assert_eq!(second, first);
        assert!(!host.called("systemctl stop"));
        assert!(!host.called("kill"));
        assert!(!host.called("systemctl daemon-reload"));
        assert!(fx.source.join("main.py").exists());
    }

    #[test]
    fn previous_installation_is_torn_down() {
        let fx = fixture();
        let install = &fx.config.layout.install_dir;
        std::fs::create_dir_all(install.join("data")).unwrap();
        std::fs::write(install.join("data/workers.json"), "[]").unwrap();
        let unit_path = fx.config.service.unit_path();
        std::fs::create_dir_all(unit_path.parent().unwrap()).unwrap();
        std::fs::write(&unit_path, "[Unit]\n").unwrap();

        let host = FakeHost::new();
        host.respond("lsof -t", CommandOutput::ok("4242\n4243\n"));
        let outcome = Deployer::new(&host, &fx.config, &fx.source, "ubuntu")
            .cleanup()
            .unwrap();

        assert_eq!(outcome, StepOutcome::Done);
        assert!(!install.exists());
        assert!(!unit_path.exists());
        assert_eq!(
            host.calls(),
            vec![
                "systemctl is-active --quiet hydepark-sync",
                "systemctl stop hydepark-sync",
                "systemctl is-enabled --quiet hydepark-sync",
                "systemctl disable hydepark-sync",
                "lsof -t -i :8080",
                "kill -9 4242",
                "kill -9 4243",
                "systemctl daemon-reload",
            ]
        );
        assert_eq!(
            host.total_slept(),
            Duration::from_secs(fx.config.readiness.kill_wait_secs)
        );
    }

    #[test]
    fn failing_stop_is_tolerated() {
        let fx = fixture();
        let host = FakeHost::new();
        host.fail("systemctl stop");
        host.unspawnable("kill");
        host.respond("lsof -t", CommandOutput::ok("77\n"));
        let outcome = Deployer::new(&host, &fx.config, &fx.source, "ubuntu").cleanup();
        assert!(outcome.is_ok());
    }
}
