//! Read-only systemd queries and unit rendering.
//!
//! Mutating calls (start, stop, enable, ...) live with the deployer, which is
//! the only component allowed to change service state.

use std::path::Path;

use crate::host::{succeeds, Host};

/// Placeholder in unit templates replaced by the install directory.
pub const INSTALL_DIR_PLACEHOLDER: &str = "YOUR_INSTALL_DIR";

/// Rendered when the source tree carries no unit template of its own.
pub const BUILTIN_UNIT: &str = "\
[Unit]
Description=HydePark Sync (HikCentral / Supabase synchronisation and dashboard)
After=network-online.target
Wants=network-online.target

[Service]
Type=simple
User=YOUR_USERNAME
Group=YOUR_USERNAME
WorkingDirectory=YOUR_INSTALL_DIR
Environment=PYTHONUNBUFFERED=1
ExecStart=YOUR_INSTALL_DIR/venv/bin/python YOUR_INSTALL_DIR/main.py
Restart=always
RestartSec=10
StandardOutput=journal
StandardError=journal

[Install]
WantedBy=multi-user.target
";

pub fn is_active<H: Host + ?Sized>(host: &H, unit: &str) -> bool {
    succeeds(host, "systemctl", &["is-active", "--quiet", unit])
}

pub fn is_enabled<H: Host + ?Sized>(host: &H, unit: &str) -> bool {
    succeeds(host, "systemctl", &["is-enabled", "--quiet", unit])
}

/// Last `lines` journal entries for `unit`, or a note explaining why none
/// could be read.
pub fn journal_tail<H: Host + ?Sized>(host: &H, unit: &str, lines: u32) -> String {
    let n = lines.to_string();
    match host.run("journalctl", &["-u", unit, "-n", &n, "--no-pager"]) {
        Ok(out) if out.success() => out.stdout,
        Ok(out) => format!("(journalctl failed: {})", out.detail()),
        Err(e) => format!("(journalctl unavailable: {e})"),
    }
}

/// `systemctl status` text. The command exits non-zero for inactive units,
/// so the output is returned regardless of exit code.
pub fn status_text<H: Host + ?Sized>(host: &H, unit: &str) -> String {
    match host.run("systemctl", &["status", unit, "--no-pager"]) {
        Ok(out) if !out.stdout.trim().is_empty() => out.stdout,
        Ok(out) => out.detail(),
        Err(e) => format!("(systemctl unavailable: {e})"),
    }
}

/// Substitute the owning user and install directory into a unit template.
pub fn render_unit(template: &str, user_placeholder: &str, user: &str, install_dir: &Path) -> String {
    template
        .replace(user_placeholder, user)
        .replace(INSTALL_DIR_PLACEHOLDER, &install_dir.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::CommandOutput;
    use crate::testing::FakeHost;

    #[test]
    fn builtin_unit_renders_user_and_paths() {
        let unit = render_unit(
            BUILTIN_UNIT,
            "YOUR_USERNAME",
            "ubuntu",
            Path::new("/opt/hydepark-sync"),
        );
        assert!(unit.contains("User=ubuntu"));
        assert!(unit.contains("Group=ubuntu"));
        assert!(unit.contains("WorkingDirectory=/opt/hydepark-sync"));
        assert!(unit.contains("ExecStart=/opt/hydepark-sync/venv/bin/python /opt/hydepark-sync/main.py"));
        assert!(!unit.contains("YOUR_"));
    }

    #[test]
    fn custom_placeholder_is_honoured() {
        let unit = render_unit("User=%USER%\n", "%USER%", "svc", Path::new("/srv/x"));
        assert_eq!(unit, "User=svc\n");
    }

    #[test]
    fn active_and_enabled_follow_exit_codes() {
        let host = FakeHost::new();
        host.fail("systemctl is-enabled");
        assert!(is_active(&host, "hydepark-sync"));
        assert!(!is_enabled(&host, "hydepark-sync"));
        assert_eq!(
            host.calls(),
            vec![
                "systemctl is-active --quiet hydepark-sync",
                "systemctl is-enabled --quiet hydepark-sync",
            ]
        );
    }

    #[test]
    fn journal_tail_reports_missing_journalctl() {
        let host = FakeHost::new();
        host.unspawnable("journalctl");
        assert!(journal_tail(&host, "hydepark-sync", 50).contains("journalctl unavailable"));
    }

    #[test]
    fn status_text_kept_for_inactive_unit() {
        let host = FakeHost::new();
        host.respond(
            "systemctl status",
            CommandOutput {
                code: Some(3),
                stdout: "Active: inactive (dead)".into(),
                stderr: String::new(),
            },
        );
        assert_eq!(status_text(&host, "hydepark-sync"), "Active: inactive (dead)");
    }
}
