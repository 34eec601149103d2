use super::Overrides;
use crate::output::{print_banner, print_json, print_section};
use hydepark_core::host::SystemHost;
use hydepark_core::verify::{verify, CheckStatus, VerifyReport};

/// `hydepark-deploy verify`: exits non-zero when any check fails.
pub fn run(overrides: &Overrides, json: bool) -> anyhow::Result<()> {
    let config = overrides.load()?;
    let report = verify(&SystemHost::new(), &config);

    if json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }

    let failed = report.count(CheckStatus::Fail);
    if failed > 0 {
        anyhow::bail!("{failed} of {} health checks failed", report.checks.len());
    }
    Ok(())
}

fn print_report(report: &VerifyReport) {
    println!("Verifying {}\n", report.service);
    for check in &report.checks {
        let tag = match check.status {
            CheckStatus::Pass => "PASS",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Skip => "SKIP",
        };
        println!("[{tag}] {}: {}", check.name, check.detail);
    }
    println!();

    let total = report.checks.len();
    if report.passed() {
        let passed = report.count(CheckStatus::Pass);
        print_banner(&format!("{} is healthy ({passed}/{total} checks passed)", report.service));
    } else {
        let failed = report.count(CheckStatus::Fail);
        print_banner(&format!("{} is NOT healthy ({failed}/{total} checks failed)", report.service));
        print_section("Try", &report.remediation);
    }
}
