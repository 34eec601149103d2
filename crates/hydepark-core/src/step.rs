//! Fail-fast step sequencing.
//!
//! A deployment is a list of named steps, each returning
//! `Result<StepOutcome>`. A failing fatal step stops the run with
//! [`DeployError::Step`]; a failing advisory step is downgraded to a warning
//! and the run continues. Either kind may succeed with its own warning.

use serde::Serialize;

use crate::error::{DeployError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Fatal,
    Advisory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    Skipped(String),
    /// Completed with reduced functionality.
    Warned(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Ok,
    Skipped,
    Warning,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub name: String,
    pub severity: Severity,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Default)]
pub struct StepRunner {
    records: Vec<StepRecord>,
}

impl StepRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fatal<F>(&mut self, name: &str, step: F) -> Result<()>
    where
        F: FnOnce() -> Result<StepOutcome>,
    {
        self.run(name, Severity::Fatal, step)
    }

    pub fn advisory<F>(&mut self, name: &str, step: F)
    where
        F: FnOnce() -> Result<StepOutcome>,
    {
        // Advisory failures are recorded, never returned.
        let _ = self.run(name, Severity::Advisory, step);
    }

    fn run<F>(&mut self, name: &str, severity: Severity, step: F) -> Result<()>
    where
        F: FnOnce() -> Result<StepOutcome>,
    {
        tracing::info!(step = name, "starting");
        let (status, detail) = match step() {
            Ok(StepOutcome::Done) => (StepStatus::Ok, None),
            Ok(StepOutcome::Skipped(why)) => {
                tracing::info!(step = name, reason = %why, "skipped");
                (StepStatus::Skipped, Some(why))
            }
            Ok(StepOutcome::Warned(why)) => {
                tracing::warn!(step = name, "{why}");
                (StepStatus::Warning, Some(why))
            }
            Err(e) if severity == Severity::Advisory => {
                tracing::warn!(step = name, error = %e, "advisory step failed");
                (StepStatus::Warning, Some(e.to_string()))
            }
            Err(e) => {
                tracing::error!(step = name, error = %e, "fatal step failed");
                return Err(DeployError::Step {
                    step: name.to_string(),
                    source: Box::new(e),
                });
            }
        };
        self.records.push(StepRecord {
            name: name.to_string(),
            severity,
            status,
            detail,
        });
        Ok(())
    }

    pub fn warnings(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.status == StepStatus::Warning)
            .map(|r| match &r.detail {
                Some(d) => format!("{}: {d}", r.name),
                None => r.name.clone(),
            })
            .collect()
    }

    pub fn into_records(self) -> Vec<StepRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boom() -> Result<StepOutcome> {
        Err(DeployError::CommandFailed {
            program: "apt-get update".into(),
            detail: "exit code 100".into(),
        })
    }

    #[test]
    fn fatal_failure_stops_with_step_name() {
        let mut runner = StepRunner::new();
        let err = runner.fatal("system packages", boom).unwrap_err();
        match err {
            DeployError::Step { step, source } => {
                assert_eq!(step, "system packages");
                assert!(matches!(*source, DeployError::CommandFailed { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(runner.into_records().is_empty());
    }

    #[test]
    fn advisory_failure_becomes_warning() {
        let mut runner = StepRunner::new();
        runner.advisory("firewall", boom);
        runner
            .fatal("staging", || Ok(StepOutcome::Done))
            .unwrap();
        assert_eq!(runner.warnings().len(), 1);
        assert!(runner.warnings()[0].starts_with("firewall: "));
        let records = runner.into_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, StepStatus::Warning);
        assert_eq!(records[0].severity, Severity::Advisory);
        assert_eq!(records[1].status, StepStatus::Ok);
    }

    #[test]
    fn fatal_step_may_warn_and_continue() {
        let mut runner = StepRunner::new();
        runner
            .fatal("python environment", || {
                Ok(StepOutcome::Warned("model data unavailable".into()))
            })
            .unwrap();
        assert_eq!(
            runner.warnings(),
            vec!["python environment: model data unavailable".to_string()]
        );
    }

    #[test]
    fn skipped_is_not_a_warning() {
        let mut runner = StepRunner::new();
        runner.advisory("firewall", || Ok(StepOutcome::Skipped("no active firewall".into())));
        assert!(runner.warnings().is_empty());
        assert_eq!(runner.into_records()[0].status, StepStatus::Skipped);
    }
}
