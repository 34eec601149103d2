//! Scripted [`Host`] for unit tests.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use crate::error::{DeployError, Result};
use crate::host::{command_line, CommandOutput, Host};

struct Rule {
    prefix: String,
    responses: VecDeque<CommandOutput>,
}

/// Records every call. Commands succeed with empty output unless a rule whose
/// prefix matches the command line says otherwise; the most recently added
/// matching rule wins.
#[derive(Default)]
pub struct FakeHost {
    rules: RefCell<Vec<Rule>>,
    missing: RefCell<HashSet<String>>,
    unspawnable: RefCell<HashSet<String>>,
    http: RefCell<Option<u16>>,
    no_http_client: RefCell<bool>,
    calls: RefCell<Vec<String>>,
    http_calls: RefCell<Vec<String>>,
    sleeps: RefCell<Vec<Duration>>,
}

impl FakeHost {
    pub fn new() -> Self {
        let host = Self::default();
        *host.http.borrow_mut() = Some(200);
        host.respond("id -u", CommandOutput::ok("0\n"));
        host
    }

    pub fn respond(&self, prefix: &str, output: CommandOutput) -> &Self {
        self.respond_seq(prefix, vec![output])
    }

    /// Hand out `outputs` in order; the last one repeats.
    pub fn respond_seq(&self, prefix: &str, outputs: Vec<CommandOutput>) -> &Self {
        self.rules.borrow_mut().push(Rule {
            prefix: prefix.to_string(),
            responses: outputs.into(),
        });
        self
    }

    pub fn fail(&self, prefix: &str) -> &Self {
        self.respond(prefix, CommandOutput::failed(1, format!("{prefix}: failed")))
    }

    pub fn without_program(&self, program: &str) -> &Self {
        self.missing.borrow_mut().insert(program.to_string());
        self
    }

    pub fn unspawnable(&self, program: &str) -> &Self {
        self.unspawnable.borrow_mut().insert(program.to_string());
        self
    }

    pub fn http_answers(&self, status: Option<u16>) -> &Self {
        *self.http.borrow_mut() = status;
        self
    }

    /// Every HTTP request errors as if no client could be built.
    pub fn http_unavailable(&self) -> &Self {
        *self.no_http_client.borrow_mut() = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn http_calls(&self) -> Vec<String> {
        self.http_calls.borrow().clone()
    }

    pub fn called(&self, prefix: &str) -> bool {
        self.calls.borrow().iter().any(|c| c.starts_with(prefix))
    }

    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.calls.borrow().iter().position(|c| c.starts_with(prefix))
    }

    pub fn total_slept(&self) -> Duration {
        self.sleeps.borrow().iter().sum()
    }
}

impl Host for FakeHost {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let line = command_line(program, args);
        self.calls.borrow_mut().push(line.clone());
        if self.unspawnable.borrow().contains(program) {
            return Err(DeployError::Spawn {
                program: program.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            });
        }
        let mut rules = self.rules.borrow_mut();
        let Some(rule) = rules.iter_mut().rev().find(|r| line.starts_with(&r.prefix)) else {
            return Ok(CommandOutput::ok(""));
        };
        let output = if rule.responses.len() > 1 {
            rule.responses.pop_front().unwrap_or_default()
        } else {
            rule.responses.front().cloned().unwrap_or_default()
        };
        Ok(output)
    }

    fn has_program(&self, program: &str) -> bool {
        !self.missing.borrow().contains(program)
    }

    fn http_status(&self, url: &str, _timeout: Duration) -> Result<Option<u16>> {
        self.http_calls.borrow_mut().push(url.to_string());
        if *self.no_http_client.borrow() {
            return Err(DeployError::HttpClient("tls backend unavailable".to_string()));
        }
        Ok(*self.http.borrow())
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
    }
}
