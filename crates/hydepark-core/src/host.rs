//! Host integration: every subprocess, program lookup, HTTP probe and sleep
//! the deployer issues goes through the [`Host`] trait.
//!
//! [`SystemHost`] is the real implementation. Commands run synchronously with
//! captured output; nothing is inherited from the terminal so that failure
//! detail can be folded into error messages and journal dumps.

use std::process::{Command, Stdio};
use std::time::Duration;

use crate::error::{DeployError, Result};

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Short human-readable failure detail: stderr if present, else stdout.
    pub fn detail(&self) -> String {
        let text = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let text = text.trim();
        let hint: String = text.chars().take(500).collect();
        match self.code {
            Some(code) if hint.is_empty() => format!("exit code {code}"),
            Some(code) => format!("exit code {code}: {hint}"),
            None => format!("terminated by signal: {hint}"),
        }
    }
}

pub trait Host {
    /// Run `program` with `args` to completion. `Err` only when the process
    /// could not be spawned; a non-zero exit is reported in the output.
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;

    fn has_program(&self, program: &str) -> bool;

    /// GET `url` without following redirects. `Ok(None)` when nothing
    /// answered; `Err` only when no HTTP client is available at all.
    fn http_status(&self, url: &str, timeout: Duration) -> Result<Option<u16>>;

    fn sleep(&self, duration: Duration);
}

/// Run a command and turn a non-zero exit into [`DeployError::CommandFailed`].
pub fn run_checked<H: Host + ?Sized>(
    host: &H,
    program: &str,
    args: &[&str],
) -> Result<CommandOutput> {
    let output = host.run(program, args)?;
    if !output.success() {
        return Err(DeployError::CommandFailed {
            program: command_line(program, args),
            detail: output.detail(),
        });
    }
    Ok(output)
}

/// True if the command ran and exited zero. Spawn failures count as false.
pub fn succeeds<H: Host + ?Sized>(host: &H, program: &str, args: &[&str]) -> bool {
    match host.run(program, args) {
        Ok(output) => output.success(),
        Err(e) => {
            tracing::debug!(program, error = %e, "probe command could not run");
            false
        }
    }
}

pub fn command_line(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{program} {}", args.join(" "))
    }
}

// ---------------------------------------------------------------------------
// SystemHost
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

impl SystemHost {
    pub fn new() -> Self {
        Self
    }
}

impl Host for SystemHost {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        tracing::debug!(command = %command_line(program, args), "run");
        let output = Command::new(program)
            .args(args)
            // apt must never stop to ask a question
            .env("DEBIAN_FRONTEND", "noninteractive")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| DeployError::Spawn {
                program: program.to_string(),
                source,
            })?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn has_program(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn http_status(&self, url: &str, timeout: Duration) -> Result<Option<u16>> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| DeployError::HttpClient(e.to_string()))?;
        match client.get(url).send() {
            Ok(resp) => Ok(Some(resp.status().as_u16())),
            Err(e) => {
                tracing::debug!(url, error = %e, "http probe got no response");
                Ok(None)
            }
        }
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
