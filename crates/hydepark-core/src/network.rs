use serde::Serialize;

use crate::host::{succeeds, Host};

/// PIDs of every process holding `port`, from `lsof -t`.
/// `lsof` exits 1 when nothing matches; that is an empty list, not an error.
pub fn port_holders<H: Host + ?Sized>(host: &H, port: u16) -> Vec<u32> {
    let target = format!(":{port}");
    match host.run("lsof", &["-t", "-i", &target]) {
        Ok(out) => parse_pids(&out.stdout),
        Err(e) => {
            tracing::debug!(port, error = %e, "lsof unavailable");
            Vec::new()
        }
    }
}

fn parse_pids(stdout: &str) -> Vec<u32> {
    let mut pids: Vec<u32> = stdout
        .lines()
        .filter_map(|l| l.trim().parse().ok())
        .collect();
    pids.sort_unstable();
    pids.dedup();
    pids
}

/// True if a socket is in LISTEN state on `port`.
pub fn is_listening<H: Host + ?Sized>(host: &H, port: u16) -> bool {
    let target = format!(":{port}");
    match host.run("lsof", &["-i", &target, "-sTCP:LISTEN"]) {
        Ok(out) => out.success() && !out.stdout.trim().is_empty(),
        Err(_) => false,
    }
}

/// One ICMP echo to `target`.
pub fn has_internet<H: Host + ?Sized>(host: &H, target: &str) -> bool {
    succeeds(host, "ping", &["-c", "1", "-W", "3", target])
}

/// Addresses the service can be reached on: localhost first, then every
/// IPv4 address reported by `hostname -I`.
pub fn reachable_urls<H: Host + ?Sized>(host: &H, port: u16) -> Vec<String> {
    let mut urls = vec![format!("http://localhost:{port}")];
    if let Ok(out) = host.run("hostname", &["-I"]) {
        if out.success() {
            urls.extend(
                out.stdout
                    .split_whitespace()
                    .filter(|addr| !addr.contains(':'))
                    .map(|addr| format!("http://{addr}:{port}")),
            );
        }
    }
    urls
}

// ---------------------------------------------------------------------------
// HTTP probe classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "status", rename_all = "snake_case")]
pub enum HttpCheck {
    Accepted(u16),
    Unexpected(u16),
    NoResponse,
}

impl HttpCheck {
    pub fn classify(status: Option<u16>, accepted: &[u16]) -> Self {
        match status {
            Some(code) if accepted.contains(&code) => HttpCheck::Accepted(code),
            Some(code) => HttpCheck::Unexpected(code),
            None => HttpCheck::NoResponse,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, HttpCheck::Accepted(_))
    }

    pub fn describe(&self) -> String {
        match self {
            HttpCheck::Accepted(code) => format!("HTTP {code}"),
            HttpCheck::Unexpected(code) => format!("unexpected HTTP {code}"),
            HttpCheck::NoResponse => "no HTTP response".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::CommandOutput;
    use crate::testing::FakeHost;

    #[test]
    fn pids_are_parsed_and_deduplicated() {
        assert_eq!(parse_pids("1234\n99\n1234\n\n"), vec![99, 1234]);
        assert!(parse_pids("").is_empty());
    }

    #[test]
    fn no_holders_when_lsof_finds_nothing() {
        let host = FakeHost::new();
        host.respond("lsof -t", CommandOutput::failed(1, ""));
        assert!(port_holders(&host, 8080).is_empty());
        assert_eq!(host.calls(), vec!["lsof -t -i :8080"]);
    }

    #[test]
    fn listening_requires_output() {
        let host = FakeHost::new();
        assert!(!is_listening(&host, 8080));
        host.respond(
            "lsof -i :8080 -sTCP:LISTEN",
            CommandOutput::ok("python3 4242 ubuntu 3u IPv4 TCP *:http-alt (LISTEN)\n"),
        );
        assert!(is_listening(&host, 8080));
    }

    #[test]
    fn urls_skip_ipv6() {
        let host = FakeHost::new();
        host.respond("hostname -I", CommandOutput::ok("10.0.0.5 fe80::1 192.168.1.20 \n"));
        assert_eq!(
            reachable_urls(&host, 8080),
            vec![
                "http://localhost:8080",
                "http://10.0.0.5:8080",
                "http://192.168.1.20:8080",
            ]
        );
    }

    #[test]
    fn http_classification() {
        let accepted = [200, 302];
        assert_eq!(HttpCheck::classify(Some(200), &accepted), HttpCheck::Accepted(200));
        assert_eq!(HttpCheck::classify(Some(302), &accepted), HttpCheck::Accepted(302));
        assert_eq!(HttpCheck::classify(Some(502), &accepted), HttpCheck::Unexpected(502));
        assert_eq!(HttpCheck::classify(None, &accepted), HttpCheck::NoResponse);
        assert!(!HttpCheck::Unexpected(301).is_accepted());
    }
}
