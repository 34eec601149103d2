use std::time::Duration;

use crate::host::Host;

/// Bounds for [`poll_until`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Maximum number of predicate evaluations.
    pub attempts: u32,
    pub interval: Duration,
}

impl PollPolicy {
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    /// Upper bound on time spent sleeping inside [`poll_until`].
    pub fn budget(&self) -> Duration {
        self.interval * self.attempts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The predicate held on this 1-indexed attempt.
    Ready { attempt: u32 },
    TimedOut { attempts: u32 },
}

/// Evaluate `predicate` until it holds or `policy.attempts` is exhausted,
/// sleeping `policy.interval` between attempts (never after the last one).
pub fn poll_until<H, F>(host: &H, policy: PollPolicy, mut predicate: F) -> PollOutcome
where
    H: Host + ?Sized,
    F: FnMut(u32) -> bool,
{
    for attempt in 1..=policy.attempts {
        if predicate(attempt) {
            return PollOutcome::Ready { attempt };
        }
        tracing::debug!(attempt, max = policy.attempts, "condition not met yet");
        if attempt < policy.attempts {
            host.sleep(policy.interval);
        }
    }
    PollOutcome::TimedOut {
        attempts: policy.attempts,
    }
}
