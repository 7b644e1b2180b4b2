//! Bounded polling for asynchronous control-plane operations

use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Fixed-interval polling bound
///
/// A probe runs at most `max_attempts` times with `interval` between
/// consecutive probes, so the ceiling is `interval * (max_attempts - 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    pub const fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Account creation: 30 seconds x 20 attempts (~10 minutes)
    pub const fn account_creation() -> Self {
        Self::new(Duration::from_secs(30), 20)
    }

    /// Stack create/update completion: 30 seconds x 120 attempts
    pub const fn stack_completion() -> Self {
        Self::new(Duration::from_secs(30), 120)
    }

    /// Upper bound on time spent sleeping between probes
    pub fn ceiling(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

/// Result of a bounded poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The probe reported a terminal value
    Ready(T),
    /// The attempt budget ran out before a terminal value was seen
    Exhausted { attempts: u32 },
}

/// Run `probe` until it yields `Some`, an error, or the budget is spent
///
/// Errors from the probe abort polling immediately. `None` means "not yet
/// terminal" and schedules another attempt after `policy.interval`.
pub async fn poll_until<T, F, Fut>(policy: &PollPolicy, mut probe: F) -> Result<PollOutcome<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    for attempt in 0..policy.max_attempts {
        if let Some(value) = probe(attempt).await? {
            return Ok(PollOutcome::Ready(value));
        }

        if attempt + 1 < policy.max_attempts {
            sleep(policy.interval).await;
        }
    }

    Ok(PollOutcome::Exhausted {
        attempts: policy.max_attempts,
    })
}
