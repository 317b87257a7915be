//! Bounded polling for asynchronous remote jobs.
//!
//! Remote video and talking-head jobs complete at an unknown time; callers
//! re-check a status endpoint at a fixed interval. The deadline is explicit
//! and injected, so no poll loop can spin forever.

use std::{future::Future, time::Duration};

use tokio_util::sync::CancellationToken;

use crate::error::Error;

#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub deadline: Duration,
}

impl PollPolicy {
    pub fn new(interval: Duration, deadline: Duration) -> Self {
        Self { interval, deadline }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            deadline: Duration::from_secs(600),
        }
    }
}

/// Calls `check` until it yields `Some(value)`, sleeping `policy.interval`
/// between attempts.
///
/// # Returns
/// * `Ok(value)` when a check reports the job terminal.
/// * `Err(Error::JobTimeout)` once the deadline elapses without one.
/// * `Err(Error::Cancelled)` when `cancel` fires mid-wait.
///
/// Errors from `check` itself propagate immediately; a failed status request
/// is not retried here.
pub async fn poll_until<T, F, Fut>(
    policy: PollPolicy,
    cancel: &CancellationToken,
    mut check: F,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, Error>>,
{
    let deadline = tokio::time::Instant::now() + policy.deadline;

    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        if let Some(value) = check().await? {
            return Ok(value);
        }

        // The next check would land past the deadline, so report the timeout
        // now instead of sleeping into it.
        if tokio::time::Instant::now() + policy.interval >= deadline {
            return Err(Error::JobTimeout {
                deadline: policy.deadline,
            });
        }

        tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            _ = tokio::time::sleep(policy.interval) => {}
        }
    }
}
