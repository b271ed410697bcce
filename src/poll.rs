//! Retry-with-timeout primitive.
//!
//! [`poll_until`] runs a check on a fixed interval until it yields a value,
//! fails with an error that is not a "not ready yet" condition, or the
//! wall-clock deadline passes. Every blocking wait in the crate goes through
//! it, so they all share the same timing:
//!
//! ```text
//! start ──interval──► check ──interval──► check ── ... ──► deadline
//!                       │                   │                  │
//!                  Some(v): done       not ready: wait    TimedOut
//! ```
//!
//! - The first check runs one interval after the wait starts.
//! - The deadline is evaluated at each tick, before the check runs, so a
//!   timeout is reported no earlier than the deadline and no later than the
//!   deadline plus one interval.
//! - There is no cancellation token; dropping the future abandons the wait.
//! - A timeout too large to represent as an instant means no deadline; the
//!   interval is capped at [`MAX_INTERVAL`].

use std::{future::Future, time::Duration};

use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Longest spacing between two checks.
pub const MAX_INTERVAL: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Deadline and tick spacing for a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Spacing between checks
    pub interval: Duration,
    /// Wall-clock budget measured from the start of the wait
    pub timeout: Duration,
}

impl PollPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// Why [`poll_until`] gave up.
#[derive(Debug)]
pub enum PollError<E> {
    /// The deadline passed while the check kept reporting "not ready".
    TimedOut { waited: Duration, attempts: usize },
    /// The check failed with an error that is not a "not ready" condition.
    Failed(E),
}

impl<E> PollError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, PollError::TimedOut { .. })
    }
}

/// Poll `check` until it returns `Ok(Some(_))`.
///
/// `Ok(None)` and errors for which `not_ready` returns `true` are treated as
/// "not ready yet" and retried at the next tick. Any other error is returned
/// immediately as [`PollError::Failed`].
pub async fn poll_until<T, E, F, Fut, R>(
    policy: PollPolicy,
    mut check: F,
    not_ready: R,
) -> Result<T, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
    R: Fn(&E) -> bool,
{
    let start = Instant::now();
    let deadline = start.checked_add(policy.timeout);

    // interval_at panics on a zero period
    let period = policy.interval.clamp(Duration::from_millis(1), MAX_INTERVAL);
    let mut ticker = interval_at(start + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut attempts = 0usize;

    loop {
        ticker.tick().await;

        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            let waited = start.elapsed();
            tracing::debug!(attempts, ?waited, "poll deadline reached");
            return Err(PollError::TimedOut { waited, attempts });
        }

        attempts += 1;
        match check().await {
            Ok(Some(value)) => {
                tracing::trace!(attempts, "poll check ready");
                return Ok(value);
            }
            Ok(None) => {
                tracing::trace!(attempts, "poll check not ready");
            }
            Err(e) if not_ready(&e) => {
                tracing::trace!(attempts, "poll check not ready (error)");
            }
            Err(e) => return Err(PollError::Failed(e)),
        }
    }
}
