//! Condition polling.
//!
//! The remote site never tells us when something happened, so every wait is
//! "ask again until yes or until the deadline".

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, info, trace};

use crate::remote::PageError;

/// How long a probe started at the deadline may take to answer.
const FINAL_PROBE_GRACE: Duration = Duration::from_secs(2);

/// Why a poll ended without the condition becoming true.
#[derive(Debug, Error)]
pub enum PollError {
    /// The deadline passed; the awaited state never arrived.
    #[error("timed out after {}ms waiting for {what}", .waited.as_millis())]
    Timeout { what: String, waited: Duration },

    /// The probe failed in a way that waiting will not fix.
    #[error(transparent)]
    Fatal(#[from] PageError),
}

impl PollError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, PollError::Timeout { .. })
    }
}

/// Re-evaluates a predicate on a fixed interval until it holds or a deadline passes.
#[derive(Debug, Clone)]
pub struct Poller {
    interval: Duration,
    wake: Option<Arc<Notify>>,
    progress: Option<Duration>,
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            wake: None,
            progress: None,
        }
    }

    /// Let an external signal trigger an immediate re-evaluation.
    pub fn with_wake(mut self, wake: Arc<Notify>) -> Self {
        self.wake = Some(wake);
        self
    }

    /// Log how long we have been waiting every `every`.
    pub fn with_progress(mut self, every: Duration) -> Self {
        self.progress = Some(every);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Poll `probe` until it returns `Ok(true)` or `timeout` elapses.
    ///
    /// The probe runs immediately and then once per interval; the last run
    /// happens at the deadline and may take up to two more seconds to answer.
    /// Transient probe errors count as "not yet".
    /// Returns how long the wait took.
    pub async fn wait_until<F, Fut>(
        &self,
        what: &str,
        timeout: Duration,
        mut probe: F,
    ) -> Result<Duration, PollError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool, PageError>>,
    {
        let start = Instant::now();
        let deadline = start + timeout;
        let mut last_report = start;
        let mut attempts: u64 = 0;

        loop {
            attempts += 1;
            let started = Instant::now();
            let cutoff = if started >= deadline {
                started + FINAL_PROBE_GRACE
            } else {
                deadline
            };
            match tokio::time::timeout_at(cutoff, probe()).await {
                Ok(Ok(true)) => {
                    let waited = start.elapsed();
                    debug!(what, attempts, waited_ms = waited.as_millis() as u64, "Condition met");
                    return Ok(waited);
                }
                Ok(Ok(false)) => {}
                Ok(Err(e)) if e.is_transient() => {
                    trace!(what, error = %e, "Probe failed, treating as not yet true");
                }
                Ok(Err(e)) => return Err(PollError::Fatal(e)),
                Err(_) => {
                    trace!(what, "Probe still running at the deadline");
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(PollError::Timeout {
                    what: what.to_string(),
                    waited: now - start,
                });
            }

            if let Some(every) = self.progress {
                if now - last_report >= every {
                    info!(what, waited_secs = (now - start).as_secs(), "Still waiting");
                    last_report = now;
                }
            }

            let next = (now + self.interval).min(deadline);
            match &self.wake {
                Some(wake) => {
                    tokio::select! {
                        _ = tokio::time::sleep_until(next) => {}
                        _ = wake.notified() => {
                            debug!(what, "Woken early, re-checking");
                        }
                    }
                }
                None => tokio::time::sleep_until(next).await,
            }
        }
    }
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;
