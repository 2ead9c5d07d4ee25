//! Session liveness.
//!
//! The contest site drops idle browser sessions, so a background task
//! touches a page every so often for as long as the workflow runs.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::remote::RemoteSession;
use crate::scripts;

/// Scoped handle to the liveness task. Dropping it stops the task.
pub struct KeepAlive {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl KeepAlive {
    pub fn spawn(session: Arc<dyn RemoteSession>, interval: Duration) -> Self {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let handle = tokio::spawn(async move {
            debug!(interval_ms = interval.as_millis() as u64, "Keep-alive started");
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
                let Some(page) = session.pages().await.into_iter().next() else {
                    continue;
                };
                if let Err(e) = page.evaluate(scripts::KEEPALIVE).await {
                    trace!(page = page.id(), error = %e, "Keep-alive touch failed");
                }
            }
            debug!("Keep-alive stopped");
        });
        Self {
            token,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the task and wait for it to exit.
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for KeepAlive {
    fn drop(&mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
