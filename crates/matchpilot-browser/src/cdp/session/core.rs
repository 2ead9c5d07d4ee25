//! Core session struct, command dispatch and the event task.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cdp::error::CdpError;
use crate::cdp::events::PageEvents;
use crate::cdp::protocol::CdpResponse;
use crate::cdp::transport::Transport;

/// A session attached to a single page/target.
pub struct PageSession {
    pub(super) target_id: String,
    pub(super) session_id: String,
    pub(super) transport: Transport,
    pub(super) events: Arc<PageEvents>,
    event_task: JoinHandle<()>,
}

impl PageSession {
    /// Create a session and start dispatching its events.
    pub(crate) fn new(
        target_id: String,
        session_id: String,
        transport: Transport,
        event_rx: mpsc::UnboundedReceiver<CdpResponse>,
    ) -> Self {
        let events = Arc::new(PageEvents::new());
        let event_task = tokio::spawn(Self::event_loop(
            event_rx,
            events.clone(),
            transport.clone(),
            session_id.clone(),
        ));
        Self {
            target_id,
            session_id,
            transport,
            events,
            event_task,
        }
    }

    /// Answers registered dialogs and records lifecycle progress.
    async fn event_loop(
        mut event_rx: mpsc::UnboundedReceiver<CdpResponse>,
        events: Arc<PageEvents>,
        transport: Transport,
        session_id: String,
    ) {
        while let Some(msg) = event_rx.recv().await {
            let Some(dialog) = events.handle(&msg) else {
                continue;
            };
            let accept = dialog.accepts();
            if let Err(e) = transport
                .call(
                    "Page.handleJavaScriptDialog",
                    Some(json!({"accept": accept})),
                    Some(&session_id),
                )
                .await
            {
                warn!("Failed to answer dialog: {}", e);
            }
            dialog.finish();
        }
        debug!("Event stream for session {} ended", session_id);
    }

    /// Get target ID.
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Get session ID.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn events(&self) -> &PageEvents {
        &self.events
    }

    /// Send a CDP command to this page session.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport
            .call(method, params, Some(&self.session_id))
            .await
    }

    /// Enable required CDP domains.
    pub(crate) async fn enable_domains(&self) -> Result<(), CdpError> {
        self.call("Page.enable", None).await?;
        self.call(
            "Page.setLifecycleEventsEnabled",
            Some(json!({"enabled": true})),
        )
        .await?;
        self.call("DOM.enable", None).await?;
        self.call("Runtime.enable", None).await?;

        debug!("Enabled CDP domains for session {}", self.session_id);
        Ok(())
    }

    /// Stop receiving events for this session.
    pub async fn detach(&self) {
        self.transport.unsubscribe(&self.session_id).await;
    }
}

impl Drop for PageSession {
    fn drop(&mut self) {
        self.event_task.abort();
    }
}
