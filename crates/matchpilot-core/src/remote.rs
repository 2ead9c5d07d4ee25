//! The remote automation surface the engine drives.
//!
//! These traits are the only way the orchestration code touches a browser.
//! `matchpilot-browser` implements them over the Chrome DevTools Protocol and
//! [`crate::testing`] implements them in memory.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot;

/// Errors raised by a remote page or session.
#[derive(Debug, Clone, Error)]
pub enum PageError {
    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Script error: {0}")]
    Script(String),

    #[error("Element no longer attached: {0}")]
    ElementGone(String),

    #[error("Dialog error: {0}")]
    Dialog(String),

    #[error("Remote session disconnected")]
    Disconnected,

    #[error("{0}")]
    Other(String),
}

impl PageError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, PageError::Timeout(_))
    }

    /// Errors a page produces while it is mid-navigation or re-rendering.
    ///
    /// A losing connection is the only thing that will not fix itself.
    pub fn is_transient(&self) -> bool {
        !matches!(self, PageError::Disconnected)
    }
}

/// When a navigation counts as finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitPolicy {
    /// The document has been parsed.
    #[default]
    DomContentLoaded,
    /// The load event fired.
    Load,
    /// Loaded and the network stayed quiet for a moment.
    NetworkIdle,
}

/// Opaque reference to an element on a remote page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(i64);

impl ElementHandle {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> i64 {
        self.0
    }
}

/// How a one-shot dialog handler answers the dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogResponse {
    Accept,
    Dismiss,
}

impl DialogResponse {
    pub fn accepts(&self) -> bool {
        matches!(self, DialogResponse::Accept)
    }
}

/// A modal dialog observed (and already answered) on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogEvent {
    /// `alert`, `confirm`, `prompt` or `beforeunload`.
    pub kind: String,
    pub message: String,
}

/// Page-side half of a one-shot dialog registration.
pub struct DialogSender {
    tx: oneshot::Sender<DialogEvent>,
}

impl DialogSender {
    /// Hand the observed dialog to the waiting subscription.
    pub fn deliver(self, event: DialogEvent) {
        // The subscriber may have given up already; the dialog was still answered.
        let _ = self.tx.send(event);
    }
}

/// Caller-side half of a one-shot dialog registration.
///
/// Resolves at most once: `wait` consumes the subscription.
#[derive(Debug)]
pub struct DialogSubscription {
    rx: oneshot::Receiver<DialogEvent>,
}

impl DialogSubscription {
    /// Create a linked sender/subscription pair.
    pub fn channel() -> (DialogSender, DialogSubscription) {
        let (tx, rx) = oneshot::channel();
        (DialogSender { tx }, DialogSubscription { rx })
    }

    /// Wait for the dialog this subscription was registered for.
    pub async fn wait(self, timeout: Duration) -> Result<DialogEvent, PageError> {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(Ok(event)) => Ok(event),
            Ok(Err(_)) => Err(PageError::Dialog("dialog handler dropped".to_string())),
            Err(_) => Err(PageError::Timeout(format!(
                "no dialog within {}ms",
                timeout.as_millis()
            ))),
        }
    }
}

/// A navigable view in the remote browser.
#[async_trait]
pub trait RemotePage: Send + Sync {
    /// Stable identifier of this view, for logs.
    fn id(&self) -> &str;

    async fn navigate(&self, url: &str, wait: WaitPolicy, timeout: Duration)
        -> Result<(), PageError>;

    async fn current_url(&self) -> Result<String, PageError>;

    async fn query(&self, selector: &str) -> Result<Option<ElementHandle>, PageError>;

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>, PageError>;

    /// Evaluate a JavaScript expression in the page and return its JSON value.
    async fn evaluate(&self, expression: &str) -> Result<Value, PageError>;

    async fn click(&self, element: &ElementHandle) -> Result<(), PageError>;

    /// Select the whole content of an editable element.
    async fn select_all(&self, element: &ElementHandle) -> Result<(), PageError>;

    async fn type_text(&self, element: &ElementHandle, text: &str) -> Result<(), PageError>;

    /// Overwrite the content of an editable element.
    async fn replace_text(&self, element: &ElementHandle, text: &str) -> Result<(), PageError> {
        self.select_all(element).await?;
        self.type_text(element, text).await
    }

    async fn upload_file(&self, element: &ElementHandle, path: &Path) -> Result<(), PageError>;

    /// Register a handler for the next dialog only.
    ///
    /// Must be called before the action that opens the dialog. The page
    /// answers the dialog with `response` and then resolves the subscription.
    /// Later dialogs are not seen by this registration.
    async fn once_dialog(&self, response: DialogResponse) -> Result<DialogSubscription, PageError>;
}

/// A live connection to the automation target owning its pages.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Open a new view, optionally loading `url` in it.
    async fn open_page(&self, url: Option<&str>) -> Result<Arc<dyn RemotePage>, PageError>;

    /// Wait for a view opened by the page itself (e.g. a `target=_blank` link)
    /// whose URL satisfies `matcher`. Views already handed out are ignored.
    async fn wait_for_page(
        &self,
        matcher: &(dyn for<'m> Fn(&'m str) -> bool + Send + Sync),
        timeout: Duration,
    ) -> Result<Arc<dyn RemotePage>, PageError>;

    /// All views currently known to the session.
    async fn pages(&self) -> Vec<Arc<dyn RemotePage>>;
}
