//! Page event bookkeeping: one-shot dialog handlers and load progress.

use std::collections::{HashMap, HashSet};

use matchpilot_core::{DialogEvent, DialogResponse, DialogSender, DialogSubscription, WaitPolicy};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, trace, warn};

use super::protocol::{CdpResponse, DialogOpening, LifecycleEvent};

/// Lifecycle milestone a navigation waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadEvent {
    DomContentLoaded,
    Load,
    NetworkIdle,
}

impl LoadEvent {
    /// Name Chrome uses in `Page.lifecycleEvent`.
    pub fn lifecycle_name(&self) -> &'static str {
        match self {
            LoadEvent::DomContentLoaded => "DOMContentLoaded",
            LoadEvent::Load => "load",
            LoadEvent::NetworkIdle => "networkIdle",
        }
    }
}

impl From<WaitPolicy> for LoadEvent {
    fn from(policy: WaitPolicy) -> Self {
        match policy {
            WaitPolicy::DomContentLoaded => LoadEvent::DomContentLoaded,
            WaitPolicy::Load => LoadEvent::Load,
            WaitPolicy::NetworkIdle => LoadEvent::NetworkIdle,
        }
    }
}

/// A dialog that matched a registration and still needs answering.
pub struct PendingDialog {
    response: DialogResponse,
    sender: DialogSender,
    event: DialogEvent,
}

impl PendingDialog {
    pub fn accepts(&self) -> bool {
        self.response.accepts()
    }

    /// Hand the dialog to its subscriber once the browser has been answered.
    pub fn finish(self) {
        self.sender.deliver(self.event);
    }
}

/// Per-frame lifecycle milestones of the current document.
#[derive(Default)]
struct Lifecycle {
    frames: HashMap<String, (String, HashSet<String>)>,
}

/// Event state of one page session.
#[derive(Default)]
pub struct PageEvents {
    dialog: Mutex<Option<(DialogResponse, DialogSender)>>,
    lifecycle: Mutex<Lifecycle>,
    changed: Notify,
}

impl PageEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the next dialog with `response`, and only the next one.
    ///
    /// Replaces an unconsumed earlier registration.
    pub fn register_dialog(&self, response: DialogResponse) -> DialogSubscription {
        let (sender, subscription) = DialogSubscription::channel();
        if self.dialog.lock().replace((response, sender)).is_some() {
            debug!("Replaced an unused dialog registration");
        }
        subscription
    }

    /// Record an incoming event. Returns the dialog to answer, if any.
    pub fn handle(&self, msg: &CdpResponse) -> Option<PendingDialog> {
        let method = msg.method.as_deref()?;
        let params = msg.params.clone().unwrap_or_default();
        match method {
            "Page.javascriptDialogOpening" => {
                let opening: DialogOpening = match serde_json::from_value(params) {
                    Ok(opening) => opening,
                    Err(e) => {
                        warn!("Malformed dialog event: {}", e);
                        return None;
                    }
                };
                let event = DialogEvent {
                    kind: opening.dialog_type,
                    message: opening.message,
                };
                match self.dialog.lock().take() {
                    Some((response, sender)) => {
                        debug!(kind = %event.kind, message = %event.message, "Dialog matched registration");
                        Some(PendingDialog {
                            response,
                            sender,
                            event,
                        })
                    }
                    None => {
                        warn!(kind = %event.kind, message = %event.message, "Dialog with no handler left open");
                        None
                    }
                }
            }
            "Page.lifecycleEvent" => {
                if let Ok(event) = serde_json::from_value::<LifecycleEvent>(params) {
                    trace!(frame = %event.frame_id, name = %event.name, "Lifecycle");
                    self.record_lifecycle(event);
                }
                None
            }
            _ => None,
        }
    }

    fn record_lifecycle(&self, event: LifecycleEvent) {
        {
            let mut lifecycle = self.lifecycle.lock();
            let entry = lifecycle
                .frames
                .entry(event.frame_id)
                .or_insert_with(|| (event.loader_id.clone(), HashSet::new()));
            if entry.0 != event.loader_id {
                *entry = (event.loader_id, HashSet::new());
            }
            entry.1.insert(event.name);
        }
        self.changed.notify_waiters();
    }

    /// Has the document loaded by `loader_id` reached `milestone`?
    pub fn reached(&self, loader_id: &str, milestone: LoadEvent) -> bool {
        let name = milestone.lifecycle_name();
        self.lifecycle
            .lock()
            .frames
            .values()
            .any(|(loader, seen)| loader == loader_id && seen.contains(name))
    }

    /// Resolve once `loader_id` reaches `milestone`. Callers bound this with a timeout.
    pub async fn wait_for(&self, loader_id: &str, milestone: LoadEvent) {
        loop {
            let notified = self.changed.notified();
            if self.reached(loader_id, milestone) {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
