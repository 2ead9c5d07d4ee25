//! Session authentication.
//!
//! Credential entry on the contest site is done by a person. The
//! authenticator opens the sign-in page, tells the operator what to do, and
//! then waits for the page to turn into an authenticated dashboard.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use matchpilot_config::Config;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::classifier::PageStateClassifier;
use crate::error::WorkflowError;
use crate::identity::ParticipantIdentity;
use crate::poller::{PollError, Poller};
use crate::remote::{RemotePage, WaitPolicy};
use crate::scripts;

/// What the operator needs to know to finish signing in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginInstructions {
    pub entry_url: String,
    pub identity_name: String,
}

/// Out-of-band channel to the person completing the sign-in.
#[async_trait]
pub trait OperatorPrompt: Send + Sync {
    async fn announce_login(&self, instructions: &LoginInstructions);
}

/// The authenticated landing view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dashboard {
    pub url: String,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub entry_url: String,
    pub entry_timeout: Duration,
    pub login_timeout: Duration,
    pub poll_interval: Duration,
    /// How often to report that we are still waiting.
    pub progress_every: Duration,
    /// Pause after the dashboard appears, before the next stage.
    pub settle_delay: Duration,
}

impl AuthSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            entry_url: config.site.login_url(),
            entry_timeout: config.timing.entry_navigation_timeout(),
            login_timeout: config.timing.login_timeout(),
            poll_interval: config.timing.poll_interval(),
            progress_every: config.timing.login_progress(),
            settle_delay: config.timing.settle_delay(),
        }
    }
}

pub struct Authenticator {
    settings: AuthSettings,
    classifier: Arc<dyn PageStateClassifier>,
    prompt: Arc<dyn OperatorPrompt>,
    wake: Option<Arc<Notify>>,
}

impl Authenticator {
    pub fn new(
        settings: AuthSettings,
        classifier: Arc<dyn PageStateClassifier>,
        prompt: Arc<dyn OperatorPrompt>,
    ) -> Self {
        Self {
            settings,
            classifier,
            prompt,
            wake: None,
        }
    }

    /// Re-check the page immediately whenever `wake` is notified.
    pub fn with_wake(mut self, wake: Arc<Notify>) -> Self {
        self.wake = Some(wake);
        self
    }

    /// Wait for the operator to sign in on `page`.
    pub async fn authenticate(
        &self,
        page: &dyn RemotePage,
        identity: &ParticipantIdentity,
    ) -> Result<Dashboard, WorkflowError> {
        let entry = &self.settings.entry_url;
        info!(url = %entry, "Opening sign-in page");
        // The entry URL may redirect through a broken host while the
        // sign-in form itself still loads.
        if let Err(e) = page
            .navigate(entry, WaitPolicy::DomContentLoaded, self.settings.entry_timeout)
            .await
        {
            warn!(url = %entry, error = %e, "Sign-in page did not load cleanly, continuing");
        }

        self.prompt
            .announce_login(&LoginInstructions {
                entry_url: entry.clone(),
                identity_name: identity.name().to_string(),
            })
            .await;

        let mut poller = Poller::new(self.settings.poll_interval)
            .with_progress(self.settings.progress_every);
        if let Some(wake) = &self.wake {
            poller = poller.with_wake(wake.clone());
        }

        let classifier = &self.classifier;
        let waited = poller
            .wait_until("dashboard", self.settings.login_timeout, || async move {
                let snapshot = scripts::snapshot(page).await?;
                debug!(
                    url = %snapshot.url,
                    title = %snapshot.title,
                    upload_link = snapshot.has_upload_link,
                    run_link = snapshot.has_run_link,
                    "Waiting for sign-in"
                );
                Ok(classifier.is_dashboard(&snapshot, identity))
            })
            .await
            .map_err(|e| match e {
                PollError::Timeout { waited, .. } => WorkflowError::AuthenticationTimeout { waited },
                PollError::Fatal(e) => WorkflowError::Page(e),
            })?;

        let dashboard = match scripts::snapshot(page).await {
            Ok(snapshot) => Dashboard {
                url: snapshot.url,
                title: snapshot.title,
            },
            Err(e) if e.is_transient() => {
                warn!(error = %e, "Could not read the dashboard after sign-in");
                Dashboard::default()
            }
            Err(e) => return Err(e.into()),
        };
        info!(
            url = %dashboard.url,
            title = %dashboard.title,
            waited_secs = waited.as_secs(),
            "Signed in"
        );
        tokio::time::sleep(self.settings.settle_delay).await;

        Ok(dashboard)
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
