//! Artifact registration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use matchpilot_config::Config;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::classifier::{PageStateClassifier, UploadConfirmation};
use crate::error::WorkflowError;
use crate::identity::ParticipantIdentity;
use crate::poller::{PollError, Poller};
use crate::remote::{ElementHandle, RemotePage, WaitPolicy};
use crate::scripts;

/// How the registrar left things.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The site already had our artifact; nothing was uploaded.
    AlreadyRegistered,
    /// We uploaded it and the site confirmed.
    Uploaded,
    /// We uploaded it but never saw a confirmation.
    Unconfirmed,
    /// The upload could not be completed. The artifact may be on file from an
    /// earlier run, so the contest setup goes ahead regardless.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct RegistrarSettings {
    pub status_url: String,
    pub artifact_path: PathBuf,
    pub navigation_timeout: Duration,
    pub file_input_timeout: Duration,
    pub credential_field_timeout: Duration,
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
}

impl RegistrarSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            status_url: config.site.status_url(),
            artifact_path: config.tournament.artifact_path.clone(),
            navigation_timeout: config.timing.navigation_timeout(),
            file_input_timeout: config.timing.file_input_timeout(),
            credential_field_timeout: config.timing.credential_field_timeout(),
            confirmation_timeout: config.timing.registration_timeout(),
            poll_interval: config.timing.poll_interval(),
        }
    }
}

pub struct Registrar {
    settings: RegistrarSettings,
    classifier: Arc<dyn PageStateClassifier>,
    poller: Poller,
}

impl Registrar {
    pub fn new(settings: RegistrarSettings, classifier: Arc<dyn PageStateClassifier>) -> Self {
        let poller = Poller::new(settings.poll_interval);
        Self {
            settings,
            classifier,
            poller,
        }
    }

    /// Make sure `identity`'s artifact is on file, uploading it if needed.
    ///
    /// Never uploads when the status view already shows the artifact.
    pub async fn ensure_registered(
        &self,
        page: &dyn RemotePage,
        identity: &ParticipantIdentity,
    ) -> Result<Registration, WorkflowError> {
        let status = &self.settings.status_url;
        info!(url = %status, player = %identity, "Checking registration");
        if let Err(e) = page
            .navigate(status, WaitPolicy::NetworkIdle, self.settings.navigation_timeout)
            .await
        {
            warn!(url = %status, error = %e, "Status page did not settle, using what loaded");
        }

        let text = scripts::body_text(page).await?;
        if self.classifier.is_registered(&text, identity) {
            info!(player = %identity, "Artifact already registered");
            return Ok(Registration::AlreadyRegistered);
        }

        let Some(file_input) = self
            .find(page, scripts::FILE_INPUT, self.settings.file_input_timeout)
            .await?
        else {
            let text = scripts::body_text(page).await?;
            if self.classifier.mentions_identity(&text, identity) {
                info!(player = %identity, "No upload form but the player is listed, assuming registered");
                return Ok(Registration::AlreadyRegistered);
            }
            warn!(player = %identity, "Cannot find the upload form, continuing to the contest");
            return Ok(Registration::Skipped);
        };
        // The form may carry several file inputs; the artifact goes in the named one.
        let file_input = page.query(scripts::NAMED_FILE_INPUT).await?.unwrap_or(file_input);

        match self.submit(page, identity, &file_input).await {
            Ok(()) => {}
            Err(WorkflowError::Page(e)) if !e.is_transient() => return Err(e.into()),
            Err(e) => {
                warn!(error = %e, "Upload did not go through, continuing to the contest");
                return Ok(Registration::Skipped);
            }
        }

        let confirmation = Mutex::new(None);
        let seen_slot = &confirmation;
        let classifier = &self.classifier;
        let outcome = self
            .poller
            .wait_until("upload confirmation", self.settings.confirmation_timeout, || async move {
                let text = scripts::body_text(page).await?;
                let seen = classifier.upload_confirmation(&text);
                *seen_slot.lock() = seen;
                Ok(seen.is_some())
            })
            .await;

        match outcome {
            Ok(_) => match *confirmation.lock() {
                Some(UploadConfirmation::AlreadyExists) => {
                    info!(player = %identity, "Site reports the artifact already exists");
                    Ok(Registration::AlreadyRegistered)
                }
                _ => {
                    info!(player = %identity, "Artifact uploaded");
                    Ok(Registration::Uploaded)
                }
            },
            Err(PollError::Timeout { waited, .. }) => {
                // The upload may still have gone through; the contest setup
                // will find out.
                warn!(
                    waited_ms = waited.as_millis() as u64,
                    "No upload confirmation, continuing"
                );
                Ok(Registration::Unconfirmed)
            }
            Err(PollError::Fatal(e)) => Err(e.into()),
        }
    }

    /// Attach the artifact, fill in the credential and submit the form.
    async fn submit(
        &self,
        page: &dyn RemotePage,
        identity: &ParticipantIdentity,
        file_input: &ElementHandle,
    ) -> Result<(), WorkflowError> {
        info!(path = %self.settings.artifact_path.display(), "Uploading artifact");
        page.upload_file(file_input, &self.settings.artifact_path).await?;

        let credential = self
            .find(
                page,
                scripts::CREDENTIAL_INPUT,
                self.settings.credential_field_timeout,
            )
            .await?
            .ok_or_else(|| WorkflowError::structural("upload credential field"))?;
        page.type_text(&credential, identity.credential()).await?;

        let submit = page
            .query(scripts::SUBMIT_INPUT)
            .await?
            .ok_or_else(|| WorkflowError::structural("upload submit button"))?;
        page.click(&submit).await?;
        Ok(())
    }

    /// Poll for `selector` until it exists or `timeout` passes.
    async fn find(
        &self,
        page: &dyn RemotePage,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<ElementHandle>, WorkflowError> {
        let found = Mutex::new(None);
        let slot = &found;
        let result = self
            .poller
            .wait_until(selector, timeout, || async move {
                let element = page.query(selector).await?;
                let hit = element.is_some();
                *slot.lock() = element;
                Ok(hit)
            })
            .await;
        match result {
            Ok(_) => Ok(found.into_inner()),
            Err(PollError::Timeout { .. }) => {
                debug!(selector, "Element never appeared");
                Ok(None)
            }
            Err(PollError::Fatal(e)) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "registrar_tests.rs"]
mod tests;
