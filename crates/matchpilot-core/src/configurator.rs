//! Contest setup.
//!
//! Opens the manager view of a contest, shortens its clocks, seats both
//! participants and pings them. The ping answer arrives as a modal dialog.

use std::sync::Arc;
use std::time::Duration;

use matchpilot_config::Config;
use tracing::{debug, info, warn};

use crate::classifier::PageStateClassifier;
use crate::error::WorkflowError;
use crate::identity::ParticipantIdentity;
use crate::remote::{DialogResponse, RemotePage, RemoteSession, WaitPolicy};
use crate::scripts;

#[derive(Debug, Clone)]
pub struct ContestSettings {
    pub contest: String,
    pub listing_url: String,
    /// Manager view to open directly when the listing link opens nothing.
    pub manager_url: String,
    /// Participant endpoint, with `{name}` standing for the participant.
    pub participant_url: String,
    pub clock_seconds: u32,
    pub clock_field_selector: String,
    pub clock_field_limit: usize,
    pub navigation_timeout: Duration,
    pub new_view_timeout: Duration,
    pub readiness_timeout: Duration,
    pub settle_delay: Duration,
    pub slot_engage_delay: Duration,
}

impl ContestSettings {
    pub fn from_config(config: &Config) -> Self {
        let contest = config.tournament.contest_name.clone();
        Self {
            listing_url: config.site.contests_url(),
            manager_url: config.site.manager_url_for(&contest),
            participant_url: config.site.participant_url.clone(),
            contest,
            clock_seconds: config.tournament.clock_seconds,
            clock_field_selector: config.tournament.clock_field_selector.clone(),
            clock_field_limit: config.tournament.clock_field_limit,
            navigation_timeout: config.timing.navigation_timeout(),
            new_view_timeout: config.timing.new_view_timeout(),
            readiness_timeout: config.timing.readiness_timeout(),
            settle_delay: config.timing.settle_delay(),
            slot_engage_delay: config.timing.slot_engage_delay(),
        }
    }

    fn participant_url_for(&self, name: &str) -> String {
        self.participant_url.replace("{name}", name)
    }
}

/// How a participant name got into its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindMethod {
    /// Through the inline editor the slot opens when clicked.
    Editor,
    /// No editor appeared; the slot text was overwritten.
    DirectText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotBinding {
    pub slot: usize,
    pub participant: String,
    pub method: BindMethod,
}

/// Result of the ping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// The dialog said everyone is ready.
    Ready(String),
    /// A dialog came back but did not report readiness.
    Reported(String),
    /// The manager view has no ping control.
    NotChecked,
}

/// A manager view ready to run rounds.
pub struct ConfiguredContest {
    pub manager: Arc<dyn RemotePage>,
    pub slots: Vec<SlotBinding>,
    pub clocks_rewritten: usize,
    pub readiness: Readiness,
}

pub struct Configurator {
    settings: ContestSettings,
    classifier: Arc<dyn PageStateClassifier>,
}

impl Configurator {
    pub fn new(settings: ContestSettings, classifier: Arc<dyn PageStateClassifier>) -> Self {
        Self {
            settings,
            classifier,
        }
    }

    /// Set up the contest with `participants` seated in order (self first).
    pub async fn configure(
        &self,
        session: &dyn RemoteSession,
        listing: &dyn RemotePage,
        participants: [&ParticipantIdentity; 2],
    ) -> Result<ConfiguredContest, WorkflowError> {
        self.open_participant_endpoints(session, &participants).await;

        let manager = self.open_manager(session, listing).await?;
        tokio::time::sleep(self.settings.settle_delay).await;

        let clocks_rewritten = self.rewrite_clocks(manager.as_ref()).await?;
        let slots = self.seat_participants(manager.as_ref(), &participants).await?;
        tokio::time::sleep(self.settings.settle_delay).await;

        let readiness = self.ping(manager.as_ref()).await?;
        tokio::time::sleep(self.settings.settle_delay).await;

        Ok(ConfiguredContest {
            manager,
            slots,
            clocks_rewritten,
            readiness,
        })
    }

    /// The ping reaches each participant through its endpoint page.
    async fn open_participant_endpoints(
        &self,
        session: &dyn RemoteSession,
        participants: &[&ParticipantIdentity; 2],
    ) {
        for participant in participants {
            let url = self.settings.participant_url_for(participant.name());
            match session.open_page(Some(&url)).await {
                Ok(page) => debug!(page = page.id(), url = %url, "Opened participant endpoint"),
                Err(e) => warn!(url = %url, error = %e, "Participant endpoint did not load"),
            }
        }
    }

    async fn open_manager(
        &self,
        session: &dyn RemoteSession,
        listing: &dyn RemotePage,
    ) -> Result<Arc<dyn RemotePage>, WorkflowError> {
        let contest = &self.settings.contest;
        let listing_url = &self.settings.listing_url;
        info!(contest = %contest, "Opening contest manager");
        if let Err(e) = listing
            .navigate(listing_url, WaitPolicy::NetworkIdle, self.settings.navigation_timeout)
            .await
        {
            warn!(url = %listing_url, error = %e, "Contest listing did not settle, using what loaded");
        }

        let marked = listing.evaluate(&scripts::mark_manager_link(contest)).await?;
        let link = match marked.as_bool() {
            Some(true) => listing.query(scripts::MANAGER_LINK).await?,
            _ => None,
        };
        let link = link.ok_or_else(|| {
            WorkflowError::structural(format!("manager link for contest '{}'", contest))
        })?;
        listing.click(&link).await?;

        let is_manager = |url: &str| url.contains("manager");
        match session
            .wait_for_page(&is_manager, self.settings.new_view_timeout)
            .await
        {
            Ok(page) => {
                info!(page = page.id(), "Manager view opened");
                Ok(page)
            }
            Err(e) => {
                let fallback = &self.settings.manager_url;
                warn!(error = %e, url = %fallback, "No manager view appeared, opening it directly");
                session.open_page(Some(fallback)).await.map_err(|e| {
                    warn!(url = %fallback, error = %e, "Manager view failed to open");
                    WorkflowError::structural(format!("manager view for contest '{}'", contest))
                })
            }
        }
    }

    /// Overwrite the clock fields; returns how many took the new value.
    async fn rewrite_clocks(&self, manager: &dyn RemotePage) -> Result<usize, WorkflowError> {
        let fields = manager.query_all(&self.settings.clock_field_selector).await?;
        let value = self.settings.clock_seconds.to_string();
        let mut rewritten = 0;
        for field in fields.iter().take(self.settings.clock_field_limit) {
            match manager.replace_text(field, &value).await {
                Ok(()) => rewritten += 1,
                Err(e) => warn!(error = %e, "Could not rewrite clock field, keeping default"),
            }
        }
        if rewritten == 0 {
            warn!(selector = %self.settings.clock_field_selector, "No clock fields rewritten");
        } else {
            info!(fields = rewritten, seconds = self.settings.clock_seconds, "Clocks shortened");
        }
        Ok(rewritten)
    }

    async fn seat_participants(
        &self,
        manager: &dyn RemotePage,
        participants: &[&ParticipantIdentity; 2],
    ) -> Result<Vec<SlotBinding>, WorkflowError> {
        let tagged = manager
            .evaluate(&scripts::tag_placeholder_slots(scripts::PLACEHOLDER_SLOT_TEXT))
            .await?
            .as_u64()
            .unwrap_or(0) as usize;
        if tagged < participants.len() {
            warn!(found = tagged, "Fewer open slots than participants");
        }

        let mut slots = Vec::with_capacity(participants.len());
        for (index, participant) in participants.iter().enumerate().take(tagged) {
            let Some(cell) = manager.query(&scripts::slot_selector(index)).await? else {
                warn!(slot = index, "Slot disappeared before it could be filled");
                continue;
            };
            if let Err(e) = manager.click(&cell).await {
                warn!(slot = index, error = %e, "Could not engage slot editor");
            }
            tokio::time::sleep(self.settings.slot_engage_delay).await;

            let bound = manager
                .evaluate(&scripts::bind_slot(index, participant.name()))
                .await?;
            let method = match bound.as_str() {
                Some("editor") => BindMethod::Editor,
                Some("text") => BindMethod::DirectText,
                _ => {
                    warn!(slot = index, player = %participant, "Slot vanished while binding");
                    continue;
                }
            };
            info!(slot = index, player = %participant, ?method, "Seated participant");
            slots.push(SlotBinding {
                slot: index,
                participant: participant.name().to_string(),
                method,
            });
        }
        Ok(slots)
    }

    async fn ping(&self, manager: &dyn RemotePage) -> Result<Readiness, WorkflowError> {
        let Some(ping) = manager.query(scripts::PING_CONTROL).await? else {
            warn!("No ping control, skipping readiness check");
            return Ok(Readiness::NotChecked);
        };

        // Registered before the click so the dialog cannot slip past.
        let subscription = manager.once_dialog(DialogResponse::Accept).await?;
        manager.click(&ping).await?;

        let timeout = self.settings.readiness_timeout;
        match subscription.wait(timeout).await {
            Ok(event) if self.classifier.dialog_reports_ready(&event.message) => {
                info!(message = %event.message, "All players ready");
                Ok(Readiness::Ready(event.message))
            }
            Ok(event) => {
                warn!(message = %event.message, "Readiness check answered without confirming");
                Ok(Readiness::Reported(event.message))
            }
            Err(e) if e.is_timeout() => Err(WorkflowError::ReadinessTimeout { waited: timeout }),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "configurator_tests.rs"]
mod tests;
