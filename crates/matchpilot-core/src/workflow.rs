//! The end-to-end tournament run.

use std::sync::Arc;

use matchpilot_config::Config;
use tokio::sync::Notify;
use tracing::{error, info, warn};

use crate::auth::{AuthSettings, Authenticator, OperatorPrompt};
use crate::classifier::{HeuristicClassifier, PageStateClassifier};
use crate::configurator::{ContestSettings, Configurator};
use crate::error::WorkflowError;
use crate::identity::ParticipantIdentity;
use crate::keepalive::KeepAlive;
use crate::match_loop::{MatchLoop, MatchSettings};
use crate::registrar::{Registrar, RegistrarSettings};
use crate::remote::RemoteSession;
use crate::results::{ResultsAggregator, TournamentResult};

/// Runs sign-in, registration, contest setup and every round in order.
pub struct Workflow {
    config: Config,
    classifier: Arc<dyn PageStateClassifier>,
    prompt: Arc<dyn OperatorPrompt>,
    wake: Option<Arc<Notify>>,
}

impl Workflow {
    pub fn new(config: Config, prompt: Arc<dyn OperatorPrompt>) -> Self {
        Self {
            config,
            classifier: Arc::new(HeuristicClassifier::new()),
            prompt,
            wake: None,
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn PageStateClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Signal that makes the sign-in wait re-check at once.
    pub fn with_wake(mut self, wake: Arc<Notify>) -> Self {
        self.wake = Some(wake);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Play the configured tournament on `session` and persist the result.
    ///
    /// If the rounds stop early the partial result is still written, marked
    /// as aborted, before the error is returned.
    pub async fn run(&self, session: Arc<dyn RemoteSession>) -> Result<TournamentResult, WorkflowError> {
        let tournament = &self.config.tournament;
        let _keepalive = KeepAlive::spawn(session.clone(), self.config.timing.keepalive_interval());

        let me = ParticipantIdentity::new(&tournament.self_name, &tournament.self_credential);
        let opponent = ParticipantIdentity::named(&tournament.opponent_name);

        let page = match session.pages().await.into_iter().next() {
            Some(page) => page,
            None => session.open_page(None).await?,
        };

        let mut authenticator = Authenticator::new(
            AuthSettings::from_config(&self.config),
            self.classifier.clone(),
            self.prompt.clone(),
        );
        if let Some(wake) = &self.wake {
            authenticator = authenticator.with_wake(wake.clone());
        }
        authenticator.authenticate(page.as_ref(), &me).await?;

        let registration = Registrar::new(RegistrarSettings::from_config(&self.config), self.classifier.clone())
            .ensure_registered(page.as_ref(), &me)
            .await?;
        info!(?registration, "Registration step done");

        let contest = Configurator::new(ContestSettings::from_config(&self.config), self.classifier.clone())
            .configure(session.as_ref(), page.as_ref(), [&me, &opponent])
            .await?;
        info!(
            slots = contest.slots.len(),
            clocks = contest.clocks_rewritten,
            readiness = ?contest.readiness,
            "Contest configured"
        );

        let match_loop = MatchLoop::new(MatchSettings::from_config(&self.config), self.classifier.clone());
        let mut aggregator = ResultsAggregator::new();
        let played = match_loop
            .run_rounds(contest.manager.as_ref(), &mut aggregator)
            .await;

        let summary = aggregator.finalize(
            &tournament.contest_name,
            &tournament.opponent_name,
            match_loop.total_rounds(),
        );
        match played {
            Ok(_) => {
                self.persist(&summary)?;
                info!("Tournament complete\n{}", summary.report());
                Ok(summary)
            }
            Err(e) => {
                error!(error = %e, completed = aggregator.completed(), "Match loop aborted");
                let partial = summary.with_abort(e.to_string());
                if let Err(io) = self.persist(&partial) {
                    warn!(error = %io, "Could not persist partial results");
                }
                info!("Partial results\n{}", partial.report());
                Err(e)
            }
        }
    }

    fn persist(&self, result: &TournamentResult) -> Result<(), WorkflowError> {
        let path = &self.config.tournament.results_path;
        result.save(path)?;
        info!(path = %path.display(), "Results saved");
        Ok(())
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
