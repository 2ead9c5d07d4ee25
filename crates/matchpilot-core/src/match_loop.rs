//! Round execution.

use std::sync::Arc;
use std::time::Duration;

use matchpilot_config::Config;
use tracing::{debug, info, warn};

use crate::classifier::PageStateClassifier;
use crate::error::WorkflowError;
use crate::poller::{PollError, Poller};
use crate::remote::RemotePage;
use crate::results::{ResultsAggregator, RoundOutcome, ScoreLayout};
use crate::scripts;

#[derive(Debug, Clone)]
pub struct MatchSettings {
    pub total_rounds: u32,
    pub round_timeout: Duration,
    pub inter_round_delay: Duration,
    pub poll_interval: Duration,
    pub score_layout: ScoreLayout,
}

impl MatchSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            total_rounds: config.tournament.total_rounds(),
            round_timeout: config.timing.round_timeout(),
            inter_round_delay: config.timing.inter_round_delay(),
            poll_interval: config.timing.poll_interval(),
            score_layout: ScoreLayout::self_at(config.tournament.self_score_index),
        }
    }
}

/// Plays rounds one after another on the manager view.
pub struct MatchLoop {
    settings: MatchSettings,
    classifier: Arc<dyn PageStateClassifier>,
    poller: Poller,
}

impl MatchLoop {
    pub fn new(settings: MatchSettings, classifier: Arc<dyn PageStateClassifier>) -> Self {
        let poller = Poller::new(settings.poll_interval);
        Self {
            settings,
            classifier,
            poller,
        }
    }

    pub fn total_rounds(&self) -> u32 {
        self.settings.total_rounds
    }

    /// Play every round, recording each outcome into `results` as it lands.
    ///
    /// A round whose run control is missing is skipped. A finished round whose
    /// scores cannot be paired counts as a draw. A round that does not finish
    /// in time ends the loop; `results` keeps what was played before it.
    pub async fn run_rounds(
        &self,
        manager: &dyn RemotePage,
        results: &mut ResultsAggregator,
    ) -> Result<Vec<RoundOutcome>, WorkflowError> {
        let total = self.settings.total_rounds;
        let mut outcomes = Vec::with_capacity(total as usize);
        info!(rounds = total, "Starting matches");

        for round in 1..=total {
            let Some(run) = manager.query(scripts::RUN_CONTROL).await? else {
                debug!(round, "Run control not present, skipping round");
                continue;
            };
            info!(round, total, "Running round");
            manager.click(&run).await?;

            let classifier = &self.classifier;
            self.poller
                .wait_until("round result", self.settings.round_timeout, || async move {
                    let text = scripts::body_text(manager).await?;
                    Ok(classifier.round_finished(&text))
                })
                .await
                .map_err(|e| match e {
                    PollError::Timeout { waited, .. } => WorkflowError::RoundTimeout { round, waited },
                    PollError::Fatal(e) => WorkflowError::Page(e),
                })?;

            let cells = scripts::table_cells(manager).await?;
            let scores = self.classifier.parse_scores(&cells);
            let outcome = match self.settings.score_layout.pair(&scores) {
                Some(pair) => {
                    let outcome = RoundOutcome::new(round, pair);
                    info!(
                        round,
                        ours = pair.ours,
                        theirs = pair.theirs,
                        result = %outcome.kind,
                        "Round finished"
                    );
                    outcome
                }
                None => {
                    warn!(round, ?scores, "Round finished without a readable score pair, counting a draw");
                    RoundOutcome::unreadable(round, scores)
                }
            };
            results.record(outcome.clone());
            outcomes.push(outcome);

            tokio::time::sleep(self.settings.inter_round_delay).await;
        }

        Ok(outcomes)
    }
}

#[cfg(test)]
#[path = "match_loop_tests.rs"]
mod tests;
