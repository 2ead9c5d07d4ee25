//! Round outcomes and the tournament summary.

use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How one round ended from our side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Win,
    Draw,
    Loss,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeKind::Win => write!(f, "win"),
            OutcomeKind::Draw => write!(f, "draw"),
            OutcomeKind::Loss => write!(f, "loss"),
        }
    }
}

/// Our score and the opponent's score for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorePair {
    pub ours: u32,
    pub theirs: u32,
}

impl ScorePair {
    pub fn kind(&self) -> OutcomeKind {
        match self.ours.cmp(&self.theirs) {
            Ordering::Greater => OutcomeKind::Win,
            Ordering::Less => OutcomeKind::Loss,
            Ordering::Equal => OutcomeKind::Draw,
        }
    }
}

/// Which score cell belongs to whom.
///
/// The site lists scores in seat order and gives no stronger signal about
/// which seat is ours, so this is configuration rather than inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreLayout {
    pub self_index: usize,
    pub opponent_index: usize,
}

impl Default for ScoreLayout {
    fn default() -> Self {
        Self::self_at(0)
    }
}

impl ScoreLayout {
    /// Two-seat layout with our score at `index` (0 or 1).
    pub fn self_at(index: usize) -> Self {
        let self_index = index.min(1);
        Self {
            self_index,
            opponent_index: 1 - self_index,
        }
    }

    /// Pick our score and theirs out of the ordered score list.
    pub fn pair(&self, scores: &[u32]) -> Option<ScorePair> {
        Some(ScorePair {
            ours: *scores.get(self.self_index)?,
            theirs: *scores.get(self.opponent_index)?,
        })
    }
}

/// One finished round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    /// 1-based round number.
    pub round: u32,
    pub kind: OutcomeKind,
    pub scores: ScorePair,
    /// Score cells as read, kept only when they did not form a pair.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unreadable: Option<Vec<u32>>,
}

impl RoundOutcome {
    pub fn new(round: u32, scores: ScorePair) -> Self {
        Self {
            round,
            kind: scores.kind(),
            scores,
            unreadable: None,
        }
    }

    /// A finished round whose score cells could not be split into ours and
    /// theirs. Neither side is ahead, so it counts as a draw.
    pub fn unreadable(round: u32, raw: Vec<u32>) -> Self {
        Self {
            round,
            kind: OutcomeKind::Draw,
            scores: ScorePair { ours: 0, theirs: 0 },
            unreadable: Some(raw),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
}

impl OutcomeCounts {
    pub fn total(&self) -> u32 {
        self.wins + self.draws + self.losses
    }
}

/// Share of each outcome in percent, rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutcomePercentages {
    pub wins: f64,
    pub draws: f64,
    pub losses: f64,
}

/// Running tally of the rounds played so far.
#[derive(Debug, Default)]
pub struct ResultsAggregator {
    counts: OutcomeCounts,
    rounds: Vec<RoundOutcome>,
}

impl ResultsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: RoundOutcome) {
        match outcome.kind {
            OutcomeKind::Win => self.counts.wins += 1,
            OutcomeKind::Draw => self.counts.draws += 1,
            OutcomeKind::Loss => self.counts.losses += 1,
        }
        self.rounds.push(outcome);
    }

    pub fn counts(&self) -> OutcomeCounts {
        self.counts
    }

    pub fn rounds(&self) -> &[RoundOutcome] {
        &self.rounds
    }

    /// Number of rounds recorded so far.
    pub fn completed(&self) -> u32 {
        self.counts.total()
    }

    /// Snapshot the tally as a persisted record.
    pub fn finalize(&self, contest: &str, opponent: &str, rounds_requested: u32) -> TournamentResult {
        TournamentResult {
            contest: contest.to_string(),
            opponent: opponent.to_string(),
            total_rounds: self.completed(),
            rounds_requested,
            results: self.counts,
            timestamp: Utc::now(),
            aborted: None,
        }
    }
}

/// The record written once a tournament ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentResult {
    #[serde(rename = "game")]
    pub contest: String,
    pub opponent: String,
    /// Rounds actually completed.
    #[serde(rename = "totalGames")]
    pub total_rounds: u32,
    #[serde(default)]
    pub rounds_requested: u32,
    pub results: OutcomeCounts,
    pub timestamp: DateTime<Utc>,
    /// Why the match loop stopped early, if it did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

impl TournamentResult {
    pub fn with_abort(mut self, reason: impl Into<String>) -> Self {
        self.aborted = Some(reason.into());
        self
    }

    pub fn percentages(&self) -> OutcomePercentages {
        let pct = |count: u32| {
            if self.total_rounds == 0 {
                0.0
            } else {
                (f64::from(count) / f64::from(self.total_rounds) * 1000.0).round() / 10.0
            }
        };
        OutcomePercentages {
            wins: pct(self.results.wins),
            draws: pct(self.results.draws),
            losses: pct(self.results.losses),
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Human-readable summary table.
    pub fn report(&self) -> String {
        let rule = "=".repeat(50);
        let pct = self.percentages();
        let mut out = String::new();
        out.push_str(&rule);
        out.push('\n');
        out.push_str(&format!("{} vs {}\n", self.contest, self.opponent));
        out.push_str(&rule);
        out.push('\n');
        if self.total_rounds == self.rounds_requested || self.rounds_requested == 0 {
            out.push_str(&format!("Total Games: {}\n", self.total_rounds));
        } else {
            out.push_str(&format!(
                "Total Games: {} of {} requested\n",
                self.total_rounds, self.rounds_requested
            ));
        }
        out.push_str(&format!("Wins: {} ({:.1}%)\n", self.results.wins, pct.wins));
        out.push_str(&format!("Draws: {} ({:.1}%)\n", self.results.draws, pct.draws));
        out.push_str(&format!("Losses: {} ({:.1}%)\n", self.results.losses, pct.losses));
        if let Some(reason) = &self.aborted {
            out.push_str(&format!("Aborted: {}\n", reason));
        }
        out.push_str(&format!("Recorded: {}\n", self.timestamp.to_rfc3339()));
        out.push_str(&rule);
        out
    }
}

#[cfg(test)]
#[path = "results_tests.rs"]
mod tests;
