//! Reading meaning out of page text.
//!
//! Every substring heuristic the engine relies on lives behind
//! [`PageStateClassifier`], so a changed site only needs a new classifier.

use serde::Deserialize;

use crate::identity::ParticipantIdentity;

/// What the engine knows about a page after one snapshot probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageSnapshot {
    pub url: String,
    pub title: String,
    pub text: String,
    pub has_upload_link: bool,
    pub has_run_link: bool,
}

/// How the site answered an artifact upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadConfirmation {
    /// The site already had an artifact under this name.
    AlreadyExists,
    /// The upload was taken.
    Accepted,
}

/// Pure questions about page state.
pub trait PageStateClassifier: Send + Sync {
    /// Has sign-in finished and landed on an authenticated view?
    fn is_dashboard(&self, snapshot: &PageSnapshot, identity: &ParticipantIdentity) -> bool;

    /// Does the status view say the artifact is on file?
    fn is_registered(&self, text: &str, identity: &ParticipantIdentity) -> bool;

    /// Does the page mention the identity at all?
    fn mentions_identity(&self, text: &str, identity: &ParticipantIdentity) -> bool;

    fn upload_confirmation(&self, text: &str) -> Option<UploadConfirmation>;

    /// Has the current round reached a terminal score?
    fn round_finished(&self, text: &str) -> bool;

    /// Numeric-only cells, in page order.
    fn parse_scores(&self, cells: &[String]) -> Vec<u32>;

    /// Does a readiness dialog say both players answered?
    fn dialog_reports_ready(&self, message: &str) -> bool;
}

/// Substring heuristics tuned to the contest site's markup.
#[derive(Debug, Clone)]
pub struct HeuristicClassifier {
    login_marker: String,
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self {
            login_marker: "signin".to_string(),
        }
    }
}

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different URL fragment to recognise the sign-in page.
    pub fn with_login_marker(mut self, marker: impl Into<String>) -> Self {
        self.login_marker = marker.into();
        self
    }
}

impl PageStateClassifier for HeuristicClassifier {
    fn is_dashboard(&self, snapshot: &PageSnapshot, identity: &ParticipantIdentity) -> bool {
        if snapshot.url.contains(&self.login_marker) {
            return false;
        }
        snapshot.has_upload_link
            || snapshot.has_run_link
            || snapshot.text.contains("Player:")
            || (!identity.name().is_empty() && snapshot.text.contains(identity.name()))
    }

    fn is_registered(&self, text: &str, identity: &ParticipantIdentity) -> bool {
        let name = identity.name().to_lowercase();
        if name.is_empty() {
            return false;
        }
        let text = text.to_lowercase();
        if !text.contains(&name) {
            return false;
        }
        text.contains("already")
            || text.contains("exists")
            || text.contains("uploaded")
            || text.contains(&format!("{}:", name))
            || text.contains(&format!("player: {}", name))
    }

    fn mentions_identity(&self, text: &str, identity: &ParticipantIdentity) -> bool {
        let name = identity.name().to_lowercase();
        !name.is_empty() && text.to_lowercase().contains(&name)
    }

    fn upload_confirmation(&self, text: &str) -> Option<UploadConfirmation> {
        let text = text.to_lowercase();
        if text.contains("already exists") {
            Some(UploadConfirmation::AlreadyExists)
        } else if text.contains("uploaded") || text.contains("success") {
            Some(UploadConfirmation::Accepted)
        } else {
            None
        }
    }

    fn round_finished(&self, text: &str) -> bool {
        text.contains("100") || (text.contains("50") && !text.contains("Control"))
    }

    fn parse_scores(&self, cells: &[String]) -> Vec<u32> {
        cells
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty() && c.bytes().all(|b| b.is_ascii_digit()))
            .filter_map(|c| c.parse().ok())
            .collect()
    }

    fn dialog_reports_ready(&self, message: &str) -> bool {
        message.to_lowercase().contains("ready")
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
