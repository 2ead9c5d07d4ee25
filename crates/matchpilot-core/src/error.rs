//! Workflow errors.

use std::time::Duration;

use thiserror::Error;

use crate::remote::PageError;

/// Errors that end a stage, and with it the run.
///
/// Non-fatal conditions (slow navigations, an unconfirmed upload, a missing
/// ping control) never become a `WorkflowError`; they are logged and the run
/// moves on.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The dashboard never appeared after the manual sign-in gate.
    #[error("Authentication timed out after {}s: no dashboard markers appeared", .waited.as_secs())]
    AuthenticationTimeout { waited: Duration },

    /// The readiness check was triggered but its confirmation dialog never came.
    #[error("Readiness check timed out after {}ms waiting for the confirmation dialog", .waited.as_millis())]
    ReadinessTimeout { waited: Duration },

    /// An expected element, row or control is absent and there is no fallback.
    #[error("Missing {what}")]
    Structural { what: String },

    /// A round did not reach a terminal score before its deadline.
    #[error("Round {round} did not finish within {}s", .waited.as_secs())]
    RoundTimeout { round: u32, waited: Duration },

    /// Anything the page raised that is not a "still waiting" condition.
    #[error(transparent)]
    Page(#[from] PageError),

    #[error("Failed to persist results: {0}")]
    Persist(#[from] std::io::Error),
}

impl WorkflowError {
    pub fn structural(what: impl Into<String>) -> Self {
        WorkflowError::Structural { what: what.into() }
    }

    /// Every error that reaches a caller has ended the run.
    ///
    /// Recoverable conditions are logged inside the stages and never surface.
    pub fn is_fatal(&self) -> bool {
        match self {
            WorkflowError::AuthenticationTimeout { .. }
            | WorkflowError::ReadinessTimeout { .. }
            | WorkflowError::Structural { .. }
            | WorkflowError::RoundTimeout { .. }
            | WorkflowError::Page(_)
            | WorkflowError::Persist(_) => true,
        }
    }

    /// Whether this error came from a deadline rather than a broken page.
    pub fn is_timeout(&self) -> bool {
        match self {
            WorkflowError::AuthenticationTimeout { .. }
            | WorkflowError::ReadinessTimeout { .. }
            | WorkflowError::RoundTimeout { .. } => true,
            WorkflowError::Page(e) => e.is_timeout(),
            _ => false,
        }
    }
}
