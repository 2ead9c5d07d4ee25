//! # matchpilot Core
//!
//! The orchestration engine that drives a contest site through a remote
//! browser: it waits for the operator to sign in, makes sure our artifact is
//! registered, sets up a head-to-head contest, and plays it round by round.
//!
//! ## Stages
//!
//! ```text
//! Authenticator -> Registrar -> Configurator -> MatchLoop (N rounds) -> ResultsAggregator
//! ```
//!
//! Every stage talks to the browser only through [`RemoteSession`] and
//! [`RemotePage`], and every "has the page reached state X yet" question goes
//! through the [`Poller`] with a [`PageStateClassifier`] deciding what the page
//! text means. The site has no push channel, so polling is the only way to
//! observe it.
//!
//! ## Failure policy
//!
//! Navigation hiccups are logged and swallowed. State-confirmation timeouts are
//! fatal unless the stage has an explicit fallback (registration
//! confirmation does). A round timeout stops the match loop but keeps every
//! outcome gathered so far in the [`ResultsAggregator`].

pub mod auth;
pub mod classifier;
pub mod configurator;
mod error;
pub mod identity;
pub mod keepalive;
pub mod match_loop;
pub mod poller;
pub mod registrar;
pub mod remote;
pub mod results;
pub mod scripts;
pub mod workflow;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use auth::{Authenticator, AuthSettings, Dashboard, LoginInstructions, OperatorPrompt};
pub use classifier::{HeuristicClassifier, PageSnapshot, PageStateClassifier, UploadConfirmation};
pub use configurator::{BindMethod, ConfiguredContest, Configurator, ContestSettings, Readiness, SlotBinding};
pub use error::WorkflowError;
pub use identity::ParticipantIdentity;
pub use keepalive::KeepAlive;
pub use match_loop::{MatchLoop, MatchSettings};
pub use poller::{PollError, Poller};
pub use registrar::{Registrar, RegistrarSettings, Registration};
pub use remote::{
    DialogEvent, DialogResponse, DialogSender, DialogSubscription, ElementHandle, PageError,
    RemotePage, RemoteSession, WaitPolicy,
};
pub use results::{
    OutcomeCounts, OutcomeKind, OutcomePercentages, ResultsAggregator, RoundOutcome, ScoreLayout,
    ScorePair, TournamentResult,
};
pub use workflow::Workflow;
