//! Contest participants.

use std::fmt;

/// An immutable (name, credential) pair identifying one contest entrant.
///
/// The credential is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct ParticipantIdentity {
    name: String,
    credential: String,
}

impl ParticipantIdentity {
    pub fn new(name: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            credential: credential.into(),
        }
    }

    /// An entrant we only know by name (the opponent).
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, String::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }
}

impl fmt::Debug for ParticipantIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticipantIdentity")
            .field("name", &self.name)
            .field("credential", &if self.credential.is_empty() { "" } else { "***" })
            .finish()
    }
}

impl fmt::Display for ParticipantIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
