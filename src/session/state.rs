//! Internal states of the session controller and their public views.

use std::fmt;
use std::time::Instant;

use zeroize::Zeroizing;

use crate::vault::{RecordId, SecretRecord};

/// What a pending credential prompt will unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    /// Decrypt an existing record for display.
    Reveal,
    /// Encrypt and store a new record.
    Create,
}

/// Plaintext-free view of the controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingCredential(Pending),
    Unlocked,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::AwaitingCredential(Pending::Reveal) => "awaiting a credential to reveal",
            Phase::AwaitingCredential(Pending::Create) => "awaiting a credential to create",
            Phase::Unlocked => "unlocked",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a successful `submit_credential`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The record is unlocked; read it with `SessionController::revealed`.
    Revealed,
    /// A new record was stored under this id.
    Created(RecordId),
}

/// A record waiting for its first encryption.
pub(crate) struct NewRecord {
    pub service: String,
    pub identifier: String,
    pub plaintext: Zeroizing<String>,
}

/// A decrypted record.
pub(crate) struct UnlockedRecord {
    pub record: SecretRecord,
    pub plaintext: Zeroizing<String>,
    pub since: Instant,
}

pub(crate) enum State {
    Idle,
    AwaitingReveal { record: SecretRecord, failures: u32 },
    AwaitingCreate { draft: NewRecord, failures: u32 },
    Unlocked(UnlockedRecord),
}

impl State {
    pub fn phase(&self) -> Phase {
        match self {
            State::Idle => Phase::Idle,
            State::AwaitingReveal { .. } => Phase::AwaitingCredential(Pending::Reveal),
            State::AwaitingCreate { .. } => Phase::AwaitingCredential(Pending::Create),
            State::Unlocked(_) => Phase::Unlocked,
        }
    }
}
