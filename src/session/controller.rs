//! The reveal/edit session controller.
//!
//! One controller serves one signed-in owner and works on one record at
//! a time:
//!
//! ```text
//! Idle --request_reveal--> AwaitingCredential(Reveal) --submit_credential--> Unlocked
//! Idle --create_record---> AwaitingCredential(Create) --submit_credential--> Idle
//! Unlocked --save_edit / delete_active / close--> Idle
//! ```
//!
//! The master password is kept only between a successful verification
//! and the encrypt/decrypt call it authorizes.  Leaving a state always
//! drops (and so wipes) the credential and any decrypted plaintext.

use std::mem;
use std::time::Duration;

use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use super::state::{NewRecord, Phase, State, SubmitOutcome, UnlockedRecord};
use crate::auth::Authenticator;
use crate::crypto::EnvelopeCodec;
use crate::errors::{CredVaultError, Result};
use crate::vault::record::validate_label;
use crate::vault::{OwnerId, RecordId, RecordStore, RecordSummary, SecretRecord};

/// Central owner of the reveal/edit state machine.
pub struct SessionController<S: RecordStore, A: Authenticator> {
    owner: OwnerId,
    store: S,
    auth: A,
    codec: EnvelopeCodec,

    /// How long an unlocked record may be edited without re-verifying.
    unlock_timeout: Option<Duration>,

    /// Consecutive wrong passwords allowed per prompt.
    max_attempts: Option<u32>,

    state: State,

    /// Set by a successful verification, taken by the operation it
    /// authorizes.
    verified_credential: Option<Zeroizing<String>>,
}

impl<S: RecordStore, A: Authenticator> SessionController<S, A> {
    /// Open a session for `owner` in the `Idle` state.
    pub fn new(owner: OwnerId, store: S, auth: A, codec: EnvelopeCodec) -> Self {
        debug!(owner = %owner, "session opened");
        Self {
            owner,
            store,
            auth,
            codec,
            unlock_timeout: None,
            max_attempts: None,
            state: State::Idle,
            verified_credential: None,
        }
    }

    /// Refuse `save_edit` once a record has been unlocked longer than `timeout`.
    pub fn with_unlock_timeout(mut self, timeout: Duration) -> Self {
        self.unlock_timeout = Some(timeout);
        self
    }

    /// Abandon a credential prompt after `attempts` consecutive wrong passwords.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts.max(1));
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// The storage collaborator.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The decrypted secret, while `Unlocked`.
    pub fn revealed(&self) -> Option<&str> {
        match &self.state {
            State::Unlocked(u) => Some(u.plaintext.as_str()),
            _ => None,
        }
    }

    /// The record currently pending or unlocked, if any.
    pub fn active_record(&self) -> Option<&SecretRecord> {
        match &self.state {
            State::AwaitingReveal { record, .. } => Some(record),
            State::Unlocked(u) => Some(&u.record),
            State::Idle | State::AwaitingCreate { .. } => None,
        }
    }

    /// Returns `true` while a verified credential is held.
    pub fn holds_credential(&self) -> bool {
        self.verified_credential.is_some()
    }

    /// Metadata for every record of this owner.  Never decrypts.
    pub fn list_records(&self) -> Result<Vec<RecordSummary>> {
        let records = self.store.list_by_owner(&self.owner)?;
        Ok(records.iter().map(SecretRecord::summary).collect())
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// `Idle -> AwaitingCredential(Reveal)` for `record`.
    pub fn request_reveal(&mut self, record: SecretRecord) -> Result<()> {
        self.require_idle("reveal a record")?;

        if record.owner != self.owner {
            return Err(CredVaultError::RecordNotFound(record.id.to_string()));
        }

        debug!(record = %record.id, "reveal requested");
        self.state = State::AwaitingReveal {
            record,
            failures: 0,
        };
        Ok(())
    }

    /// Look `id` up in the store, then `request_reveal` it.
    pub fn request_reveal_by_id(&mut self, id: &RecordId) -> Result<()> {
        self.require_idle("reveal a record")?;
        let record = self.store.get(id)?;
        self.request_reveal(record)
    }

    /// `Idle -> AwaitingCredential(Create)` for a new record.
    ///
    /// Nothing is encrypted until the next `submit_credential` succeeds.
    pub fn create_record(&mut self, service: &str, identifier: &str, plaintext: &str) -> Result<()> {
        self.require_idle("create a record")?;
        validate_label("service", service)?;
        validate_label("identifier", identifier)?;
        validate_secret(plaintext)?;

        debug!(service, "create requested");
        self.state = State::AwaitingCreate {
            draft: NewRecord {
                service: service.to_string(),
                identifier: identifier.to_string(),
                plaintext: Zeroizing::new(plaintext.to_string()),
            },
            failures: 0,
        };
        Ok(())
    }

    /// Verify `candidate` and run the pending reveal or create.
    ///
    /// A wrong password keeps the prompt open for another try (until
    /// `max_attempts` is reached).  Any other failure returns to `Idle`.
    pub fn submit_credential(&mut self, candidate: &str) -> Result<SubmitOutcome> {
        if !matches!(self.phase(), Phase::AwaitingCredential(_)) {
            return Err(self.invalid("submit a credential"));
        }

        if let Err(e) = self.auth.verify(&self.owner, candidate) {
            return Err(self.credential_rejected(e));
        }

        self.verified_credential = Some(Zeroizing::new(candidate.to_string()));

        match mem::replace(&mut self.state, State::Idle) {
            State::AwaitingReveal { record, .. } => self.finish_reveal(record),
            State::AwaitingCreate { draft, .. } => self.finish_create(draft),
            // Checked above.
            State::Idle | State::Unlocked(_) => {
                self.verified_credential = None;
                Err(self.invalid("submit a credential"))
            }
        }
    }

    /// Re-encrypt the unlocked record with `new_plaintext` and store it.
    ///
    /// Uses the credential verified for the reveal; the session returns
    /// to `Idle` whether or not the save succeeds, including when the new
    /// secret is rejected as blank.
    pub fn save_edit(&mut self, new_plaintext: &str) -> Result<()> {
        if self.phase() != Phase::Unlocked {
            return Err(self.invalid("save an edit"));
        }
        if let Err(e) = validate_secret(new_plaintext) {
            self.close();
            return Err(e);
        }

        let unlocked = match mem::replace(&mut self.state, State::Idle) {
            State::Unlocked(u) => u,
            _ => return Err(self.invalid("save an edit")),
        };
        let credential = self.verified_credential.take();

        let credential = match credential {
            Some(c) if !self.window_elapsed(&unlocked) => c,
            _ => {
                info!(record = %unlocked.record.id, "edit refused, session expired");
                return Err(CredVaultError::SessionExpired);
            }
        };

        let envelope = self.codec.encrypt(new_plaintext, &credential)?;
        drop(credential);

        self.store.update(&unlocked.record.id, &envelope)?;
        info!(record = %unlocked.record.id, "record re-encrypted");
        Ok(())
    }

    /// Delete the unlocked record and return to `Idle`.
    pub fn delete_active(&mut self) -> Result<RecordId> {
        if self.phase() != Phase::Unlocked {
            return Err(self.invalid("delete a record"));
        }

        let unlocked = match mem::replace(&mut self.state, State::Idle) {
            State::Unlocked(u) => u,
            _ => return Err(self.invalid("delete a record")),
        };
        self.verified_credential = None;

        let id = unlocked.record.id.clone();
        drop(unlocked);

        self.store.delete(&id)?;
        info!(record = %id, "record deleted");
        Ok(id)
    }

    /// Drop any pending work, credential and plaintext; back to `Idle`.
    pub fn close(&mut self) {
        if self.phase() != Phase::Idle {
            debug!(from = %self.phase(), "session closed");
        }
        self.state = State::Idle;
        self.verified_credential = None;
    }

    /// End the session.  Always closes first.
    pub fn sign_out(mut self) {
        self.close();
        info!(owner = %self.owner, "signed out");
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn finish_reveal(&mut self, record: SecretRecord) -> Result<SubmitOutcome> {
        let result = match &self.verified_credential {
            Some(credential) => self.codec.decrypt_envelope(&record.envelope, credential),
            None => Err(CredVaultError::SessionExpired),
        };

        match result {
            Ok(plaintext) => {
                info!(record = %record.id, "record unlocked");
                self.state = State::Unlocked(UnlockedRecord {
                    record,
                    plaintext,
                    since: std::time::Instant::now(),
                });
                Ok(SubmitOutcome::Revealed)
            }
            Err(e) => {
                warn!(record = %record.id, "could not open record envelope");
                self.verified_credential = None;
                Err(e)
            }
        }
    }

    fn finish_create(&mut self, draft: NewRecord) -> Result<SubmitOutcome> {
        let credential = self
            .verified_credential
            .take()
            .ok_or(CredVaultError::SessionExpired)?;

        let envelope = self.codec.encrypt(&draft.plaintext, &credential)?;
        drop(credential);
        drop(draft.plaintext);

        let id = self
            .store
            .create(&self.owner, &draft.service, &draft.identifier, &envelope)?;
        info!(record = %id, service = %draft.service, "record created");
        Ok(SubmitOutcome::Created(id))
    }

    /// Handle a failed verification.  Only `InvalidCredential` keeps
    /// the prompt open.
    fn credential_rejected(&mut self, error: CredVaultError) -> CredVaultError {
        if !matches!(error, CredVaultError::InvalidCredential) {
            self.close();
            return error;
        }

        let failures = match &mut self.state {
            State::AwaitingReveal { failures, .. } | State::AwaitingCreate { failures, .. } => {
                *failures += 1;
                *failures
            }
            State::Idle | State::Unlocked(_) => 0,
        };
        debug!(failures, "credential rejected");

        match self.max_attempts {
            Some(max) if failures >= max => {
                self.close();
                CredVaultError::TooManyAttempts(failures)
            }
            _ => CredVaultError::InvalidCredential,
        }
    }

    fn window_elapsed(&self, unlocked: &UnlockedRecord) -> bool {
        self.unlock_timeout
            .is_some_and(|timeout| unlocked.since.elapsed() >= timeout)
    }

    fn require_idle(&self, operation: &'static str) -> Result<()> {
        if self.phase() == Phase::Idle {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    fn invalid(&self, operation: &'static str) -> CredVaultError {
        CredVaultError::InvalidTransition {
            operation,
            state: self.phase().name(),
        }
    }
}

/// Secrets may not be empty or whitespace only.
fn validate_secret(value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CredVaultError::InvalidInput("secret cannot be empty".into()));
    }
    Ok(())
}

impl<S: RecordStore, A: Authenticator> Drop for SessionController<S, A> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KdfParams;
    use crate::session::Pending;
    use crate::vault::MemoryRecordStore;

    /// Accepts exactly one password for every owner.
    struct FixedPassword(&'static str);

    impl Authenticator for FixedPassword {
        fn verify(&self, _owner: &OwnerId, candidate: &str) -> Result<()> {
            if candidate == self.0 {
                Ok(())
            } else {
                Err(CredVaultError::InvalidCredential)
            }
        }
    }

    fn controller() -> SessionController<MemoryRecordStore, FixedPassword> {
        SessionController::new(
            OwnerId::new("alice").unwrap(),
            MemoryRecordStore::new(),
            FixedPassword("hunter2"),
            EnvelopeCodec::new(KdfParams::new(1_000).unwrap()),
        )
    }

    #[test]
    fn wrong_password_keeps_create_prompt_open() {
        let mut c = controller();
        c.create_record("github", "alice", "S3cret!").unwrap();

        let err = c.submit_credential("nope").unwrap_err();
        assert!(matches!(err, CredVaultError::InvalidCredential));
        assert_eq!(c.phase(), Phase::AwaitingCredential(Pending::Create));
        assert!(!c.holds_credential());

        let outcome = c.submit_credential("hunter2").unwrap();
        assert!(matches!(outcome, SubmitOutcome::Created(_)));
        assert_eq!(c.phase(), Phase::Idle);
        assert!(!c.holds_credential());
    }

    #[test]
    fn attempts_are_bounded() {
        let mut c = controller().with_max_attempts(2);
        c.create_record("github", "alice", "S3cret!").unwrap();

        assert!(matches!(
            c.submit_credential("a"),
            Err(CredVaultError::InvalidCredential)
        ));
        assert!(matches!(
            c.submit_credential("b"),
            Err(CredVaultError::TooManyAttempts(2))
        ));
        assert_eq!(c.phase(), Phase::Idle);
    }

    #[test]
    fn zero_timeout_expires_edit_window() {
        let mut c = controller().with_unlock_timeout(Duration::ZERO);
        c.create_record("github", "alice", "S3cret!").unwrap();
        c.submit_credential("hunter2").unwrap();

        let record = c.store().list_by_owner(c.owner()).unwrap().remove(0);
        c.request_reveal(record).unwrap();
        c.submit_credential("hunter2").unwrap();

        let err = c.save_edit("new").unwrap_err();
        assert!(matches!(err, CredVaultError::SessionExpired));
        assert_eq!(c.phase(), Phase::Idle);
        assert!(!c.holds_credential());
    }

    #[test]
    fn submit_from_idle_is_refused() {
        let mut c = controller();
        let err = c.submit_credential("hunter2").unwrap_err();
        assert!(matches!(err, CredVaultError::InvalidTransition { .. }));
        assert!(!c.holds_credential());
    }

    #[test]
    fn blank_edit_closes_the_session() {
        let mut c = controller();
        c.create_record("github", "alice", "S3cret!").unwrap();
        c.submit_credential("hunter2").unwrap();
        let record = c.store().list_by_owner(c.owner()).unwrap().remove(0);

        for blank in ["", "   "] {
            c.request_reveal(record.clone()).unwrap();
            c.submit_credential("hunter2").unwrap();

            assert!(matches!(
                c.save_edit(blank),
                Err(CredVaultError::InvalidInput(_))
            ));
            assert_eq!(c.phase(), Phase::Idle);
            assert!(!c.holds_credential());
            assert!(c.revealed().is_none());
        }

        // The stored secret is untouched.
        c.request_reveal(record).unwrap();
        c.submit_credential("hunter2").unwrap();
        assert_eq!(c.revealed(), Some("S3cret!"));
    }

    #[test]
    fn whitespace_secret_is_rejected_on_create() {
        let mut c = controller();
        assert!(matches!(
            c.create_record("github", "alice", " \t "),
            Err(CredVaultError::InvalidInput(_))
        ));
        assert_eq!(c.phase(), Phase::Idle);
        assert!(c.store().is_empty());
    }
}
