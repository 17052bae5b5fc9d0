//! Local account registry.
//!
//! Each account stores an Argon2id PHC string (`$argon2id$v=19$...`)
//! in `accounts.json` inside the vault directory.  The master password
//! itself is never written anywhere.

use std::path::{Path, PathBuf};

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use rand::rngs::OsRng;
use rand::TryRngCore;
use tracing::{debug, info};

use super::Authenticator;
use crate::errors::{CredVaultError, Result};
use crate::vault::format::{self, AccountEntry, AccountsDocument};
use crate::vault::OwnerId;

/// File name of the account document inside the vault directory.
pub const ACCOUNTS_FILE: &str = "accounts.json";

/// Length of the random Argon2 salt in bytes.
const SALT_LEN: usize = 16;

/// File-backed `Authenticator`.
pub struct AccountStore {
    path: PathBuf,
    document: AccountsDocument,

    /// Hash checked for unknown owners so their timing matches a real
    /// verification.
    dummy_hash: String,
}

impl AccountStore {
    /// Open (or start) the account registry in `vault_dir`.
    pub fn open(vault_dir: &Path) -> Result<Self> {
        let path = vault_dir.join(ACCOUNTS_FILE);
        let document = format::read_document::<AccountsDocument>(&path)?.unwrap_or_default();

        // Built up front with the same parameters as real hashes.
        let dummy_hash = hash_credential("credvault-dummy-password")?;

        Ok(Self {
            path,
            document,
            dummy_hash,
        })
    }

    /// Register a new owner with its master password.
    pub fn register(&mut self, owner: &OwnerId, credential: &str) -> Result<()> {
        if credential.is_empty() {
            return Err(CredVaultError::InvalidInput(
                "master password cannot be empty".into(),
            ));
        }
        if self.contains(owner) {
            return Err(CredVaultError::AccountAlreadyExists(owner.to_string()));
        }

        let password_hash = hash_credential(credential)?;
        self.document.accounts.push(AccountEntry {
            owner: owner.clone(),
            password_hash,
            created_at: Utc::now(),
        });

        if let Err(e) = format::write_document(&self.path, &self.document) {
            self.document.accounts.pop();
            return Err(e);
        }

        info!(owner = %owner, "account registered");
        Ok(())
    }

    /// Returns `true` if `owner` has a registered account.
    pub fn contains(&self, owner: &OwnerId) -> bool {
        self.document.accounts.iter().any(|a| &a.owner == owner)
    }

    /// Number of registered accounts.
    pub fn account_count(&self) -> usize {
        self.document.accounts.len()
    }

    /// Returns the path to the account file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Authenticator for AccountStore {
    fn verify(&self, owner: &OwnerId, candidate: &str) -> Result<()> {
        let entry = self.document.accounts.iter().find(|a| &a.owner == owner);

        let stored = match entry {
            Some(entry) => entry.password_hash.as_str(),
            None => {
                let _ = verify_credential(&self.dummy_hash, candidate);
                debug!(owner = %owner, "verification rejected");
                return Err(CredVaultError::InvalidCredential);
            }
        };

        if verify_credential(stored, candidate)? {
            Ok(())
        } else {
            debug!(owner = %owner, "verification rejected");
            Err(CredVaultError::InvalidCredential)
        }
    }
}

/// Hash a master password into an Argon2id PHC string.
fn hash_credential(credential: &str) -> Result<String> {
    let mut salt_bytes = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt_bytes)
        .map_err(|e| CredVaultError::StorageError(format!("random salt: {e}")))?;

    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| CredVaultError::StorageError(format!("salt encoding: {e}")))?;

    let hash = Argon2::default()
        .hash_password(credential.as_bytes(), &salt)
        .map_err(|e| CredVaultError::StorageError(format!("password hashing: {e}")))?;

    Ok(hash.to_string())
}

/// Check `candidate` against a PHC string.
///
/// A corrupt stored hash is a storage problem, not a wrong password.
fn verify_credential(phc: &str, candidate: &str) -> Result<bool> {
    let parsed = PasswordHash::new(phc)
        .map_err(|e| CredVaultError::StorageError(format!("stored password hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok())
}
