//! Record types stored in a vault.
//!
//! A `SecretRecord` carries plaintext labels (`service`, `identifier`)
//! and one confidential field, the `envelope`.  There is no way to
//! build a record around raw plaintext: the envelope type only accepts
//! well-formed `iv:salt:ciphertext` strings.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::Envelope;
use crate::errors::{CredVaultError, Result};

/// Opaque record identifier assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generate a new random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of the vault user that owns a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
    /// Validate and wrap an owner identity (typically an email address).
    ///
    /// Must be non-empty, at most 254 characters, and free of
    /// whitespace and control characters.
    pub fn new(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(CredVaultError::InvalidInput(
                "owner identity cannot be empty".into(),
            ));
        }
        if raw.chars().count() > 254 {
            return Err(CredVaultError::InvalidInput(
                "owner identity cannot exceed 254 characters".into(),
            ));
        }
        if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(CredVaultError::InvalidInput(format!(
                "owner identity '{}' cannot contain whitespace or control characters",
                raw.escape_default()
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OwnerId {
    type Error = CredVaultError;

    fn try_from(raw: String) -> Result<Self> {
        Self::new(&raw)
    }
}

impl From<OwnerId> for String {
    fn from(owner: OwnerId) -> Self {
        owner.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One saved credential entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    /// Assigned by the store, never changes.
    pub id: RecordId,

    /// The vault user this record belongs to.
    pub owner: OwnerId,

    /// Service name (e.g. "github.com").
    pub service: String,

    /// Login identifier for the service (username, email, ...).
    pub identifier: String,

    /// The encrypted secret.
    pub envelope: Envelope,

    /// When this record was first created.
    pub created_at: DateTime<Utc>,
}

impl SecretRecord {
    /// Metadata view of the record without the envelope.
    pub fn summary(&self) -> RecordSummary {
        RecordSummary {
            id: self.id.clone(),
            service: self.service.clone(),
            identifier: self.identifier.clone(),
            created_at: self.created_at,
        }
    }
}

/// Lightweight listing view of a record (no envelope).
///
/// Used by the `list` command so callers can display records
/// without touching any ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSummary {
    pub id: RecordId,
    pub service: String,
    pub identifier: String,
    pub created_at: DateTime<Utc>,
}

/// Validate a plaintext label (service or identifier).
pub(crate) fn validate_label(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CredVaultError::InvalidInput(format!(
            "{field} cannot be empty"
        )));
    }
    if value.chars().count() > 256 {
        return Err(CredVaultError::InvalidInput(format!(
            "{field} cannot exceed 256 characters"
        )));
    }
    Ok(())
}
