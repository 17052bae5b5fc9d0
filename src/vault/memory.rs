//! In-memory record store.
//!
//! Useful for testing and for embedding the session controller without
//! a vault directory.  All data is lost on drop.

use chrono::Utc;

use super::record::{validate_label, OwnerId, RecordId, SecretRecord};
use super::store::RecordStore;
use crate::crypto::Envelope;
use crate::errors::{CredVaultError, Result};

/// `RecordStore` that keeps records in a `Vec`.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Vec<SecretRecord>,
}

impl MemoryRecordStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records across all owners.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn find_mut(&mut self, id: &RecordId) -> Result<&mut SecretRecord> {
        self.records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| CredVaultError::RecordNotFound(id.to_string()))
    }
}

impl RecordStore for MemoryRecordStore {
    fn create(
        &mut self,
        owner: &OwnerId,
        service: &str,
        identifier: &str,
        envelope: &Envelope,
    ) -> Result<RecordId> {
        validate_label("service", service)?;
        validate_label("identifier", identifier)?;

        let id = RecordId::generate();
        self.records.push(SecretRecord {
            id: id.clone(),
            owner: owner.clone(),
            service: service.to_string(),
            identifier: identifier.to_string(),
            envelope: envelope.clone(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<SecretRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| &r.owner == owner)
            .cloned()
            .collect())
    }

    fn get(&self, id: &RecordId) -> Result<SecretRecord> {
        self.records
            .iter()
            .find(|r| &r.id == id)
            .cloned()
            .ok_or_else(|| CredVaultError::RecordNotFound(id.to_string()))
    }

    fn update(&mut self, id: &RecordId, envelope: &Envelope) -> Result<()> {
        self.find_mut(id)?.envelope = envelope.clone();
        Ok(())
    }

    fn delete(&mut self, id: &RecordId) -> Result<()> {
        let before = self.records.len();
        self.records.retain(|r| &r.id != id);
        if self.records.len() == before {
            return Err(CredVaultError::RecordNotFound(id.to_string()));
        }
        Ok(())
    }
}
