//! Record storage.
//!
//! `RecordStore` is the storage seam the session controller talks to.
//! Stores only move envelopes around; they never inspect or rewrite
//! them.  `FileRecordStore` persists every mutation to `records.json`
//! inside the vault directory.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;

use super::format::{self, RecordsDocument, RecordsHeader};
use super::record::{validate_label, OwnerId, RecordId, SecretRecord};
use crate::crypto::{Envelope, KdfParams};
use crate::errors::{CredVaultError, Result};

/// Storage for secret records, keyed by owner identity.
pub trait RecordStore {
    /// Persist a new record and return its assigned id.
    fn create(
        &mut self,
        owner: &OwnerId,
        service: &str,
        identifier: &str,
        envelope: &Envelope,
    ) -> Result<RecordId>;

    /// All records belonging to `owner`, oldest first.
    fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<SecretRecord>>;

    /// Fetch a single record by id.
    fn get(&self, id: &RecordId) -> Result<SecretRecord>;

    /// Replace the envelope of an existing record.
    fn update(&mut self, id: &RecordId, envelope: &Envelope) -> Result<()>;

    /// Remove a record.
    fn delete(&mut self, id: &RecordId) -> Result<()>;
}

/// File name of the record document inside the vault directory.
pub const RECORDS_FILE: &str = "records.json";

/// `RecordStore` backed by a JSON file, rewritten atomically on change.
pub struct FileRecordStore {
    /// Path to `records.json`.
    path: PathBuf,

    /// In-memory copy of the document.
    document: RecordsDocument,
}

impl FileRecordStore {
    /// Open the store in `vault_dir`.
    ///
    /// If no record file exists yet, a new one is started with `params`
    /// as its KDF settings; it is written on the first mutation.  An
    /// existing file keeps the KDF settings recorded in its header.
    pub fn open(vault_dir: &Path, params: KdfParams) -> Result<Self> {
        let path = vault_dir.join(RECORDS_FILE);

        let document = match format::read_document::<RecordsDocument>(&path)? {
            Some(doc) => {
                doc.header.kdf_params()?;
                doc
            }
            None => RecordsDocument {
                header: RecordsHeader::new(params),
                records: Vec::new(),
            },
        };

        Ok(Self { path, document })
    }

    /// KDF parameters every envelope in this store must use.
    pub fn kdf_params(&self) -> Result<KdfParams> {
        self.document.header.kdf_params()
    }

    /// Returns the path to the record file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total number of records across all owners.
    pub fn record_count(&self) -> usize {
        self.document.records.len()
    }

    fn save(&self) -> Result<()> {
        format::write_document(&self.path, &self.document)
    }

    fn position(&self, id: &RecordId) -> Result<usize> {
        self.document
            .records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| CredVaultError::RecordNotFound(id.to_string()))
    }
}

impl RecordStore for FileRecordStore {
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
        self.document.records.push(SecretRecord {
            id: id.clone(),
            owner: owner.clone(),
            service: service.to_string(),
            identifier: identifier.to_string(),
            envelope: envelope.clone(),
            created_at: Utc::now(),
        });

        if let Err(e) = self.save() {
            self.document.records.pop();
            return Err(e);
        }

        debug!(record = %id, owner = %owner, "record created");
        Ok(id)
    }

    fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<SecretRecord>> {
        Ok(self
            .document
            .records
            .iter()
            .filter(|r| &r.owner == owner)
            .cloned()
            .collect())
    }

    fn get(&self, id: &RecordId) -> Result<SecretRecord> {
        let idx = self.position(id)?;
        Ok(self.document.records[idx].clone())
    }

    fn update(&mut self, id: &RecordId, envelope: &Envelope) -> Result<()> {
        let idx = self.position(id)?;
        let previous =
            std::mem::replace(&mut self.document.records[idx].envelope, envelope.clone());

        if let Err(e) = self.save() {
            self.document.records[idx].envelope = previous;
            return Err(e);
        }

        debug!(record = %id, "record envelope updated");
        Ok(())
    }

    fn delete(&mut self, id: &RecordId) -> Result<()> {
        let idx = self.position(id)?;
        let removed = self.document.records.remove(idx);

        if let Err(e) = self.save() {
            self.document.records.insert(idx, removed);
            return Err(e);
        }

        debug!(record = %id, "record deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::encrypt;
    use tempfile::TempDir;

    fn owner(name: &str) -> OwnerId {
        OwnerId::new(name).unwrap()
    }

    #[test]
    fn fresh_store_is_empty_and_not_yet_written() {
        let dir = TempDir::new().unwrap();
        let store = FileRecordStore::open(dir.path(), KdfParams::default()).unwrap();
        assert_eq!(store.record_count(), 0);
        assert!(!store.path().exists());
    }

    #[test]
    fn create_rejects_blank_labels() {
        let dir = TempDir::new().unwrap();
        let mut store = FileRecordStore::open(dir.path(), KdfParams::default()).unwrap();
        let env = encrypt("pw", "master").unwrap();

        let err = store.create(&owner("alice"), " ", "alice", &env).unwrap_err();
        assert!(matches!(err, CredVaultError::InvalidInput(_)));
        assert_eq!(store.record_count(), 0);
    }

    #[test]
    fn existing_file_keeps_its_kdf_iterations() {
        let dir = TempDir::new().unwrap();
        let env = encrypt("pw", "master").unwrap();

        let mut store = FileRecordStore::open(dir.path(), KdfParams::new(20_000).unwrap()).unwrap();
        store.create(&owner("alice"), "svc", "id", &env).unwrap();

        let reopened = FileRecordStore::open(dir.path(), KdfParams::default()).unwrap();
        assert_eq!(reopened.kdf_params().unwrap().iterations, 20_000);
    }
}
