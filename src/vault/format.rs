//! On-disk document format for vault files.
//!
//! Both `records.json` and `accounts.json` are stored as a single JSON
//! object of this shape:
//!
//! ```text
//! { "header": { "version": 1, ... }, "<items>": [ ... ] }
//! ```
//!
//! - **version**: format version (currently `1`); anything else is
//!   rejected on read.
//! - Writes go to a temp file in the same directory and are renamed
//!   over the target, so readers never see a half-written file.
//! - On Unix the file is restricted to owner-only read/write.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::record::SecretRecord;
use crate::crypto::KdfParams;
use crate::errors::{CredVaultError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Current document format version.
pub const CURRENT_VERSION: u8 = 1;

// ---------------------------------------------------------------------------
// Record document
// ---------------------------------------------------------------------------

/// Metadata stored at the top of `records.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsHeader {
    /// Format version.
    pub version: u8,

    /// PBKDF2 iteration count fixed at vault creation.  Envelopes do
    /// not record it, so every envelope in this file uses this value.
    pub kdf_iterations: u32,

    /// When this vault file was first created.
    pub created_at: DateTime<Utc>,
}

impl RecordsHeader {
    pub fn new(params: KdfParams) -> Self {
        Self {
            version: CURRENT_VERSION,
            kdf_iterations: params.iterations,
            created_at: Utc::now(),
        }
    }

    /// The KDF parameters recorded in this header.
    pub fn kdf_params(&self) -> Result<KdfParams> {
        KdfParams::new(self.kdf_iterations).map_err(|_| {
            CredVaultError::StorageError(format!(
                "vault header has invalid kdf_iterations {}",
                self.kdf_iterations
            ))
        })
    }
}

/// Full contents of `records.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsDocument {
    pub header: RecordsHeader,
    pub records: Vec<SecretRecord>,
}

// ---------------------------------------------------------------------------
// Account document
// ---------------------------------------------------------------------------

/// One registered account: an owner and its Argon2id PHC hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountEntry {
    pub owner: super::record::OwnerId,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Metadata stored at the top of `accounts.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountsHeader {
    pub version: u8,
}

/// Full contents of `accounts.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountsDocument {
    pub header: AccountsHeader,
    pub accounts: Vec<AccountEntry>,
}

impl Default for AccountsDocument {
    fn default() -> Self {
        Self {
            header: AccountsHeader {
                version: CURRENT_VERSION,
            },
            accounts: Vec::new(),
        }
    }
}

/// Documents that carry a format version.
pub trait Versioned {
    fn version(&self) -> u8;
}

impl Versioned for RecordsDocument {
    fn version(&self) -> u8 {
        self.header.version
    }
}

impl Versioned for AccountsDocument {
    fn version(&self) -> u8 {
        self.header.version
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Write a document to disk **atomically**.
///
/// 1. Serialize to pretty JSON.
/// 2. Write to a temp file in the same directory.
/// 3. Rename the temp file over the target path.
pub fn write_document<T: Serialize>(path: &Path, document: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(document)
        .map_err(|e| CredVaultError::SerializationError(format!("{}: {e}", path.display())))?;

    let parent = path.parent().unwrap_or(Path::new("."));
    if !parent.as_os_str().is_empty() && !parent.exists() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    fs::write(&tmp_path, &bytes)?;
    restrict_permissions(&tmp_path)?;
    fs::rename(&tmp_path, path)?;

    Ok(())
}

/// Read a document from disk, rejecting unknown format versions.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn read_document<T: DeserializeOwned + Versioned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let data = fs::read(path)?;
    let document: T = serde_json::from_slice(&data).map_err(|e| {
        CredVaultError::StorageError(format!("invalid vault file {}: {e}", path.display()))
    })?;

    let version = document.version();
    if version != CURRENT_VERSION {
        return Err(CredVaultError::StorageError(format!(
            "unsupported version {version} in {}, expected {CURRENT_VERSION}",
            path.display()
        )));
    }

    Ok(Some(document))
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_then_read_records_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");

        let doc = RecordsDocument {
            header: RecordsHeader::new(KdfParams::default()),
            records: Vec::new(),
        };
        write_document(&path, &doc).unwrap();

        let back: RecordsDocument = read_document(&path).unwrap().unwrap();
        assert_eq!(back.header.kdf_iterations, KdfParams::default().iterations);
        assert!(back.records.is_empty());
        assert!(!dir.path().join(".records.json.tmp").exists());
    }

    #[test]
    fn missing_file_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let doc: Option<AccountsDocument> =
            read_document(&dir.path().join("accounts.json")).unwrap();
        assert!(doc.is_none());
    }

    #[test]
    fn rejects_unknown_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("accounts.json");
        fs::write(&path, r#"{"header":{"version":9},"accounts":[]}"#).unwrap();

        let result: Result<Option<AccountsDocument>> = read_document(&path);
        assert!(matches!(result, Err(CredVaultError::StorageError(_))));
    }

    #[test]
    fn rejects_malformed_envelope_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");
        let json = r#"{
            "header": {"version": 1, "kdf_iterations": 10000, "created_at": "2024-01-01T00:00:00Z"},
            "records": [{
                "id": "r1", "owner": "alice", "service": "s", "identifier": "i",
                "envelope": "plaintext-password",
                "created_at": "2024-01-01T00:00:00Z"
            }]
        }"#;
        fs::write(&path, json).unwrap();

        let result: Result<Option<RecordsDocument>> = read_document(&path);
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn written_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("accounts.json");
        write_document(&path, &AccountsDocument::default()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
