//! Password-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! The master password is stretched into a 256-bit AES key with a
//! per-envelope random salt.  The iteration count is a vault-wide
//! constant: envelopes do not record it, so every envelope in a vault
//! must be produced and opened with the same `KdfParams`.

use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::TryRngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::errors::{CredVaultError, Result};

/// Length of the salt in bytes (128 bits).
pub const SALT_LEN: usize = 16;

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Iteration count used when nothing else is configured.
pub const DEFAULT_KDF_ITERATIONS: u32 = 10_000;

/// Lowest iteration count we accept from configuration.
pub const MIN_KDF_ITERATIONS: u32 = 1_000;

/// PBKDF2 parameters shared by every envelope of a vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Number of PBKDF2 rounds (default: 10 000).
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_KDF_ITERATIONS,
        }
    }
}

impl KdfParams {
    /// Build params, rejecting iteration counts below `MIN_KDF_ITERATIONS`.
    pub fn new(iterations: u32) -> Result<Self> {
        if iterations < MIN_KDF_ITERATIONS {
            return Err(CredVaultError::ConfigError(format!(
                "KDF iterations must be at least {MIN_KDF_ITERATIONS} (got {iterations})"
            )));
        }
        Ok(Self { iterations })
    }
}

/// Derive a 32-byte key from a credential and salt.
///
/// The same credential + salt + params always produce the same key.
/// The key buffer is wiped when the returned value is dropped.
pub fn derive_key(
    credential: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(credential, salt, params.iterations, &mut key[..]);
    key
}

/// Generate a cryptographically random 16-byte salt.
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| CredVaultError::EncryptionFailure(format!("random salt: {e}")))?;
    Ok(salt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_key_is_deterministic() {
        let params = KdfParams::default();
        let salt = [7u8; SALT_LEN];
        let k1 = derive_key(b"hunter2", &salt, &params);
        let k2 = derive_key(b"hunter2", &salt, &params);
        assert_eq!(*k1, *k2);
    }

    #[test]
    fn derive_key_depends_on_salt_and_credential() {
        let params = KdfParams::default();
        let base = derive_key(b"hunter2", &[1u8; SALT_LEN], &params);
        let other_salt = derive_key(b"hunter2", &[2u8; SALT_LEN], &params);
        let other_cred = derive_key(b"hunter3", &[1u8; SALT_LEN], &params);
        assert_ne!(*base, *other_salt);
        assert_ne!(*base, *other_cred);
    }

    #[test]
    fn derive_key_depends_on_iterations() {
        let salt = [9u8; SALT_LEN];
        let a = derive_key(b"pw", &salt, &KdfParams { iterations: 1_000 });
        let b = derive_key(b"pw", &salt, &KdfParams { iterations: 10_000 });
        assert_ne!(*a, *b);
    }

    #[test]
    fn params_reject_low_iteration_counts() {
        assert!(KdfParams::new(999).is_err());
        assert_eq!(KdfParams::new(1_000).unwrap().iterations, 1_000);
    }

    #[test]
    fn salts_are_fresh() {
        assert_ne!(generate_salt().unwrap(), generate_salt().unwrap());
    }
}
