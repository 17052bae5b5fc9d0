//! AES-256-CBC with PKCS#7 padding.
//!
//! The IV is supplied by the caller so the envelope layer can store it
//! next to the salt.  CBC gives no integrity guarantee on its own: a
//! padding failure on decrypt is the only signal of a wrong key, and it
//! is reported as `DecryptionFailure` without further detail.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::TryRngCore;

use crate::errors::{CredVaultError, Result};

/// Size of the AES block and of the CBC IV in bytes.
pub const IV_LEN: usize = 16;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Encrypt `plaintext` with a 32-byte `key` and 16-byte `iv`.
pub fn encrypt(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256CbcEnc::new_from_slices(key, iv)
        .map_err(|e| CredVaultError::EncryptionFailure(format!("invalid key or IV length: {e}")))?;

    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// Decrypt data that was produced by `encrypt` and strip the padding.
pub fn decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    // Empty or partial blocks can never be valid CBC output.
    if ciphertext.is_empty() || ciphertext.len() % IV_LEN != 0 {
        return Err(CredVaultError::DecryptionFailure);
    }

    let cipher =
        Aes256CbcDec::new_from_slices(key, iv).map_err(|_| CredVaultError::DecryptionFailure)?;

    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CredVaultError::DecryptionFailure)
}

/// Generate a cryptographically random 16-byte IV.
pub fn generate_iv() -> Result<[u8; IV_LEN]> {
    let mut iv = [0u8; IV_LEN];
    OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|e| CredVaultError::EncryptionFailure(format!("random IV: {e}")))?;
    Ok(iv)
}
