//! The ciphertext envelope stored for every secret.
//!
//! Wire format (ASCII, exactly two separators):
//!
//! ```text
//! <base64 iv>:<base64 salt>:<base64 ciphertext>
//! ```
//!
//! - **iv**: 16 random bytes, fresh per `encrypt` call.
//! - **salt**: 16 random bytes, fresh per `encrypt` call, fed to PBKDF2.
//! - **ciphertext**: AES-256-CBC / PKCS#7 output under the derived key.
//!
//! The derived key is never stored.  Shape is validated before any
//! cryptographic work so malformed input never reaches the cipher.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use super::cipher::{self, IV_LEN};
use super::kdf::{self, KdfParams, SALT_LEN};
use crate::errors::{CredVaultError, Result};

/// Separator between the three envelope segments.
const SEPARATOR: char = ':';

/// A well-formed envelope string.
///
/// Construction always goes through `Envelope::parse` (or the codec),
/// so holding an `Envelope` means the shape has been checked.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Envelope(String);

/// Decoded envelope segments.
pub struct EnvelopeParts {
    pub iv: [u8; IV_LEN],
    pub salt: [u8; SALT_LEN],
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Validate `raw` as an envelope without decrypting it.
    pub fn parse(raw: &str) -> Result<Self> {
        decode_parts(raw)?;
        Ok(Self(raw.to_string()))
    }

    /// Split the envelope into its decoded iv, salt, and ciphertext.
    pub fn parts(&self) -> Result<EnvelopeParts> {
        decode_parts(&self.0)
    }

    /// The wire representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_parts(parts: &EnvelopeParts) -> Self {
        Self(format!(
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            BASE64.encode(parts.iv),
            BASE64.encode(parts.salt),
            BASE64.encode(&parts.ciphertext)
        ))
    }
}

impl TryFrom<String> for Envelope {
    type Error = CredVaultError;

    fn try_from(raw: String) -> Result<Self> {
        decode_parts(&raw)?;
        Ok(Self(raw))
    }
}

impl From<Envelope> for String {
    fn from(envelope: Envelope) -> Self {
        envelope.0
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Envelopes are opaque; keep them out of debug logs.
impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Envelope(..)")
    }
}

fn decode_parts(raw: &str) -> Result<EnvelopeParts> {
    let segments: Vec<&str> = raw.split(SEPARATOR).collect();
    if segments.len() != 3 {
        return Err(CredVaultError::MalformedEnvelope(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }

    let iv = decode_fixed::<IV_LEN>(segments[0], "iv")?;
    let salt = decode_fixed::<SALT_LEN>(segments[1], "salt")?;
    let ciphertext = BASE64
        .decode(segments[2])
        .map_err(|_| CredVaultError::MalformedEnvelope("ciphertext is not valid base64".into()))?;

    Ok(EnvelopeParts {
        iv,
        salt,
        ciphertext,
    })
}

fn decode_fixed<const N: usize>(segment: &str, name: &str) -> Result<[u8; N]> {
    let bytes = BASE64
        .decode(segment)
        .map_err(|_| CredVaultError::MalformedEnvelope(format!("{name} is not valid base64")))?;

    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        CredVaultError::MalformedEnvelope(format!("{name} must be {} bytes, got {len}", N))
    })
}

/// Stateless encrypt/decrypt of secrets under a master credential.
///
/// The only configuration is the KDF iteration count, which must match
/// between encryption and decryption.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeCodec {
    params: KdfParams,
}

impl EnvelopeCodec {
    pub fn new(params: KdfParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> KdfParams {
        self.params
    }

    /// Encrypt `plaintext` under `credential` into a fresh envelope.
    ///
    /// Every call draws a new IV and salt, so encrypting the same
    /// plaintext twice never yields the same envelope.
    pub fn encrypt(&self, plaintext: &str, credential: &str) -> Result<Envelope> {
        if plaintext.is_empty() {
            return Err(CredVaultError::InvalidInput("secret cannot be empty".into()));
        }
        if credential.is_empty() {
            return Err(CredVaultError::InvalidInput(
                "master password cannot be empty".into(),
            ));
        }

        let iv = cipher::generate_iv()?;
        let salt = kdf::generate_salt()?;
        let key = kdf::derive_key(credential.as_bytes(), &salt, &self.params);

        let ciphertext = cipher::encrypt(&key[..], &iv, plaintext.as_bytes())?;

        Ok(Envelope::from_parts(&EnvelopeParts {
            iv,
            salt,
            ciphertext,
        }))
    }

    /// Decrypt an envelope string under `credential`.
    ///
    /// Shape is checked first (`MalformedEnvelope`).  A wrong credential,
    /// corrupted ciphertext, or an empty result all collapse into
    /// `DecryptionFailure`.
    pub fn decrypt(&self, envelope: &str, credential: &str) -> Result<Zeroizing<String>> {
        let parts = decode_parts(envelope)?;
        self.open(&parts, credential)
    }

    /// Decrypt an already-validated envelope.
    pub fn decrypt_envelope(
        &self,
        envelope: &Envelope,
        credential: &str,
    ) -> Result<Zeroizing<String>> {
        let parts = envelope.parts()?;
        self.open(&parts, credential)
    }

    fn open(&self, parts: &EnvelopeParts, credential: &str) -> Result<Zeroizing<String>> {
        let key = kdf::derive_key(credential.as_bytes(), &parts.salt, &self.params);
        let plaintext = cipher::decrypt(&key[..], &parts.iv, &parts.ciphertext)?;

        let plaintext = String::from_utf8(plaintext).map_err(|e| {
            let mut bad_bytes = e.into_bytes();
            bad_bytes.zeroize();
            CredVaultError::DecryptionFailure
        })?;

        if plaintext.is_empty() {
            return Err(CredVaultError::DecryptionFailure);
        }

        Ok(Zeroizing::new(plaintext))
    }
}

/// Encrypt with the default KDF parameters.
pub fn encrypt(plaintext: &str, credential: &str) -> Result<Envelope> {
    EnvelopeCodec::default().encrypt(plaintext, credential)
}

/// Decrypt with the default KDF parameters.
pub fn decrypt(envelope: &str, credential: &str) -> Result<Zeroizing<String>> {
    EnvelopeCodec::default().decrypt(envelope, credential)
}
