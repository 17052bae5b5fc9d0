//! Cryptographic primitives for CredVault.
//!
//! This module provides:
//! - PBKDF2-HMAC-SHA256 password-based key derivation (`kdf`)
//! - AES-256-CBC encryption with PKCS#7 padding (`cipher`)
//! - The `iv:salt:ciphertext` envelope codec built on both (`envelope`)

pub mod cipher;
pub mod envelope;
pub mod kdf;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, Envelope, ...};
pub use envelope::{decrypt, encrypt, Envelope, EnvelopeCodec};
pub use kdf::{KdfParams, DEFAULT_KDF_ITERATIONS, MIN_KDF_ITERATIONS};
