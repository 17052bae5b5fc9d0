//! Authentication — verifying the master password for an owner.
//!
//! The session controller only sees the `Authenticator` trait.  Any
//! provider-specific failure is mapped to `InvalidCredential` (or a
//! storage error) inside the implementation, never by the caller.

pub mod accounts;

pub use accounts::{AccountStore, ACCOUNTS_FILE};

use crate::errors::Result;
use crate::vault::OwnerId;

/// Verifies a candidate master password against an owner's account.
pub trait Authenticator {
    /// Returns `Ok(())` if `candidate` is the owner's master password,
    /// `Err(CredVaultError::InvalidCredential)` otherwise.
    ///
    /// Implementations must not distinguish an unknown owner from a
    /// wrong password, in the result or in timing.
    fn verify(&self, owner: &OwnerId, candidate: &str) -> Result<()>;
}

impl<A: Authenticator + ?Sized> Authenticator for &A {
    fn verify(&self, owner: &OwnerId, candidate: &str) -> Result<()> {
        (**self).verify(owner, candidate)
    }
}
