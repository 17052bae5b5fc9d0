use thiserror::Error;

/// All errors that can occur in CredVault.
///
/// Payloads never carry plaintext secrets, master credentials, or raw
/// envelope text, so every variant is safe to print.
#[derive(Debug, Error)]
pub enum CredVaultError {
    // --- Envelope codec errors ---
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Decryption failed — wrong master password or corrupted data")]
    DecryptionFailure,

    #[error("Encryption failed: {0}")]
    EncryptionFailure(String),

    // --- Authentication errors ---
    #[error("Invalid master password")]
    InvalidCredential,

    #[error("An account for '{0}' already exists")]
    AccountAlreadyExists(String),

    #[error("Too many failed attempts ({0}) — giving up")]
    TooManyAttempts(u32),

    // --- Session errors ---
    #[error("Cannot {operation} while the session is {state}")]
    InvalidTransition {
        operation: &'static str,
        state: &'static str,
    },

    #[error("Session expired — reveal the record again to continue")]
    SessionExpired,

    // --- Storage errors ---
    #[error("Record '{0}' not found")]
    RecordNotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    // --- Input / config errors ---
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,
}

/// Convenience type alias for CredVault results.
pub type Result<T> = std::result::Result<T, CredVaultError>;
