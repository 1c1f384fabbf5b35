use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in Keystash.
#[derive(Debug, Error)]
pub enum KeystashError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// AEAD open failure. Deliberately carries no detail so a wrong key
    /// and a corrupted ciphertext are indistinguishable.
    #[error("Authentication failed — ciphertext could not be opened")]
    Authentication,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Vault errors ---
    #[error("Vault not found at {0} — run `keystash init` first")]
    VaultNotFound(PathBuf),

    #[error("Vault already exists at {0}")]
    VaultAlreadyExists(PathBuf),

    #[error("Invalid master password")]
    InvalidPassword,

    #[error("Vault is corrupted or was tampered with: {0}")]
    Corruption(String),

    #[error("Vault is locked — run `keystash unlock` first")]
    VaultLocked,

    #[error("Secret '{project}/{key}' not found")]
    SecretNotFound { project: String, key: String },

    #[error("Project '{0}' not found")]
    ProjectNotFound(String),

    /// No usable session record: absent, expired, or unreadable.
    #[error("No active session")]
    SessionNotFound,

    #[error("Invalid name: {0}")]
    InvalidName(String),

    // --- Serialization errors ---
    #[error("Malformed vault data: {0}")]
    Decode(String),

    #[error("Failed to serialize vault data: {0}")]
    Encode(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    Config(String),

    // --- Keyring errors ---
    #[error("Keyring error: {0}")]
    Keyring(String),

    // --- CLI errors ---
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,
}

/// Convenience type alias for Keystash results.
pub type Result<T> = std::result::Result<T, KeystashError>;
