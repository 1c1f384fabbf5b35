//! Key escrow for session restore.
//!
//! A session record alone only proves that an unlock happened recently; it
//! cannot decrypt anything.  To let a later invocation pick up an unlocked
//! vault without the password, the derived key has to be parked somewhere
//! safer than a file.  `KeyEscrow` is that seam:
//!
//! - `NoEscrow` keeps nothing, so every new process must `unlock` again.
//! - `OsKeyring` (feature `keyring-store`) parks the key in the operating
//!   system's credential store:
//!   - macOS: Keychain
//!   - Windows: Credential Manager
//!   - Linux: Secret Service (GNOME Keyring / KDE Wallet)

use crate::crypto::DerivedKey;
use crate::errors::Result;

/// Somewhere a derived key can be parked between invocations.
pub trait KeyEscrow {
    /// Park `key` for the vault identified by `vault_id`.
    fn deposit(&self, vault_id: &str, key: &DerivedKey) -> Result<()>;

    /// Take back the parked key, if any.
    fn withdraw(&self, vault_id: &str) -> Result<Option<DerivedKey>>;

    /// Drop the parked key.  Missing is fine.
    fn forget(&self, vault_id: &str) -> Result<()>;

    /// Whether a deposited key can later be withdrawn.
    fn retains_keys(&self) -> bool {
        true
    }
}

/// Escrow that stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEscrow;

impl KeyEscrow for NoEscrow {
    fn deposit(&self, _vault_id: &str, _key: &DerivedKey) -> Result<()> {
        Ok(())
    }

    fn withdraw(&self, _vault_id: &str) -> Result<Option<DerivedKey>> {
        Ok(None)
    }

    fn forget(&self, _vault_id: &str) -> Result<()> {
        Ok(())
    }

    fn retains_keys(&self) -> bool {
        false
    }
}

/// The escrow this build should use by default.
pub fn default_escrow() -> Box<dyn KeyEscrow> {
    #[cfg(feature = "keyring-store")]
    {
        Box::new(os::OsKeyring)
    }

    #[cfg(not(feature = "keyring-store"))]
    {
        Box::new(NoEscrow)
    }
}

#[cfg(feature = "keyring-store")]
pub use os::OsKeyring;

#[cfg(feature = "keyring-store")]
mod os {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use zeroize::Zeroizing;

    use super::KeyEscrow;
    use crate::crypto::DerivedKey;
    use crate::errors::{KeystashError, Result};

    /// Service name used in the OS keyring.
    const SERVICE_NAME: &str = "keystash";

    /// Build a keyring entry key from a vault path.
    fn entry_key(vault_id: &str) -> String {
        format!("session-key:{vault_id}")
    }

    fn entry(vault_id: &str) -> Result<::keyring::Entry> {
        ::keyring::Entry::new(SERVICE_NAME, &entry_key(vault_id))
            .map_err(|e| KeystashError::Keyring(format!("failed to create keyring entry: {e}")))
    }

    /// Escrow backed by the platform credential store.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct OsKeyring;

    impl KeyEscrow for OsKeyring {
        fn deposit(&self, vault_id: &str, key: &DerivedKey) -> Result<()> {
            let encoded = Zeroizing::new(BASE64.encode(key.as_bytes()));
            entry(vault_id)?.set_password(&encoded).map_err(|e| {
                KeystashError::Keyring(format!("failed to store key in keyring: {e}"))
            })
        }

        fn withdraw(&self, vault_id: &str) -> Result<Option<DerivedKey>> {
            match entry(vault_id)?.get_password() {
                Ok(encoded) => {
                    let encoded = Zeroizing::new(encoded);
                    let raw = Zeroizing::new(BASE64.decode(encoded.as_bytes()).map_err(|e| {
                        KeystashError::Keyring(format!("stored key is not valid base64: {e}"))
                    })?);
                    DerivedKey::from_slice(&raw).map(Some)
                }
                Err(::keyring::Error::NoEntry) => Ok(None),
                Err(e) => Err(KeystashError::Keyring(format!(
                    "failed to read from keyring: {e}"
                ))),
            }
        }

        fn forget(&self, vault_id: &str) -> Result<()> {
            match entry(vault_id)?.delete_credential() {
                Ok(()) | Err(::keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(KeystashError::Keyring(format!(
                    "failed to delete from keyring: {e}"
                ))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_escrow_never_returns_a_key() {
        let escrow = NoEscrow;
        escrow
            .deposit("/tmp/v.vault", &DerivedKey::new([1u8; 32]))
            .unwrap();
        assert!(escrow.withdraw("/tmp/v.vault").unwrap().is_none());
        assert!(escrow.forget("/tmp/v.vault").is_ok());
        assert!(!escrow.retains_keys());
    }
}
