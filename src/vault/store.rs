//! The vault engine.
//!
//! `Vault` owns at most one derived key and one decrypted payload.  It
//! moves between three states:
//!
//! - **Uninitialized**: no container file.
//! - **Locked**: container exists, nothing decrypted in memory.
//! - **Unlocked**: key held, payload materialized.
//!
//! Every write re-seals and atomically rewrites the whole container.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::config::Settings;
use crate::crypto::{
    derive_key_with_params, generate_salt, open, password_verifier, seal, verify_password,
    Argon2Params, DerivedKey, DIGEST_LEN, SALT_LEN,
};
use crate::errors::{KeystashError, Result};
use crate::keyring::{default_escrow, KeyEscrow, NoEscrow};

use super::format::{self, validate_name, VaultContainer, VaultPlaintext};
use super::fs::{write_private_atomic, write_private_new};
use super::session::{SessionStore, UnlockSession, DEFAULT_SESSION_TTL_MINUTES};

/// File name of the encrypted container inside the vault directory.
pub const CONTAINER_FILE: &str = "keystash.vault";

/// File name of the session record inside the vault directory.
pub const SESSION_FILE: &str = ".session";

/// project -> set of key names.
pub type KeyListing = HashMap<String, HashSet<String>>;

/// Where the engine currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultState {
    Uninitialized,
    Locked,
    Unlocked,
}

/// Everything that only exists while unlocked.
struct UnlockedVault {
    key: DerivedKey,
    salt: [u8; SALT_LEN],
    verifier: [u8; DIGEST_LEN],
    kdf: Argon2Params,
    plaintext: VaultPlaintext,
}

/// The vault engine.  Construct one per process and pass it around.
pub struct Vault {
    container_path: PathBuf,
    sessions: SessionStore,
    escrow: Box<dyn KeyEscrow>,
    session_ttl: Duration,
    kdf_params: Argon2Params,
    unlocked: Option<UnlockedVault>,
    session_restorable: bool,
}

impl Vault {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Engine for the vault in `dir`.  Touches nothing on disk.
    pub fn new(dir: &Path) -> Self {
        Self {
            container_path: dir.join(CONTAINER_FILE),
            sessions: SessionStore::new(dir.join(SESSION_FILE)),
            escrow: default_escrow(),
            session_ttl: Duration::minutes(DEFAULT_SESSION_TTL_MINUTES),
            kdf_params: Argon2Params::default(),
            unlocked: None,
            session_restorable: false,
        }
    }

    /// Engine for the vault in `dir`, tuned by `settings`.
    pub fn from_settings(dir: &Path, settings: &Settings) -> Result<Self> {
        let ttl = Duration::try_minutes(settings.session_ttl_minutes).ok_or_else(|| {
            KeystashError::Config(format!(
                "session_ttl_minutes is out of range (got {})",
                settings.session_ttl_minutes
            ))
        })?;
        let escrow: Box<dyn KeyEscrow> = if settings.session_keyring {
            default_escrow()
        } else {
            Box::new(NoEscrow)
        };
        Ok(Self::new(dir)
            .with_session_ttl(ttl)
            .with_kdf_params(settings.argon2_params())
            .with_escrow(escrow))
    }

    /// How long a session lasts after an unlock.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Argon2id parameters for vaults created by `initialize`.
    ///
    /// Existing vaults always use the parameters recorded in their container.
    pub fn with_kdf_params(mut self, params: Argon2Params) -> Self {
        self.kdf_params = params;
        self
    }

    /// Where derived keys are parked for session restore.
    pub fn with_escrow(mut self, escrow: Box<dyn KeyEscrow>) -> Self {
        self.escrow = escrow;
        self
    }

    // ------------------------------------------------------------------
    // State machine
    // ------------------------------------------------------------------

    /// Returns `true` if a container file is present.
    pub fn exists(&self) -> bool {
        self.container_path.exists()
    }

    /// Current state, without attempting a session restore.
    pub fn state(&self) -> VaultState {
        if self.unlocked.is_some() {
            VaultState::Unlocked
        } else if self.exists() {
            VaultState::Locked
        } else {
            VaultState::Uninitialized
        }
    }

    /// Create a new, empty vault protected by `password` and unlock it.
    #[instrument(level = "info", skip(self, password), fields(vault = %self.container_path.display()))]
    pub fn initialize(&mut self, password: &[u8]) -> Result<()> {
        if self.exists() {
            return Err(KeystashError::VaultAlreadyExists(
                self.container_path.clone(),
            ));
        }

        let kdf = self.kdf_params;
        let salt = generate_salt();
        let key = derive_key_with_params(password, &salt, &kdf)?;
        let verifier = password_verifier(password, &salt);

        let vault = UnlockedVault {
            key,
            salt,
            verifier,
            kdf,
            plaintext: VaultPlaintext::default(),
        };
        // Another process may have created the vault since the check above.
        write_private_new(&self.container_path, &seal_container(&vault)?).map_err(|e| match e {
            KeystashError::Io(io) if io.kind() == std::io::ErrorKind::AlreadyExists => {
                KeystashError::VaultAlreadyExists(self.container_path.clone())
            }
            other => other,
        })?;

        self.session_restorable = self.start_session(&vault.key);
        self.unlocked = Some(vault);
        info!("vault initialized");
        Ok(())
    }

    /// Unlock an existing vault with `password`.
    ///
    /// A wrong password is rejected by the stored verifier before any key
    /// derivation or decryption.  If the verifier passes but the payload
    /// cannot be opened or decoded, the container is reported as corrupt.
    #[instrument(level = "info", skip(self, password), fields(vault = %self.container_path.display()))]
    pub fn unlock(&mut self, password: &[u8]) -> Result<()> {
        let container = self.read_container()?;
        let salt = container.salt_array()?;

        if !verify_password(password, &salt, &container.password_verifier) {
            warn!("rejected unlock: password verifier mismatch");
            return Err(KeystashError::InvalidPassword);
        }

        let kdf = container.kdf_params();
        let key = derive_key_with_params(password, &salt, &kdf)?;
        let plaintext = decrypt_payload(&container, &key).map_err(|e| {
            error!(error = %e, "verifier matched but payload could not be recovered");
            e
        })?;

        let mut verifier = [0u8; DIGEST_LEN];
        verifier.copy_from_slice(&container.password_verifier);

        let vault = UnlockedVault {
            key,
            salt,
            verifier,
            kdf,
            plaintext,
        };
        self.session_restorable = self.start_session(&vault.key);
        self.unlocked = Some(vault);
        info!("vault unlocked");
        Ok(())
    }

    /// Drop the key and payload and end the session.  Idempotent.
    #[instrument(level = "info", skip(self), fields(vault = %self.container_path.display()))]
    pub fn lock(&mut self) -> Result<()> {
        // Dropping the UnlockedVault zeroizes the key and secret values.
        self.unlocked = None;
        self.session_restorable = false;
        self.end_session()
    }

    /// Returns `true` if the vault is usable right now.
    ///
    /// When locked, tries to restore the unlocked state from a valid
    /// session plus an escrowed key.  Without an escrowed key a recent
    /// session cannot decrypt anything, so the vault stays locked.
    pub fn is_unlocked(&mut self) -> bool {
        if self.unlocked.is_some() {
            return true;
        }
        match self.try_restore() {
            Ok(restored) => restored,
            Err(e) => {
                warn!(error = %e, "session restore failed");
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Secret operations
    // ------------------------------------------------------------------

    /// Insert or overwrite `project/key`, then persist.
    ///
    /// If persisting fails the in-memory payload is rolled back.
    #[instrument(level = "debug", skip(self, value))]
    pub fn add_or_update(&mut self, project: &str, key: &str, value: &str) -> Result<()> {
        let vault = self.require_unlocked()?;
        validate_name("project", project)?;
        validate_name("key", key)?;

        let secrets = vault.plaintext.projects.entry(project.to_string()).or_default();
        let previous = secrets.insert(key.to_string(), value.to_string());

        if let Err(e) = persist_vault(&self.container_path, self.unlocked_ref()?) {
            let vault = self.require_unlocked()?;
            match previous {
                Some(old) => {
                    if let Some(secrets) = vault.plaintext.projects.get_mut(project) {
                        secrets.insert(key.to_string(), old);
                    }
                }
                None => {
                    let now_empty = vault.plaintext.projects.get_mut(project).is_some_and(|s| {
                        s.remove(key);
                        s.is_empty()
                    });
                    if now_empty {
                        vault.plaintext.projects.remove(project);
                    }
                }
            }
            return Err(e);
        }

        debug!("secret stored");
        Ok(())
    }

    /// Return the value of `project/key`.
    pub fn get(&mut self, project: &str, key: &str) -> Result<String> {
        let vault = self.require_unlocked()?;
        vault
            .plaintext
            .projects
            .get(project)
            .and_then(|secrets| secrets.get(key))
            .cloned()
            .ok_or_else(|| KeystashError::SecretNotFound {
                project: project.to_string(),
                key: key.to_string(),
            })
    }

    /// Snapshot of every project and its key names.  Unordered.
    pub fn list(&mut self) -> Result<KeyListing> {
        let vault = self.require_unlocked()?;
        Ok(vault
            .plaintext
            .projects
            .iter()
            .map(|(project, secrets)| (project.clone(), secrets.keys().cloned().collect()))
            .collect())
    }

    /// Pairs whose project or key name contains `keyword`, ignoring case.
    ///
    /// An empty keyword matches nothing.
    pub fn search(&mut self, keyword: &str) -> Result<KeyListing> {
        let vault = self.require_unlocked()?;
        if keyword.is_empty() {
            return Ok(KeyListing::new());
        }

        let needle = keyword.to_lowercase();
        let mut found = KeyListing::new();
        for (project, secrets) in &vault.plaintext.projects {
            let project_hit = project.to_lowercase().contains(&needle);
            let keys: HashSet<String> = secrets
                .keys()
                .filter(|key| project_hit || key.to_lowercase().contains(&needle))
                .cloned()
                .collect();
            if !keys.is_empty() {
                found.insert(project.clone(), keys);
            }
        }
        Ok(found)
    }

    /// Copy of all secrets in `project`.
    pub fn get_project(&mut self, project: &str) -> Result<HashMap<String, String>> {
        let vault = self.require_unlocked()?;
        vault
            .plaintext
            .projects
            .get(project)
            .cloned()
            .ok_or_else(|| KeystashError::ProjectNotFound(project.to_string()))
    }

    /// Erase every secret, persist the empty vault, then lock.
    #[instrument(level = "info", skip(self), fields(vault = %self.container_path.display()))]
    pub fn reset(&mut self) -> Result<()> {
        let vault = self.require_unlocked()?;
        let previous = std::mem::take(&mut vault.plaintext.projects);

        if let Err(e) = persist_vault(&self.container_path, self.unlocked_ref()?) {
            self.require_unlocked()?.plaintext.projects = previous;
            return Err(e);
        }

        // `previous` holds plain Strings; wipe them before they are freed.
        drop(VaultPlaintext {
            version: format::CURRENT_VERSION,
            projects: previous,
        });

        info!("vault reset, locking");
        self.lock()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Path to the container file.
    pub fn path(&self) -> &Path {
        &self.container_path
    }

    /// Whether the last unlock can be picked up by a later engine.
    ///
    /// False when no key could be escrowed, in which case every new
    /// process needs the password again despite the session record.
    pub fn session_restorable(&self) -> bool {
        self.session_restorable
    }

    /// The session store used by this engine.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn vault_id(&self) -> String {
        self.container_path.to_string_lossy().into_owned()
    }

    fn unlocked_ref(&self) -> Result<&UnlockedVault> {
        self.unlocked.as_ref().ok_or(KeystashError::VaultLocked)
    }

    fn require_unlocked(&mut self) -> Result<&mut UnlockedVault> {
        if !self.is_unlocked() {
            return Err(KeystashError::VaultLocked);
        }
        self.unlocked.as_mut().ok_or(KeystashError::VaultLocked)
    }

    fn read_container(&self) -> Result<VaultContainer> {
        if !self.exists() {
            return Err(KeystashError::VaultNotFound(self.container_path.clone()));
        }
        let bytes = fs::read(&self.container_path)?;
        format::unwrap(&bytes)
    }

    /// Record the unlock and return whether it can be restored later.
    ///
    /// Failures here only cost the restore convenience.
    fn start_session(&self, key: &DerivedKey) -> bool {
        let saved = match UnlockSession::start(key, self.session_ttl)
            .and_then(|session| self.sessions.save(&session))
        {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "could not persist session");
                false
            }
        };
        if !saved {
            return false;
        }
        match self.escrow.deposit(&self.vault_id(), key) {
            Ok(()) => self.escrow.retains_keys(),
            Err(e) => {
                warn!(error = %e, "could not escrow session key");
                false
            }
        }
    }

    fn end_session(&self) -> Result<()> {
        if let Err(e) = self.escrow.forget(&self.vault_id()) {
            warn!(error = %e, "could not remove escrowed key");
        }
        self.sessions.clear()
    }

    fn try_restore(&mut self) -> Result<bool> {
        if !self.exists() {
            return Ok(false);
        }

        let session = match self.sessions.load() {
            Ok(session) => session,
            Err(KeystashError::SessionNotFound) => {
                // Absent or expired: any escrowed key is stale too.
                if let Err(e) = self.escrow.forget(&self.vault_id()) {
                    debug!(error = %e, "could not remove stale escrowed key");
                }
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        let Some(key) = self.escrow.withdraw(&self.vault_id())? else {
            debug!("recent session found but no escrowed key; password required");
            return Ok(false);
        };

        if !session.matches_key(&key) {
            warn!("escrowed key does not match session fingerprint, discarding session");
            self.end_session()?;
            return Ok(false);
        }

        let container = self.read_container()?;
        let plaintext = match decrypt_payload(&container, &key) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                error!(error = %e, "escrowed key could not open the vault, discarding session");
                self.end_session()?;
                return Ok(false);
            }
        };

        let mut verifier = [0u8; DIGEST_LEN];
        verifier.copy_from_slice(&container.password_verifier);
        self.unlocked = Some(UnlockedVault {
            key,
            salt: container.salt_array()?,
            verifier,
            kdf: container.kdf_params(),
            plaintext,
        });
        self.session_restorable = true;
        info!(expires_at = %session.expires_at, "vault restored from session");
        Ok(true)
    }
}

/// Open and decode the sealed payload of `container` with `key`.
///
/// Any failure is reported as corruption: the caller already knows the
/// key is right.
fn decrypt_payload(container: &VaultContainer, key: &DerivedKey) -> Result<VaultPlaintext> {
    let opened = zeroize::Zeroizing::new(
        open(&container.ciphertext, key.as_bytes())
            .map_err(|_| KeystashError::Corruption("payload failed authentication".into()))?,
    );
    format::decode(&opened).map_err(|e| KeystashError::Corruption(e.to_string()))
}

/// Seal the payload into serialized container bytes.
fn seal_container(vault: &UnlockedVault) -> Result<Vec<u8>> {
    let encoded = format::encode(&vault.plaintext)?;
    let ciphertext = seal(&encoded, vault.key.as_bytes())?;
    format::wrap(&vault.salt, &vault.verifier, ciphertext, vault.kdf)
}

/// Seal the payload and atomically rewrite the container.
fn persist_vault(path: &Path, vault: &UnlockedVault) -> Result<()> {
    write_private_atomic(path, &seal_container(vault)?)
}
