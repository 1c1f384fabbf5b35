//! Integration tests for the Keystash vault engine.

use std::fs;
use std::path::Path;

use keystash::crypto::Argon2Params;
use keystash::errors::KeystashError;
use keystash::keyring::NoEscrow;
use keystash::vault::{format, Vault, VaultState, CONTAINER_FILE, SESSION_FILE};
use tempfile::TempDir;

const PASSWORD: &[u8] = b"correct-horse-battery";

fn fast() -> Argon2Params {
    Argon2Params {
        memory_kib: 8_192,
        iterations: 1,
        parallelism: 1,
    }
}

/// Helper: an engine over `dir` with cheap KDF settings and no key escrow.
fn engine(dir: &Path) -> Vault {
    Vault::new(dir)
        .with_kdf_params(fast())
        .with_escrow(Box::new(NoEscrow))
}

/// Helper: a fresh, initialized and unlocked vault.
fn fresh() -> (TempDir, Vault) {
    let dir = TempDir::new().expect("create temp dir");
    let mut vault = engine(dir.path());
    vault.initialize(PASSWORD).expect("initialize vault");
    (dir, vault)
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn secret_survives_lock_and_unlock() {
    let (_dir, mut vault) = fresh();
    vault.add_or_update("myapp", "api_key", "sk_live_123").unwrap();
    vault.lock().unwrap();

    assert_eq!(vault.state(), VaultState::Locked);
    vault.unlock(PASSWORD).unwrap();
    assert_eq!(vault.get("myapp", "api_key").unwrap(), "sk_live_123");
}

#[test]
fn secret_is_readable_from_a_new_engine() {
    let (dir, mut vault) = fresh();
    vault.add_or_update("myapp", "db_url", "postgres://localhost/db").unwrap();
    drop(vault);

    let mut other = engine(dir.path());
    assert!(!other.is_unlocked());
    other.unlock(PASSWORD).unwrap();
    assert_eq!(other.get("myapp", "db_url").unwrap(), "postgres://localhost/db");
}

#[test]
fn initialize_twice_is_rejected() {
    let (dir, _vault) = fresh();
    let path = dir.path().join(CONTAINER_FILE);
    let before = fs::read(&path).unwrap();

    let mut again = engine(dir.path());
    assert!(matches!(
        again.initialize(b"another-password"),
        Err(KeystashError::VaultAlreadyExists(_))
    ));
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn unlock_without_container_reports_not_found() {
    let dir = TempDir::new().unwrap();
    let mut vault = engine(dir.path());
    assert_eq!(vault.state(), VaultState::Uninitialized);
    assert!(matches!(
        vault.unlock(PASSWORD),
        Err(KeystashError::VaultNotFound(_))
    ));
}

#[test]
fn lock_is_idempotent() {
    let (dir, mut vault) = fresh();
    vault.lock().unwrap();
    vault.lock().unwrap();
    assert!(!dir.path().join(SESSION_FILE).exists());
}

// ---------------------------------------------------------------------------
// Password and integrity failures
// ---------------------------------------------------------------------------

#[test]
fn wrong_password_leaves_container_untouched() {
    let (dir, mut vault) = fresh();
    vault.add_or_update("myapp", "api_key", "sk_live_123").unwrap();
    vault.lock().unwrap();

    let path = dir.path().join(CONTAINER_FILE);
    let before = fs::read(&path).unwrap();

    assert!(matches!(
        vault.unlock(b"wrong-password"),
        Err(KeystashError::InvalidPassword)
    ));
    assert_eq!(vault.state(), VaultState::Locked);
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn tampered_ciphertext_with_right_password_is_corruption() {
    let (dir, mut vault) = fresh();
    vault.add_or_update("myapp", "api_key", "sk_live_123").unwrap();
    vault.lock().unwrap();

    let path = dir.path().join(CONTAINER_FILE);
    let mut container = format::unwrap(&fs::read(&path).unwrap()).unwrap();
    let last = container.ciphertext.len() - 1;
    container.ciphertext[last] ^= 0x01;
    fs::write(&path, serde_json::to_vec(&container).unwrap()).unwrap();

    assert!(matches!(
        vault.unlock(PASSWORD),
        Err(KeystashError::Corruption(_))
    ));
    assert_eq!(vault.state(), VaultState::Locked);
}

#[test]
fn garbage_container_is_a_decode_error() {
    let (dir, mut vault) = fresh();
    vault.lock().unwrap();
    fs::write(dir.path().join(CONTAINER_FILE), b"not json").unwrap();

    assert!(matches!(
        vault.unlock(PASSWORD),
        Err(KeystashError::Decode(_))
    ));
}

#[test]
fn salt_and_verifier_are_stable_across_writes() {
    let (dir, mut vault) = fresh();
    let path = dir.path().join(CONTAINER_FILE);
    let first = format::unwrap(&fs::read(&path).unwrap()).unwrap();

    vault.add_or_update("a", "b", "c").unwrap();
    vault.add_or_update("a", "b", "d").unwrap();
    let second = format::unwrap(&fs::read(&path).unwrap()).unwrap();

    assert_eq!(first.salt, second.salt);
    assert_eq!(first.password_verifier, second.password_verifier);
    assert_ne!(first.ciphertext, second.ciphertext);
}

#[test]
fn container_records_kdf_params() {
    let (dir, _vault) = fresh();
    let raw = fs::read(dir.path().join(CONTAINER_FILE)).unwrap();
    let container = format::unwrap(&raw).unwrap();
    assert_eq!(container.kdf_params(), fast());

    // Plaintext secrets never reach the disk.
    let text = String::from_utf8(raw).unwrap();
    assert!(text.contains("\"hash\""));
    assert!(text.contains("\"data\""));
}

#[test]
fn secret_values_are_not_written_in_clear() {
    let (dir, mut vault) = fresh();
    vault.add_or_update("myapp", "api_key", "sk_live_123").unwrap();
    let raw = fs::read_to_string(dir.path().join(CONTAINER_FILE)).unwrap();
    assert!(!raw.contains("sk_live_123"));
    assert!(!raw.contains("api_key"));
}

// ---------------------------------------------------------------------------
// Secret operations
// ---------------------------------------------------------------------------

#[test]
fn add_overwrites_and_repeats_are_idempotent() {
    let (_dir, mut vault) = fresh();
    vault.add_or_update("p", "k", "v1").unwrap();
    vault.add_or_update("p", "k", "v1").unwrap();
    assert_eq!(vault.list().unwrap()["p"].len(), 1);

    vault.add_or_update("p", "k", "v2").unwrap();
    assert_eq!(vault.get("p", "k").unwrap(), "v2");
}

#[test]
fn missing_secret_and_project_are_reported() {
    let (_dir, mut vault) = fresh();
    vault.add_or_update("p", "k", "v").unwrap();

    assert!(matches!(
        vault.get("p", "nope"),
        Err(KeystashError::SecretNotFound { .. })
    ));
    assert!(matches!(
        vault.get("nope", "k"),
        Err(KeystashError::SecretNotFound { .. })
    ));
    assert!(matches!(
        vault.get_project("nope"),
        Err(KeystashError::ProjectNotFound(_))
    ));
}

#[test]
fn invalid_names_are_rejected() {
    let (_dir, mut vault) = fresh();
    assert!(matches!(
        vault.add_or_update("", "k", "v"),
        Err(KeystashError::InvalidName(_))
    ));
    assert!(matches!(
        vault.add_or_update("p", "a/b", "v"),
        Err(KeystashError::InvalidName(_))
    ));
    assert!(vault.list().unwrap().is_empty());
}

#[test]
fn list_groups_keys_by_project() {
    let (_dir, mut vault) = fresh();
    vault.add_or_update("web", "api_key", "1").unwrap();
    vault.add_or_update("web", "db_url", "2").unwrap();
    vault.add_or_update("worker", "queue", "3").unwrap();

    let listing = vault.list().unwrap();
    assert_eq!(listing.len(), 2);
    assert!(listing["web"].contains("api_key"));
    assert!(listing["web"].contains("db_url"));
    assert!(listing["worker"].contains("queue"));
}

#[test]
fn search_matches_project_or_key_ignoring_case() {
    let (_dir, mut vault) = fresh();
    vault.add_or_update("MyApp", "token", "1").unwrap();
    vault.add_or_update("MyApp", "db_url", "2").unwrap();
    vault.add_or_update("billing", "STRIPE_KEY", "3").unwrap();
    vault.add_or_update("billing", "region", "4").unwrap();

    // Project match brings every key in that project.
    let found = vault.search("myapp").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found["MyApp"].len(), 2);

    // Key match brings only the matching key.
    let found = vault.search("stripe").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found["billing"].len(), 1);
    assert!(found["billing"].contains("STRIPE_KEY"));

    assert!(vault.search("").unwrap().is_empty());
    assert!(vault.search("zzz").unwrap().is_empty());
}

#[test]
fn get_project_returns_every_pair() {
    let (_dir, mut vault) = fresh();
    vault.add_or_update("myapp", "api_key", "sk_live_123").unwrap();
    vault.add_or_update("myapp", "db_url", "postgres://x").unwrap();

    let secrets = vault.get_project("myapp").unwrap();
    assert_eq!(secrets.len(), 2);
    assert_eq!(secrets["api_key"], "sk_live_123");
    assert_eq!(secrets["db_url"], "postgres://x");
}

#[test]
fn locked_vault_refuses_secret_operations() {
    let (_dir, mut vault) = fresh();
    vault.lock().unwrap();

    assert!(matches!(vault.get("p", "k"), Err(KeystashError::VaultLocked)));
    assert!(matches!(vault.list(), Err(KeystashError::VaultLocked)));
    assert!(matches!(vault.search("p"), Err(KeystashError::VaultLocked)));
    assert!(matches!(
        vault.add_or_update("p", "k", "v"),
        Err(KeystashError::VaultLocked)
    ));
    assert!(matches!(vault.get_project("p"), Err(KeystashError::VaultLocked)));
    assert!(matches!(vault.reset(), Err(KeystashError::VaultLocked)));

    // The lock check comes before name validation.
    assert!(matches!(
        vault.add_or_update("", "k", "v"),
        Err(KeystashError::VaultLocked)
    ));
}

#[test]
fn reset_empties_and_locks() {
    let (_dir, mut vault) = fresh();
    vault.add_or_update("myapp", "api_key", "sk_live_123").unwrap();

    vault.reset().unwrap();
    assert_eq!(vault.state(), VaultState::Locked);

    vault.unlock(PASSWORD).unwrap();
    assert!(vault.list().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Files on disk
// ---------------------------------------------------------------------------

#[cfg(unix)]
#[test]
fn container_and_session_are_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let (dir, mut vault) = fresh();
    vault.add_or_update("p", "k", "v").unwrap();

    for name in [CONTAINER_FILE, SESSION_FILE] {
        let mode = fs::metadata(dir.path().join(name))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600, "{name} has mode {:o}", mode & 0o777);
    }
}

#[test]
fn initialize_creates_missing_directory() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a").join("b");
    let mut vault = engine(&nested);
    vault.initialize(PASSWORD).unwrap();
    assert!(nested.join(CONTAINER_FILE).exists());
}
