//! Container codec: the on-disk envelope and the decrypted payload.
//!
//! A `.vault` file is a JSON document:
//!
//! ```text
//! { "version": 1, "salt": "<b64>", "hash": "<b64>", "data": "<b64>", "kdf": {...} }
//! ```
//!
//! - **salt**: Argon2id salt, generated once at `init` and copied into every resave.
//! - **hash**: the password verifier (see `crypto::keys`).
//! - **data**: AES-256-GCM sealed bytes of the encoded `VaultPlaintext`.
//! - **kdf**: Argon2id parameters used at creation.  Missing means defaults.
//!
//! The sealed payload is itself JSON:
//!
//! ```text
//! { "version": 1, "projects": { "<project>": { "<key>": "<value>" } } }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::{Argon2Params, DIGEST_LEN, SALT_LEN};
use crate::errors::{KeystashError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Current container and payload format version.
pub const CURRENT_VERSION: u32 = 1;

/// Longest accepted project or key name, in bytes.
const MAX_NAME_LEN: usize = 256;

/// project -> key -> secret value.
pub type Projects = HashMap<String, HashMap<String, String>>;

// ---------------------------------------------------------------------------
// VaultContainer
// ---------------------------------------------------------------------------

/// The encrypted envelope persisted to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultContainer {
    pub version: u32,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    #[serde(
        rename = "hash",
        serialize_with = "base64_encode",
        deserialize_with = "base64_decode"
    )]
    pub password_verifier: Vec<u8>,

    #[serde(
        rename = "data",
        serialize_with = "base64_encode",
        deserialize_with = "base64_decode"
    )]
    pub ciphertext: Vec<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kdf: Option<Argon2Params>,
}

impl VaultContainer {
    /// The salt as a fixed-size array.  Length is checked by `unwrap`.
    pub fn salt_array(&self) -> Result<[u8; SALT_LEN]> {
        self.salt.as_slice().try_into().map_err(|_| {
            KeystashError::Decode(format!(
                "salt must be {SALT_LEN} bytes, got {}",
                self.salt.len()
            ))
        })
    }

    /// Argon2id parameters this vault was created with.
    pub fn kdf_params(&self) -> Argon2Params {
        self.kdf.unwrap_or_default()
    }
}

/// Build the serialized on-disk envelope.
pub fn wrap(
    salt: &[u8; SALT_LEN],
    password_verifier: &[u8; DIGEST_LEN],
    ciphertext: Vec<u8>,
    kdf: Argon2Params,
) -> Result<Vec<u8>> {
    let container = VaultContainer {
        version: CURRENT_VERSION,
        salt: salt.to_vec(),
        password_verifier: password_verifier.to_vec(),
        ciphertext,
        kdf: Some(kdf),
    };
    serde_json::to_vec_pretty(&container)
        .map_err(|e| KeystashError::Encode(format!("container: {e}")))
}

/// Parse and validate a serialized envelope.
pub fn unwrap(bytes: &[u8]) -> Result<VaultContainer> {
    let container: VaultContainer = serde_json::from_slice(bytes)
        .map_err(|e| KeystashError::Decode(format!("container JSON: {e}")))?;

    if container.version != CURRENT_VERSION {
        return Err(KeystashError::Decode(format!(
            "unsupported container version {}, expected {CURRENT_VERSION}",
            container.version
        )));
    }
    container.salt_array()?;
    if container.password_verifier.len() != DIGEST_LEN {
        return Err(KeystashError::Decode(format!(
            "password hash must be {DIGEST_LEN} bytes, got {}",
            container.password_verifier.len()
        )));
    }

    Ok(container)
}

// ---------------------------------------------------------------------------
// VaultPlaintext
// ---------------------------------------------------------------------------

/// The decrypted vault contents.  Secret values are wiped on drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultPlaintext {
    pub version: u32,

    #[serde(deserialize_with = "unique_projects")]
    pub projects: Projects,
}

impl Default for VaultPlaintext {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            projects: HashMap::new(),
        }
    }
}

impl Drop for VaultPlaintext {
    fn drop(&mut self) {
        for secrets in self.projects.values_mut() {
            for value in secrets.values_mut() {
                value.zeroize();
            }
        }
    }
}

/// Serialize the payload that gets sealed.  The buffer is wiped on drop.
pub fn encode(plaintext: &VaultPlaintext) -> Result<Zeroizing<Vec<u8>>> {
    to_json("payload", plaintext).map(Zeroizing::new)
}

/// Compact JSON for anything written by the vault.
pub(crate) fn to_json<T: Serialize>(what: &str, value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| KeystashError::Encode(format!("{what}: {e}")))
}

/// Parse an opened payload, rejecting unknown versions and invalid names.
pub fn decode(bytes: &[u8]) -> Result<VaultPlaintext> {
    let plaintext: VaultPlaintext = serde_json::from_slice(bytes)
        .map_err(|e| KeystashError::Decode(format!("payload JSON: {e}")))?;

    if plaintext.version != CURRENT_VERSION {
        return Err(KeystashError::Decode(format!(
            "unsupported payload version {}, expected {CURRENT_VERSION}",
            plaintext.version
        )));
    }

    for (project, secrets) in &plaintext.projects {
        validate_name("project", project).map_err(|e| KeystashError::Decode(e.to_string()))?;
        for key in secrets.keys() {
            validate_name("key", key).map_err(|e| KeystashError::Decode(e.to_string()))?;
        }
    }

    Ok(plaintext)
}

/// Validate a project or key name.
///
/// Must be non-empty, at most 256 bytes, and free of `/` and control
/// characters.
pub fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(KeystashError::InvalidName(format!("{kind} name cannot be empty")));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(KeystashError::InvalidName(format!(
            "{kind} name cannot exceed {MAX_NAME_LEN} bytes"
        )));
    }
    if name.chars().any(|c| c == '/' || c.is_control()) {
        return Err(KeystashError::InvalidName(format!(
            "{kind} name '{}' contains '/' or control characters",
            name.escape_debug()
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Duplicate-rejecting map deserialization
// ---------------------------------------------------------------------------

struct UniqueMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for UniqueMapVisitor<V> {
    type Value = HashMap<String, V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map with unique string keys")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
        let mut map = HashMap::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((name, value)) = access.next_entry::<String, V>()? {
            if map.contains_key(&name) {
                return Err(de::Error::custom(format!("duplicate entry '{name}'")));
            }
            map.insert(name, value);
        }
        Ok(map)
    }
}

struct UniqueSecrets(HashMap<String, String>);

impl<'de> Deserialize<'de> for UniqueSecrets {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer
            .deserialize_map(UniqueMapVisitor(PhantomData))
            .map(UniqueSecrets)
    }
}

fn unique_projects<'de, D>(deserializer: D) -> std::result::Result<Projects, D::Error>
where
    D: Deserializer<'de>,
{
    let projects: HashMap<String, UniqueSecrets> =
        deserializer.deserialize_map(UniqueMapVisitor(PhantomData))?;
    Ok(projects.into_iter().map(|(name, s)| (name, s.0)).collect())
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = BASE64.encode(data);
    serializer.serialize_str(&encoded)
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
