//! Encrypted credential vault for user-supplied API keys and translation
//! settings.
//!
//! At rest the vault is a single record `{salt, iv, data}` (base64), the
//! AES-256-GCM ciphertext of the whole secret map under a key derived from
//! the user's passphrase with PBKDF2-HMAC-SHA256. Every save re-encrypts the
//! entire map under a fresh salt and nonce and replaces the record whole, so
//! there is no partial update to corrupt. The decrypted map and the
//! passphrase live only in the in-memory session; reads never touch the
//! persisted record.

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use anyhow::Result;
use base64::{engine::general_purpose, Engine as _};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use zeroize::Zeroizing;

/// PBKDF2 iteration count for the passphrase-derived key.
pub const KDF_ITERATIONS: u32 = 150_000;

const KEY_SIZE: usize = 32;
const SALT_SIZE: usize = 16;
const NONCE_SIZE: usize = 12;

/// The single at-rest record. All fields are base64.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultRecord {
    pub salt: String,
    pub iv: String,
    pub data: String,
}

/// Storage for the at-rest record. Absence means "not yet configured".
pub trait SecretStore: Send + Sync {
    fn load(&self) -> Option<VaultRecord>;
    fn store(&self, record: &VaultRecord);
    fn clear(&self);
}

/// Record persisted as one JSON file under the config directory; writes are
/// whole-file replacements.
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_path() -> PathBuf {
        let dir = dirs::config_dir()
            .unwrap_or_default()
            .join("stream-chat-translator");
        let _ = std::fs::create_dir_all(&dir);
        dir.join("secure_settings.json")
    }
}

impl SecretStore for FileSecretStore {
    fn load(&self) -> Option<VaultRecord> {
        let data = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&data) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(error = %e, "vault record unparseable, clearing");
                let _ = std::fs::remove_file(&self.path);
                None
            }
        }
    }

    fn store(&self, record: &VaultRecord) {
        if let Ok(data) = serde_json::to_string(record) {
            let _ = std::fs::write(&self.path, data);
        }
    }

    fn clear(&self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// In-memory store, for embedders that manage persistence themselves and
/// for tests.
#[derive(Default)]
pub struct MemorySecretStore {
    record: Mutex<Option<VaultRecord>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for MemorySecretStore {
    fn load(&self) -> Option<VaultRecord> {
        self.record.lock().unwrap().clone()
    }

    fn store(&self, record: &VaultRecord) {
        *self.record.lock().unwrap() = Some(record.clone());
    }

    fn clear(&self) {
        *self.record.lock().unwrap() = None;
    }
}

struct VaultSession {
    passphrase: Zeroizing<String>,
    secrets: HashMap<String, String>,
}

pub struct Vault {
    store: Box<dyn SecretStore>,
    session: Mutex<Option<VaultSession>>,
}

impl Vault {
    pub fn new(store: Box<dyn SecretStore>) -> Self {
        Self {
            store,
            session: Mutex::new(None),
        }
    }

    /// Vault over the default on-disk record.
    pub fn open_default() -> Self {
        Self::new(Box::new(FileSecretStore::new(FileSecretStore::default_path())))
    }

    /// Whether an encrypted record exists at rest.
    pub fn has_record(&self) -> bool {
        self.store.load().is_some()
    }

    pub fn is_unlocked(&self) -> bool {
        self.session.lock().unwrap().is_some()
    }

    /// Unlock the vault for this session.
    ///
    /// With no record at rest this succeeds trivially with an empty secret
    /// map (first-use path). A wrong passphrase or a corrupt record fails
    /// closed: returns `false` and clears any partial session state.
    pub fn unlock(&self, passphrase: &str) -> bool {
        if passphrase.is_empty() {
            return false;
        }
        let mut session = self.session.lock().unwrap();
        match self.store.load() {
            None => {
                *session = Some(VaultSession {
                    passphrase: Zeroizing::new(passphrase.to_string()),
                    secrets: HashMap::new(),
                });
                true
            }
            Some(record) => match decrypt_record(&record, passphrase) {
                Ok(secrets) => {
                    *session = Some(VaultSession {
                        passphrase: Zeroizing::new(passphrase.to_string()),
                        secrets,
                    });
                    true
                }
                Err(e) => {
                    tracing::warn!(error = %e, "vault unlock failed");
                    *session = None;
                    false
                }
            },
        }
    }

    /// Merge `updates` into the secret map and rewrite the at-rest record.
    ///
    /// Empty values delete their key. The whole map is re-encrypted under
    /// the session passphrase with a fresh salt and nonce.
    pub fn save(&self, updates: &HashMap<String, String>) -> Result<()> {
        let mut guard = self.session.lock().unwrap();
        let session = guard
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("vault is locked"))?;

        for (key, value) in updates {
            if value.is_empty() {
                session.secrets.remove(key);
            } else {
                session.secrets.insert(key.clone(), value.clone());
            }
        }

        let record = encrypt_secrets(&session.secrets, &session.passphrase)?;
        self.store.store(&record);
        Ok(())
    }

    /// Read one secret from the session cache. Never touches the record.
    pub fn secret(&self, key: &str) -> Option<String> {
        self.session
            .lock()
            .unwrap()
            .as_ref()
            .and_then(|s| s.secrets.get(key).cloned())
    }

    /// Shallow copy of all decrypted secrets, empty when locked.
    pub fn secrets(&self) -> HashMap<String, String> {
        self.session
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.secrets.clone())
            .unwrap_or_default()
    }

    /// Drop the session state, keeping the at-rest record.
    pub fn lock(&self) {
        *self.session.lock().unwrap() = None;
    }

    /// Drop the session state and delete the at-rest record.
    pub fn reset(&self) {
        self.store.clear();
        *self.session.lock().unwrap() = None;
    }
}

fn derive_key(passphrase: &str, salt: &[u8]) -> Zeroizing<[u8; KEY_SIZE]> {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, KDF_ITERATIONS, key.as_mut());
    key
}

fn encrypt_secrets(secrets: &HashMap<String, String>, passphrase: &str) -> Result<VaultRecord> {
    let mut salt = [0u8; SALT_SIZE];
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut nonce_bytes);

    let key = derive_key(passphrase, &salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_ref()));
    let plaintext = serde_json::to_vec(secrets)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_slice())
        .map_err(|e| anyhow::anyhow!("encryption failed: {e}"))?;

    Ok(VaultRecord {
        salt: general_purpose::STANDARD.encode(salt),
        iv: general_purpose::STANDARD.encode(nonce_bytes),
        data: general_purpose::STANDARD.encode(ciphertext),
    })
}

fn decrypt_record(record: &VaultRecord, passphrase: &str) -> Result<HashMap<String, String>> {
    let salt = general_purpose::STANDARD.decode(&record.salt)?;
    let nonce = general_purpose::STANDARD.decode(&record.iv)?;
    let ciphertext = general_purpose::STANDARD.decode(&record.data)?;
    if salt.is_empty() || nonce.len() != NONCE_SIZE || ciphertext.is_empty() {
        anyhow::bail!("vault record is incomplete");
    }

    let key = derive_key(passphrase, &salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_ref()));
    let plaintext = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(&nonce), ciphertext.as_slice())
            .map_err(|e| anyhow::anyhow!("decryption failed: {e}"))?,
    );

    Ok(serde_json::from_slice(&plaintext)?)
}
