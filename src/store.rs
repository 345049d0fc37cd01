//! The credential store: an encrypted single-table database.
//!
//! The whole database is decrypted into memory when the store is opened and
//! re-encrypted under a fresh nonce on every write. Opening an existing file
//! authenticates the master password immediately, so a wrong password is
//! reported as [`StoreError::Authentication`] before any other operation.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::credentials::{PasswordTable, Record, RecordSummary};
use crate::crypto::{self, KEY_LEN, KdfParams, NONCE_LEN, SALT_LEN};
use crate::error::{Result, StoreError};
use crate::logging::timed;
use crate::storage::{self, EncryptedStore, FORMAT_VERSION};

/// Decrypted payload of the database file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Database {
    #[serde(default)]
    passwords: Option<PasswordTable>,
}

pub struct CredentialStore {
    path: PathBuf,
    key: Zeroizing<[u8; KEY_LEN]>,
    salt: [u8; SALT_LEN],
    kdf: KdfParams,
    db: Database,
}

impl CredentialStore {
    /// Opens the database at `path`, creating it when it does not exist.
    pub fn open(path: impl AsRef<Path>, password: &str) -> Result<Self> {
        Self::open_with_params(path, password, KdfParams::default())
    }

    /// Like [`CredentialStore::open`], with explicit key derivation costs for
    /// a newly created file. Existing files keep the costs they were created
    /// with.
    pub fn open_with_params(
        path: impl AsRef<Path>,
        password: &str,
        kdf: KdfParams,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let envelope = storage::load_encrypted_store(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::InvalidData {
                StoreError::Corrupt {
                    path: path.clone(),
                    reason: e.to_string(),
                }
            } else {
                StoreError::Open {
                    path: path.clone(),
                    source: e,
                }
            }
        })?;

        match envelope {
            Some(envelope) => Self::unlock(path, password, envelope),
            None => Self::create(path, password, kdf),
        }
    }

    fn create(path: PathBuf, password: &str, kdf: KdfParams) -> Result<Self> {
        log::info!("Creating new database at {}", path.display());
        let salt = crypto::generate_salt().map_err(|e| StoreError::Crypto(e.to_string()))?;
        let key = timed("key derivation", || crypto::derive_key(password, &salt, kdf))
            .map_err(|e| StoreError::Crypto(e.to_string()))?;

        let store = Self {
            path,
            key,
            salt,
            kdf,
            db: Database::default(),
        };
        store.persist().map_err(|e| match e {
            StoreError::Write { path, source } => StoreError::Open { path, source },
            other => other,
        })?;
        Ok(store)
    }

    fn unlock(path: PathBuf, password: &str, envelope: EncryptedStore) -> Result<Self> {
        if envelope.version != FORMAT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                path,
                version: envelope.version,
            });
        }

        let corrupt = |reason: String| StoreError::Corrupt {
            path: path.clone(),
            reason,
        };
        let salt: [u8; SALT_LEN] = storage::decode_salt(&envelope.argon2_salt)
            .map_err(|e| corrupt(format!("bad salt: {}", e)))?
            .try_into()
            .map_err(|_| corrupt("bad salt length".to_string()))?;
        let nonce: [u8; NONCE_LEN] = storage::decode_nonce(&envelope.encryption_nonce)
            .map_err(|e| corrupt(format!("bad nonce: {}", e)))?
            .try_into()
            .map_err(|_| corrupt("bad nonce length".to_string()))?;
        let ciphertext = storage::decode_encrypted_data(&envelope.encrypted_data)
            .map_err(|e| corrupt(format!("bad payload: {}", e)))?;

        envelope
            .kdf
            .check_limits()
            .map_err(|e| corrupt(format!("bad key derivation parameters: {}", e)))?;

        let key = timed("key derivation", || {
            crypto::derive_key(password, &salt, envelope.kdf)
        })
        .map_err(|e| StoreError::Crypto(e.to_string()))?;

        let plaintext = crypto::decrypt(&ciphertext, &key, &nonce).map_err(|_| {
            log::info!("Authentication failed for {}", path.display());
            StoreError::Authentication { path: path.clone() }
        })?;

        let db: Database = serde_json::from_slice(&plaintext)
            .map_err(|e| corrupt(format!("bad payload: {}", e)))?;
        if let Some(table) = &db.passwords {
            table.validate().map_err(corrupt)?;
        }

        log::info!("Unlocked database at {}", path.display());
        Ok(Self {
            path,
            key,
            salt,
            kdf: envelope.kdf,
            db,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True once the passwords table has been created by some session.
    pub fn records_table_exists(&self) -> bool {
        self.db.passwords.is_some()
    }

    /// Creates the passwords table if it is missing. Safe to call on every
    /// startup.
    pub fn ensure_schema(&mut self) -> Result<()> {
        if self.db.passwords.is_some() {
            return Ok(());
        }
        self.db.passwords = Some(PasswordTable::new());
        if let Err(e) = self.persist() {
            self.db.passwords = None;
            return Err(e);
        }
        log::info!("Created passwords table");
        Ok(())
    }

    /// Stores a new record and returns its id once it is on disk.
    pub fn insert(&mut self, site: &str, pass: &str) -> Result<i64> {
        let table = self.db.passwords.as_mut().ok_or(StoreError::MissingTable)?;
        let previous_seq = table.seq();
        let id = table.insert(site, pass);

        if let Err(e) = self.persist() {
            if let Some(table) = self.db.passwords.as_mut() {
                table.rollback(id, previous_seq);
            }
            log::error!("Failed to save record {}: {}", id, e);
            return Err(e);
        }
        log::info!("Saved record {}", id);
        Ok(id)
    }

    /// All records as (id, site) in insertion order. Never includes secrets.
    pub fn list_all(&self) -> Vec<RecordSummary> {
        self.db
            .passwords
            .as_ref()
            .map(PasswordTable::list)
            .unwrap_or_default()
    }

    pub fn get_by_id(&self, id: i64) -> Option<Record> {
        self.db.passwords.as_ref()?.get(id).cloned()
    }

    fn persist(&self) -> Result<()> {
        let payload = Zeroizing::new(
            serde_json::to_vec(&self.db).map_err(|e| StoreError::Crypto(e.to_string()))?,
        );
        let nonce = crypto::generate_nonce().map_err(|e| StoreError::Crypto(e.to_string()))?;
        let ciphertext = crypto::encrypt(&payload, &self.key, &nonce)
            .map_err(|e| StoreError::Crypto(e.to_string()))?;

        let envelope = EncryptedStore {
            version: FORMAT_VERSION,
            kdf: self.kdf,
            argon2_salt: storage::encode_salt(&self.salt),
            encryption_nonce: storage::encode_nonce(&nonce),
            encrypted_data: storage::encode_encrypted_data(&ciphertext),
        };
        storage::save_encrypted_store(&self.path, &envelope).map_err(|source| {
            StoreError::Write {
                path: self.path.clone(),
                source,
            }
        })
    }
}
