//! On-disk envelope for the encrypted database.
//!
//! The file is a small JSON document carrying the KDF parameters, salt,
//! nonce and the ChaCha20-Poly1305 ciphertext, all base64 encoded. Writes go
//! through a temporary file in the same directory that is synced and then
//! renamed over the target, so a crash never leaves a half-written database.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

use crate::crypto::KdfParams;

pub const FORMAT_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
pub struct EncryptedStore {
    pub version: u8,
    pub kdf: KdfParams,
    pub argon2_salt: String,      // Base64 encoded
    pub encryption_nonce: String, // Base64 encoded
    pub encrypted_data: String,   // Base64 encoded
}

/// Reads the envelope at `path`.
///
/// Returns `Ok(None)` when the file does not exist or is empty, which callers
/// treat as a brand new database.
pub fn load_encrypted_store(path: &Path) -> io::Result<Option<EncryptedStore>> {
    let file_content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    if file_content.trim().is_empty() {
        return Ok(None);
    }
    let store: EncryptedStore = serde_json::from_str(&file_content)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Some(store))
}

/// Atomically replaces `path` with the serialized envelope.
///
/// The file is created with mode 0o600 on Unix systems.
pub fn save_encrypted_store(path: &Path, store: &EncryptedStore) -> io::Result<()> {
    let json = serde_json::to_string_pretty(store)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(dir)?;
    temp_file.write_all(json.as_bytes())?;
    // Flush and fsync() so the rename below always points at a complete file.
    temp_file.flush()?;
    temp_file.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = temp_file.as_file().metadata()?.permissions();
        perms.set_mode(0o600);
        temp_file.as_file().set_permissions(perms)?;
    }

    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

pub fn decode_salt(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD.decode(encoded)
}

pub fn decode_nonce(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD.decode(encoded)
}

pub fn decode_encrypted_data(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD.decode(encoded)
}

pub fn encode_salt(salt: &[u8]) -> String {
    general_purpose::STANDARD.encode(salt)
}

pub fn encode_nonce(nonce: &[u8]) -> String {
    general_purpose::STANDARD.encode(nonce)
}

pub fn encode_encrypted_data(data: &[u8]) -> String {
    general_purpose::STANDARD.encode(data)
}
