use anyhow::{Result, anyhow};
use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::aead::Aead;
use chacha20poly1305::{ChaCha20Poly1305, KeyInit, Nonce};
use rand::{TryRngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

pub const KEY_LEN: usize = 32;
pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;

/// Upper bounds for costs read back from a database file: 1 GiB of memory,
/// 64 passes, 64 lanes.
pub const MAX_M_COST: u32 = 1024 * 1024;
pub const MAX_T_COST: u32 = 64;
pub const MAX_P_COST: u32 = 64;

/// Argon2id cost parameters, recorded in every database envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost: Params::DEFAULT_M_COST,
            t_cost: Params::DEFAULT_T_COST,
            p_cost: Params::DEFAULT_P_COST,
        }
    }
}

impl KdfParams {
    /// The cheapest parameters Argon2 accepts. Only suitable for tests.
    pub fn minimal() -> Self {
        Self {
            m_cost: Params::MIN_M_COST,
            t_cost: Params::MIN_T_COST,
            p_cost: Params::MIN_P_COST,
        }
    }

    /// Rejects costs that would exhaust memory or never finish.
    pub fn check_limits(&self) -> Result<()> {
        if self.m_cost > MAX_M_COST {
            return Err(anyhow!("memory cost {} KiB exceeds {}", self.m_cost, MAX_M_COST));
        }
        if self.t_cost > MAX_T_COST {
            return Err(anyhow!("time cost {} exceeds {}", self.t_cost, MAX_T_COST));
        }
        if self.p_cost > MAX_P_COST {
            return Err(anyhow!("parallelism {} exceeds {}", self.p_cost, MAX_P_COST));
        }
        Ok(())
    }
}

pub fn derive_key(
    password: &str,
    salt: &[u8],
    params: KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    let params = Params::new(params.m_cost, params.t_cost, params.p_cost, Some(KEY_LEN))
        .map_err(|e| anyhow!("Invalid Argon2id parameters: {}", e))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut key[..])
        .map_err(|e| anyhow!("Failed to derive encryption key using Argon2id: {}", e))?;
    Ok(key)
}

pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.try_fill_bytes(&mut salt)?;
    Ok(salt)
}

pub fn generate_nonce() -> Result<[u8; NONCE_LEN]> {
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.try_fill_bytes(&mut nonce_bytes)?;
    Ok(nonce_bytes)
}

pub fn encrypt(data: &[u8], key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN]) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(key.into());
    let nonce = Nonce::from_slice(nonce);
    cipher
        .encrypt(nonce, data)
        .map_err(|_| anyhow!("Encryption failed"))
}

pub fn decrypt(
    encrypted_data: &[u8],
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<Zeroizing<Vec<u8>>> {
    let cipher = ChaCha20Poly1305::new(key.into());
    let nonce = Nonce::from_slice(nonce);
    cipher
        .decrypt(nonce, encrypted_data)
        .map(Zeroizing::new)
        .map_err(|_| anyhow!("Decryption failed - invalid password"))
}
