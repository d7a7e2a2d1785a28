//! Symmetric encryption for saved-connection passwords (§4.9).
//!
//! The key lives in a secret file; if absent, a fresh key is generated and
//! persisted with restrictive permissions. Encryption is AES-256-GCM,
//! nonce || ciphertext, base64-encoded.

use std::path::Path;

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;

use crate::error::{Result, ServerError};

#[derive(Clone)]
pub struct EncryptionKey([u8; 32]);

impl EncryptionKey {
    /// Load the key from `path`, generating and persisting a fresh one if it
    /// does not exist yet.
    pub fn load_or_generate(path: &Path) -> Result<Self> {
        if let Ok(bytes) = std::fs::read(path) {
            if bytes.len() == 32 {
                let mut key = [0u8; 32];
                key.copy_from_slice(&bytes);
                return Ok(Self(key));
            }
            tracing::warn!("secret file at {:?} has unexpected length, regenerating", path);
        }

        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, key)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, perms)?;
        }

        tracing::info!("generated new encryption key at {:?}", path);
        Ok(Self(key))
    }

    /// Encrypt `plaintext`, returning `base64(nonce || ciphertext || tag)`.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let cipher = Aes256Gcm::new_from_slice(&self.0)
            .map_err(|e| ServerError::Encryption(e.to_string()))?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| ServerError::Encryption(e.to_string()))?;

        let mut combined = nonce.to_vec();
        combined.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(combined))
    }

    /// Decrypt a value produced by [`encrypt`]. Decryption failure is
    /// reported as `None` by the caller (§4.9: fatal for the field only).
    pub fn decrypt(&self, stored: &str) -> Option<String> {
        let combined = STANDARD.decode(stored).ok()?;
        if combined.len() < 12 {
            return None;
        }
        let (nonce_bytes, ciphertext) = combined.split_at(12);
        let nonce = Nonce::from_slice(nonce_bytes);
        let cipher = Aes256Gcm::new_from_slice(&self.0).ok()?;
        let plaintext = cipher.decrypt(nonce, ciphertext).ok()?;
        String::from_utf8(plaintext).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let mut raw = [0u8; 32];
        OsRng.fill_bytes(&mut raw);
        let key = EncryptionKey(raw);
        let enc = key.encrypt("hunter2").unwrap();
        assert_ne!(enc, "hunter2");
        assert_eq!(key.decrypt(&enc).unwrap(), "hunter2");
    }

    #[test]
    fn decrypt_of_garbage_is_none_not_panic() {
        let mut raw = [0u8; 32];
        OsRng.fill_bytes(&mut raw);
        let key = EncryptionKey(raw);
        assert!(key.decrypt("not base64 ciphertext!!").is_none());
    }

    #[test]
    fn load_or_generate_persists_and_reloads_same_key() {
        let dir = std::env::temp_dir().join(format!("pgedge-mcp-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("secret.key");
        let _ = std::fs::remove_file(&path);

        let first = EncryptionKey::load_or_generate(&path).unwrap();
        let second = EncryptionKey::load_or_generate(&path).unwrap();
        let enc = first.encrypt("abc").unwrap();
        assert_eq!(second.decrypt(&enc).unwrap(), "abc");

        std::fs::remove_file(&path).ok();
    }
}
