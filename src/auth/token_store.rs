//! Bearer token store (§3, §4.8). Versioned YAML file, hash-indexed,
//! mutated via atomic write-temp + rename.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::error::Result;

pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(digest)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    pub hash: String,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenFile {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    tokens: Vec<TokenRecord>,
}

fn default_version() -> u32 {
    1
}

pub struct TokenStore {
    path: PathBuf,
    tokens: RwLock<HashMap<String, TokenRecord>>,
}

impl TokenStore {
    /// Load from `path`, treating a missing file as an empty store.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let tokens = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => {
                let file: TokenFile = serde_yaml::from_str(&raw)?;
                file.tokens.into_iter().map(|t| (t.hash.clone(), t)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, tokens: RwLock::new(tokens) })
    }

    /// Verify a presented token, returning its hash on success.
    pub async fn verify(&self, token: &str) -> Option<String> {
        let hash = hash_token(token);
        let tokens = self.tokens.read().await;
        tokens.contains_key(&hash).then_some(hash)
    }

    pub async fn list(&self) -> Vec<TokenRecord> {
        self.tokens.read().await.values().cloned().collect()
    }

    /// Create a new token. Returns `(plaintext, record)` — the plaintext is
    /// shown exactly once (§3).
    pub async fn create(&self, note: impl Into<String>) -> Result<(String, TokenRecord)> {
        let plaintext = generate_token();
        let record = TokenRecord { hash: hash_token(&plaintext), note: note.into(), created_at: Utc::now() };

        let mut tokens = self.tokens.write().await;
        tokens.insert(record.hash.clone(), record.clone());
        self.persist(&tokens).await?;
        Ok((plaintext, record))
    }

    pub async fn remove(&self, hash: &str) -> Result<bool> {
        let mut tokens = self.tokens.write().await;
        let removed = tokens.remove(hash).is_some();
        if removed {
            self.persist(&tokens).await?;
        }
        Ok(removed)
    }

    async fn persist(&self, tokens: &HashMap<String, TokenRecord>) -> Result<()> {
        persist_yaml_atomic(&self.path, &TokenFile { version: 1, tokens: tokens.values().cloned().collect() }).await
    }
}

fn generate_token() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    format!("pgm_{}", hex::encode(bytes))
}

/// Serialize `value` to YAML and write it to `path` via write-temp + rename,
/// so a crash mid-write never corrupts the live file.
pub async fn persist_yaml_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let yaml = serde_yaml::to_string(value)?;
    let tmp = path.with_extension("tmp");
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(&tmp, yaml).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("pgedge-mcp-test-{}-{}", std::process::id(), name))
    }

    #[tokio::test]
    async fn create_verify_remove_round_trip() {
        let path = tmp_path("tokens.yaml");
        let _ = tokio::fs::remove_file(&path).await;

        let store = TokenStore::load(&path).await.unwrap();
        let (plaintext, record) = store.create("ci").await.unwrap();
        assert!(store.verify(&plaintext).await.is_some());
        assert_eq!(store.list().await.len(), 1);

        assert!(store.remove(&record.hash).await.unwrap());
        assert!(store.verify(&plaintext).await.is_none());

        tokio::fs::remove_file(&path).await.ok();
    }

    #[tokio::test]
    async fn persists_across_reload() {
        let path = tmp_path("tokens2.yaml");
        let _ = tokio::fs::remove_file(&path).await;

        let store = TokenStore::load(&path).await.unwrap();
        let (plaintext, _) = store.create("persisted").await.unwrap();
        drop(store);

        let reloaded = TokenStore::load(&path).await.unwrap();
        assert!(reloaded.verify(&plaintext).await.is_some());

        tokio::fs::remove_file(&path).await.ok();
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty_store() {
        let path = tmp_path("does-not-exist.yaml");
        let store = TokenStore::load(&path).await.unwrap();
        assert!(store.list().await.is_empty());
    }
}
