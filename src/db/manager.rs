//! Per-key client isolation: one [`DatabaseClient`] per bearer-token hash
//! (or the literal `"default"` when auth is disabled), created at most once
//! per key even under concurrent first access (§3, §4.3 invariant).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::client::DatabaseClient;
use crate::error::{Result, ServerError};

pub struct ClientManager {
    clients: RwLock<HashMap<String, Arc<DatabaseClient>>>,
}

impl ClientManager {
    pub fn new() -> Self {
        Self { clients: RwLock::new(HashMap::new()) }
    }

    /// Return the existing client for `key`, or connect and register a new
    /// one. Holds the write lock across the connect attempt for a given
    /// miss so two concurrent callers for the same new key can't both dial.
    pub async fn get_or_create(&self, key: &str, connection_string: &str) -> Result<Arc<DatabaseClient>> {
        if let Some(client) = self.clients.read().await.get(key) {
            return Ok(Arc::clone(client));
        }

        let mut clients = self.clients.write().await;
        if let Some(client) = clients.get(key) {
            return Ok(Arc::clone(client));
        }

        let client = Arc::new(DatabaseClient::connect(connection_string).await?);
        client.spawn_metadata_loader();
        clients.insert(key.to_string(), Arc::clone(&client));
        Ok(client)
    }

    pub async fn get(&self, key: &str) -> Option<Arc<DatabaseClient>> {
        self.clients.read().await.get(key).cloned()
    }

    /// Atomically install a pre-built client, closing and draining any
    /// prior client registered under `key` (§4.3).
    pub async fn set_client(&self, key: &str, client: Arc<DatabaseClient>) {
        let previous = self.clients.write().await.insert(key.to_string(), client);
        if let Some(previous) = previous {
            previous.close().await;
        }
    }

    pub async fn close_client(&self, key: &str) -> Result<()> {
        let client = self.clients.write().await.remove(key);
        match client {
            Some(client) => {
                client.close().await;
                Ok(())
            }
            None => Err(ServerError::NotFound(format!("no client for key '{key}'"))),
        }
    }

    pub async fn close_all(&self) {
        let mut clients = self.clients.write().await;
        for (_, client) in clients.drain() {
            client.close().await;
        }
    }

    pub async fn keys(&self) -> Vec<String> {
        self.clients.read().await.keys().cloned().collect()
    }
}

impl Default for ClientManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn close_unknown_key_is_not_found() {
        let manager = ClientManager::new();
        let err = manager.close_client("missing").await.unwrap_err();
        assert!(matches!(err, ServerError::NotFound(_)));
    }

    #[tokio::test]
    async fn empty_manager_has_no_keys() {
        let manager = ClientManager::new();
        assert!(manager.keys().await.is_empty());
    }
}
