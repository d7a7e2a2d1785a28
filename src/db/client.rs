//! A single Postgres connection with its cached schema metadata (§3, §4.3).

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::RwLock;

use super::metadata::{self, MetadataSnapshot};
use crate::error::Result;

/// Diagnostic view of where a client's background load stands (§9 design
/// note: a tagged variant instead of a bare bool). `loaded`/`GetMetadata`
/// are the contract readers rely on; this is surfaced for introspection
/// only (e.g. the `server_info` tool, `pg://system_info`).
#[derive(Debug, Clone)]
pub enum ClientState {
    Connecting,
    Loading,
    Ready,
    /// A *reload* failed; the previous snapshot is still being served.
    Failed { error: String },
}

struct Inner {
    state: ClientState,
    loaded: bool,
    snapshot: MetadataSnapshot,
}

pub struct DatabaseClient {
    pool: PgPool,
    connection_string: String,
    inner: RwLock<Inner>,
    closed: std::sync::atomic::AtomicBool,
}

impl DatabaseClient {
    /// Open the pool and perform a liveness probe. Fails fast, no retry.
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(10))
            .connect(connection_string)
            .await?;
        sqlx::query("SELECT 1").fetch_one(&pool).await?;

        Ok(Self {
            pool,
            connection_string: connection_string.to_string(),
            inner: RwLock::new(Inner {
                state: ClientState::Connecting,
                loaded: false,
                snapshot: MetadataSnapshot::default(),
            }),
            closed: std::sync::atomic::AtomicBool::new(false),
        })
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    /// Run the catalog introspection query and swap in the new snapshot
    /// atomically. On failure, the previous snapshot (if any) keeps serving
    /// stale data — only the diagnostic `state` reflects the failure (§4.4).
    pub async fn load_metadata(&self) -> Result<()> {
        {
            let mut inner = self.inner.write().await;
            inner.state = ClientState::Loading;
        }

        match metadata::load(&self.pool).await {
            Ok(snapshot) => {
                let mut inner = self.inner.write().await;
                inner.snapshot = snapshot;
                inner.loaded = true;
                inner.state = ClientState::Ready;
                Ok(())
            }
            Err(e) => {
                let mut inner = self.inner.write().await;
                inner.state = ClientState::Failed { error: e.to_string() };
                Err(e)
            }
        }
    }

    /// Start background metadata loading, once, after `connect()` (§4.4).
    pub fn spawn_metadata_loader(self: &Arc<Self>) {
        let client = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = client.load_metadata().await {
                tracing::error!("metadata load failed: {e}");
            }
        });
    }

    pub async fn get_metadata(&self) -> MetadataSnapshot {
        self.inner.read().await.snapshot.clone()
    }

    pub async fn is_metadata_loaded(&self) -> bool {
        self.inner.read().await.loaded
    }

    pub async fn state(&self) -> ClientState {
        self.inner.read().await.state.clone()
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(&self) {
        if self.closed.swap(true, std::sync::atomic::Ordering::SeqCst) {
            return;
        }
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn not_loaded_before_first_load() {
        // Build an Inner directly — no real Postgres needed for this invariant.
        let inner = Inner { state: ClientState::Connecting, loaded: false, snapshot: MetadataSnapshot::default() };
        assert!(!inner.loaded);
        assert!(matches!(inner.state, ClientState::Connecting));
    }
}
