//! Shared, process-wide state handed to every tool and resource handler.

use std::path::PathBuf;
use std::sync::Arc;

use crate::db::{ClientManager, DatabaseClient, SavedConnectionStore};
use crate::error::{Result, ServerError};
use crate::registry::RequestContext;

pub struct AppShared {
    pub clients: Arc<ClientManager>,
    pub connections: Arc<SavedConnectionStore>,
    /// Used to lazily connect the `"default"` client when auth is disabled
    /// and a connection string was supplied directly (§6).
    pub default_database_url: Option<String>,
    pub embedding_configured: bool,
    /// Root directory `read_*` file tools may serve files from; paths are
    /// resolved and checked to stay within it (§4.5, §9).
    pub allowed_read_dir: PathBuf,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppShared {
    /// Resolve the caller's database client, connecting the default lazily
    /// on first use when no saved connection / prior call established one.
    pub async fn client_for(&self, ctx: &RequestContext) -> Result<Arc<DatabaseClient>> {
        if let Some(client) = self.clients.get(&ctx.client_key).await {
            return Ok(client);
        }
        if ctx.client_key == "default" {
            if let Some(url) = &self.default_database_url {
                return self.clients.get_or_create("default", url).await;
            }
        }
        Err(ServerError::NotReady(
            "no database connection for this client; call manage_connections first".into(),
        ))
    }
}
