//! `server_info` (§9 "sketched for completeness"). Process and runtime
//! facts a client might want before calling anything heavier.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::Row;
use sysinfo::System;

use crate::app::AppShared;
use crate::error::Result;
use crate::registry::{RequestContext, Tool};

pub struct ServerInfo {
    shared: Arc<AppShared>,
}

impl ServerInfo {
    pub fn new(shared: Arc<AppShared>) -> Self {
        Self { shared }
    }
}

#[async_trait]
impl Tool for ServerInfo {
    fn name(&self) -> &str {
        "server_info"
    }

    fn description(&self) -> &str {
        "Report server version, uptime, and the caller's connection status."
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn call(&self, ctx: &RequestContext, _arguments: Value) -> Result<Value> {
        let mut sys = System::new();
        sys.refresh_memory();

        let uptime_seconds = (chrono::Utc::now() - self.shared.started_at).num_seconds().max(0);

        let client = self.shared.clients.get(&ctx.client_key).await;
        let (connected, metadata_loaded, postgres_version) = match &client {
            Some(client) => {
                let loaded = client.is_metadata_loaded().await;
                let version: Option<String> = sqlx::query("SHOW server_version")
                    .fetch_one(client.pool())
                    .await
                    .ok()
                    .and_then(|row| row.try_get(0).ok());
                (true, loaded, version)
            }
            None => (false, false, None),
        };

        Ok(json!({
            "type": "text",
            "text": serde_json::to_string_pretty(&json!({
                "serverVersion": env!("CARGO_PKG_VERSION"),
                "uptimeSeconds": uptime_seconds,
                "totalMemoryKb": sys.total_memory(),
                "connected": connected,
                "metadataLoaded": metadata_loaded,
                "postgresVersion": postgres_version,
            }))?,
        }))
    }
}
