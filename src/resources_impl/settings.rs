//! `pg://settings` and `pg://system_info` (§9 "sketched for completeness").

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::Row;
use sysinfo::System;

use crate::app::AppShared;
use crate::error::Result;
use crate::registry::{RequestContext, Resource};

pub struct SettingsResource {
    shared: Arc<AppShared>,
}

impl SettingsResource {
    pub fn new(shared: Arc<AppShared>) -> Self {
        Self { shared }
    }
}

#[async_trait]
impl Resource for SettingsResource {
    fn uri_pattern(&self) -> &str {
        "pg://settings"
    }

    fn name(&self) -> &str {
        "settings"
    }

    fn description(&self) -> &str {
        "Every row of pg_settings for the caller's database."
    }

    async fn read(&self, ctx: &RequestContext, uri: &str) -> Result<Value> {
        let client = self.shared.client_for(ctx).await?;
        let rows = sqlx::query("SELECT name, setting, unit, category FROM pg_settings ORDER BY name")
            .fetch_all(client.pool())
            .await?;
        let settings: Vec<Value> = rows
            .iter()
            .map(|row| {
                json!({
                    "name": row.try_get::<String, _>("name").unwrap_or_default(),
                    "setting": row.try_get::<String, _>("setting").unwrap_or_default(),
                    "unit": row.try_get::<Option<String>, _>("unit").unwrap_or_default(),
                    "category": row.try_get::<String, _>("category").unwrap_or_default(),
                })
            })
            .collect();
        Ok(json!({ "uri": uri, "mimeType": "application/json", "text": serde_json::to_string(&settings)? }))
    }
}

pub struct SystemInfoResource;

#[async_trait]
impl Resource for SystemInfoResource {
    fn uri_pattern(&self) -> &str {
        "pg://system_info"
    }

    fn name(&self) -> &str {
        "system_info"
    }

    fn description(&self) -> &str {
        "Host memory and CPU facts for the machine running this server."
    }

    async fn read(&self, _ctx: &RequestContext, uri: &str) -> Result<Value> {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu_usage();
        Ok(json!({
            "uri": uri,
            "mimeType": "application/json",
            "text": serde_json::to_string(&json!({
                "totalMemoryKb": sys.total_memory(),
                "usedMemoryKb": sys.used_memory(),
                "cpuCount": sys.cpus().len(),
            }))?,
        }))
    }
}
