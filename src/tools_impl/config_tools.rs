//! `set_pg_configuration` and `recommend_pg_configuration` (§4.5, §9
//! "sketched for completeness"). Recommendations are heuristic thresholds
//! over `pg_settings`/`pg_stat_*`, not a query optimizer or policy engine —
//! those stay out of scope.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::Row;

use crate::app::AppShared;
use crate::error::{Result, ServerError};
use crate::registry::{RequestContext, Tool};

/// Parameters `ALTER SYSTEM SET` is allowed to touch through this tool.
/// Anything else is rejected rather than silently forwarded to Postgres.
const ALLOWED_PARAMETERS: &[&str] = &[
    "work_mem",
    "maintenance_work_mem",
    "shared_buffers",
    "effective_cache_size",
    "max_connections",
    "random_page_cost",
    "statement_timeout",
];

pub struct SetPgConfiguration {
    shared: Arc<AppShared>,
}

impl SetPgConfiguration {
    pub fn new(shared: Arc<AppShared>) -> Self {
        Self { shared }
    }
}

#[async_trait]
impl Tool for SetPgConfiguration {
    fn name(&self) -> &str {
        "set_pg_configuration"
    }

    fn description(&self) -> &str {
        "Set a server configuration parameter via ALTER SYSTEM and reload the config."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["parameter", "value"],
            "properties": {
                "parameter": { "type": "string", "enum": ALLOWED_PARAMETERS },
                "value": { "type": "string" },
            },
        })
    }

    async fn call(&self, ctx: &RequestContext, arguments: Value) -> Result<Value> {
        let parameter = arguments
            .get("parameter")
            .and_then(Value::as_str)
            .ok_or_else(|| ServerError::InvalidParams("missing 'parameter'".into()))?;
        let value = arguments
            .get("value")
            .and_then(Value::as_str)
            .ok_or_else(|| ServerError::InvalidParams("missing 'value'".into()))?;

        if !ALLOWED_PARAMETERS.contains(&parameter) {
            return Err(ServerError::InvalidParams(format!("'{parameter}' is not an adjustable parameter")));
        }

        let client = self.shared.client_for(ctx).await?;
        sqlx::query(&format!("ALTER SYSTEM SET {parameter} = $1"))
            .bind(value)
            .execute(client.pool())
            .await?;
        sqlx::query("SELECT pg_reload_conf()").execute(client.pool()).await?;

        Ok(json!({ "type": "text", "text": format!("{parameter} set to {value} and configuration reloaded") }))
    }
}

pub struct RecommendPgConfiguration {
    shared: Arc<AppShared>,
}

impl RecommendPgConfiguration {
    pub fn new(shared: Arc<AppShared>) -> Self {
        Self { shared }
    }
}

#[async_trait]
impl Tool for RecommendPgConfiguration {
    fn name(&self) -> &str {
        "recommend_pg_configuration"
    }

    fn description(&self) -> &str {
        "Suggest configuration adjustments based on current pg_settings values."
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn call(&self, ctx: &RequestContext, _arguments: Value) -> Result<Value> {
        let client = self.shared.client_for(ctx).await?;
        let rows = sqlx::query("SELECT name, setting, unit FROM pg_settings WHERE name = ANY($1)")
            .bind(ALLOWED_PARAMETERS)
            .fetch_all(client.pool())
            .await?;

        let mut recommendations = Vec::new();
        for row in &rows {
            let name: String = row.try_get("name")?;
            let setting: String = row.try_get("setting")?;
            if name == "work_mem" {
                if let Ok(kb) = setting.parse::<i64>() {
                    if kb < 4096 {
                        recommendations.push(format!("work_mem is {kb}kB; consider raising it for sort-heavy workloads"));
                    }
                }
            }
            if name == "random_page_cost" {
                if let Ok(cost) = setting.parse::<f64>() {
                    if cost >= 4.0 {
                        recommendations.push("random_page_cost is at its spinning-disk default; lower it on SSD-backed storage".to_string());
                    }
                }
            }
        }
        if recommendations.is_empty() {
            recommendations.push("no heuristic recommendations triggered for the inspected parameters".to_string());
        }

        Ok(json!({ "type": "text", "text": recommendations.join("\n") }))
    }
}
