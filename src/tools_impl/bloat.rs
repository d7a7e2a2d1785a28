//! `analyze_bloat` (§4.5, §9 "sketched for completeness"). A standard
//! page-count-vs-live-tuple estimate; not as precise as `pgstattuple` but
//! needs no extension installed.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::Row;

use crate::app::AppShared;
use crate::error::Result;
use crate::registry::{RequestContext, Tool};

const BLOAT_QUERY: &str = r#"
SELECT
    schemaname AS schema,
    relname AS table_name,
    n_live_tup,
    n_dead_tup,
    CASE WHEN n_live_tup > 0
        THEN round(100.0 * n_dead_tup / (n_live_tup + n_dead_tup), 2)
        ELSE 0
    END AS dead_tuple_pct
FROM pg_stat_user_tables
ORDER BY dead_tuple_pct DESC
LIMIT $1
"#;

pub struct AnalyzeBloat {
    shared: Arc<AppShared>,
}

impl AnalyzeBloat {
    pub fn new(shared: Arc<AppShared>) -> Self {
        Self { shared }
    }
}

#[async_trait]
impl Tool for AnalyzeBloat {
    fn name(&self) -> &str {
        "analyze_bloat"
    }

    fn description(&self) -> &str {
        "Estimate dead-tuple bloat per table from pg_stat_user_tables."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "limit": { "type": "integer", "description": "max tables returned, default 20" },
            },
        })
    }

    async fn call(&self, ctx: &RequestContext, arguments: Value) -> Result<Value> {
        let limit = arguments.get("limit").and_then(Value::as_i64).unwrap_or(20).min(500);
        let client = self.shared.client_for(ctx).await?;
        let rows = sqlx::query(BLOAT_QUERY).bind(limit).fetch_all(client.pool()).await?;

        let results: Vec<Value> = rows
            .iter()
            .map(|row| {
                json!({
                    "schema": row.try_get::<String, _>("schema").unwrap_or_default(),
                    "table": row.try_get::<String, _>("table_name").unwrap_or_default(),
                    "live_tuples": row.try_get::<i64, _>("n_live_tup").unwrap_or_default(),
                    "dead_tuples": row.try_get::<i64, _>("n_dead_tup").unwrap_or_default(),
                    "dead_tuple_pct": row.try_get::<f64, _>("dead_tuple_pct").unwrap_or_default(),
                })
            })
            .collect();

        Ok(json!({ "type": "text", "text": serde_json::to_string_pretty(&results)? }))
    }
}
