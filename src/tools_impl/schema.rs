//! `get_schema_info`: serve the cached catalog snapshot (§3, §4.3, §4.4).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::app::AppShared;
use crate::error::{Result, ServerError, DATABASE_NOT_READY};
use crate::registry::{RequestContext, Tool};

pub struct GetSchemaInfo {
    shared: Arc<AppShared>,
}

impl GetSchemaInfo {
    pub fn new(shared: Arc<AppShared>) -> Self {
        Self { shared }
    }
}

#[async_trait]
impl Tool for GetSchemaInfo {
    fn name(&self) -> &str {
        "get_schema_info"
    }

    fn description(&self) -> &str {
        "List tables and columns known to the server, optionally filtered to one schema or table."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "schema": { "type": "string", "description": "restrict to this schema" },
                "table": { "type": "string", "description": "restrict to this table name" },
            },
        })
    }

    async fn call(&self, ctx: &RequestContext, arguments: Value) -> Result<Value> {
        let client = self.shared.client_for(ctx).await?;
        if !client.is_metadata_loaded().await {
            return Err(ServerError::NotReady(DATABASE_NOT_READY.into()));
        }

        let snapshot = client.get_metadata().await;
        let schema_filter = arguments.get("schema").and_then(Value::as_str);
        let table_filter = arguments.get("table").and_then(Value::as_str);

        let tables: Vec<_> = snapshot
            .tables()
            .filter(|t| schema_filter.map_or(true, |s| t.schema == s))
            .filter(|t| table_filter.map_or(true, |n| t.name == n))
            .collect();

        Ok(json!({ "type": "text", "text": serde_json::to_string_pretty(&tables)? }))
    }
}
