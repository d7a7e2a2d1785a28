//! `pg://table/{schema}.{name}`: one table's cached column metadata (§3).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::app::AppShared;
use crate::error::{Result, ServerError, DATABASE_NOT_READY};
use crate::registry::{RequestContext, Resource};

pub struct TableResource {
    shared: Arc<AppShared>,
}

impl TableResource {
    pub fn new(shared: Arc<AppShared>) -> Self {
        Self { shared }
    }
}

#[async_trait]
impl Resource for TableResource {
    fn uri_pattern(&self) -> &str {
        "pg://table/"
    }

    fn name(&self) -> &str {
        "table"
    }

    fn description(&self) -> &str {
        "Cached schema, name and columns for a single table, addressed as pg://table/{schema}.{name}."
    }

    async fn read(&self, ctx: &RequestContext, uri: &str) -> Result<Value> {
        let qualified = uri.strip_prefix("pg://table/").unwrap_or_default();
        let (schema, name) = qualified
            .split_once('.')
            .ok_or_else(|| ServerError::InvalidParams("expected pg://table/{schema}.{name}".into()))?;

        let client = self.shared.client_for(ctx).await?;
        if !client.is_metadata_loaded().await {
            return Ok(json!({ "uri": uri, "mimeType": "text/plain", "text": DATABASE_NOT_READY }));
        }

        let snapshot = client.get_metadata().await;
        match snapshot.get(schema, name) {
            Some(table) => Ok(json!({ "uri": uri, "mimeType": "application/json", "text": serde_json::to_string(table)? })),
            None => Ok(json!({ "uri": uri, "mimeType": "text/plain", "text": format!("no such table: {schema}.{name}") })),
        }
    }
}
