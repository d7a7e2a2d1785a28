//! `pg://stat/{view}` and `pg://statio/{view}`: a small allow-listed family
//! over the built-in statistics views (§9 "sketched for completeness").

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::app::AppShared;
use crate::error::{Result, ServerError};
use crate::registry::{RequestContext, Resource};

const STAT_VIEWS: &[&str] = &["user_tables", "user_indexes", "activity", "bgwriter"];
const STATIO_VIEWS: &[&str] = &["user_tables", "user_indexes"];

pub struct StatResource {
    shared: Arc<AppShared>,
}

impl StatResource {
    pub fn new(shared: Arc<AppShared>) -> Self {
        Self { shared }
    }
}

#[async_trait]
impl Resource for StatResource {
    fn uri_pattern(&self) -> &str {
        "pg://stat/"
    }

    fn name(&self) -> &str {
        "stat"
    }

    fn description(&self) -> &str {
        "Rows from a pg_stat_* view: user_tables, user_indexes, activity, or bgwriter."
    }

    async fn read(&self, ctx: &RequestContext, uri: &str) -> Result<Value> {
        let view = uri.strip_prefix("pg://stat/").unwrap_or_default();
        if !STAT_VIEWS.contains(&view) {
            return Err(ServerError::InvalidParams(format!("unknown stat view '{view}'")));
        }
        let client = self.shared.client_for(ctx).await?;
        let rows = sqlx::query(&format!("SELECT * FROM pg_stat_{view} LIMIT 500"))
            .fetch_all(client.pool())
            .await?;
        Ok(json!({ "uri": uri, "mimeType": "application/json", "text": format!("{} rows", rows.len()) }))
    }
}

pub struct StatioResource {
    shared: Arc<AppShared>,
}

impl StatioResource {
    pub fn new(shared: Arc<AppShared>) -> Self {
        Self { shared }
    }
}

#[async_trait]
impl Resource for StatioResource {
    fn uri_pattern(&self) -> &str {
        "pg://statio/"
    }

    fn name(&self) -> &str {
        "statio"
    }

    fn description(&self) -> &str {
        "Rows from a pg_statio_* view: user_tables or user_indexes."
    }

    async fn read(&self, ctx: &RequestContext, uri: &str) -> Result<Value> {
        let view = uri.strip_prefix("pg://statio/").unwrap_or_default();
        if !STATIO_VIEWS.contains(&view) {
            return Err(ServerError::InvalidParams(format!("unknown statio view '{view}'")));
        }
        let client = self.shared.client_for(ctx).await?;
        let rows = sqlx::query(&format!("SELECT * FROM pg_statio_{view} LIMIT 500"))
            .fetch_all(client.pool())
            .await?;
        Ok(json!({ "uri": uri, "mimeType": "application/json", "text": format!("{} rows", rows.len()) }))
    }
}
