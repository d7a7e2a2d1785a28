//! `manage_connections`: connect/add/edit/remove/list over saved connection
//! templates (§4.5, §9 design note). `connect` additionally establishes the
//! caller's live [`DatabaseClient`] against the chosen alias.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::app::AppShared;
use crate::db::ConnectionInput;
use crate::error::{Result, ServerError};
use crate::registry::{RequestContext, Tool};

pub struct ManageConnections {
    shared: Arc<AppShared>,
}

impl ManageConnections {
    pub fn new(shared: Arc<AppShared>) -> Self {
        Self { shared }
    }

    fn parse_input(arguments: &Value) -> ConnectionInput {
        ConnectionInput {
            dsn: arguments.get("dsn").and_then(Value::as_str).map(str::to_string),
            host: arguments.get("host").and_then(Value::as_str).map(str::to_string),
            port: arguments.get("port").and_then(Value::as_u64).map(|p| p as u16),
            database: arguments.get("database").and_then(Value::as_str).map(str::to_string),
            user: arguments.get("user").and_then(Value::as_str).map(str::to_string),
            password: arguments.get("password").and_then(Value::as_str).map(str::to_string),
        }
    }
}

#[async_trait]
impl Tool for ManageConnections {
    fn name(&self) -> &str {
        "manage_connections"
    }

    fn description(&self) -> &str {
        "Connect to, add, edit, remove, or list saved Postgres connection templates."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["operation"],
            "properties": {
                "operation": { "type": "string", "enum": ["connect", "add", "edit", "remove", "list"] },
                "alias": { "type": "string" },
                "dsn": { "type": "string" },
                "host": { "type": "string" },
                "port": { "type": "integer" },
                "database": { "type": "string" },
                "user": { "type": "string" },
                "password": { "type": "string" },
            },
        })
    }

    async fn call(&self, ctx: &RequestContext, arguments: Value) -> Result<Value> {
        let operation = arguments
            .get("operation")
            .and_then(Value::as_str)
            .ok_or_else(|| ServerError::InvalidParams("missing 'operation'".into()))?;

        match operation {
            "list" => {
                let connections = self.shared.connections.list().await;
                let summaries: Vec<Value> = connections
                    .iter()
                    .map(|c| json!({ "alias": c.alias, "host": c.host, "port": c.port, "database": c.database, "user": c.user }))
                    .collect();
                Ok(json!({ "type": "text", "text": serde_json::to_string_pretty(&summaries)? }))
            }
            "add" | "edit" | "connect" => {
                let alias = arguments
                    .get("alias")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ServerError::InvalidParams("missing 'alias'".into()))?;

                if operation == "add" {
                    self.shared.connections.add(alias, Self::parse_input(&arguments)).await?;
                } else if operation == "edit" {
                    self.shared.connections.edit(alias, Self::parse_input(&arguments)).await?;
                }

                let connection_string = self.shared.connections.connection_string(alias).await?;
                let client = self.shared.clients.get_or_create(&ctx.client_key, &connection_string).await?;
                let loaded = client.is_metadata_loaded().await;
                Ok(json!({
                    "type": "text",
                    "text": format!("connected to '{alias}' (schema metadata {})", if loaded { "ready" } else { "loading" }),
                }))
            }
            "remove" => {
                let alias = arguments
                    .get("alias")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ServerError::InvalidParams("missing 'alias'".into()))?;
                let removed = self.shared.connections.remove(alias).await?;
                Ok(json!({ "type": "text", "text": format!("removed: {removed}") }))
            }
            other => Err(ServerError::InvalidParams(format!("unknown operation '{other}'"))),
        }
    }
}
