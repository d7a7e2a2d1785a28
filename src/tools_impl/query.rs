//! `query_database` and `execute_explain`: read-only SQL execution (§4.5,
//! §5). Every statement runs inside `BEGIN; SET TRANSACTION READ ONLY`,
//! rolled back unconditionally so a sneaky `SELECT ... FOR UPDATE` or a
//! volatile function can't leave side effects behind.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::{Column, Row, TypeInfo};

use crate::app::AppShared;
use crate::error::{Result, ServerError};
use crate::registry::{RequestContext, Tool};

fn require_sql(arguments: &Value) -> Result<String> {
    arguments
        .get("sql")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ServerError::InvalidParams("missing 'sql'".into()))
}

/// `SELECT`/`WITH ... SELECT` only, mirroring the read-only transaction
/// these statements already run inside.
fn is_read_only(sql: &str) -> bool {
    let normalized = sql.trim_start().to_uppercase();
    normalized.starts_with("SELECT") || normalized.starts_with("WITH")
}

fn require_read_only(sql: &str) -> Result<()> {
    if is_read_only(sql) {
        Ok(())
    } else {
        Err(ServerError::Other("Only SELECT queries (or WITH ... SELECT) are allowed here.".into()))
    }
}

fn rows_to_json(rows: &[sqlx::postgres::PgRow]) -> Vec<Value> {
    rows.iter()
        .map(|row| {
            let mut obj = serde_json::Map::new();
            for column in row.columns() {
                let name = column.name();
                let value: Value = match column.type_info().name() {
                    "INT4" | "INT2" => row.try_get::<Option<i32>, _>(name).ok().flatten().map(Value::from).unwrap_or(Value::Null),
                    "INT8" => row.try_get::<Option<i64>, _>(name).ok().flatten().map(Value::from).unwrap_or(Value::Null),
                    "FLOAT4" | "FLOAT8" | "NUMERIC" => {
                        row.try_get::<Option<f64>, _>(name).ok().flatten().map(Value::from).unwrap_or(Value::Null)
                    }
                    "BOOL" => row.try_get::<Option<bool>, _>(name).ok().flatten().map(Value::from).unwrap_or(Value::Null),
                    _ => row.try_get::<Option<String>, _>(name).ok().flatten().map(Value::from).unwrap_or(Value::Null),
                };
                obj.insert(name.to_string(), value);
            }
            Value::Object(obj)
        })
        .collect()
}

pub struct QueryDatabase {
    shared: Arc<AppShared>,
}

impl QueryDatabase {
    pub fn new(shared: Arc<AppShared>) -> Self {
        Self { shared }
    }
}

#[async_trait]
impl Tool for QueryDatabase {
    fn name(&self) -> &str {
        "query_database"
    }

    fn description(&self) -> &str {
        "Run a read-only SQL query and return the resulting rows."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["sql"],
            "properties": {
                "sql": { "type": "string" },
                "limit": { "type": "integer", "description": "max rows returned, default 1000" },
            },
        })
    }

    async fn call(&self, ctx: &RequestContext, arguments: Value) -> Result<Value> {
        let sql = require_sql(&arguments)?;
        require_read_only(&sql)?;
        let limit = arguments.get("limit").and_then(Value::as_u64).unwrap_or(1000).min(10_000);

        let client = self.shared.client_for(ctx).await?;
        let mut tx = client.pool().begin().await?;
        sqlx::query("SET TRANSACTION READ ONLY").execute(&mut *tx).await?;

        let bounded = format!("SELECT * FROM ({sql}) AS bounded_query LIMIT {limit}");
        let rows = sqlx::query(&bounded).fetch_all(&mut *tx).await?;
        tx.rollback().await?;

        Ok(json!({ "type": "text", "text": serde_json::to_string_pretty(&rows_to_json(&rows))? }))
    }
}

pub struct ExecuteExplain {
    shared: Arc<AppShared>,
}

impl ExecuteExplain {
    pub fn new(shared: Arc<AppShared>) -> Self {
        Self { shared }
    }
}

#[async_trait]
impl Tool for ExecuteExplain {
    fn name(&self) -> &str {
        "execute_explain"
    }

    fn description(&self) -> &str {
        "Return the query plan for a SQL statement, without executing it."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["sql"],
            "properties": {
                "sql": { "type": "string" },
                "analyze": { "type": "boolean", "description": "run EXPLAIN ANALYZE instead of EXPLAIN" },
            },
        })
    }

    async fn call(&self, ctx: &RequestContext, arguments: Value) -> Result<Value> {
        let sql = require_sql(&arguments)?;
        require_read_only(&sql)?;
        let analyze = arguments.get("analyze").and_then(Value::as_bool).unwrap_or(false);

        let client = self.shared.client_for(ctx).await?;
        let mut tx = client.pool().begin().await?;
        sqlx::query("SET TRANSACTION READ ONLY").execute(&mut *tx).await?;

        let explain_sql = if analyze {
            format!("EXPLAIN (ANALYZE, FORMAT JSON) {sql}")
        } else {
            format!("EXPLAIN (FORMAT JSON) {sql}")
        };
        let row = sqlx::query(&explain_sql).fetch_one(&mut *tx).await?;
        tx.rollback().await?;

        let plan: String = row.try_get(0)?;
        Ok(json!({ "type": "text", "text": plan }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_select_statements() {
        assert!(require_read_only("INSERT INTO t VALUES (1)").is_err());
        let err = require_read_only("insert into t values (1)").unwrap_err();
        assert!(err.to_string().contains("Only SELECT queries"));
    }

    #[test]
    fn accepts_select_and_with() {
        assert!(require_read_only("SELECT 1").is_ok());
        assert!(require_read_only("  select * from t").is_ok());
        assert!(require_read_only("WITH x AS (SELECT 1) SELECT * FROM x").is_ok());
    }
}
