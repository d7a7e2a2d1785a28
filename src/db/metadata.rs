//! Schema metadata snapshot and the pg_catalog introspection query (§3, §4.3).

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use sqlx::{PgPool, Row};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TableKind {
    Table,
    View,
    MaterializedView,
}

impl TableKind {
    fn from_relkind(relkind: &str) -> Option<Self> {
        match relkind {
            "r" => Some(TableKind::Table),
            "v" => Some(TableKind::View),
            "m" => Some(TableKind::MaterializedView),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub description: Option<String>,
    pub is_vector: bool,
    pub vector_dimensions: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableInfo {
    pub schema: String,
    pub name: String,
    pub kind: TableKind,
    pub description: Option<String>,
    pub columns: Vec<ColumnInfo>,
}

/// `(schema, table) -> TableInfo`, replaced atomically on reload (§3).
#[derive(Debug, Clone, Default)]
pub struct MetadataSnapshot {
    tables: HashMap<(String, String), TableInfo>,
}

impl MetadataSnapshot {
    pub fn get(&self, schema: &str, table: &str) -> Option<&TableInfo> {
        self.tables.get(&(schema.to_string(), table.to_string()))
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableInfo> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

fn vector_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^vector\((\d+)\)$").expect("static regex"))
}

/// Parse a Postgres `format_type` string, detecting `vector(N)` columns.
fn parse_vector(data_type: &str) -> (bool, Option<u32>) {
    match vector_pattern().captures(data_type.trim()) {
        Some(caps) => {
            let n = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
            (true, n)
        }
        None => (false, None),
    }
}

const CATALOG_QUERY: &str = r#"
SELECT
    n.nspname AS schema,
    c.relname AS table_name,
    c.relkind::text AS relkind,
    obj_description(c.oid, 'pg_class') AS table_description,
    a.attname AS column_name,
    format_type(a.atttypid, a.atttypmod) AS data_type,
    NOT a.attnotnull AS nullable,
    col_description(c.oid, a.attnum) AS column_description
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
JOIN pg_catalog.pg_attribute a ON a.attrelid = c.oid
WHERE c.relkind IN ('r', 'v', 'm')
  AND a.attnum > 0
  AND NOT a.attisdropped
  AND n.nspname NOT IN ('pg_catalog', 'information_schema', 'pg_toast')
ORDER BY n.nspname, c.relname, a.attnum
"#;

/// Run the catalog introspection query and build a fresh snapshot.
pub async fn load(pool: &PgPool) -> Result<MetadataSnapshot> {
    let rows = sqlx::query(CATALOG_QUERY).fetch_all(pool).await?;

    let mut tables: HashMap<(String, String), TableInfo> = HashMap::new();
    for row in rows {
        let schema: String = row.try_get("schema")?;
        let name: String = row.try_get("table_name")?;
        let relkind: String = row.try_get("relkind")?;
        let Some(kind) = TableKind::from_relkind(&relkind) else { continue };
        let table_description: Option<String> = row.try_get("table_description")?;
        let column_name: String = row.try_get("column_name")?;
        let data_type: String = row.try_get("data_type")?;
        let nullable: bool = row.try_get("nullable")?;
        let column_description: Option<String> = row.try_get("column_description")?;

        let (is_vector, vector_dimensions) = parse_vector(&data_type);

        let entry = tables.entry((schema.clone(), name.clone())).or_insert_with(|| TableInfo {
            schema: schema.clone(),
            name: name.clone(),
            kind,
            description: table_description,
            columns: Vec::new(),
        });
        entry.columns.push(ColumnInfo {
            name: column_name,
            data_type,
            nullable,
            description: column_description,
            is_vector,
            vector_dimensions,
        });
    }

    Ok(MetadataSnapshot { tables })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_vector_columns_with_dimensions() {
        assert_eq!(parse_vector("vector(1536)"), (true, Some(1536)));
        assert_eq!(parse_vector("VECTOR(3)"), (true, Some(3)));
        assert_eq!(parse_vector("text"), (false, None));
        assert_eq!(parse_vector("integer"), (false, None));
    }
}
