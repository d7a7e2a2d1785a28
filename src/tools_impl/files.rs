//! `read_server_log`, `read_postgresql_conf`, `read_pg_hba_conf`,
//! `read_pg_ident_conf` (§4.5, §9). All four read under a single
//! allow-listed directory; the resolved path is checked to stay inside it
//! before any bytes are read.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::app::AppShared;
use crate::error::{Result, ServerError};
use crate::registry::{RequestContext, Tool};

/// Resolve `relative` under `root`, rejecting anything that escapes it via
/// `..` or an absolute path.
fn resolve_under(root: &Path, relative: &str) -> Result<PathBuf> {
    let candidate = root.join(relative);
    let canonical_root = root
        .canonicalize()
        .map_err(|e| ServerError::Other(format!("allowed read directory is unavailable: {e}")))?;
    let canonical = candidate
        .canonicalize()
        .map_err(|_| ServerError::NotFound(format!("no such file: {relative}")))?;
    if !canonical.starts_with(&canonical_root) {
        return Err(ServerError::InvalidParams("path escapes the allowed directory".into()));
    }
    Ok(canonical)
}

async fn read_allowed_file(shared: &AppShared, relative: &str) -> Result<String> {
    let path = resolve_under(&shared.allowed_read_dir, relative)?;
    tokio::fs::read_to_string(path).await.map_err(Into::into)
}

macro_rules! file_tool {
    ($struct_name:ident, $tool_name:literal, $description:literal, $default_file:literal) => {
        pub struct $struct_name {
            shared: Arc<AppShared>,
        }

        impl $struct_name {
            pub fn new(shared: Arc<AppShared>) -> Self {
                Self { shared }
            }
        }

        #[async_trait]
        impl Tool for $struct_name {
            fn name(&self) -> &str {
                $tool_name
            }

            fn description(&self) -> &str {
                $description
            }

            fn input_schema(&self) -> Value {
                json!({
                    "type": "object",
                    "properties": {
                        "path": { "type": "string", "description": concat!("relative path, default '", $default_file, "'") },
                    },
                })
            }

            async fn call(&self, _ctx: &RequestContext, arguments: Value) -> Result<Value> {
                let relative = arguments.get("path").and_then(Value::as_str).unwrap_or($default_file);
                let contents = read_allowed_file(&self.shared, relative).await?;
                Ok(json!({ "type": "text", "text": contents }))
            }
        }
    };
}

file_tool!(ReadServerLog, "read_server_log", "Read a slice of the Postgres server log.", "postgresql.log");
file_tool!(ReadPostgresqlConf, "read_postgresql_conf", "Read postgresql.conf.", "postgresql.conf");
file_tool!(ReadPgHbaConf, "read_pg_hba_conf", "Read pg_hba.conf.", "pg_hba.conf");
file_tool!(ReadPgIdentConf, "read_pg_ident_conf", "Read pg_ident.conf.", "pg_ident.conf");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_path_outside_allowed_root() {
        let dir = std::env::temp_dir().join(format!("pgedge-mcp-files-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("postgresql.conf"), "shared_buffers = 128MB\n").unwrap();

        let ok = resolve_under(&dir, "postgresql.conf");
        assert!(ok.is_ok());

        let escape = resolve_under(&dir, "../../etc/passwd");
        assert!(escape.is_err());

        std::fs::remove_dir_all(&dir).ok();
    }
}
