//! Tool registry (§4.5, §4.6). A [`Tool`] is resolved by name and invoked
//! with a [`RequestContext`] so it can look up the caller's database client
//! at call time, not at registration time.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::context::RequestContext;
use crate::error::{Result, ServerError};

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// JSON Schema for the tool's `arguments` object.
    fn input_schema(&self) -> Value;
    async fn call(&self, ctx: &RequestContext, arguments: Value) -> Result<Value>;
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    /// Registered, callable, but excluded from `tools/list` (§9: `authenticate_user`).
    hidden: HashSet<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn register_hidden(&mut self, tool: Arc<dyn Tool>) {
        self.hidden.insert(tool.name().to_string());
        self.register(tool);
    }

    pub fn list(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .values()
            .filter(|t| !self.hidden.contains(t.name()))
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.input_schema(),
            })
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    pub async fn call(&self, name: &str, ctx: &RequestContext, arguments: Value) -> Result<Value> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ServerError::NotFound(format!("unknown tool '{name}'")))?;
        check_required_params(&tool.input_schema(), &arguments)?;
        tool.call(ctx, arguments).await
    }
}

/// Presence-only validation: every name in the schema's `required` array
/// must be a key in `arguments`. Type/shape checking is the tool's own job.
fn check_required_params(schema: &Value, arguments: &Value) -> Result<()> {
    let Some(required) = schema.get("required").and_then(|r| r.as_array()) else {
        return Ok(());
    };
    for name in required {
        let Some(name) = name.as_str() else { continue };
        if arguments.get(name).is_none() {
            return Err(ServerError::InvalidParams(format!("missing required parameter '{name}'")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes its input"
        }
        fn input_schema(&self) -> Value {
            json!({ "type": "object", "required": ["text"], "properties": { "text": { "type": "string" } } })
        }
        async fn call(&self, _ctx: &RequestContext, arguments: Value) -> Result<Value> {
            Ok(arguments)
        }
    }

    #[tokio::test]
    async fn missing_required_param_is_invalid_params() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo));
        let ctx = RequestContext::default_key("127.0.0.1");
        let err = registry.call("echo", &ctx, json!({})).await.unwrap_err();
        assert_eq!(err.code(), -32602);
    }

    #[tokio::test]
    async fn hidden_tool_is_callable_but_not_listed() {
        let mut registry = ToolRegistry::new();
        registry.register_hidden(Arc::new(Echo));
        assert!(registry.list().is_empty());
        let ctx = RequestContext::default_key("127.0.0.1");
        assert!(registry.call("echo", &ctx, json!({"text": "hi"})).await.is_ok());
    }
}
