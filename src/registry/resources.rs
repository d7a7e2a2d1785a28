//! Resource registry (§4.5, §4.6). Resource handlers are matched either by
//! exact URI or by prefix (for a family like `pg://table/{schema}.{name}`).
//! An unmatched URI is a *content-level* not-found, not a protocol error
//! (§9 design note) — callers read one content item either way.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::context::RequestContext;
use crate::error::Result;

#[async_trait]
pub trait Resource: Send + Sync {
    /// Either an exact URI, or a prefix ending in `/` that matches any URI
    /// starting with it.
    fn uri_pattern(&self) -> &str;
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn mime_type(&self) -> &str {
        "application/json"
    }
    async fn read(&self, ctx: &RequestContext, uri: &str) -> Result<Value>;

    fn matches(&self, uri: &str) -> bool {
        let pattern = self.uri_pattern();
        if let Some(prefix) = pattern.strip_suffix('/') {
            uri == pattern || uri.starts_with(&format!("{prefix}/"))
        } else {
            uri == pattern
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

#[derive(Default)]
pub struct ResourceRegistry {
    resources: Vec<std::sync::Arc<dyn Resource>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, resource: std::sync::Arc<dyn Resource>) {
        self.resources.push(resource);
    }

    pub fn list(&self) -> Vec<ResourceDescriptor> {
        self.resources
            .iter()
            .map(|r| ResourceDescriptor {
                uri: r.uri_pattern().to_string(),
                name: r.name().to_string(),
                description: r.description().to_string(),
                mime_type: r.mime_type().to_string(),
            })
            .collect()
    }

    /// Read `uri`. An unmatched URI yields a content item describing the
    /// miss instead of a protocol-level error.
    pub async fn read(&self, ctx: &RequestContext, uri: &str) -> Result<Value> {
        match self.resources.iter().find(|r| r.matches(uri)) {
            Some(resource) => resource.read(ctx, uri).await,
            None => Ok(json!({
                "uri": uri,
                "mimeType": "text/plain",
                "text": format!("resource not found: {uri}"),
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    #[async_trait]
    impl Resource for Fixed {
        fn uri_pattern(&self) -> &str {
            "pg://settings"
        }
        fn name(&self) -> &str {
            "settings"
        }
        fn description(&self) -> &str {
            "server settings"
        }
        async fn read(&self, _ctx: &RequestContext, _uri: &str) -> Result<Value> {
            Ok(json!({"ok": true}))
        }
    }

    struct TableFamily;

    #[async_trait]
    impl Resource for TableFamily {
        fn uri_pattern(&self) -> &str {
            "pg://table/"
        }
        fn name(&self) -> &str {
            "table"
        }
        fn description(&self) -> &str {
            "a single table's schema"
        }
        async fn read(&self, _ctx: &RequestContext, uri: &str) -> Result<Value> {
            Ok(json!({"uri": uri}))
        }
    }

    #[tokio::test]
    async fn unknown_uri_is_not_found_content_not_error() {
        let registry = ResourceRegistry::new();
        let ctx = RequestContext::default_key("127.0.0.1");
        let result = registry.read(&ctx, "pg://nope").await.unwrap();
        assert!(result["text"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn prefix_family_matches_suffix() {
        let mut registry = ResourceRegistry::new();
        registry.register(std::sync::Arc::new(Fixed));
        registry.register(std::sync::Arc::new(TableFamily));
        let ctx = RequestContext::default_key("127.0.0.1");

        let settings = registry.read(&ctx, "pg://settings").await.unwrap();
        assert_eq!(settings["ok"], true);

        let table = registry.read(&ctx, "pg://table/public.users").await.unwrap();
        assert_eq!(table["uri"], "pg://table/public.users");
    }
}
