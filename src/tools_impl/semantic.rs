//! `semantic_search` and `search_similar` (§9: embedding/LLM provider
//! internals are out of scope). Both tools are always registered so they
//! show up in discovery, but return a configuration error until a
//! deployment wires an embedding provider.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::app::AppShared;
use crate::error::{Result, ServerError};
use crate::registry::{RequestContext, Tool};

fn not_configured() -> ServerError {
    ServerError::Other("no embedding provider is configured for this server".into())
}

pub struct SemanticSearch {
    shared: Arc<AppShared>,
}

impl SemanticSearch {
    pub fn new(shared: Arc<AppShared>) -> Self {
        Self { shared }
    }
}

#[async_trait]
impl Tool for SemanticSearch {
    fn name(&self) -> &str {
        "semantic_search"
    }

    fn description(&self) -> &str {
        "Search rows by embedding similarity against a pgvector column."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["query", "table"],
            "properties": {
                "query": { "type": "string" },
                "table": { "type": "string" },
                "limit": { "type": "integer" },
            },
        })
    }

    async fn call(&self, _ctx: &RequestContext, _arguments: Value) -> Result<Value> {
        let _ = self.shared.embedding_configured;
        Err(not_configured())
    }
}

pub struct SearchSimilar {
    shared: Arc<AppShared>,
}

impl SearchSimilar {
    pub fn new(shared: Arc<AppShared>) -> Self {
        Self { shared }
    }
}

#[async_trait]
impl Tool for SearchSimilar {
    fn name(&self) -> &str {
        "search_similar"
    }

    fn description(&self) -> &str {
        "Find rows whose vector column is nearest to a given row's."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["table", "id"],
            "properties": {
                "table": { "type": "string" },
                "id": { "type": "string" },
                "limit": { "type": "integer" },
            },
        })
    }

    async fn call(&self, _ctx: &RequestContext, _arguments: Value) -> Result<Value> {
        let _ = self.shared.embedding_configured;
        Err(not_configured())
    }
}
