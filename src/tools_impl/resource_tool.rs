//! `read_resource`: a tool-shaped wrapper around `resources/read` (§9) for
//! clients that only drive the `tools/call` surface.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{Result, ServerError};
use crate::registry::{RequestContext, ResourceRegistry, Tool};

pub struct ReadResource {
    resources: Arc<ResourceRegistry>,
}

impl ReadResource {
    pub fn new(resources: Arc<ResourceRegistry>) -> Self {
        Self { resources }
    }
}

#[async_trait]
impl Tool for ReadResource {
    fn name(&self) -> &str {
        "read_resource"
    }

    fn description(&self) -> &str {
        "Read a pg:// resource by URI, the same content resources/read would return."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["uri"],
            "properties": { "uri": { "type": "string" } },
        })
    }

    async fn call(&self, ctx: &RequestContext, arguments: Value) -> Result<Value> {
        let uri = arguments
            .get("uri")
            .and_then(Value::as_str)
            .ok_or_else(|| ServerError::InvalidParams("missing 'uri'".into()))?;
        self.resources.read(ctx, uri).await
    }
}
