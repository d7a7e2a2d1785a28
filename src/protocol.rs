//! The JSON-RPC method multiplexer (§4.2). Transport-agnostic: both the
//! stdio and HTTP transports hand it a decoded [`RequestFrame`] plus the
//! [`RequestContext`] they resolved, and get back an optional
//! [`ResponseFrame`] (`None` for notifications).

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use crate::auth::{IpRateLimiter, UserStore};
use crate::error::{Result, ServerError};
use crate::registry::{RequestContext, ResourceRegistry, ToolRegistry};
use crate::wire::{RequestFrame, ResponseFrame};

pub const PROTOCOL_VERSION: &str = "2025-06-18";
const SERVER_NAME: &str = "pgedge-mcp-server";
const SESSION_TTL: Duration = Duration::from_secs(3600);

pub struct Protocol {
    tools: ToolRegistry,
    resources: Arc<ResourceRegistry>,
    user_store: Option<Arc<dyn UserStore>>,
    rate_limiter: IpRateLimiter,
}

impl Protocol {
    pub fn new(tools: ToolRegistry, resources: Arc<ResourceRegistry>, user_store: Option<Arc<dyn UserStore>>) -> Self {
        Self { tools, resources, user_store, rate_limiter: IpRateLimiter::new() }
    }

    /// Handle one decoded frame. Returns `None` for notifications, which
    /// never get a response per JSON-RPC 2.0.
    pub async fn handle(&self, frame: RequestFrame, ctx: RequestContext) -> Option<ResponseFrame> {
        if frame.is_notification() {
            self.handle_notification(&frame.method, frame.params).await;
            return None;
        }

        let id = frame.id.clone().unwrap_or(Value::Null);
        match self.dispatch(&frame.method, frame.params.unwrap_or(Value::Null), &ctx).await {
            Ok(result) => Some(ResponseFrame::ok(id, result)),
            Err(e) => Some(ResponseFrame::err_value(id, e.to_rpc_error())),
        }
    }

    async fn handle_notification(&self, method: &str, _params: Option<Value>) {
        match method {
            "notifications/initialized" => tracing::debug!("client completed initialization"),
            other => tracing::debug!(method = other, "unhandled notification"),
        }
    }

    async fn dispatch(&self, method: &str, params: Value, ctx: &RequestContext) -> Result<Value> {
        match method {
            "initialize" => Ok(self.initialize_result(&params)),
            "tools/list" => Ok(json!({ "tools": self.tools.list() })),
            "tools/call" => self.call_tool(params, ctx).await,
            "resources/list" => Ok(json!({ "resources": self.resources.list() })),
            "resources/read" => self.read_resource(params, ctx).await,
            // Registered but deliberately excluded from tools/list (§9 design note):
            // a client needs to already know the method name to use it.
            "authenticate_user" => self.authenticate_user(params, ctx).await,
            other => Err(ServerError::MethodNotFound(other.to_string())),
        }
    }

    /// Echo the client's `protocolVersion` when it sent a non-empty one
    /// (§4.2, §6); otherwise advertise the server's own constant.
    fn initialize_result(&self, params: &Value) -> Value {
        let protocol_version = params
            .get("protocolVersion")
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .unwrap_or(PROTOCOL_VERSION);

        json!({
            "protocolVersion": protocol_version,
            "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") },
            "capabilities": { "tools": {}, "resources": {} },
        })
    }

    async fn call_tool(&self, params: Value, ctx: &RequestContext) -> Result<Value> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ServerError::InvalidParams("missing 'name'".into()))?;
        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

        match self.tools.call(name, ctx, arguments).await {
            Ok(content) => Ok(json!({ "content": [content], "isError": false })),
            Err(e) => Ok(json!({
                "content": [{ "type": "text", "text": e.to_string() }],
                "isError": true,
            })),
        }
    }

    async fn read_resource(&self, params: Value, ctx: &RequestContext) -> Result<Value> {
        let uri = params
            .get("uri")
            .and_then(Value::as_str)
            .ok_or_else(|| ServerError::InvalidParams("missing 'uri'".into()))?;
        let content = self.resources.read(ctx, uri).await?;
        Ok(json!({ "contents": [content] }))
    }

    /// Exchange a username/password for a session token (§4.8). Requires a
    /// [`UserStore`] to have been wired by the deployment; otherwise this
    /// method is unreachable regardless of discovery.
    async fn authenticate_user(&self, params: Value, ctx: &RequestContext) -> Result<Value> {
        let store = self
            .user_store
            .as_ref()
            .ok_or_else(|| ServerError::Other("authentication is not configured".into()))?;

        if !self.rate_limiter.check(&ctx.client_ip).await {
            return Err(ServerError::Unauthorized);
        }

        let username = params
            .get("username")
            .and_then(Value::as_str)
            .ok_or_else(|| ServerError::InvalidParams("missing 'username'".into()))?;
        let password = params
            .get("password")
            .and_then(Value::as_str)
            .ok_or_else(|| ServerError::InvalidParams("missing 'password'".into()))?;

        if store.validate_credentials(username, password).await {
            self.rate_limiter.record_success(&ctx.client_ip).await;
            let session = crate::auth::session::issue_session_token(SESSION_TTL);
            Ok(json!({ "token": session.token, "expiresAt": session.expires_at }))
        } else {
            self.rate_limiter.record_failure(&ctx.client_ip).await;
            Err(ServerError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let protocol = Protocol::new(ToolRegistry::new(), Arc::new(ResourceRegistry::new()), None);
        let ctx = RequestContext::default_key("127.0.0.1");
        let frame = RequestFrame { jsonrpc: None, id: Some(json!(1)), method: "nope".into(), params: None };
        let response = protocol.handle(frame, ctx).await.unwrap();
        assert_eq!(response.error.unwrap()["code"], -32601);
    }

    #[tokio::test]
    async fn initialize_echoes_client_protocol_version() {
        let protocol = Protocol::new(ToolRegistry::new(), Arc::new(ResourceRegistry::new()), None);
        let ctx = RequestContext::default_key("127.0.0.1");
        let frame = RequestFrame {
            jsonrpc: None,
            id: Some(json!(1)),
            method: "initialize".into(),
            params: Some(json!({ "protocolVersion": "2024-11-05", "capabilities": {}, "clientInfo": { "name": "c", "version": "1" } })),
        };
        let response = protocol.handle(frame, ctx).await.unwrap();
        assert_eq!(response.result.unwrap()["protocolVersion"], "2024-11-05");
    }

    #[tokio::test]
    async fn initialize_defaults_when_client_sends_no_version() {
        let protocol = Protocol::new(ToolRegistry::new(), Arc::new(ResourceRegistry::new()), None);
        let ctx = RequestContext::default_key("127.0.0.1");
        let frame = RequestFrame { jsonrpc: None, id: Some(json!(1)), method: "initialize".into(), params: Some(json!({})) };
        let response = protocol.handle(frame, ctx).await.unwrap();
        assert_eq!(response.result.unwrap()["protocolVersion"], PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn notification_yields_no_response() {
        let protocol = Protocol::new(ToolRegistry::new(), Arc::new(ResourceRegistry::new()), None);
        let ctx = RequestContext::default_key("127.0.0.1");
        let frame = RequestFrame {
            jsonrpc: None,
            id: None,
            method: "notifications/initialized".into(),
            params: None,
        };
        assert!(protocol.handle(frame, ctx).await.is_none());
    }

    #[tokio::test]
    async fn authenticate_user_without_store_is_unavailable() {
        let protocol = Protocol::new(ToolRegistry::new(), Arc::new(ResourceRegistry::new()), None);
        let ctx = RequestContext::default_key("127.0.0.1");
        let frame = RequestFrame {
            jsonrpc: None,
            id: Some(json!(1)),
            method: "authenticate_user".into(),
            params: Some(json!({ "username": "a", "password": "b" })),
        };
        let response = protocol.handle(frame, ctx).await.unwrap();
        assert!(response.error.is_some());
    }

    #[tokio::test]
    async fn authenticate_user_is_hidden_from_discovery() {
        let protocol = Protocol::new(ToolRegistry::new(), Arc::new(ResourceRegistry::new()), None);
        let ctx = RequestContext::default_key("127.0.0.1");
        let frame = RequestFrame { jsonrpc: None, id: Some(json!(1)), method: "tools/list".into(), params: None };
        let response = protocol.handle(frame, ctx).await.unwrap();
        let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
        assert!(tools.iter().all(|t| t["name"] != "authenticate_user"));
    }
}
