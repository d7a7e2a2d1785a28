//! End-to-end JSON-RPC tests driving the public API the way a deployment
//! would: build a `Protocol` with empty registries and a default client
//! manager, and exercise the stdio and HTTP transports against it.

use std::sync::Arc;

use pgedge_mcp_server::auth::AuthState;
use pgedge_mcp_server::protocol::Protocol;
use pgedge_mcp_server::registry::{ResourceRegistry, ToolRegistry};
use pgedge_mcp_server::transport::{http, stdio};

fn bare_protocol() -> Protocol {
    Protocol::new(ToolRegistry::new(), Arc::new(ResourceRegistry::new()), None)
}

#[tokio::test]
async fn stdio_transport_handles_initialize_then_eof() {
    let protocol = bare_protocol();
    let input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\",\"params\":{}}\n".to_vec();
    let reader = tokio::io::BufReader::new(&input[..]);
    let mut output = Vec::new();

    stdio::run(&protocol, "default", reader, &mut output).await.unwrap();

    let response: serde_json::Value = serde_json::from_slice(
        output.split(|&b| b == b'\n').next().unwrap(),
    )
    .unwrap();
    assert_eq!(response["result"]["serverInfo"]["name"], "pgedge-mcp-server");
}

#[tokio::test]
async fn stdio_transport_rejects_malformed_json_with_parse_error() {
    let protocol = bare_protocol();
    let input = b"not json at all\n".to_vec();
    let reader = tokio::io::BufReader::new(&input[..]);
    let mut output = Vec::new();

    stdio::run(&protocol, "default", reader, &mut output).await.unwrap();

    let response: serde_json::Value = serde_json::from_slice(
        output.split(|&b| b == b'\n').next().unwrap(),
    )
    .unwrap();
    assert_eq!(response["error"]["code"], -32700);
}

#[tokio::test]
async fn http_transport_requires_bearer_when_auth_enabled() {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt as _;
    use pgedge_mcp_server::auth::TokenStore;
    use tower::ServiceExt;

    let token_path = std::env::temp_dir().join(format!("pgedge-mcp-it-tokens-{}.yaml", std::process::id()));
    let _ = tokio::fs::remove_file(&token_path).await;
    let store = TokenStore::load(&token_path).await.unwrap();
    let (plaintext, _) = store.create("integration-test").await.unwrap();

    let auth = AuthState::from_config(Some(Arc::new(store)), &pgedge_mcp_server::config::HttpConfig::default());
    let protocol = Arc::new(bare_protocol());
    let addr: std::net::SocketAddr = "127.0.0.1:9".parse().unwrap();
    let app = http::router(protocol, auth).layer(axum::extract::connect_info::MockConnectInfo(addr));

    let unauthorized = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/rpc")
                .body(Body::from(r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);

    let authorized = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/rpc")
                .header("authorization", format!("Bearer {plaintext}"))
                .body(Body::from(r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(authorized.status(), StatusCode::OK);
    let bytes = authorized.into_body().collect().await.unwrap().to_bytes();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["result"]["protocolVersion"], pgedge_mcp_server::protocol::PROTOCOL_VERSION);

    tokio::fs::remove_file(&token_path).await.ok();
}
