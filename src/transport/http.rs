//! Single-frame-in/single-frame-out JSON-RPC over HTTP (§4.1, §6, §7).
//! Bearer auth, when configured, runs ahead of the handler via
//! [`crate::auth::require_bearer`]; TLS termination, when configured, is
//! handled by the caller selecting `serve` vs `serve_tls`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{middleware, Extension, Json, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::{require_bearer, AuthContext, AuthState};
use crate::config::TlsConfig;
use crate::protocol::Protocol;
use crate::registry::RequestContext;
use crate::wire;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
struct HttpState {
    protocol: Arc<Protocol>,
}

pub fn router(protocol: Arc<Protocol>, auth: AuthState) -> Router {
    // 30 request burst, replenishing one every 2 seconds, per IP (§A ambient stack).
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(30)
        .finish()
        .expect("static governor config is valid");

    Router::new()
        .route("/rpc", post(rpc_handler))
        .route("/healthz", axum::routing::get(healthz))
        .layer(middleware::from_fn_with_state(auth, require_bearer))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(GovernorLayer::new(governor_conf))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(HttpState { protocol })
}

async fn healthz() -> &'static str {
    "ok"
}

async fn rpc_handler(
    State(state): State<HttpState>,
    Extension(auth): Extension<AuthContext>,
    body: Bytes,
) -> impl IntoResponse {
    let raw = String::from_utf8_lossy(&body);
    let ctx = RequestContext::new(auth.key, auth.client_ip);

    let response = match wire::decode(&raw) {
        Ok(frame) => state.protocol.handle(frame, ctx).await,
        Err(parse_error) => Some(parse_error),
    };

    match response {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        // A notification produces no JSON-RPC response body (§4.1).
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Stamp every request with a correlation id, propagated back on the
/// response and attached to the tracing span for the duration of the call.
async fn request_id_middleware(mut request: axum::extract::Request, next: middleware::Next) -> axum::response::Response {
    let request_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!("http_request", request_id = %request_id);
    let _entered = span.enter();

    request
        .headers_mut()
        .insert(HeaderName::from_static(REQUEST_ID_HEADER), HeaderValue::from_str(&request_id).unwrap());

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(HeaderName::from_static(REQUEST_ID_HEADER), HeaderValue::from_str(&request_id).unwrap());
    response
}

pub async fn serve(router: Router, addr: SocketAddr) -> crate::error::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "http transport listening");
    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub async fn serve_tls(router: Router, addr: SocketAddr, tls: &TlsConfig) -> crate::error::Result<()> {
    let cert = tls
        .cert_file
        .as_ref()
        .ok_or_else(|| crate::error::ServerError::Config("tls.cert_file is required".into()))?;
    let key = tls
        .key_file
        .as_ref()
        .ok_or_else(|| crate::error::ServerError::Config("tls.key_file is required".into()))?;

    let config = axum_server::tls_rustls::RustlsConfig::from_pem_file(cert, key)
        .await
        .map_err(|e| crate::error::ServerError::Config(format!("failed to load TLS material: {e}")))?;

    tracing::info!(%addr, "http transport listening (tls)");
    axum_server::bind_rustls(addr, config)
        .serve(router.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(|e| crate::error::ServerError::Other(e.to_string()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        let mut sig = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler");
        sig.recv().await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthState;
    use crate::registry::{ResourceRegistry, ToolRegistry};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn rpc_endpoint_round_trips_initialize() {
        let protocol = Arc::new(Protocol::new(ToolRegistry::new(), Arc::new(ResourceRegistry::new()), None));
        let addr: SocketAddr = "127.0.0.1:1234".parse().unwrap();
        let app = router(protocol, AuthState::disabled())
            .layer(axum::extract::connect_info::MockConnectInfo(addr));

        let body = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#;
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/rpc")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["result"]["protocolVersion"], crate::protocol::PROTOCOL_VERSION);
    }
}
