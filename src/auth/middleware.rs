//! HTTP bearer-token middleware (§4.1, §4.8). Mirrors the teacher's
//! `require_auth` in shape but resolves against the [`TokenStore`] and
//! publishes the resolved hash as a request extension instead of a
//! pass/fail boolean, so downstream dispatch can key off it (§4.6).

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

use super::token_store::TokenStore;
use crate::config::HttpConfig;

/// Resolved caller identity for one HTTP request, attached via extension.
#[derive(Clone, Debug)]
pub struct AuthContext {
    /// Token hash, or the literal `"default"` when auth is disabled (§3, §4.6).
    pub key: String,
    pub client_ip: String,
}

#[derive(Clone)]
pub struct AuthState {
    pub store: Option<Arc<TokenStore>>,
    pub trust_forwarded_for: bool,
}

impl AuthState {
    pub fn disabled() -> Self {
        Self { store: None, trust_forwarded_for: false }
    }

    pub fn from_config(store: Option<Arc<TokenStore>>, http: &HttpConfig) -> Self {
        Self { store, trust_forwarded_for: http.trust_forwarded_for }
    }
}

pub async fn require_bearer(
    State(auth): State<AuthState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let client_ip = resolve_client_ip(&request, addr, auth.trust_forwarded_for);

    let key = match &auth.store {
        None => "default".to_string(),
        Some(store) => {
            let header = request
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok());
            let token = header
                .and_then(|h| h.strip_prefix("Bearer "))
                .ok_or(StatusCode::UNAUTHORIZED)?;
            store.verify(token).await.ok_or(StatusCode::UNAUTHORIZED)?
        }
    };

    request.extensions_mut().insert(AuthContext { key, client_ip });
    Ok(next.run(request).await)
}

fn resolve_client_ip(request: &Request, peer: SocketAddr, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        if let Some(xff) = request.headers().get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
            if let Some(first) = xff.split(',').next() {
                let candidate = first.trim();
                if !candidate.is_empty() {
                    return candidate.to_string();
                }
            }
        }
    }
    peer.ip().to_string()
}
