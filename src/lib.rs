pub mod app;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod resources_impl;
pub mod tools_impl;
pub mod transport;
pub mod wire;

use std::path::PathBuf;
use std::sync::Arc;

use crate::app::AppShared;
use crate::auth::{AuthState, TokenStore};
use crate::config::{Config, Transport};
use crate::crypto::EncryptionKey;
use crate::db::{ClientManager, SavedConnectionStore};
use crate::error::Result;
use crate::protocol::Protocol;
use crate::registry::{ResourceRegistry, ToolRegistry};

/// Configure the global tracing subscriber (§A). `PGEDGE_LOG_FORMAT=json`
/// switches to structured JSON output; otherwise lines are human-readable.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("PGEDGE_LOG_FORMAT").map(|v| v == "json").unwrap_or(false);

    if json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt().with_env_filter(filter).init();
    }
}

/// Assemble every long-lived piece of server state from a validated config
/// and hand back the pieces `main` needs to start a transport.
pub struct Server {
    pub config: Config,
    pub protocol: Arc<Protocol>,
    pub auth: AuthState,
}

pub async fn build(config: Config) -> Result<Server> {
    let encryption_key = EncryptionKey::load_or_generate(&config.secret_file)?;
    let connections = Arc::new(SavedConnectionStore::load(&config.preferences_file, encryption_key).await?);
    let clients = Arc::new(ClientManager::new());

    let token_store = if config.http.auth.enabled {
        let path = config
            .http
            .auth
            .token_file
            .clone()
            .unwrap_or_else(|| PathBuf::from("tokens.yaml"));
        Some(Arc::new(TokenStore::load(path).await?))
    } else {
        None
    };
    let auth = AuthState::from_config(token_store, &config.http);

    let shared = Arc::new(AppShared {
        clients,
        connections,
        default_database_url: config.database_url.clone(),
        embedding_configured: false,
        allowed_read_dir: PathBuf::from("."),
        started_at: chrono::Utc::now(),
    });

    let mut resources = ResourceRegistry::new();
    resources_impl::register_all(&mut resources, shared.clone());
    let resources = Arc::new(resources);

    let mut tools = ToolRegistry::new();
    tools_impl::register_all(&mut tools, shared.clone(), resources.clone());

    let protocol = Arc::new(Protocol::new(tools, resources, None));

    Ok(Server { config, protocol, auth })
}

pub async fn run(server: Server) -> Result<()> {
    match server.config.transport {
        Transport::Stdio => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let stdout = tokio::io::stdout();
            transport::stdio::run(&server.protocol, "default", stdin, stdout).await
        }
        Transport::Http => {
            let addr = server
                .config
                .http
                .address
                .clone()
                .unwrap_or_else(|| "0.0.0.0:8080".to_string());
            let addr: std::net::SocketAddr = addr
                .parse()
                .map_err(|e| crate::error::ServerError::Config(format!("invalid http address: {e}")))?;
            let router = transport::http::router(server.protocol.clone(), server.auth.clone());
            if server.config.http.tls.enabled {
                transport::http::serve_tls(router, addr, &server.config.http.tls).await
            } else {
                transport::http::serve(router, addr).await
            }
        }
    }
}
