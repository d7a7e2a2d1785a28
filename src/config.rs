//! YAML config loading with CLI flag > env var (`PGEDGE_*`) > config file >
//! default precedence, and TLS/auth validation (§6).

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

use crate::error::{Result, ServerError};

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TlsConfig {
    #[serde(default)]
    pub enabled: bool,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    pub chain_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub enabled: bool,
    pub token_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct HttpConfig {
    #[serde(default)]
    pub enabled: bool,
    pub address: Option<String>,
    #[serde(default)]
    pub tls: TlsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Trust a single `X-Forwarded-For` hop when resolving the client IP (§4.1).
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct EmbeddingConfig {
    pub provider: Option<String>,
    pub api_key_env: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    pub preferences_file: Option<PathBuf>,
    pub secret_file: Option<PathBuf>,
    pub database_url: Option<String>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            embedding: EmbeddingConfig::default(),
            preferences_file: None,
            secret_file: None,
            database_url: None,
        }
    }
}

/// CLI flags. Each overrides the matching env var / config file / default.
#[derive(Debug, Parser)]
#[command(name = "pgedge-mcp-server")]
pub struct CliArgs {
    #[arg(long, env = "PGEDGE_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "PGEDGE_TRANSPORT", value_parser = ["stdio", "http"])]
    pub transport: Option<String>,

    #[arg(long, env = "PGEDGE_HTTP_ADDRESS")]
    pub http_address: Option<String>,

    #[arg(long, env = "PGEDGE_AUTH_TOKEN_FILE")]
    pub auth_token_file: Option<PathBuf>,

    #[arg(long, env = "PGEDGE_DATABASE_URL")]
    pub database_url: Option<String>,
}

/// Fully resolved, validated runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub transport: Transport,
    pub http: HttpConfig,
    pub preferences_file: PathBuf,
    pub secret_file: PathBuf,
    pub database_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    Http,
}

impl Config {
    pub fn load(args: CliArgs) -> Result<Self> {
        let file: FileConfig = match &args.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                serde_yaml::from_str(&raw)?
            }
            None => FileConfig::default(),
        };

        let mut http = file.http;
        if let Some(addr) = args.http_address.clone() {
            http.address = Some(addr);
        }
        if let Some(path) = args.auth_token_file.clone() {
            http.auth.enabled = true;
            http.auth.token_file = Some(path);
        }

        let transport = match args.transport.as_deref() {
            Some("http") => Transport::Http,
            Some("stdio") => Transport::Stdio,
            _ if http.enabled => Transport::Http,
            _ => Transport::Stdio,
        };

        let preferences_file = file
            .preferences_file
            .unwrap_or_else(|| PathBuf::from("connections.yaml"));
        let secret_file = file.secret_file.unwrap_or_else(|| PathBuf::from("secret.key"));
        let database_url = args.database_url.or(file.database_url);

        let config = Config { transport, http, preferences_file, secret_file, database_url };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.http.tls.enabled && !self.http.enabled {
            return Err(ServerError::Config(
                "TLS is enabled but the HTTP transport is not".into(),
            ));
        }
        if self.http.tls.enabled
            && (self.http.tls.cert_file.is_none() || self.http.tls.key_file.is_none())
        {
            return Err(ServerError::Config(
                "TLS requires both cert_file and key_file".into(),
            ));
        }
        if self.http.auth.enabled && self.http.auth.token_file.is_none() {
            return Err(ServerError::Config(
                "auth is enabled but no token_file is configured".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tls_without_http_is_rejected() {
        let cfg = Config {
            transport: Transport::Http,
            http: HttpConfig {
                enabled: false,
                tls: TlsConfig { enabled: true, cert_file: Some("a".into()), key_file: Some("b".into()), chain_file: None },
                ..Default::default()
            },
            preferences_file: "p".into(),
            secret_file: "s".into(),
            database_url: None,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn auth_without_token_file_is_rejected() {
        let cfg = Config {
            transport: Transport::Http,
            http: HttpConfig {
                enabled: true,
                auth: AuthConfig { enabled: true, token_file: None },
                ..Default::default()
            },
            preferences_file: "p".into(),
            secret_file: "s".into(),
            database_url: None,
        };
        assert!(cfg.validate().is_err());
    }
}
