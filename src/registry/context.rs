//! Per-call request context (§4.6): resolved once per request and handed to
//! the dispatcher, rather than baking a client into a handler at
//! registration time.

#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Bearer token hash, or the literal `"default"` when auth is disabled.
    pub client_key: String,
    pub client_ip: String,
}

impl RequestContext {
    pub fn new(client_key: impl Into<String>, client_ip: impl Into<String>) -> Self {
        Self { client_key: client_key.into(), client_ip: client_ip.into() }
    }

    pub fn default_key(client_ip: impl Into<String>) -> Self {
        Self { client_key: "default".to_string(), client_ip: client_ip.into() }
    }
}
