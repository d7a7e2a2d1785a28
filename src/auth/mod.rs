pub mod middleware;
pub mod session;
pub mod token_store;

pub use middleware::{require_bearer, AuthContext, AuthState};
pub use session::{IpRateLimiter, UserStore};
pub use token_store::{hash_token, TokenRecord, TokenStore};
