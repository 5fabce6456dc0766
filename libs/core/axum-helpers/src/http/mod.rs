//! HTTP middleware module.
//!
//! - CORS configuration derived from [`ServerConfig`](core_config::server::ServerConfig)
//! - Security headers
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::http::{cors_layer_from_config, security_headers};
//!
//! let cors = cors_layer_from_config(&config.server, &config.environment)?;
//! let app = Router::new()
//!     .layer(axum::middleware::from_fn(security_headers))
//!     .layer(cors);
//! ```

pub mod cors;
pub mod security;

pub use cors::{cors_layer_from_config, create_cors_layer, create_permissive_cors_layer};
pub use security::security_headers;
