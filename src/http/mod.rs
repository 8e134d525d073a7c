//! HTTP transport: client construction, TLS trust and JSON POSTs.

mod client;
pub mod tls;

pub use client::{HttpClient, PostResponse, USER_AGENT, build_client};
pub use tls::{SYSTEM_CA_FILE, SYSTEM_CA_PATH, TrustSource, resolve_trust_source};
