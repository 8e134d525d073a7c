//! Allscripts Unity JSON API binding.
//!
//! # Structure
//!
//! - `request` - magic action requests and their JSON envelope
//! - `response` - unwrapping and timezone-aware date normalization of results
//! - `error` - classification of Unity's in-body error shapes
//! - `token` - security tokens and token endpoint parameters
//! - `driver` - the reqwest-backed [`JsonClientDriver`]
//! - `actions` - helpers for frequently used magic actions

pub mod actions;
mod driver;
pub mod error;
pub mod request;
pub mod response;
pub mod token;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

pub use driver::{ClientType, JsonClientDriver};
pub use error::{ApiError, RawResponse, check_response};
pub use request::{MagicEnvelope, MagicRequest, MagicValue};
pub use response::{normalize_dates, unwrap_result};
pub use token::{GetTokenParams, RetireTokenParams, SecurityToken};

/// Root of the JSON service under the base URL.
pub const UNITY_JSON_ENDPOINT: &str = "/Unity/UnityService.svc/json";
pub const MAGIC_JSON: &str = "MagicJson";
pub const GET_TOKEN: &str = "GetToken";
pub const RETIRE_SECURITY_TOKEN: &str = "RetireSecurityToken";

/// Operations offered by a Unity client.
///
/// Every call is one request/response round trip. Failures reported by
/// Unity surface as [`ApiError`]; transport failures surface as the
/// underlying `reqwest::Error`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UnityApi: Send + Sync {
    /// Runs a magic action and returns its normalized result.
    async fn magic(&self, request: MagicRequest) -> Result<Value>;

    /// Acquires a security token, stores it and returns it.
    async fn get_security_token(&self, params: GetTokenParams) -> Result<SecurityToken>;

    /// Retires a security token and clears the stored one.
    async fn retire_security_token(&self, params: RetireTokenParams) -> Result<()>;

    /// The currently stored token, if any.
    fn security_token(&self) -> Option<SecurityToken>;
}
