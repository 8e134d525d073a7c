use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::Value;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use super::error::{RawResponse, check_response};
use super::request::MagicRequest;
use super::response::{normalize_dates, unwrap_result};
use super::token::{
    GetTokenEnvelope, GetTokenParams, RetireTokenEnvelope, RetireTokenParams, SecurityToken,
};
use super::{GET_TOKEN, MAGIC_JSON, RETIRE_SECURITY_TOKEN, UNITY_JSON_ENDPOINT, UnityApi};
use crate::config::ClientOptions;
use crate::http::{HttpClient, build_client};
use crate::runtime::{RealRuntime, Runtime};

/// Wire format spoken by a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientType {
    Json,
}

/// Unity client speaking the JSON endpoints.
///
/// The token from the last successful `get_security_token` is stored on
/// the driver and sent with every magic call that does not carry its own.
/// The stored value is behind a mutex, but the acquire/use/retire order is
/// still the caller's to get right when a driver is shared.
pub struct JsonClientDriver {
    options: ClientOptions,
    http: HttpClient,
    security_token: Mutex<Option<SecurityToken>>,
}

impl JsonClientDriver {
    /// Creates a driver, discovering CA certificates on the local system.
    pub fn new(options: ClientOptions) -> Result<Self> {
        Self::with_runtime(&RealRuntime, options)
    }

    pub fn with_runtime<R: Runtime + ?Sized>(runtime: &R, options: ClientOptions) -> Result<Self> {
        options.validate()?;
        let client = build_client(runtime, &options)?;
        Ok(Self::from_parts(options, HttpClient::new(client)))
    }

    /// Creates a driver around an already configured HTTP client.
    pub fn from_parts(options: ClientOptions, http: HttpClient) -> Self {
        Self {
            options,
            http,
            security_token: Mutex::new(None),
        }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn client_type(&self) -> ClientType {
        ClientType::Json
    }

    pub fn has_security_token(&self) -> bool {
        self.stored_token().is_some()
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}{}/{}",
            self.options.base_unity_url(),
            UNITY_JSON_ENDPOINT,
            endpoint
        )
    }

    fn stored_token(&self) -> Option<SecurityToken> {
        self.security_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store_token(&self, token: Option<SecurityToken>) {
        *self
            .security_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }
}

fn log_request(endpoint: &str, elapsed: Duration) {
    info!(
        "Unity API JSON request ({}) {:.3}s",
        endpoint,
        elapsed.as_secs_f64()
    );
}

/// Magic responses are JSON; an empty body means no response at all.
fn parse_magic_body(body: &str) -> Result<RawResponse> {
    if body.trim().is_empty() {
        return Ok(RawResponse::Empty);
    }
    let value = serde_json::from_str(body).context("Failed to parse JSON response from Unity")?;
    Ok(RawResponse::Json(value))
}

#[async_trait]
impl UnityApi for JsonClientDriver {
    #[tracing::instrument(skip(self, request), fields(action = %request.action()))]
    async fn magic(&self, request: MagicRequest) -> Result<Value> {
        let token = self.stored_token();
        let envelope = request.to_envelope(
            self.options.appname(),
            token.as_ref(),
            self.options.timezone(),
        )?;

        let response = self
            .http
            .post_json(&self.endpoint_url(MAGIC_JSON), &envelope)
            .await?;

        let raw = parse_magic_body(&response.body)?;
        if let Err(e) = check_response(&raw) {
            warn!("{} failed: {}", request.action(), e.message());
            return Err(e.into());
        }
        log_request(
            &format!("{}:{}", MAGIC_JSON, request.action()),
            response.elapsed,
        );

        let value = match raw {
            RawResponse::Json(value) => value,
            _ => Value::Null,
        };
        Ok(normalize_dates(
            unwrap_result(value),
            self.options.timezone(),
        ))
    }

    #[tracing::instrument(skip(self, params))]
    async fn get_security_token(&self, params: GetTokenParams) -> Result<SecurityToken> {
        let username = params
            .username
            .as_deref()
            .or(self.options.username())
            .context("A username is required to get a security token")?;
        let password = params
            .password
            .as_deref()
            .or(self.options.password())
            .context("A password is required to get a security token")?;
        let appname = params.appname.as_deref().unwrap_or(self.options.appname());

        let envelope = GetTokenEnvelope {
            username,
            password,
            appname,
        };
        let response = self
            .http
            .post_json(&self.endpoint_url(GET_TOKEN), &envelope)
            .await?;

        let raw = RawResponse::from_body(&response.body);
        check_response(&raw)?;

        let token = match raw {
            RawResponse::Text(text) => SecurityToken::new(text.trim()),
            RawResponse::Json(Value::Number(number)) => SecurityToken::new(number.to_string()),
            other => bail!("Unexpected security token response: {:?}", other),
        };
        log_request(GET_TOKEN, response.elapsed);
        debug!("Acquired security token {}", token.masked());

        self.store_token(Some(token.clone()));
        Ok(token)
    }

    #[tracing::instrument(skip(self, params))]
    async fn retire_security_token(&self, params: RetireTokenParams) -> Result<()> {
        let token = params
            .token
            .or_else(|| self.stored_token())
            .context("No security token to retire")?;
        let appname = params.appname.as_deref().unwrap_or(self.options.appname());

        let envelope = RetireTokenEnvelope {
            token: token.as_str(),
            appname,
        };
        let response = self
            .http
            .post_json(&self.endpoint_url(RETIRE_SECURITY_TOKEN), &envelope)
            .await?;

        // Unity answers a successful retirement with an empty body or `null`
        match RawResponse::from_body(&response.body) {
            RawResponse::Empty | RawResponse::Json(Value::Null) => {}
            raw => check_response(&raw)?,
        }
        log_request(RETIRE_SECURITY_TOKEN, response.elapsed);
        debug!("Retired security token {}", token.masked());

        self.store_token(None);
        Ok(())
    }

    fn security_token(&self) -> Option<SecurityToken> {
        self.stored_token()
    }
}
