//! Security tokens and the parameters of the token endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque session credential issued by Unity.
///
/// The value never appears in `Debug` output; use [`SecurityToken::masked`]
/// when a token has to show up in logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecurityToken(String);

impl SecurityToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// First four and last four characters around `*********`. Tokens of 12
    /// characters or fewer are all stars.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 12 {
            return "*".repeat(chars.len().max(1));
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}*********{}", head, tail)
    }
}

impl fmt::Debug for SecurityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecurityToken({})", self.masked())
    }
}

impl From<&str> for SecurityToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for SecurityToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// Overrides for `GetToken`. Unset fields come from the client options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetTokenParams {
    pub username: Option<String>,
    pub password: Option<String>,
    pub appname: Option<String>,
}

impl GetTokenParams {
    pub fn credentials(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            appname: None,
        }
    }
}

/// Overrides for `RetireSecurityToken`. Without a token the client's stored
/// token is retired.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetireTokenParams {
    pub token: Option<SecurityToken>,
    pub appname: Option<String>,
}

impl RetireTokenParams {
    pub fn token(token: impl Into<SecurityToken>) -> Self {
        Self {
            token: Some(token.into()),
            appname: None,
        }
    }
}

/// Body of a `GetToken` request.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct GetTokenEnvelope<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub appname: &'a str,
}

/// Body of a `RetireSecurityToken` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RetireTokenEnvelope<'a> {
    pub token: &'a str,
    pub appname: &'a str,
}
