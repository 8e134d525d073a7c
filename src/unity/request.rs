//! Marshaling of magic action requests.

use anyhow::{Result, bail};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::token::SecurityToken;

/// Number of positional parameters a magic action accepts.
pub const MAX_PARAMETERS: usize = 6;

/// A value sent to a magic action.
#[derive(Debug, Clone, PartialEq)]
pub enum MagicValue {
    /// Sent as is.
    Json(Value),
    /// Rendered in the client's timezone.
    DateTime(DateTime<Utc>),
    /// Rendered as `YYYY-MM-DD`.
    Date(NaiveDate),
}

impl MagicValue {
    fn to_json(&self, timezone: Tz) -> Value {
        match self {
            MagicValue::Json(value) => value.clone(),
            MagicValue::DateTime(at) => Value::String(
                at.with_timezone(&timezone)
                    .to_rfc3339_opts(SecondsFormat::Secs, false),
            ),
            MagicValue::Date(date) => Value::String(date.format("%Y-%m-%d").to_string()),
        }
    }
}

impl From<Value> for MagicValue {
    fn from(value: Value) -> Self {
        MagicValue::Json(value)
    }
}

impl From<&str> for MagicValue {
    fn from(value: &str) -> Self {
        MagicValue::Json(Value::String(value.to_string()))
    }
}

impl From<String> for MagicValue {
    fn from(value: String) -> Self {
        MagicValue::Json(Value::String(value))
    }
}

impl From<i64> for MagicValue {
    fn from(value: i64) -> Self {
        MagicValue::Json(Value::from(value))
    }
}

impl From<i32> for MagicValue {
    fn from(value: i32) -> Self {
        MagicValue::Json(Value::from(value))
    }
}

impl From<u64> for MagicValue {
    fn from(value: u64) -> Self {
        MagicValue::Json(Value::from(value))
    }
}

impl From<bool> for MagicValue {
    fn from(value: bool) -> Self {
        MagicValue::Json(Value::Bool(value))
    }
}

impl From<DateTime<Utc>> for MagicValue {
    fn from(value: DateTime<Utc>) -> Self {
        MagicValue::DateTime(value)
    }
}

impl From<NaiveDate> for MagicValue {
    fn from(value: NaiveDate) -> Self {
        MagicValue::Date(value)
    }
}

/// A call to Unity's generic `MagicJson` dispatch endpoint.
///
/// ```
/// use unity_client::unity::MagicRequest;
///
/// let request = MagicRequest::new("GetPatient")
///     .user_id("jmedici")
///     .patient_id(42)
///     .parameter(1, "Y");
/// assert_eq!(request.action(), "GetPatient");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MagicRequest {
    action: String,
    user_id: Option<String>,
    appname: Option<String>,
    patient_id: Option<MagicValue>,
    token: Option<SecurityToken>,
    parameters: BTreeMap<usize, MagicValue>,
    data: Option<Vec<u8>>,
}

impl MagicRequest {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Default::default()
        }
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Overrides the client's app name for this call.
    pub fn appname(mut self, appname: impl Into<String>) -> Self {
        self.appname = Some(appname.into());
        self
    }

    pub fn patient_id(mut self, patient_id: impl Into<MagicValue>) -> Self {
        self.patient_id = Some(patient_id.into());
        self
    }

    /// Uses `token` instead of the client's stored token.
    pub fn token(mut self, token: impl Into<SecurityToken>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets `ParameterN`, counting from 1.
    pub fn parameter(mut self, index: usize, value: impl Into<MagicValue>) -> Self {
        self.parameters.insert(index, value.into());
        self
    }

    /// Binary payload, sent base64 encoded in `Data`.
    pub fn data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn token_override(&self) -> Option<&SecurityToken> {
        self.token.as_ref()
    }

    /// Builds the request body.
    ///
    /// `appname` and `token` are the client's values; the request's own
    /// overrides take precedence over them.
    pub fn to_envelope(
        &self,
        appname: &str,
        token: Option<&SecurityToken>,
        timezone: Tz,
    ) -> Result<MagicEnvelope> {
        if let Some(index) = self
            .parameters
            .keys()
            .find(|i| **i == 0 || **i > MAX_PARAMETERS)
        {
            bail!(
                "Parameter index {} is out of range (1 to {})",
                index,
                MAX_PARAMETERS
            );
        }

        let parameter = |index: usize| {
            self.parameters
                .get(&index)
                .map(|value| value.to_json(timezone))
                .unwrap_or_else(|| Value::String(String::new()))
        };

        Ok(MagicEnvelope {
            action: self.action.clone(),
            app_user_id: self.user_id.clone(),
            appname: self.appname.as_deref().unwrap_or(appname).to_string(),
            patient_id: self
                .patient_id
                .as_ref()
                .map(|id| id.to_json(timezone))
                .unwrap_or(Value::Null),
            token: self
                .token
                .as_ref()
                .or(token)
                .map(|t| t.as_str().to_string()),
            parameter1: parameter(1),
            parameter2: parameter(2),
            parameter3: parameter(3),
            parameter4: parameter(4),
            parameter5: parameter(5),
            parameter6: parameter(6),
            data: self.data.as_ref().map(|bytes| STANDARD.encode(bytes)),
        })
    }
}

/// The JSON body Unity expects at `MagicJson`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MagicEnvelope {
    pub action: String,
    #[serde(rename = "AppUserID")]
    pub app_user_id: Option<String>,
    pub appname: String,
    #[serde(rename = "PatientID")]
    pub patient_id: Value,
    pub token: Option<String>,
    pub parameter1: Value,
    pub parameter2: Value,
    pub parameter3: Value,
    pub parameter4: Value,
    pub parameter5: Value,
    pub parameter6: Value,
    pub data: Option<String>,
}
