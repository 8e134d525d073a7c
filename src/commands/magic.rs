use anyhow::{Result, bail};
use log::debug;
use std::io::Write;

use super::{parse_value, print_json, with_session};
use crate::unity::request::MAX_PARAMETERS;
use crate::unity::{MagicRequest, SecurityToken, UnityApi};

/// Arguments of a magic action given on the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MagicArgs {
    pub action: String,
    pub user_id: Option<String>,
    pub patient_id: Option<String>,
    /// Values for `Parameter1` onwards, in order.
    pub parameters: Vec<String>,
    pub token: Option<SecurityToken>,
}

impl MagicArgs {
    fn to_request(&self) -> Result<MagicRequest> {
        if self.parameters.len() > MAX_PARAMETERS {
            bail!(
                "{} accepts at most {} parameters, got {}",
                self.action,
                MAX_PARAMETERS,
                self.parameters.len()
            );
        }

        let mut request = MagicRequest::new(self.action.as_str());
        if let Some(user_id) = &self.user_id {
            request = request.user_id(user_id.as_str());
        }
        if let Some(patient_id) = &self.patient_id {
            request = request.patient_id(parse_value(patient_id));
        }
        for (i, raw) in self.parameters.iter().enumerate() {
            request = request.parameter(i + 1, parse_value(raw));
        }
        Ok(request)
    }
}

/// Runs a magic action and prints its result as JSON.
#[tracing::instrument(skip(api, args, out), fields(action = %args.action))]
pub async fn magic<A: UnityApi + ?Sized, W: Write>(
    api: &A,
    args: MagicArgs,
    out: &mut W,
) -> Result<()> {
    let request = args.to_request()?;
    debug!("Running {}", request.action());

    let result = with_session(api, args.token, |token| api.magic(request.token(token))).await?;
    print_json(out, &result)
}

/// Runs `GetServerInfo` and prints its result as JSON.
pub async fn server_info<A: UnityApi + ?Sized, W: Write>(
    api: &A,
    token: Option<SecurityToken>,
    user_id: Option<String>,
    out: &mut W,
) -> Result<()> {
    let args = MagicArgs {
        action: "GetServerInfo".to_string(),
        user_id,
        token,
        ..Default::default()
    };
    magic(api, args, out).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unity::MockUnityApi;
    use chrono_tz::Tz;
    use serde_json::json;

    fn envelope(request: &MagicRequest) -> serde_json::Value {
        serde_json::to_value(request.to_envelope("TestApp", None, Tz::UTC).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_magic_with_supplied_token() {
        let mut api = MockUnityApi::new();
        api.expect_magic()
            .withf(|request| {
                let body = envelope(request);
                body["Action"] == "GetPatient"
                    && body["AppUserID"] == "jmedici"
                    && body["PatientID"] == 42
                    && body["Parameter1"] == "Y"
                    && body["Parameter2"] == json!({"a": 1})
                    && body["Token"] == "tok-1"
            })
            .times(1)
            .returning(|_| Ok(json!({"ID": 42})));

        let args = MagicArgs {
            action: "GetPatient".to_string(),
            user_id: Some("jmedici".to_string()),
            patient_id: Some("42".to_string()),
            parameters: vec!["Y".to_string(), r#"{"a":1}"#.to_string()],
            token: Some(SecurityToken::new("tok-1")),
        };

        let mut out = Vec::new();
        magic(&api, args, &mut out).await.unwrap();

        let printed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(printed, json!({"ID": 42}));
    }

    #[tokio::test]
    async fn test_magic_runs_in_session_without_token() {
        let mut api = MockUnityApi::new();
        api.expect_get_security_token()
            .times(1)
            .returning(|_| Ok(SecurityToken::new("session")));
        api.expect_magic()
            .withf(|request| request.token_override() == Some(&SecurityToken::new("session")))
            .times(1)
            .returning(|_| Ok(json!([])));
        api.expect_retire_security_token()
            .times(1)
            .returning(|_| Ok(()));

        let args = MagicArgs {
            action: "GetServerInfo".to_string(),
            ..Default::default()
        };

        let mut out = Vec::new();
        magic(&api, args, &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[]\n");
    }

    #[tokio::test]
    async fn test_magic_rejects_too_many_parameters() {
        let api = MockUnityApi::new();
        let args = MagicArgs {
            action: "SaveTask".to_string(),
            parameters: vec!["x".to_string(); 7],
            token: Some(SecurityToken::new("tok-1")),
            ..Default::default()
        };

        let mut out = Vec::new();
        let err = magic(&api, args, &mut out).await.unwrap_err();
        assert!(err.to_string().contains("at most 6 parameters"));
    }

    #[tokio::test]
    async fn test_server_info() {
        let mut api = MockUnityApi::new();
        api.expect_magic()
            .withf(|request| request.action() == "GetServerInfo")
            .times(1)
            .returning(|_| Ok(json!([{"ProductVersion": "11.2"}])));

        let mut out = Vec::new();
        server_info(&api, Some(SecurityToken::new("tok-1")), None, &mut out)
            .await
            .unwrap();

        let printed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(printed, json!([{"ProductVersion": "11.2"}]));
    }
}
