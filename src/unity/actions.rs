//! Helpers for frequently used magic actions.
//!
//! Each helper only fills in the action name and positional parameters;
//! the token and app name come from the client as for any other call.

use anyhow::Result;
use serde_json::Value;

use super::request::MagicRequest;
use super::UnityApi;

/// `GetServerInfo`: server version, time zone and UAI build details.
#[tracing::instrument(skip(api))]
pub async fn get_server_info<A: UnityApi + ?Sized>(api: &A) -> Result<Value> {
    api.magic(MagicRequest::new("GetServerInfo")).await
}

/// `GetUserAuthentication`: validates an EHR user's password.
#[tracing::instrument(skip(api, password))]
pub async fn get_user_authentication<A: UnityApi + ?Sized>(
    api: &A,
    user_id: &str,
    password: &str,
) -> Result<Value> {
    api.magic(
        MagicRequest::new("GetUserAuthentication")
            .user_id(user_id)
            .parameter(1, password),
    )
    .await
}

/// `GetPatient`: demographics, optionally with the patient's picture.
#[tracing::instrument(skip(api))]
pub async fn get_patient<A: UnityApi + ?Sized>(
    api: &A,
    user_id: &str,
    patient_id: &str,
    include_picture: bool,
) -> Result<Value> {
    let picture_flag = if include_picture { "Y" } else { "" };
    api.magic(
        MagicRequest::new("GetPatient")
            .user_id(user_id)
            .patient_id(patient_id)
            .parameter(1, picture_flag),
    )
    .await
}

/// `SearchPatients`: free text search by name, MRN or date of birth.
#[tracing::instrument(skip(api))]
pub async fn search_patients<A: UnityApi + ?Sized>(
    api: &A,
    user_id: &str,
    search: &str,
) -> Result<Value> {
    api.magic(
        MagicRequest::new("SearchPatients")
            .user_id(user_id)
            .parameter(1, search),
    )
    .await
}

/// `GetClinicalSummary`: one section (problems, medications, ...) or all
/// of them when `section` is `None`.
#[tracing::instrument(skip(api))]
pub async fn get_clinical_summary<A: UnityApi + ?Sized>(
    api: &A,
    user_id: &str,
    patient_id: &str,
    section: Option<&str>,
) -> Result<Value> {
    let mut request = MagicRequest::new("GetClinicalSummary")
        .user_id(user_id)
        .patient_id(patient_id);
    if let Some(section) = section {
        request = request.parameter(1, section);
    }
    api.magic(request).await
}

/// `GetProvider`: looks a provider up by id or, failing that, user name.
#[tracing::instrument(skip(api))]
pub async fn get_provider<A: UnityApi + ?Sized>(
    api: &A,
    provider_id: Option<&str>,
    user_name: Option<&str>,
) -> Result<Value> {
    api.magic(
        MagicRequest::new("GetProvider")
            .parameter(1, provider_id.unwrap_or_default())
            .parameter(2, user_name.unwrap_or_default()),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unity::{MagicValue, MockUnityApi};
    use chrono_tz::Tz;
    use serde_json::json;

    /// Expects exactly one magic call and checks its marshaled envelope.
    fn expect_magic(api: &mut MockUnityApi, expected: Value) {
        api.expect_magic()
            .withf(move |request| {
                let envelope = serde_json::to_value(
                    request.to_envelope("TestApp", None, Tz::UTC).unwrap(),
                )
                .unwrap();
                expected
                    .as_object()
                    .unwrap()
                    .iter()
                    .all(|(key, value)| envelope.get(key) == Some(value))
            })
            .times(1)
            .returning(|_| Ok(json!({"ok": true})));
    }

    #[tokio::test]
    async fn test_get_server_info() {
        let mut api = MockUnityApi::new();
        expect_magic(
            &mut api,
            json!({"Action": "GetServerInfo", "Parameter1": "", "PatientID": null}),
        );

        let result = get_server_info(&api).await.unwrap();
        assert_eq!(result, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_get_user_authentication() {
        let mut api = MockUnityApi::new();
        expect_magic(
            &mut api,
            json!({"Action": "GetUserAuthentication", "AppUserID": "jmedici", "Parameter1": "pw"}),
        );

        get_user_authentication(&api, "jmedici", "pw").await.unwrap();
    }

    #[tokio::test]
    async fn test_get_patient_with_picture() {
        let mut api = MockUnityApi::new();
        expect_magic(
            &mut api,
            json!({"Action": "GetPatient", "PatientID": "42", "Parameter1": "Y"}),
        );

        get_patient(&api, "jmedici", "42", true).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_patient_without_picture() {
        let mut api = MockUnityApi::new();
        expect_magic(&mut api, json!({"Action": "GetPatient", "Parameter1": ""}));

        get_patient(&api, "jmedici", "42", false).await.unwrap();
    }

    #[tokio::test]
    async fn test_search_patients() {
        let mut api = MockUnityApi::new();
        expect_magic(
            &mut api,
            json!({"Action": "SearchPatients", "Parameter1": "Smith"}),
        );

        search_patients(&api, "jmedici", "Smith").await.unwrap();
    }

    #[tokio::test]
    async fn test_get_clinical_summary_section() {
        let mut api = MockUnityApi::new();
        expect_magic(
            &mut api,
            json!({"Action": "GetClinicalSummary", "PatientID": "42", "Parameter1": "problems"}),
        );

        get_clinical_summary(&api, "jmedici", "42", Some("problems"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_get_provider_by_user_name() {
        let mut api = MockUnityApi::new();
        expect_magic(
            &mut api,
            json!({"Action": "GetProvider", "Parameter1": "", "Parameter2": "terry"}),
        );

        get_provider(&api, None, Some("terry")).await.unwrap();
    }

    #[tokio::test]
    async fn test_errors_propagate() {
        let mut api = MockUnityApi::new();
        api.expect_magic()
            .returning(|_| Err(crate::unity::ApiError::new("Invalid security token").into()));

        let err = get_server_info(&api).await.unwrap_err();
        assert!(err.to_string().contains("Invalid security token"));
    }

    #[test]
    fn test_patient_id_is_sent_as_given() {
        let request = MagicRequest::new("GetPatient").patient_id("0042");
        let envelope = request.to_envelope("TestApp", None, Tz::UTC).unwrap();
        assert_eq!(envelope.patient_id, json!("0042"));
        assert_eq!(
            MagicValue::from("0042"),
            MagicValue::Json(Value::String("0042".to_string()))
        );
    }
}
