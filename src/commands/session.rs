use anyhow::Result;
use log::{debug, warn};
use std::future::Future;

use crate::unity::{GetTokenParams, RetireTokenParams, SecurityToken, UnityApi};

/// Runs `action` with a security token.
///
/// A caller-supplied token is used as is and left alive. Otherwise a token
/// is acquired with the client's credentials and retired once `action`
/// finishes, whether it succeeded or not. An error from `action` takes
/// precedence over one from retiring.
#[tracing::instrument(skip(api, token, action))]
pub async fn with_session<A, F, Fut, T>(
    api: &A,
    token: Option<SecurityToken>,
    action: F,
) -> Result<T>
where
    A: UnityApi + ?Sized,
    F: FnOnce(SecurityToken) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if let Some(token) = token {
        debug!("Using supplied security token {}", token.masked());
        return action(token).await;
    }

    let token = api.get_security_token(GetTokenParams::default()).await?;
    let result = action(token.clone()).await;
    let retired = api
        .retire_security_token(RetireTokenParams::token(token))
        .await;

    match (result, retired) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(retire_error)) => {
            warn!("Failed to retire security token: {}", retire_error);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unity::{ApiError, MockUnityApi};
    use mockall::Sequence;

    #[tokio::test]
    async fn test_supplied_token_skips_acquire_and_retire() {
        let api = MockUnityApi::new();

        let result = with_session(&api, Some(SecurityToken::new("given")), |token| async move {
            Ok(token.into_inner())
        })
        .await
        .unwrap();

        assert_eq!(result, "given");
    }

    #[tokio::test]
    async fn test_acquires_and_retires() {
        let mut api = MockUnityApi::new();
        let mut seq = Sequence::new();

        api.expect_get_security_token()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(SecurityToken::new("tok-1")));
        api.expect_retire_security_token()
            .withf(|params| params.token == Some(SecurityToken::new("tok-1")))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let result = with_session(&api, None, |token| async move { Ok(token.into_inner()) })
            .await
            .unwrap();

        assert_eq!(result, "tok-1");
    }

    #[tokio::test]
    async fn test_retires_after_failed_action() {
        let mut api = MockUnityApi::new();
        api.expect_get_security_token()
            .returning(|_| Ok(SecurityToken::new("tok-1")));
        api.expect_retire_security_token()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("retire failed")));

        let err = with_session(&api, None, |_| async {
            Err::<(), _>(anyhow::Error::from(ApiError::new("action failed")))
        })
        .await
        .unwrap_err();

        assert!(err.downcast_ref::<ApiError>().is_some());
        assert!(err.to_string().contains("action failed"));
    }

    #[tokio::test]
    async fn test_retire_failure_reported_after_success() {
        let mut api = MockUnityApi::new();
        api.expect_get_security_token()
            .returning(|_| Ok(SecurityToken::new("tok-1")));
        api.expect_retire_security_token()
            .returning(|_| Err(anyhow::anyhow!("retire failed")));

        let err = with_session(&api, None, |_| async { Ok(()) })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "retire failed");
    }

    #[tokio::test]
    async fn test_acquire_failure_skips_action() {
        let mut api = MockUnityApi::new();
        api.expect_get_security_token()
            .returning(|_| Err(ApiError::new("Username and password not valid").into()));
        api.expect_retire_security_token().times(0);

        let err = with_session(&api, None, |_| async {
            Err::<(), _>(anyhow::anyhow!("action ran"))
        })
        .await
        .unwrap_err();

        assert!(err.to_string().contains("not valid"));
        assert!(!err.to_string().contains("action ran"));
    }
}
