use anyhow::{Context, Result};
use log::info;
use std::io::Write;

use crate::unity::{GetTokenParams, RetireTokenParams, SecurityToken, UnityApi};

/// Acquires a security token and prints it.
#[tracing::instrument(skip(api, out))]
pub async fn token<A: UnityApi + ?Sized, W: Write>(api: &A, out: &mut W) -> Result<()> {
    let token = api.get_security_token(GetTokenParams::default()).await?;
    info!("Acquired security token {}", token.masked());
    writeln!(out, "{}", token.as_str()).context("Failed to write output")?;
    Ok(())
}

/// Retires `token`.
#[tracing::instrument(skip(api, token, out))]
pub async fn retire<A: UnityApi + ?Sized, W: Write>(
    api: &A,
    token: SecurityToken,
    out: &mut W,
) -> Result<()> {
    api.retire_security_token(RetireTokenParams::token(token))
        .await?;
    writeln!(out, "Security token retired.").context("Failed to write output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unity::{ApiError, MockUnityApi};

    #[tokio::test]
    async fn test_token_prints_token() {
        let mut api = MockUnityApi::new();
        api.expect_get_security_token()
            .withf(|params| *params == GetTokenParams::default())
            .times(1)
            .returning(|_| Ok(SecurityToken::new("abc123")));

        let mut out = Vec::new();
        token(&api, &mut out).await.unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "abc123\n");
    }

    #[tokio::test]
    async fn test_token_failure_prints_nothing() {
        let mut api = MockUnityApi::new();
        api.expect_get_security_token()
            .returning(|_| Err(ApiError::new("Username and password not valid").into()));

        let mut out = Vec::new();
        assert!(token(&api, &mut out).await.is_err());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_retire_sends_given_token() {
        let mut api = MockUnityApi::new();
        api.expect_retire_security_token()
            .withf(|params| params.token == Some(SecurityToken::new("abc123")))
            .times(1)
            .returning(|_| Ok(()));

        let mut out = Vec::new();
        retire(&api, SecurityToken::new("abc123"), &mut out)
            .await
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "Security token retired.\n");
    }
}
