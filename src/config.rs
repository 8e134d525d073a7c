//! Client configuration.

use anyhow::{Result, anyhow, bail};
use chrono_tz::Tz;
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Request and connect timeout used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 90;

/// Connection settings for a Unity endpoint.
///
/// Only the base URL and the app name are required. Everything else falls
/// back to a default (UTC, 90 second timeout, autodetected CA certificates,
/// no proxy) or is supplied per call (credentials).
#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    base_unity_url: String,
    appname: String,
    timezone: Tz,
    username: Option<String>,
    password: Option<String>,
    timeout: Option<Duration>,
    ca_file: Option<PathBuf>,
    ca_path: Option<PathBuf>,
    proxy: Option<String>,
}

impl ClientOptions {
    pub fn new(base_unity_url: impl Into<String>, appname: impl Into<String>) -> Self {
        let base_unity_url = base_unity_url.into();
        let base_unity_url = base_unity_url
            .strip_suffix('/')
            .unwrap_or(&base_unity_url)
            .to_string();

        Self {
            base_unity_url,
            appname: appname.into(),
            timezone: Tz::UTC,
            username: None,
            password: None,
            timeout: None,
            ca_file: None,
            ca_path: None,
            proxy: None,
        }
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Sets the timezone from an IANA name such as `America/New_York`.
    pub fn with_timezone_name(self, name: &str) -> Result<Self> {
        let timezone: Tz = name
            .parse()
            .map_err(|e| anyhow!("Unknown timezone '{}': {}", name, e))?;
        Ok(self.with_timezone(timezone))
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_ca_file(mut self, ca_file: impl Into<PathBuf>) -> Self {
        self.ca_file = Some(ca_file.into());
        self
    }

    pub fn with_ca_path(mut self, ca_path: impl Into<PathBuf>) -> Self {
        self.ca_path = Some(ca_path.into());
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Checks that the required settings are present and usable.
    pub fn validate(&self) -> Result<()> {
        if self.base_unity_url.trim().is_empty() {
            bail!("Base Unity URL can not be empty");
        }
        if self.appname.trim().is_empty() {
            bail!("App name can not be empty");
        }

        let url = Url::parse(&self.base_unity_url)
            .map_err(|e| anyhow!("Invalid base Unity URL '{}': {}", self.base_unity_url, e))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            bail!(
                "Base Unity URL must use http or https, got '{}'",
                url.scheme()
            );
        }

        Ok(())
    }

    pub fn base_unity_url(&self) -> &str {
        &self.base_unity_url
    }

    pub fn appname(&self) -> &str {
        &self.appname
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// The configured timeout, or [`DEFAULT_TIMEOUT_SECS`].
    pub fn timeout(&self) -> Duration {
        self.timeout
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn ca_file(&self) -> Option<&Path> {
        self.ca_file.as_deref()
    }

    pub fn ca_path(&self) -> Option<&Path> {
        self.ca_path.as_deref()
    }

    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }
}
