//! Client for the Allscripts Unity JSON API.
//!
//! ```no_run
//! use unity_client::config::ClientOptions;
//! use unity_client::unity::{GetTokenParams, JsonClientDriver, MagicRequest, UnityApi};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let options = ClientOptions::new("https://unity.example.com", "TestApp")
//!     .with_credentials("jmedici", "password01")
//!     .with_timezone_name("America/New_York")?;
//! let client = JsonClientDriver::new(options)?;
//!
//! client.get_security_token(GetTokenParams::default()).await?;
//! let patient = client
//!     .magic(MagicRequest::new("GetPatient").user_id("jmedici").patient_id(42))
//!     .await?;
//! println!("{}", patient);
//! client.retire_security_token(Default::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod config;
pub mod http;
pub mod runtime;
pub mod unity;
