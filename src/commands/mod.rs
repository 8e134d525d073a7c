//! Command implementations behind the `unity` binary.
//!
//! Commands are generic over [`UnityApi`] and write to any `Write`, so they
//! run against a mocked client in tests.

mod magic;
mod session;
mod token;

use anyhow::{Context, Result};
use serde_json::Value;
use std::io::Write;

pub use magic::{MagicArgs, magic, server_info};
pub use session::with_session;
pub use token::{retire, token};

/// Interprets a command line value: valid JSON is sent as JSON, anything
/// else as a plain string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn print_json<W: Write>(out: &mut W, value: &Value) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render result")?;
    writeln!(out, "{}", rendered).context("Failed to write output")?;
    Ok(())
}
