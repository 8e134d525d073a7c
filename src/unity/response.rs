//! Post-processing of magic action results.
//!
//! Both functions here are pure transformations of the parsed JSON tree.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;

/// Formats Unity uses for local timestamps, after whitespace is collapsed.
const DATETIME_FORMATS: &[&str] = &[
    "%b %d %Y %I:%M%p",
    "%b %d %Y %I:%M:%S%p",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%d-%b-%Y", "%b %d %Y"];

/// A date-like string recognized in a Unity response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnityDate {
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
}

impl UnityDate {
    /// RFC 3339 in UTC for timestamps, `YYYY-MM-DD` for dates.
    pub fn to_json_string(&self) -> String {
        match self {
            UnityDate::DateTime(at) => at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            UnityDate::Date(date) => date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Strips the `[{"<action>info": ...}]` wrapper Unity puts around results.
///
/// Only a single-element array holding a single-key object whose key ends in
/// `info` is unwrapped. Anything else is returned as is.
pub fn unwrap_result(response: Value) -> Value {
    let is_wrapped = match &response {
        Value::Array(items) if items.len() == 1 => match &items[0] {
            Value::Object(map) if map.len() == 1 => map
                .keys()
                .all(|key| key.to_ascii_lowercase().ends_with("info")),
            _ => false,
        },
        _ => false,
    };

    if !is_wrapped {
        return response;
    }

    match response {
        Value::Array(mut items) => match items.pop() {
            Some(Value::Object(map)) => map.into_iter().next().map(|(_, v)| v).unwrap_or(Value::Null),
            Some(other) => other,
            None => Value::Null,
        },
        other => other,
    }
}

/// Replaces every date-like string in `value` with a timezone-qualified one.
///
/// Unity reports timestamps in the server's local time without an offset;
/// `timezone` says which zone that is.
pub fn normalize_dates(value: Value, timezone: Tz) -> Value {
    match value {
        Value::String(text) => match parse_unity_date(&text, timezone) {
            Some(date) => Value::String(date.to_json_string()),
            None => Value::String(text),
        },
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| normalize_dates(item, timezone))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, item)| (key, normalize_dates(item, timezone)))
                .collect(),
        ),
        other => other,
    }
}

/// Parses one of the date formats Unity is known to emit.
///
/// Returns `None` for anything else, including local times that fall into a
/// daylight saving gap. Ambiguous local times resolve to the earlier instant.
pub fn parse_unity_date(text: &str, timezone: Tz) -> Option<UnityDate> {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    // Shortest supported form is `1/1/2014`
    if text.len() < 8 || text.len() > 40 {
        return None;
    }

    if let Ok(at) = DateTime::parse_from_rfc3339(&text) {
        return Some(UnityDate::DateTime(at.with_timezone(&Utc)));
    }

    for format in DATETIME_FORMATS {
        if let Ok(local) = NaiveDateTime::parse_from_str(&text, format) {
            return timezone
                .from_local_datetime(&local)
                .earliest()
                .map(|at| UnityDate::DateTime(at.with_timezone(&Utc)));
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&text, format).ok())
        .map(UnityDate::Date)
}
