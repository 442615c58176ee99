pub mod analytics;
pub mod auth;
pub mod certifications;
pub mod classifier;
pub mod contact;
pub mod experience;
pub mod gate;
pub mod identity;
pub mod markdown;
pub mod normalize;
pub mod projects;
pub mod sink;
pub mod skills;
pub mod storage;
pub mod validation;

use chrono::{DateTime, SecondsFormat, Utc};

/// RFC 3339 in UTC with millisecond precision. Lexicographic order matches
/// chronological order, which the list queries rely on.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// Decodes a JSON list column. `None` means the stored text is corrupt.
pub(crate) fn decode_list(raw: &str) -> Option<Vec<String>> {
    serde_json::from_str(raw).ok()
}

pub(crate) fn encode_list(items: &[String]) -> anyhow::Result<String> {
    Ok(serde_json::to_string(items)?)
}

/// Partial-update merge for nullable text: absent keeps the stored value, a
/// blank string clears it.
pub(crate) fn merge_optional(input: Option<&String>, existing: Option<String>) -> Option<String> {
    match input {
        Some(value) => validation::blank_to_none(Some(value.clone())),
        None => existing,
    }
}
