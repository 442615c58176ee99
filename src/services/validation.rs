use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

const MAX_TAGS: usize = 30;
const MAX_TAG_LENGTH: usize = 50;

static PARTIAL_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-(0[1-9]|1[0-2])(-(0[1-9]|[12]\d|3[01]))?$").expect("valid date regex")
});

/// Failures the web layer maps to a specific status instead of a 500.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("{0}")]
    Unavailable(String),
}

/// Runs the derived checks and flattens them into `field: message` lines,
/// sorted so the output is stable.
pub fn check<T: Validate>(input: &T) -> Result<(), ServiceError> {
    input
        .validate()
        .map_err(|errors| ServiceError::Validation(format_errors(&errors)))
}

pub fn format_errors(errors: &ValidationErrors) -> Vec<String> {
    let mut details: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{}: {}", field, message)
            })
        })
        .collect();
    details.sort();
    details
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("blank", "must not be blank"));
    }
    Ok(())
}

/// Empty means "no URL". Anything else must be an absolute http(s) URL.
pub fn validate_http_url(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }
    match url::Url::parse(value) {
        Ok(u) if matches!(u.scheme(), "http" | "https") && u.host_str().is_some() => Ok(()),
        Ok(_) => Err(error("url_scheme", "must be an http or https URL")),
        Err(_) => Err(error("url", "must be a valid URL")),
    }
}

/// `YYYY-MM` or `YYYY-MM-DD`.
pub fn validate_partial_date(value: &str) -> Result<(), ValidationError> {
    if PARTIAL_DATE.is_match(value.trim()) {
        Ok(())
    } else {
        Err(error("date", "must be a date in YYYY-MM or YYYY-MM-DD form"))
    }
}

pub fn validate_optional_date(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Ok(());
    }
    validate_partial_date(value)
}

pub fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.len() > MAX_TAGS {
        return Err(error("too_many", "must have 30 entries or fewer"));
    }
    if tags
        .iter()
        .any(|t| t.trim().is_empty() || t.chars().count() > MAX_TAG_LENGTH)
    {
        return Err(error(
            "entry_length",
            "entries must be between 1 and 50 characters",
        ));
    }
    Ok(())
}

/// Trims list entries and drops duplicates while keeping the first occurrence.
pub fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
        .collect()
}

/// Empty or whitespace-only optional strings are stored as NULL.
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateProject;

    fn project() -> CreateProject {
        CreateProject {
            title: "Folio".to_string(),
            description: "A portfolio backend written in Rust".to_string(),
            long_description: String::new(),
            tech_stack: vec!["Rust".to_string()],
            github_url: Some("https://github.com/example/folio".to_string()),
            live_url: None,
            image_url: None,
            featured: false,
            status: Default::default(),
        }
    }

    #[test]
    fn test_valid_input_passes() {
        assert!(check(&project()).is_ok());
    }

    #[test]
    fn test_rejects_javascript_url() {
        let mut input = project();
        input.live_url = Some("javascript:alert(1)".to_string());
        match check(&input) {
            Err(ServiceError::Validation(details)) => {
                assert_eq!(details, vec!["live_url: must be an http or https URL"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_collects_every_failing_field() {
        let mut input = project();
        input.title = "   ".to_string();
        input.description = "short".to_string();
        let Err(ServiceError::Validation(details)) = check(&input) else {
            panic!("expected validation error");
        };
        assert_eq!(details.len(), 2);
        assert!(details[0].starts_with("description:"));
        assert_eq!(details[1], "title: must not be blank");
    }

    #[test]
    fn test_partial_dates() {
        assert!(validate_partial_date("2024-03").is_ok());
        assert!(validate_partial_date("2024-03-31").is_ok());
        assert!(validate_partial_date("2024-13").is_err());
        assert!(validate_partial_date("March 2024").is_err());
        assert!(validate_optional_date("").is_ok());
        assert!(validate_partial_date("").is_err());
    }

    #[test]
    fn test_tag_length_counts_characters() {
        let mut input = project();
        // 20 characters, 60 bytes
        input.tech_stack = vec!["分散システム設計と運用のための基盤技術一".to_string()];
        assert!(check(&input).is_ok());

        input.tech_stack = vec!["界".repeat(51)];
        assert!(check(&input).is_err());
    }

    #[test]
    fn test_clean_tags_dedupes_case_insensitively() {
        let tags = vec![" Rust ".into(), "rust".into(), "".into(), "Axum".into()];
        assert_eq!(clean_tags(tags), vec!["Rust".to_string(), "Axum".to_string()]);
    }
}
