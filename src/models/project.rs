use crate::services::validation::{validate_http_url, validate_not_blank, validate_tags};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Completed,
    InProgress,
    Planned,
}

impl FromStr for ProjectStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "completed" => Ok(Self::Completed),
            "in_progress" => Ok(Self::InProgress),
            "planned" => Ok(Self::Planned),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Planned => write!(f, "planned"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub long_description: String,
    pub tech_stack: Vec<String>,
    pub github_url: Option<String>,
    pub live_url: Option<String>,
    pub image_url: Option<String>,
    pub featured: bool,
    pub status: ProjectStatus,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProject {
    #[validate(
        length(min = 1, max = 100, message = "must be between 1 and 100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub title: String,
    #[validate(length(min = 10, max = 500, message = "must be between 10 and 500 characters"))]
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 5000, message = "must be 5000 characters or less"))]
    pub long_description: String,
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub tech_stack: Vec<String>,
    #[validate(custom(function = "validate_http_url"))]
    pub github_url: Option<String>,
    #[validate(custom(function = "validate_http_url"))]
    pub live_url: Option<String>,
    #[validate(custom(function = "validate_http_url"))]
    pub image_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub status: ProjectStatus,
}

/// Absent fields keep their stored value. An empty string clears an optional URL.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProject {
    #[validate(
        length(min = 1, max = 100, message = "must be between 1 and 100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub title: Option<String>,
    #[validate(length(min = 10, max = 500, message = "must be between 10 and 500 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 5000, message = "must be 5000 characters or less"))]
    pub long_description: Option<String>,
    #[validate(custom(function = "validate_tags"))]
    pub tech_stack: Option<Vec<String>>,
    #[validate(custom(function = "validate_http_url"))]
    pub github_url: Option<String>,
    #[validate(custom(function = "validate_http_url"))]
    pub live_url: Option<String>,
    #[validate(custom(function = "validate_http_url"))]
    pub image_url: Option<String>,
    pub featured: Option<bool>,
    pub status: Option<ProjectStatus>,
}
