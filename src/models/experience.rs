use crate::services::validation::{
    validate_http_url, validate_not_blank, validate_optional_date, validate_partial_date,
    validate_tags,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub id: i64,
    pub company: String,
    pub position: String,
    pub location: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub current: bool,
    pub description: String,
    pub technologies: Vec<String>,
    pub company_url: Option<String>,
    pub logo_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateExperience {
    #[validate(
        length(min = 1, max = 100, message = "must be between 1 and 100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub company: String,
    #[validate(
        length(min = 1, max = 100, message = "must be between 1 and 100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub position: String,
    #[serde(default)]
    #[validate(length(max = 100, message = "must be 100 characters or less"))]
    pub location: String,
    #[validate(custom(function = "validate_partial_date"))]
    pub start_date: String,
    #[validate(custom(function = "validate_optional_date"))]
    pub end_date: Option<String>,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    #[validate(length(max = 2000, message = "must be 2000 characters or less"))]
    pub description: String,
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub technologies: Vec<String>,
    #[validate(custom(function = "validate_http_url"))]
    pub company_url: Option<String>,
    #[validate(custom(function = "validate_http_url"))]
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExperience {
    #[validate(
        length(min = 1, max = 100, message = "must be between 1 and 100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub company: Option<String>,
    #[validate(
        length(min = 1, max = 100, message = "must be between 1 and 100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub position: Option<String>,
    #[validate(length(max = 100, message = "must be 100 characters or less"))]
    pub location: Option<String>,
    #[validate(custom(function = "validate_partial_date"))]
    pub start_date: Option<String>,
    #[validate(custom(function = "validate_optional_date"))]
    pub end_date: Option<String>,
    pub current: Option<bool>,
    #[validate(length(max = 2000, message = "must be 2000 characters or less"))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_tags"))]
    pub technologies: Option<Vec<String>>,
    #[validate(custom(function = "validate_http_url"))]
    pub company_url: Option<String>,
    #[validate(custom(function = "validate_http_url"))]
    pub logo_url: Option<String>,
}
