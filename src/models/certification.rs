use crate::services::validation::{
    validate_http_url, validate_not_blank, validate_optional_date, validate_partial_date,
    validate_tags,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    pub id: i64,
    pub title: String,
    pub issuer: String,
    pub issue_date: String,
    pub expiry_date: Option<String>,
    pub credential_id: Option<String>,
    pub credential_url: Option<String>,
    pub image_url: Option<String>,
    pub skills: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCertification {
    #[validate(
        length(min = 1, max = 150, message = "must be between 1 and 150 characters"),
        custom(function = "validate_not_blank")
    )]
    pub title: String,
    #[validate(
        length(min = 1, max = 100, message = "must be between 1 and 100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub issuer: String,
    #[validate(custom(function = "validate_partial_date"))]
    pub issue_date: String,
    #[validate(custom(function = "validate_optional_date"))]
    pub expiry_date: Option<String>,
    #[validate(length(max = 100, message = "must be 100 characters or less"))]
    pub credential_id: Option<String>,
    #[validate(custom(function = "validate_http_url"))]
    pub credential_url: Option<String>,
    #[validate(custom(function = "validate_http_url"))]
    pub image_url: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCertification {
    #[validate(
        length(min = 1, max = 150, message = "must be between 1 and 150 characters"),
        custom(function = "validate_not_blank")
    )]
    pub title: Option<String>,
    #[validate(
        length(min = 1, max = 100, message = "must be between 1 and 100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub issuer: Option<String>,
    #[validate(custom(function = "validate_partial_date"))]
    pub issue_date: Option<String>,
    #[validate(custom(function = "validate_optional_date"))]
    pub expiry_date: Option<String>,
    #[validate(length(max = 100, message = "must be 100 characters or less"))]
    pub credential_id: Option<String>,
    #[validate(custom(function = "validate_http_url"))]
    pub credential_url: Option<String>,
    #[validate(custom(function = "validate_http_url"))]
    pub image_url: Option<String>,
    #[validate(custom(function = "validate_tags"))]
    pub skills: Option<Vec<String>>,
}
