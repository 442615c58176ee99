use crate::services::validation::validate_not_blank;
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactMessage {
    #[validate(
        length(min = 1, max = 100, message = "must be between 1 and 100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 200, message = "must be 200 characters or less"))]
    pub subject: String,
    #[validate(
        length(min = 1, max = 5000, message = "must be between 1 and 5000 characters"),
        custom(function = "validate_not_blank")
    )]
    pub message: String,
}
