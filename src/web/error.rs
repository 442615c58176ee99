use crate::services::validation::ServiceError;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use std::sync::atomic::{AtomicBool, Ordering};

static SHOW_ERROR_DETAILS: AtomicBool = AtomicBool::new(false);

/// Error pages include the underlying message only when this is on.
pub fn set_show_error_details(show: bool) {
    SHOW_ERROR_DETAILS.store(show, Ordering::Relaxed);
}

fn show_error_details() -> bool {
    SHOW_ERROR_DETAILS.load(Ordering::Relaxed)
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Rendered without Tera so a broken template cannot break the error page too.
pub fn error_panel(status: StatusCode, detail: Option<&str>) -> Response {
    let detail = match detail {
        Some(d) if show_error_details() => format!("<pre class=\"error-detail\">{}</pre>", escape_html(d)),
        _ => String::new(),
    };
    let body = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Something went wrong</title></head>
<body>
<main class="error-panel">
<h1>Something went wrong</h1>
<p>An unexpected error occurred. Please reload the page.</p>
{}
<button type="button" onclick="window.location.reload()">Reload</button>
</main>
</body>
</html>"#,
        detail
    );
    (status, Html(body)).into_response()
}

/// Error for handlers that answer with HTML.
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(ServiceError::NotFound { .. }) = self.0.downcast_ref::<ServiceError>() {
            return error_panel(StatusCode::NOT_FOUND, Some(&self.0.to_string()));
        }
        tracing::error!("Application error: {:?}", self.0);
        error_panel(StatusCode::INTERNAL_SERVER_ERROR, Some(&format!("{:#}", self.0)))
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Error for JSON handlers. Service errors keep their meaning as status codes.
pub struct ApiError(anyhow::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0.downcast_ref::<ServiceError>() {
            Some(ServiceError::Validation(details)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({
                    "error": "Validation failed",
                    "details": details,
                })),
            )
                .into_response(),
            Some(err @ ServiceError::NotFound { .. }) => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({
                    "error": "Not Found",
                    "message": err.to_string(),
                })),
            )
                .into_response(),
            Some(ServiceError::Unavailable(message)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "error": "Service Unavailable",
                    "message": message,
                })),
            )
                .into_response(),
            None => {
                tracing::error!("API error: {:?}", self.0);
                let mut body = serde_json::json!({ "error": "Internal server error" });
                if show_error_details() {
                    body["message"] = serde_json::Value::String(format!("{:#}", self.0));
                }
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_422() {
        let err = ApiError::from(ServiceError::Validation(vec!["title: must not be blank".into()]));
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_not_found_and_unavailable() {
        let err = ApiError::from(ServiceError::NotFound { entity: "Project", id: 3 });
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
        let err = ApiError::from(ServiceError::Unavailable("down".into()));
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_other_errors_are_500() {
        let err = AppError::from(anyhow::anyhow!("disk on fire"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>\"x\" & y</b>"), "&lt;b&gt;&quot;x&quot; &amp; y&lt;/b&gt;");
    }
}
