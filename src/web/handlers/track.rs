use crate::models::PageView;
use crate::services::analytics::VisitorContext;
use crate::web::extractors::{CookieStorage, OptionalUser};
use crate::web::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

/// POST /api/track
///
/// Called by the front end on every route change. Always answers 204: a
/// visitor's navigation never waits on, or fails because of, analytics.
pub async fn track(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    OptionalUser(user): OptionalUser,
    body: Bytes,
) -> Response {
    if !state.config.analytics.enabled {
        return StatusCode::NO_CONTENT.into_response();
    }

    let view: PageView = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!("Ignoring malformed page view: {}", e);
            return StatusCode::NO_CONTENT.into_response();
        }
    };
    if view.page_path.trim().is_empty() {
        return StatusCode::NO_CONTENT.into_response();
    }

    let cross_site = !state.config.site.allowed_origins.is_empty();
    let mut ctx = VisitorContext::new(CookieStorage::new(jar).cross_site(cross_site));
    state.recorder.record(&mut ctx, &view);

    if let Some(user) = user {
        state.recorder.record_user_activity(&user, &view);
    }

    (ctx.into_storage().into_jar(), StatusCode::NO_CONTENT).into_response()
}
