mod error;
mod extractors;
mod handlers;
mod routes;
pub mod security;
mod state;

pub use error::{set_show_error_details, ApiError, AppError};
pub use extractors::{CookieStorage, GateRejection, SESSION_COOKIE};
pub use state::AppState;

use crate::services::auth;
use crate::services::storage::MEDIA_URL_PREFIX;
use crate::{Config, Database};
use anyhow::Result;
use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use axum::Router;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower::Layer;
use tower_http::services::ServeDir;
use tower_http::set_header::{SetResponseHeader, SetResponseHeaderLayer};
use tower_http::trace::TraceLayer;

const MEDIA_CSP: &str = "sandbox; default-src 'none'; img-src 'self'; style-src 'unsafe-inline'";
const HOUSEKEEPING_INTERVAL: Duration = Duration::from_secs(3600);

pub fn build_router(state: Arc<AppState>) -> Router {
    let mut api = routes::api_routes();
    if let Some(cors) = cors_layer(&state.config.site.allowed_origins) {
        api = api.layer(cors);
    }

    let media_root = state.store.root().to_path_buf();
    let max_upload_bytes = state.config.media.max_upload_bytes().unwrap_or(10 * 1024 * 1024);

    Router::new()
        .merge(routes::public_routes())
        .merge(api)
        .merge(
            routes::admin_routes(max_upload_bytes)
                .layer(middleware::from_fn(extractors::renew_session_cookie)),
        )
        .nest_service(MEDIA_URL_PREFIX, media_service(media_root))
        .layer(middleware::from_fn(security::apply_security_headers))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Uploaded files. A sandboxed CSP keeps an uploaded SVG or HTML file from
/// running script under the site's origin.
fn media_service(root: PathBuf) -> SetResponseHeader<ServeDir, HeaderValue> {
    SetResponseHeaderLayer::overriding(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(MEDIA_CSP),
    )
    .layer(ServeDir::new(root))
}

/// Cross-origin access for the public API. No configured origins means
/// same-origin only.
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o.trim_end_matches('/')) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid allowed origin '{}'", o);
                None
            }
        })
        .collect();
    if origins.is_empty() {
        return None;
    }
    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true),
    )
}

pub async fn serve(config: Config, db: Database, addr: &str) -> Result<()> {
    config.report_degraded_features();
    set_show_error_details(!config.server.production);

    let state = Arc::new(AppState::new(config, db)?);

    let housekeeping = state.clone();
    tokio::spawn(async move {
        run_housekeeping(housekeeping).await;
    });

    let app = build_router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);
    let app = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_housekeeping(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(HOUSEKEEPING_INTERVAL);
    loop {
        interval.tick().await;
        match auth::cleanup_expired_sessions(&state.db) {
            Ok(0) => {}
            Ok(n) => tracing::debug!("Removed {} expired sessions", n),
            Err(e) => tracing::warn!("Session cleanup failed: {}", e),
        }
        state.rate_limiter.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_needs_origins() {
        assert!(cors_layer(&[]).is_none());
        assert!(cors_layer(&["https://example.com/".to_string()]).is_some());
        assert!(cors_layer(&["bad\norigin".to_string()]).is_none());
    }
}
