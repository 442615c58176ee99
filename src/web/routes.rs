use super::handlers;
use super::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::public::index))
        .route("/health", get(handlers::public::health))
}

/// Read API, tracking and contact: the endpoints the front end calls, possibly
/// from another origin.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/skills", get(handlers::api::list_skills))
        .route("/api/v1/projects", get(handlers::api::list_projects))
        .route(
            "/api/v1/certifications",
            get(handlers::api::list_certifications),
        )
        .route("/api/v1/experience", get(handlers::api::list_experience))
        .route("/api/track", post(handlers::track::track))
        .route("/api/contact", post(handlers::api::send_contact))
}

pub fn admin_routes(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/admin/login",
            get(handlers::auth::login_form).post(handlers::auth::login),
        )
        .route("/admin/logout", post(handlers::auth::logout))
        .route("/admin", get(handlers::admin::dashboard))
        .route(
            "/admin/api/skills",
            get(handlers::admin::list_skills).post(handlers::admin::create_skill),
        )
        .route(
            "/admin/api/skills/:id",
            get(handlers::admin::get_skill)
                .put(handlers::admin::update_skill)
                .delete(handlers::admin::delete_skill),
        )
        .route(
            "/admin/api/projects",
            get(handlers::admin::list_projects).post(handlers::admin::create_project),
        )
        .route(
            "/admin/api/projects/:id",
            get(handlers::admin::get_project)
                .put(handlers::admin::update_project)
                .delete(handlers::admin::delete_project),
        )
        .route(
            "/admin/api/certifications",
            get(handlers::admin::list_certifications)
                .post(handlers::admin::create_certification),
        )
        .route(
            "/admin/api/certifications/:id",
            get(handlers::admin::get_certification)
                .put(handlers::admin::update_certification)
                .delete(handlers::admin::delete_certification),
        )
        .route(
            "/admin/api/experience",
            get(handlers::admin::list_experience).post(handlers::admin::create_experience),
        )
        .route(
            "/admin/api/experience/:id",
            get(handlers::admin::get_experience)
                .put(handlers::admin::update_experience)
                .delete(handlers::admin::delete_experience),
        )
        .route(
            "/admin/api/media",
            get(handlers::admin::list_media).post(handlers::admin::upload_media).layer(
                // multipart framing on top of the file itself
                DefaultBodyLimit::max(max_upload_bytes + 1024 * 1024),
            ),
        )
        .route(
            "/admin/api/media/:id",
            axum::routing::delete(handlers::admin::delete_media),
        )
        .route(
            "/admin/api/analytics/daily",
            get(handlers::admin::daily_stats),
        )
        .route(
            "/admin/api/analytics/visitors",
            get(handlers::admin::visitors),
        )
        .route(
            "/admin/api/analytics/activity",
            get(handlers::admin::activity),
        )
}
