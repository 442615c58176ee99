use crate::models::ContactMessage;
use crate::services::{certifications, contact, experience, projects, skills};
use crate::web::error::ApiResult;
use crate::web::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use std::sync::Arc;

pub(crate) fn json_list<T: Serialize>(items: Vec<T>) -> Json<serde_json::Value> {
    let total = items.len();
    Json(serde_json::json!({
        "data": items,
        "meta": { "total": total },
    }))
}

pub(crate) fn json_single<T: Serialize>(item: T) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "data": item }))
}

/// GET /api/v1/skills
pub async fn list_skills(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    Ok(json_list(skills::list_skills(&state.db)?).into_response())
}

/// GET /api/v1/projects
pub async fn list_projects(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    Ok(json_list(projects::list_projects(&state.db)?).into_response())
}

/// GET /api/v1/certifications
pub async fn list_certifications(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    Ok(json_list(certifications::list_certifications(&state.db)?).into_response())
}

/// GET /api/v1/experience
pub async fn list_experience(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    Ok(json_list(experience::list_experience(&state.db)?).into_response())
}

/// POST /api/contact
pub async fn send_contact(
    State(state): State<Arc<AppState>>,
    Json(message): Json<ContactMessage>,
) -> ApiResult<Response> {
    contact::send_message(&state.config.contact, &message).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "message": "Message sent" })),
    )
        .into_response())
}
