use crate::models::{
    CreateCertification, CreateExperience, CreateProject, CreateSkill, UpdateCertification,
    UpdateExperience, UpdateProject, UpdateSkill,
};
use crate::services::validation::ServiceError;
use crate::services::{analytics, certifications, experience, projects, skills, storage};
use crate::web::error::{ApiResult, AppResult};
use crate::web::extractors::AdminUser;
use crate::web::handlers::api::{json_list, json_single};
use crate::web::handlers::public::make_context;
use crate::web::state::AppState;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

const DASHBOARD_DAYS: i64 = 30;
const DEFAULT_VISITOR_LIMIT: usize = 50;
const MAX_VISITOR_LIMIT: usize = 500;

fn created(item: impl serde::Serialize) -> Response {
    (StatusCode::CREATED, json_single(item)).into_response()
}

fn not_found(entity: &'static str, id: i64) -> ServiceError {
    ServiceError::NotFound { entity, id }
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    AdminUser(user): AdminUser,
) -> AppResult<Html<String>> {
    let series = analytics::recent_daily_stats(&state.db, DASHBOARD_DAYS, Utc::now())?;
    let overview = analytics::summarize(series);
    let visitors = analytics::list_recent_visitors(&state.db, 10)?;
    let activity = analytics::get_user_activity(&state.db, user.id)?;

    let mut ctx = make_context(&state, &Some(user));
    ctx.insert("overview", &overview);
    ctx.insert("visitors", &visitors);
    ctx.insert("activity", &activity);
    ctx.insert("skill_count", &skills::list_skills(&state.db)?.len());
    ctx.insert("project_count", &projects::list_projects(&state.db)?.len());
    ctx.insert(
        "certification_count",
        &certifications::list_certifications(&state.db)?.len(),
    );
    ctx.insert("experience_count", &experience::list_experience(&state.db)?.len());

    let html = state.templates.render("admin/dashboard.html", &ctx)?;
    Ok(Html(html))
}

// Skills

pub async fn list_skills(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> ApiResult<Response> {
    Ok(json_list(skills::list_skills(&state.db)?).into_response())
}

pub async fn get_skill(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    let skill = skills::get_skill(&state.db, id)?.ok_or(not_found("Skill", id))?;
    Ok(json_single(skill).into_response())
}

pub async fn create_skill(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(input): Json<CreateSkill>,
) -> ApiResult<Response> {
    let id = skills::create_skill(&state.db, &input)?;
    let skill = skills::get_skill(&state.db, id)?.ok_or(not_found("Skill", id))?;
    Ok(created(skill))
}

pub async fn update_skill(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdateSkill>,
) -> ApiResult<Response> {
    skills::update_skill(&state.db, id, &input)?;
    let skill = skills::get_skill(&state.db, id)?.ok_or(not_found("Skill", id))?;
    Ok(json_single(skill).into_response())
}

pub async fn delete_skill(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    skills::delete_skill(&state.db, id)?;
    Ok(StatusCode::NO_CONTENT)
}

// Projects

pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> ApiResult<Response> {
    Ok(json_list(projects::list_projects(&state.db)?).into_response())
}

pub async fn get_project(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    let project = projects::get_project(&state.db, id)?.ok_or(not_found("Project", id))?;
    Ok(json_single(project).into_response())
}

pub async fn create_project(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(input): Json<CreateProject>,
) -> ApiResult<Response> {
    let id = projects::create_project(&state.db, &input)?;
    let project = projects::get_project(&state.db, id)?.ok_or(not_found("Project", id))?;
    Ok(created(project))
}

pub async fn update_project(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdateProject>,
) -> ApiResult<Response> {
    projects::update_project(&state.db, id, &input)?;
    let project = projects::get_project(&state.db, id)?.ok_or(not_found("Project", id))?;
    Ok(json_single(project).into_response())
}

pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    projects::delete_project(&state.db, id)?;
    Ok(StatusCode::NO_CONTENT)
}

// Certifications

pub async fn list_certifications(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> ApiResult<Response> {
    Ok(json_list(certifications::list_certifications(&state.db)?).into_response())
}

pub async fn get_certification(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    let certification = certifications::get_certification(&state.db, id)?
        .ok_or(not_found("Certification", id))?;
    Ok(json_single(certification).into_response())
}

pub async fn create_certification(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(input): Json<CreateCertification>,
) -> ApiResult<Response> {
    let id = certifications::create_certification(&state.db, &input)?;
    let certification = certifications::get_certification(&state.db, id)?
        .ok_or(not_found("Certification", id))?;
    Ok(created(certification))
}

pub async fn update_certification(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdateCertification>,
) -> ApiResult<Response> {
    certifications::update_certification(&state.db, id, &input)?;
    let certification = certifications::get_certification(&state.db, id)?
        .ok_or(not_found("Certification", id))?;
    Ok(json_single(certification).into_response())
}

pub async fn delete_certification(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    certifications::delete_certification(&state.db, id)?;
    Ok(StatusCode::NO_CONTENT)
}

// Experience

pub async fn list_experience(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> ApiResult<Response> {
    Ok(json_list(experience::list_experience(&state.db)?).into_response())
}

pub async fn get_experience(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    let entry = experience::get_experience(&state.db, id)?.ok_or(not_found("Experience", id))?;
    Ok(json_single(entry).into_response())
}

pub async fn create_experience(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(input): Json<CreateExperience>,
) -> ApiResult<Response> {
    let id = experience::create_experience(&state.db, &input)?;
    let entry = experience::get_experience(&state.db, id)?.ok_or(not_found("Experience", id))?;
    Ok(created(entry))
}

pub async fn update_experience(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdateExperience>,
) -> ApiResult<Response> {
    experience::update_experience(&state.db, id, &input)?;
    let entry = experience::get_experience(&state.db, id)?.ok_or(not_found("Experience", id))?;
    Ok(json_single(entry).into_response())
}

pub async fn delete_experience(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    experience::delete_experience(&state.db, id)?;
    Ok(StatusCode::NO_CONTENT)
}

// Media

#[derive(Deserialize)]
pub struct MediaQuery {
    #[serde(default)]
    offset: usize,
    limit: Option<usize>,
}

pub async fn list_media(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<MediaQuery>,
) -> ApiResult<Response> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    Ok(json_list(storage::list_media(&state.db, limit, query.offset)?).into_response())
}

/// Multipart with a `file` part and an optional `folder` text part.
pub async fn upload_media(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    let mut folder = String::new();
    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("folder") => folder = field.text().await?,
            Some("file") => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await?;
                file = Some((name, content_type, data.to_vec()));
            }
            _ => {}
        }
    }

    let Some((name, content_type, data)) = file else {
        return Err(ServiceError::Validation(vec!["file: is required".to_string()]).into());
    };

    let media =
        storage::upload_media(&state.db, &state.store, &folder, &name, &content_type, &data)?;
    Ok(created(media))
}

pub async fn delete_media(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    storage::delete_media(&state.db, &state.store, id)?;
    Ok(StatusCode::NO_CONTENT)
}

// Analytics

#[derive(Deserialize)]
pub struct DaysQuery {
    days: Option<i64>,
}

pub async fn daily_stats(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<DaysQuery>,
) -> ApiResult<Response> {
    let days = query.days.unwrap_or(DASHBOARD_DAYS);
    let series = analytics::recent_daily_stats(&state.db, days, Utc::now())?;
    Ok(json_single(analytics::summarize(series)).into_response())
}

#[derive(Deserialize)]
pub struct LimitQuery {
    limit: Option<usize>,
}

pub async fn visitors(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Response> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_VISITOR_LIMIT)
        .clamp(1, MAX_VISITOR_LIMIT);
    Ok(json_list(analytics::list_recent_visitors(&state.db, limit)?).into_response())
}

#[derive(Deserialize)]
pub struct ActivityQuery {
    user_id: Option<i64>,
}

/// Activity of the given user, or of the caller when no id is passed.
pub async fn activity(
    State(state): State<Arc<AppState>>,
    AdminUser(user): AdminUser,
    Query(query): Query<ActivityQuery>,
) -> ApiResult<Response> {
    let user_id = query.user_id.unwrap_or(user.id);
    let activity = analytics::get_user_activity(&state.db, user_id)?;
    Ok(json_single(activity).into_response())
}
