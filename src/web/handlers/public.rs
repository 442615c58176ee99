use crate::models::{Project, Skill, User};
use crate::services::{certifications, experience, projects, skills};
use crate::web::error::AppResult;
use crate::web::extractors::OptionalUser;
use crate::web::state::AppState;
use axum::extract::State;
use axum::response::Html;
use serde::Serialize;
use std::sync::Arc;
use tera::Context;

const SUMMARY_LENGTH: usize = 160;

pub(crate) fn make_context(state: &AppState, user: &Option<User>) -> Context {
    let mut ctx = Context::new();
    ctx.insert("site", &state.config.site);
    ctx.insert("user", user);
    ctx.insert("production_mode", &state.production_mode);
    ctx
}

#[derive(Serialize)]
struct SkillGroup {
    category: &'static str,
    label: &'static str,
    skills: Vec<Skill>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectView {
    #[serde(flatten)]
    project: Project,
    summary: String,
    long_description_html: String,
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    OptionalUser(user): OptionalUser,
) -> AppResult<Html<String>> {
    let skill_groups: Vec<SkillGroup> = skills::skills_by_category(&state.db)?
        .into_iter()
        .map(|(category, skills)| SkillGroup {
            category: category.as_str(),
            label: category.label(),
            skills,
        })
        .collect();

    let projects: Vec<ProjectView> = projects::list_projects(&state.db)?
        .into_iter()
        .map(|project| ProjectView {
            summary: state.markdown.summary(&project.long_description, SUMMARY_LENGTH),
            long_description_html: state.markdown.render(&project.long_description),
            project,
        })
        .collect();

    let mut ctx = make_context(&state, &user);
    ctx.insert("skill_groups", &skill_groups);
    ctx.insert("projects", &projects);
    ctx.insert("certifications", &certifications::list_certifications(&state.db)?);
    ctx.insert("experience", &experience::list_experience(&state.db)?);
    ctx.insert("contact_enabled", &state.config.contact.is_configured());

    let html = state.templates.render("index.html", &ctx)?;
    Ok(Html(html))
}

pub async fn health() -> &'static str {
    "ok"
}
