use crate::models::{CreateProject, Project, ProjectStatus, UpdateProject};
use crate::services::validation::{blank_to_none, check, clean_tags, ServiceError};
use crate::services::{decode_list, encode_list, merge_optional, now_timestamp};
use crate::Database;
use anyhow::Result;
use rusqlite::OptionalExtension;

const PROJECT_COLUMNS: &str = "id, title, description, long_description, tech_stack, github_url, live_url, image_url, featured, status, created_at, updated_at";

struct ProjectRow {
    project: Project,
    tech_stack: String,
}

impl ProjectRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            project: Project {
                id: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                long_description: row.get(3)?,
                tech_stack: Vec::new(),
                github_url: row.get(5)?,
                live_url: row.get(6)?,
                image_url: row.get(7)?,
                featured: row.get(8)?,
                status: row
                    .get::<_, String>(9)?
                    .parse()
                    .unwrap_or(ProjectStatus::Completed),
                created_at: row.get(10)?,
                updated_at: row.get(11)?,
            },
            tech_stack: row.get(4)?,
        })
    }

    fn decode(self) -> Option<Project> {
        match decode_list(&self.tech_stack) {
            Some(tech_stack) => Some(Project {
                tech_stack,
                ..self.project
            }),
            None => {
                tracing::warn!("Skipping project {}: tech_stack is not a JSON list", self.project.id);
                None
            }
        }
    }
}

pub fn list_projects(db: &Database) -> Result<Vec<Project>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM projects ORDER BY created_at DESC, id DESC",
        PROJECT_COLUMNS
    ))?;
    let rows = stmt
        .query_map([], ProjectRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows.into_iter().filter_map(ProjectRow::decode).collect())
}

pub fn list_featured_projects(db: &Database) -> Result<Vec<Project>> {
    Ok(list_projects(db)?.into_iter().filter(|p| p.featured).collect())
}

pub fn get_project(db: &Database, id: i64) -> Result<Option<Project>> {
    let conn = db.get()?;
    let row = conn
        .query_row(
            &format!("SELECT {} FROM projects WHERE id = ?", PROJECT_COLUMNS),
            [id],
            ProjectRow::from_row,
        )
        .optional()?;
    Ok(row.and_then(ProjectRow::decode))
}

pub fn create_project(db: &Database, input: &CreateProject) -> Result<i64> {
    check(input)?;

    let tech_stack = encode_list(&clean_tags(input.tech_stack.clone()))?;
    let now = now_timestamp();

    let conn = db.get()?;
    conn.execute(
        r#"
        INSERT INTO projects (title, description, long_description, tech_stack, github_url,
                              live_url, image_url, featured, status, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
        "#,
        rusqlite::params![
            input.title.trim(),
            input.description.trim(),
            input.long_description,
            tech_stack,
            blank_to_none(input.github_url.clone()),
            blank_to_none(input.live_url.clone()),
            blank_to_none(input.image_url.clone()),
            input.featured,
            input.status.to_string(),
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_project(db: &Database, id: i64, input: &UpdateProject) -> Result<()> {
    check(input)?;

    let existing = get_project(db, id)?.ok_or(ServiceError::NotFound { entity: "Project", id })?;

    let title = input.title.as_deref().map(str::trim).unwrap_or(&existing.title);
    let description = input
        .description
        .as_deref()
        .map(str::trim)
        .unwrap_or(&existing.description);
    let long_description = input
        .long_description
        .as_deref()
        .unwrap_or(&existing.long_description);
    let tech_stack = match &input.tech_stack {
        Some(tags) => clean_tags(tags.clone()),
        None => existing.tech_stack.clone(),
    };

    let conn = db.get()?;
    conn.execute(
        r#"
        UPDATE projects
        SET title = ?1, description = ?2, long_description = ?3, tech_stack = ?4,
            github_url = ?5, live_url = ?6, image_url = ?7, featured = ?8, status = ?9,
            updated_at = ?10
        WHERE id = ?11
        "#,
        rusqlite::params![
            title,
            description,
            long_description,
            encode_list(&tech_stack)?,
            merge_optional(input.github_url.as_ref(), existing.github_url.clone()),
            merge_optional(input.live_url.as_ref(), existing.live_url.clone()),
            merge_optional(input.image_url.as_ref(), existing.image_url.clone()),
            input.featured.unwrap_or(existing.featured),
            input.status.unwrap_or(existing.status).to_string(),
            now_timestamp(),
            id,
        ],
    )?;
    Ok(())
}

pub fn delete_project(db: &Database, id: i64) -> Result<()> {
    let conn = db.get()?;
    let deleted = conn.execute("DELETE FROM projects WHERE id = ?", [id])?;
    if deleted == 0 {
        return Err(ServiceError::NotFound { entity: "Project", id }.into());
    }
    Ok(())
}
