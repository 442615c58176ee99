use crate::models::{CreateExperience, Experience, UpdateExperience};
use crate::services::validation::{blank_to_none, check, clean_tags, ServiceError};
use crate::services::{decode_list, encode_list, merge_optional, now_timestamp};
use crate::Database;
use anyhow::Result;
use rusqlite::OptionalExtension;

const EXPERIENCE_COLUMNS: &str = "id, company, position, location, start_date, end_date, current, description, technologies, company_url, logo_url, created_at, updated_at";

fn row_to_experience(row: &rusqlite::Row) -> rusqlite::Result<(Experience, String)> {
    Ok((
        Experience {
            id: row.get(0)?,
            company: row.get(1)?,
            position: row.get(2)?,
            location: row.get(3)?,
            start_date: row.get(4)?,
            end_date: row.get(5)?,
            current: row.get(6)?,
            description: row.get(7)?,
            technologies: Vec::new(),
            company_url: row.get(9)?,
            logo_url: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        },
        row.get(8)?,
    ))
}

fn decode((experience, technologies): (Experience, String)) -> Option<Experience> {
    let Some(technologies) = decode_list(&technologies) else {
        tracing::warn!("Skipping experience {}: technologies is not a JSON list", experience.id);
        return None;
    };
    Some(Experience {
        technologies,
        ..experience
    })
}

pub fn list_experience(db: &Database) -> Result<Vec<Experience>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM experience ORDER BY start_date DESC, id DESC",
        EXPERIENCE_COLUMNS
    ))?;
    let rows = stmt
        .query_map([], row_to_experience)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows.into_iter().filter_map(decode).collect())
}

pub fn get_experience(db: &Database, id: i64) -> Result<Option<Experience>> {
    let conn = db.get()?;
    let row = conn
        .query_row(
            &format!("SELECT {} FROM experience WHERE id = ?", EXPERIENCE_COLUMNS),
            [id],
            row_to_experience,
        )
        .optional()?;
    Ok(row.and_then(decode))
}

/// A current position has no end date; any submitted one is dropped.
pub fn create_experience(db: &Database, input: &CreateExperience) -> Result<i64> {
    check(input)?;

    let end_date = if input.current {
        None
    } else {
        blank_to_none(input.end_date.clone())
    };
    let technologies = encode_list(&clean_tags(input.technologies.clone()))?;
    let now = now_timestamp();

    let conn = db.get()?;
    conn.execute(
        r#"
        INSERT INTO experience (company, position, location, start_date, end_date, current,
                                description, technologies, company_url, logo_url,
                                created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
        "#,
        rusqlite::params![
            input.company.trim(),
            input.position.trim(),
            input.location.trim(),
            input.start_date.trim(),
            end_date,
            input.current,
            input.description,
            technologies,
            blank_to_none(input.company_url.clone()),
            blank_to_none(input.logo_url.clone()),
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_experience(db: &Database, id: i64, input: &UpdateExperience) -> Result<()> {
    check(input)?;

    let existing = get_experience(db, id)?
        .ok_or(ServiceError::NotFound { entity: "Experience", id })?;

    let current = input.current.unwrap_or(existing.current);
    let end_date = if current {
        None
    } else {
        merge_optional(input.end_date.as_ref(), existing.end_date.clone())
    };
    let technologies = match &input.technologies {
        Some(tags) => clean_tags(tags.clone()),
        None => existing.technologies.clone(),
    };

    let conn = db.get()?;
    conn.execute(
        r#"
        UPDATE experience
        SET company = ?1, position = ?2, location = ?3, start_date = ?4, end_date = ?5,
            current = ?6, description = ?7, technologies = ?8, company_url = ?9,
            logo_url = ?10, updated_at = ?11
        WHERE id = ?12
        "#,
        rusqlite::params![
            input.company.as_deref().map(str::trim).unwrap_or(&existing.company),
            input.position.as_deref().map(str::trim).unwrap_or(&existing.position),
            input.location.as_deref().map(str::trim).unwrap_or(&existing.location),
            input.start_date.as_deref().map(str::trim).unwrap_or(&existing.start_date),
            end_date,
            current,
            input.description.as_deref().unwrap_or(&existing.description),
            encode_list(&technologies)?,
            merge_optional(input.company_url.as_ref(), existing.company_url.clone()),
            merge_optional(input.logo_url.as_ref(), existing.logo_url.clone()),
            now_timestamp(),
            id,
        ],
    )?;
    Ok(())
}

pub fn delete_experience(db: &Database, id: i64) -> Result<()> {
    let conn = db.get()?;
    let deleted = conn.execute("DELETE FROM experience WHERE id = ?", [id])?;
    if deleted == 0 {
        return Err(ServiceError::NotFound { entity: "Experience", id }.into());
    }
    Ok(())
}
