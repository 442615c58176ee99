use crate::models::{Certification, CreateCertification, UpdateCertification};
use crate::services::validation::{blank_to_none, check, clean_tags, ServiceError};
use crate::services::{decode_list, encode_list, merge_optional, now_timestamp};
use crate::Database;
use anyhow::Result;
use rusqlite::OptionalExtension;

const CERTIFICATION_COLUMNS: &str = "id, title, issuer, issue_date, expiry_date, credential_id, credential_url, image_url, skills, created_at, updated_at";

fn row_to_certification(row: &rusqlite::Row) -> rusqlite::Result<(Certification, String)> {
    Ok((
        Certification {
            id: row.get(0)?,
            title: row.get(1)?,
            issuer: row.get(2)?,
            issue_date: row.get(3)?,
            expiry_date: row.get(4)?,
            credential_id: row.get(5)?,
            credential_url: row.get(6)?,
            image_url: row.get(7)?,
            skills: Vec::new(),
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        },
        row.get(8)?,
    ))
}

fn decode((certification, skills): (Certification, String)) -> Option<Certification> {
    let Some(skills) = decode_list(&skills) else {
        tracing::warn!("Skipping certification {}: skills is not a JSON list", certification.id);
        return None;
    };
    Some(Certification {
        skills,
        ..certification
    })
}

pub fn list_certifications(db: &Database) -> Result<Vec<Certification>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM certifications ORDER BY issue_date DESC, id DESC",
        CERTIFICATION_COLUMNS
    ))?;
    let rows = stmt
        .query_map([], row_to_certification)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows.into_iter().filter_map(decode).collect())
}

pub fn get_certification(db: &Database, id: i64) -> Result<Option<Certification>> {
    let conn = db.get()?;
    let row = conn
        .query_row(
            &format!("SELECT {} FROM certifications WHERE id = ?", CERTIFICATION_COLUMNS),
            [id],
            row_to_certification,
        )
        .optional()?;
    Ok(row.and_then(decode))
}

pub fn create_certification(db: &Database, input: &CreateCertification) -> Result<i64> {
    check(input)?;

    let skills = encode_list(&clean_tags(input.skills.clone()))?;
    let now = now_timestamp();

    let conn = db.get()?;
    conn.execute(
        r#"
        INSERT INTO certifications (title, issuer, issue_date, expiry_date, credential_id,
                                    credential_url, image_url, skills, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
        "#,
        rusqlite::params![
            input.title.trim(),
            input.issuer.trim(),
            input.issue_date.trim(),
            blank_to_none(input.expiry_date.clone()),
            blank_to_none(input.credential_id.clone()),
            blank_to_none(input.credential_url.clone()),
            blank_to_none(input.image_url.clone()),
            skills,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_certification(db: &Database, id: i64, input: &UpdateCertification) -> Result<()> {
    check(input)?;

    let existing = get_certification(db, id)?
        .ok_or(ServiceError::NotFound { entity: "Certification", id })?;

    let skills = match &input.skills {
        Some(tags) => clean_tags(tags.clone()),
        None => existing.skills.clone(),
    };

    let conn = db.get()?;
    conn.execute(
        r#"
        UPDATE certifications
        SET title = ?1, issuer = ?2, issue_date = ?3, expiry_date = ?4, credential_id = ?5,
            credential_url = ?6, image_url = ?7, skills = ?8, updated_at = ?9
        WHERE id = ?10
        "#,
        rusqlite::params![
            input.title.as_deref().map(str::trim).unwrap_or(&existing.title),
            input.issuer.as_deref().map(str::trim).unwrap_or(&existing.issuer),
            input.issue_date.as_deref().map(str::trim).unwrap_or(&existing.issue_date),
            merge_optional(input.expiry_date.as_ref(), existing.expiry_date.clone()),
            merge_optional(input.credential_id.as_ref(), existing.credential_id.clone()),
            merge_optional(input.credential_url.as_ref(), existing.credential_url.clone()),
            merge_optional(input.image_url.as_ref(), existing.image_url.clone()),
            encode_list(&skills)?,
            now_timestamp(),
            id,
        ],
    )?;
    Ok(())
}

pub fn delete_certification(db: &Database, id: i64) -> Result<()> {
    let conn = db.get()?;
    let deleted = conn.execute("DELETE FROM certifications WHERE id = ?", [id])?;
    if deleted == 0 {
        return Err(ServiceError::NotFound { entity: "Certification", id }.into());
    }
    Ok(())
}
