use crate::models::{CreateSkill, Skill, SkillCategory, UpdateSkill};
use crate::services::normalize::{migrate_category, normalize_category, normalize_level, SKILL_SCHEMA_VERSION};
use crate::services::validation::{check, ServiceError};
use crate::services::now_timestamp;
use crate::Database;
use anyhow::Result;
use rusqlite::OptionalExtension;
use std::collections::BTreeMap;

const SKILL_COLUMNS: &str =
    "id, name, category, level, icon, schema_version, created_at, updated_at";

fn row_to_skill(row: &rusqlite::Row) -> rusqlite::Result<Skill> {
    let category: Option<String> = row.get(2)?;
    let level: Option<String> = row.get(3)?;
    let version: u32 = row.get(5)?;
    Ok(Skill {
        id: row.get(0)?,
        name: row.get(1)?,
        category: migrate_category(category.as_deref(), version),
        level: normalize_level(level.as_deref()),
        icon: row.get(4)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

pub fn list_skills(db: &Database) -> Result<Vec<Skill>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM skills ORDER BY created_at DESC, id DESC",
        SKILL_COLUMNS
    ))?;
    let skills = stmt
        .query_map([], row_to_skill)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(skills)
}

/// Skills grouped by canonical category, in display order. Empty groups are left out.
pub fn skills_by_category(db: &Database) -> Result<Vec<(SkillCategory, Vec<Skill>)>> {
    let mut groups: BTreeMap<usize, Vec<Skill>> = BTreeMap::new();
    for skill in list_skills(db)? {
        let index = SkillCategory::ALL
            .iter()
            .position(|c| *c == skill.category)
            .unwrap_or(SkillCategory::ALL.len() - 1);
        groups.entry(index).or_default().push(skill);
    }
    Ok(groups
        .into_iter()
        .map(|(index, skills)| (SkillCategory::ALL[index], skills))
        .collect())
}

pub fn get_skill(db: &Database, id: i64) -> Result<Option<Skill>> {
    let conn = db.get()?;
    let skill = conn
        .query_row(
            &format!("SELECT {} FROM skills WHERE id = ?", SKILL_COLUMNS),
            [id],
            row_to_skill,
        )
        .optional()?;
    Ok(skill)
}

pub fn create_skill(db: &Database, input: &CreateSkill) -> Result<i64> {
    check(input)?;

    let category = normalize_category(input.category.as_deref());
    let level = normalize_level(input.level.as_deref());
    let now = now_timestamp();

    let conn = db.get()?;
    conn.execute(
        r#"
        INSERT INTO skills (name, category, level, icon, schema_version, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
        "#,
        rusqlite::params![
            input.name.trim(),
            category.as_str(),
            level.to_string(),
            input.icon.trim(),
            SKILL_SCHEMA_VERSION,
            now,
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!("Created skill {} in {}", id, category);
    Ok(id)
}

/// Every update rewrites the category in canonical form, so legacy rows are
/// upgraded the first time they are edited.
pub fn update_skill(db: &Database, id: i64, input: &UpdateSkill) -> Result<()> {
    check(input)?;

    let existing = get_skill(db, id)?.ok_or(ServiceError::NotFound { entity: "Skill", id })?;

    let name = input
        .name
        .as_deref()
        .map(str::trim)
        .unwrap_or(&existing.name)
        .to_string();
    let category = match input.category.as_deref() {
        Some(raw) => normalize_category(Some(raw)),
        None => existing.category,
    };
    let level = match input.level.as_deref() {
        Some(raw) => normalize_level(Some(raw)),
        None => existing.level,
    };
    let icon = input
        .icon
        .as_deref()
        .map(str::trim)
        .unwrap_or(&existing.icon)
        .to_string();

    let conn = db.get()?;
    conn.execute(
        r#"
        UPDATE skills
        SET name = ?1, category = ?2, level = ?3, icon = ?4, schema_version = ?5, updated_at = ?6
        WHERE id = ?7
        "#,
        rusqlite::params![
            name,
            category.as_str(),
            level.to_string(),
            icon,
            SKILL_SCHEMA_VERSION,
            now_timestamp(),
            id,
        ],
    )?;
    Ok(())
}

pub fn delete_skill(db: &Database, id: i64) -> Result<()> {
    let conn = db.get()?;
    let deleted = conn.execute("DELETE FROM skills WHERE id = ?", [id])?;
    if deleted == 0 {
        return Err(ServiceError::NotFound { entity: "Skill", id }.into());
    }
    Ok(())
}
