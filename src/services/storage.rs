use crate::models::Media;
use crate::services::now_timestamp;
use crate::services::validation::ServiceError;
use crate::Database;
use anyhow::{bail, Result};
use rusqlite::OptionalExtension;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

/// Public URL prefix the upload directory is served under.
pub const MEDIA_URL_PREFIX: &str = "/media";

const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    "application/pdf",
];

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub path: String,
    pub url: String,
    pub mime_type: String,
    pub size_bytes: usize,
}

/// Files under a local directory, addressed by `/`-separated relative paths.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    root: PathBuf,
    max_bytes: usize,
}

impl ObjectStore {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stores `data` under `<folder>/<uuid>.<ext>`. The content type is sniffed
    /// from the bytes when possible and the declared one is only a fallback.
    pub fn upload(&self, folder: &str, original_name: &str, declared_mime: &str, data: &[u8]) -> Result<StoredObject> {
        if data.is_empty() {
            return Err(rejected("file is empty".to_string()));
        }
        if data.len() > self.max_bytes {
            return Err(rejected(format!(
                "file too large: {} bytes (max {} bytes)",
                data.len(),
                self.max_bytes
            )));
        }

        let mime_type = detect_mime(original_name, declared_mime, data);
        if !ALLOWED_MIME_TYPES.contains(&mime_type.as_str()) {
            return Err(rejected(format!(
                "type not allowed: {}. Allowed types: {}",
                mime_type,
                ALLOWED_MIME_TYPES.join(", ")
            )));
        }

        let folder = sanitize_folder(folder);
        let filename = match extension_for(original_name, &mime_type) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        let path = if folder.is_empty() {
            filename
        } else {
            format!("{}/{}", folder, filename)
        };

        let file_path = self.resolve(&path)?;
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&file_path, data)?;
        tracing::info!("Stored {} ({} bytes)", path, data.len());

        Ok(StoredObject {
            url: public_url(&path),
            path,
            mime_type,
            size_bytes: data.len(),
        })
    }

    pub fn delete(&self, path: &str) -> Result<()> {
        let file_path = self.resolve(path)?;
        if file_path.exists() {
            std::fs::remove_file(file_path)?;
        }
        Ok(())
    }

    /// Rejects absolute paths and `..` so callers cannot escape the root.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            bail!("Invalid object path: {}", path);
        }
        Ok(self.root.join(relative))
    }
}

fn rejected(reason: String) -> anyhow::Error {
    ServiceError::Validation(vec![format!("file: {}", reason)]).into()
}

pub fn public_url(path: &str) -> String {
    format!("{}/{}", MEDIA_URL_PREFIX, path.trim_start_matches('/'))
}

fn detect_mime(original_name: &str, declared: &str, data: &[u8]) -> String {
    // text sniffing cannot tell SVG from any other XML
    if let Some(kind) = infer::get(data).filter(|k| k.matcher_type() != infer::MatcherType::Text) {
        return kind.mime_type().to_string();
    }
    let guessed = mime_guess::from_path(original_name).first_raw();
    match guessed {
        Some(m) => m.to_string(),
        None => declared.trim().to_lowercase(),
    }
}

fn extension_for(original_name: &str, mime_type: &str) -> Option<String> {
    let from_name = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .filter(|e| {
            mime_guess::from_ext(e)
                .iter_raw()
                .any(|m| m == mime_type)
        });
    from_name.or_else(|| {
        mime_guess::get_mime_extensions_str(mime_type)
            .and_then(|exts| exts.first())
            .map(|e| e.to_string())
    })
}

fn sanitize_folder(folder: &str) -> String {
    folder
        .split('/')
        .map(|segment| {
            segment
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

fn row_to_media(row: &rusqlite::Row) -> rusqlite::Result<Media> {
    let path: String = row.get(1)?;
    Ok(Media {
        id: row.get(0)?,
        url: public_url(&path),
        path,
        original_name: row.get(2)?,
        mime_type: row.get(3)?,
        size_bytes: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub fn upload_media(
    db: &Database,
    store: &ObjectStore,
    folder: &str,
    original_name: &str,
    declared_mime: &str,
    data: &[u8],
) -> Result<Media> {
    let object = store.upload(folder, original_name, declared_mime, data)?;
    let created_at = now_timestamp();
    let conn = db.get()?;
    let inserted = conn.execute(
        "INSERT INTO media (path, original_name, mime_type, size_bytes, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            object.path,
            original_name,
            object.mime_type,
            object.size_bytes as i64,
            created_at,
        ],
    );
    if let Err(e) = inserted {
        // keep the directory in step with the table
        if let Err(cleanup) = store.delete(&object.path) {
            tracing::warn!("Failed to remove orphaned upload {}: {}", object.path, cleanup);
        }
        return Err(e.into());
    }

    Ok(Media {
        id: conn.last_insert_rowid(),
        path: object.path,
        url: object.url,
        original_name: original_name.to_string(),
        mime_type: object.mime_type,
        size_bytes: object.size_bytes as i64,
        created_at,
    })
}

pub fn list_media(db: &Database, limit: usize, offset: usize) -> Result<Vec<Media>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(
        "SELECT id, path, original_name, mime_type, size_bytes, created_at FROM media ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
    )?;
    let media = stmt
        .query_map((limit as i64, offset as i64), row_to_media)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(media)
}

pub fn get_media(db: &Database, id: i64) -> Result<Option<Media>> {
    let conn = db.get()?;
    let media = conn
        .query_row(
            "SELECT id, path, original_name, mime_type, size_bytes, created_at FROM media WHERE id = ?",
            [id],
            row_to_media,
        )
        .optional()?;
    Ok(media)
}

pub fn delete_media(db: &Database, store: &ObjectStore, id: i64) -> Result<()> {
    let media = get_media(db, id)?.ok_or(ServiceError::NotFound { entity: "Media", id })?;
    store.delete(&media.path)?;
    let conn = db.get()?;
    conn.execute("DELETE FROM media WHERE id = ?", [id])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

    #[test]
    fn test_sanitize_folder() {
        assert_eq!(sanitize_folder("Projects/Covers"), "projects/covers");
        assert_eq!(sanitize_folder("../../etc"), "etc");
        assert_eq!(sanitize_folder(""), "");
    }

    #[test]
    fn test_public_url() {
        assert_eq!(public_url("projects/a.png"), "/media/projects/a.png");
        assert_eq!(public_url("/a.png"), "/media/a.png");
    }

    #[test]
    fn test_detect_mime_prefers_content() {
        assert_eq!(detect_mime("cover.jpg", "image/jpeg", PNG_HEADER), "image/png");
        assert_eq!(detect_mime("logo.svg", "", b"<svg></svg>"), "image/svg+xml");
    }

    #[test]
    fn test_upload_and_delete_round_trip() {
        let dir = std::env::temp_dir().join(format!("folio-store-{}", Uuid::new_v4()));
        let store = ObjectStore::new(&dir, 1024);

        let object = store
            .upload("projects", "cover.png", "image/png", PNG_HEADER)
            .expect("upload");
        assert!(object.path.starts_with("projects/"));
        assert!(object.path.ends_with(".png"));
        assert_eq!(object.url, format!("/media/{}", object.path));
        assert!(dir.join(&object.path).exists());

        store.delete(&object.path).expect("delete");
        assert!(!dir.join(&object.path).exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_upload_rejects_disallowed_and_oversized() {
        let store = ObjectStore::new(std::env::temp_dir(), 4);
        assert!(store.upload("", "a.png", "image/png", PNG_HEADER).is_err());

        let store = ObjectStore::new(std::env::temp_dir(), 1024);
        assert!(store
            .upload("", "run.sh", "application/x-sh", b"#!/bin/sh\necho hi\n")
            .is_err());
        assert!(store.upload("", "a.png", "image/png", b"").is_err());
    }

    #[test]
    fn test_resolve_rejects_escapes() {
        let store = ObjectStore::new("/tmp/folio", 1024);
        assert!(store.resolve("../secret").is_err());
        assert!(store.resolve("/etc/passwd").is_err());
        assert!(store.resolve("projects/a.png").is_ok());
    }
}
