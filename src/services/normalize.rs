//! Lazy migration of skill rows.
//!
//! Older rows carry free-text category labels. Nothing rewrites them in bulk:
//! every read maps the stored value to a [`SkillCategory`], and every write
//! stores the canonical token together with [`SKILL_SCHEMA_VERSION`], so the
//! table converges as rows are touched.

use crate::models::{SkillCategory, SkillLevel};

/// Version written alongside every skill row.
///
/// * 0 - category is whatever text the editor typed
/// * 1 - category is a canonical [`SkillCategory`] token
pub const SKILL_SCHEMA_VERSION: u32 = 1;

const LEGACY_CATEGORIES: &[(&str, SkillCategory)] = &[
    ("frontend development", SkillCategory::Frontend),
    ("front-end", SkillCategory::Frontend),
    ("front end", SkillCategory::Frontend),
    ("backend & database", SkillCategory::BackendDatabase),
    ("backend and database", SkillCategory::BackendDatabase),
    ("backend development", SkillCategory::BackendDatabase),
    ("database", SkillCategory::BackendDatabase),
    ("programming languages", SkillCategory::Languages),
    ("cloud & devops", SkillCategory::CloudDevops),
    ("devops & cloud", SkillCategory::CloudDevops),
    ("tools & platforms", SkillCategory::ToolsPlatform),
    ("tools and platforms", SkillCategory::ToolsPlatform),
];

/// Maps any stored or submitted category to the canonical enum. Total: unknown,
/// empty and missing input fall back to `tools_platform`.
pub fn normalize_category(raw: Option<&str>) -> SkillCategory {
    let key = match raw.map(|s| s.trim().to_lowercase()) {
        Some(k) if !k.is_empty() => k,
        _ => return SkillCategory::default(),
    };

    if let Some((_, category)) = LEGACY_CATEGORIES.iter().find(|(label, _)| *label == key) {
        return *category;
    }

    key.parse().unwrap_or_default()
}

/// Same trim/lowercase/allow-list treatment for the skill level.
pub fn normalize_level(raw: Option<&str>) -> SkillLevel {
    raw.map(|s| s.trim().to_lowercase())
        .and_then(|s| s.parse().ok())
        .unwrap_or_default()
}

/// Brings a category stored under `from_version` up to the current version.
/// Each step only knows about its predecessor; add a new arm per version bump.
pub fn migrate_category(raw: Option<&str>, from_version: u32) -> SkillCategory {
    let mut version = from_version;
    let mut value: Option<String> = raw.map(str::to_string);

    while version < SKILL_SCHEMA_VERSION {
        value = match version {
            0 => Some(normalize_category(value.as_deref()).as_str().to_string()),
            _ => value,
        };
        version += 1;
    }

    // Rows claiming the current version are still untrusted input.
    normalize_category(value.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_labels_map_to_canonical() {
        assert_eq!(
            normalize_category(Some("Frontend Development")),
            SkillCategory::Frontend
        );
        assert_eq!(
            normalize_category(Some("  Backend & Database ")),
            SkillCategory::BackendDatabase
        );
        assert_eq!(
            normalize_category(Some("TOOLS AND PLATFORMS")),
            SkillCategory::ToolsPlatform
        );
        assert_eq!(
            normalize_category(Some("Tools & Platforms")),
            SkillCategory::ToolsPlatform
        );
        assert_eq!(
            normalize_category(Some("Programming Languages")),
            SkillCategory::Languages
        );
        assert_eq!(
            normalize_category(Some("DevOps & Cloud")),
            SkillCategory::CloudDevops
        );
    }

    #[test]
    fn test_canonical_tokens_pass_through() {
        for category in SkillCategory::ALL {
            assert_eq!(normalize_category(Some(category.as_str())), category);
            assert_eq!(
                normalize_category(Some(&category.as_str().to_uppercase())),
                category
            );
        }
    }

    #[test]
    fn test_unknown_and_empty_fall_back() {
        assert_eq!(normalize_category(None), SkillCategory::ToolsPlatform);
        assert_eq!(normalize_category(Some("")), SkillCategory::ToolsPlatform);
        assert_eq!(normalize_category(Some("   \t")), SkillCategory::ToolsPlatform);
        assert_eq!(
            normalize_category(Some("Underwater basket weaving")),
            SkillCategory::ToolsPlatform
        );
        // near misses are not fuzzy-matched
        assert_eq!(normalize_category(Some("frontend!")), SkillCategory::ToolsPlatform);
    }

    #[test]
    fn test_normalize_category_is_idempotent() {
        let inputs = [
            "frontend development",
            "Backend and Database",
            "cloud_devops",
            "nonsense",
            "",
            "front end",
        ];
        for input in inputs {
            let once = normalize_category(Some(input));
            let twice = normalize_category(Some(once.as_str()));
            assert_eq!(once, twice, "input {:?}", input);
        }
    }

    #[test]
    fn test_normalize_level() {
        assert_eq!(normalize_level(Some(" Expert ")), SkillLevel::Expert);
        assert_eq!(normalize_level(Some("BEGINNER")), SkillLevel::Beginner);
        assert_eq!(normalize_level(Some("advanced")), SkillLevel::Advanced);
        assert_eq!(normalize_level(Some("guru")), SkillLevel::Intermediate);
        assert_eq!(normalize_level(Some("")), SkillLevel::Intermediate);
        assert_eq!(normalize_level(None), SkillLevel::Intermediate);
    }

    #[test]
    fn test_migrate_from_every_version() {
        assert_eq!(
            migrate_category(Some("Frontend Development"), 0),
            SkillCategory::Frontend
        );
        assert_eq!(
            migrate_category(Some("backend_database"), SKILL_SCHEMA_VERSION),
            SkillCategory::BackendDatabase
        );
        // a current-version row with a corrupted value still lands on the default
        assert_eq!(
            migrate_category(Some("Garbage"), SKILL_SCHEMA_VERSION),
            SkillCategory::ToolsPlatform
        );
    }
}
