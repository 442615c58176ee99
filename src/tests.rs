#[cfg(test)]
mod tests {

    mod markdown_tests {
        use crate::services::markdown::MarkdownRenderer;

        #[test]
        fn test_render_basic_markdown() {
            let renderer = MarkdownRenderer::new();
            let html = renderer.render("# Hello World");
            assert!(html.contains("<h1>"));
            assert!(html.contains("Hello World"));
        }

        #[test]
        fn test_render_bold_italic() {
            let renderer = MarkdownRenderer::new();
            let html = renderer.render("**bold** and *italic*");
            assert!(html.contains("<strong>bold</strong>"));
            assert!(html.contains("<em>italic</em>"));
        }

        #[test]
        fn test_render_links_get_rel() {
            let renderer = MarkdownRenderer::new();
            let html = renderer.render("[Repo](https://github.com/example/folio)");
            assert!(html.contains("href=\"https://github.com/example/folio\""));
            assert!(html.contains("noopener noreferrer"));
        }

        #[test]
        fn test_render_strips_scripts() {
            let renderer = MarkdownRenderer::new();
            let html = renderer.render("Hi <script>alert('x')</script>");
            assert!(!html.contains("<script>"));
        }

        #[test]
        fn test_render_drops_javascript_links() {
            let renderer = MarkdownRenderer::new();
            let html = renderer.render("[click](javascript:alert(1))");
            assert!(!html.contains("javascript:"));
        }

        #[test]
        fn test_render_table() {
            let renderer = MarkdownRenderer::new();
            let html = renderer.render("| a | b |\n|---|---|\n| 1 | 2 |");
            assert!(html.contains("<table>"));
            assert!(html.contains("<td>1</td>"));
        }

        #[test]
        fn test_summary_takes_first_paragraph() {
            let renderer = MarkdownRenderer::new();
            let md = "# Title\n\nFirst paragraph with `code`.\n\nSecond paragraph.";
            assert_eq!(renderer.summary(md, 100), "First paragraph with code.");
        }

        #[test]
        fn test_summary_cuts_at_word_boundary() {
            let renderer = MarkdownRenderer::new();
            let summary = renderer.summary("one two three four five", 10);
            assert_eq!(summary, "one two...");
        }
    }

    mod auth_tests {
        use crate::services::auth::{
            generate_session_token, hash_password, validate_password, verify_password,
        };

        const PASSWORD: &str = "Password123";

        #[test]
        fn test_hash_password_produces_hash() {
            let hash = hash_password(PASSWORD).unwrap();
            assert!(hash.starts_with("$argon2"));
        }

        #[test]
        fn test_hash_password_unique() {
            let hash1 = hash_password(PASSWORD).unwrap();
            let hash2 = hash_password(PASSWORD).unwrap();
            assert_ne!(hash1, hash2);
        }

        #[test]
        fn test_verify_password() {
            let hash = hash_password(PASSWORD).unwrap();
            assert!(verify_password(PASSWORD, &hash));
            assert!(!verify_password("Password124", &hash));
            assert!(!verify_password("", &hash));
        }

        #[test]
        fn test_verify_password_invalid_hash() {
            assert!(!verify_password(PASSWORD, "invalid-hash"));
        }

        #[test]
        fn test_password_rules() {
            assert!(validate_password("Short1").is_err());
            assert!(validate_password("alllowercase1").is_err());
            assert!(validate_password("ALLUPPERCASE1").is_err());
            assert!(validate_password("NoDigitsHere").is_err());
            assert!(validate_password(PASSWORD).is_ok());
        }

        #[test]
        fn test_generate_session_token() {
            let token = generate_session_token();
            assert!(token.len() >= 40);
            assert!(token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
            assert_ne!(token, generate_session_token());
        }
    }

    mod model_tests {
        use crate::models::{DeviceType, ProjectStatus, SkillCategory, SkillLevel};
        use std::str::FromStr;

        #[test]
        fn test_project_status_round_trip() {
            for status in [
                ProjectStatus::Completed,
                ProjectStatus::InProgress,
                ProjectStatus::Planned,
            ] {
                assert_eq!(ProjectStatus::from_str(&status.to_string()), Ok(status));
            }
            assert!(ProjectStatus::from_str("abandoned").is_err());
        }

        #[test]
        fn test_project_status_serializes_snake_case() {
            let json = serde_json::to_string(&ProjectStatus::InProgress).unwrap();
            assert_eq!(json, "\"in_progress\"");
        }

        #[test]
        fn test_skill_category_tokens() {
            let json = serde_json::to_string(&SkillCategory::BackendDatabase).unwrap();
            assert_eq!(json, "\"backend_database\"");
            assert_eq!(SkillCategory::default(), SkillCategory::ToolsPlatform);
            assert_eq!(SkillCategory::CloudDevops.label(), "Cloud & DevOps");
            // legacy labels are the normaliser's job, not FromStr's
            assert!(SkillCategory::from_str("Frontend Development").is_err());
        }

        #[test]
        fn test_skill_level_default() {
            assert_eq!(SkillLevel::default(), SkillLevel::Intermediate);
            assert_eq!(SkillLevel::from_str("expert"), Ok(SkillLevel::Expert));
        }

        #[test]
        fn test_device_type_display() {
            assert_eq!(DeviceType::Mobile.to_string(), "mobile");
            assert_eq!(DeviceType::from_str("tablet"), Ok(DeviceType::Tablet));
        }
    }

    mod visitor_context_tests {
        use crate::services::analytics::VisitorContext;
        use crate::services::identity::MemoryStorage;

        #[test]
        fn test_new_visitor_only_once_per_storage() {
            let mut ctx = VisitorContext::new(MemoryStorage::new());
            assert!(ctx.check_new_visitor());
            assert!(!ctx.check_new_visitor());
            assert!(!ctx.check_new_visitor());

            let mut fresh = VisitorContext::new(MemoryStorage::new());
            assert!(fresh.check_new_visitor());
        }

        #[test]
        fn test_new_session_once_per_day() {
            let mut ctx = VisitorContext::new(MemoryStorage::new());
            assert!(ctx.check_new_session("2026-03-01"));
            assert!(!ctx.check_new_session("2026-03-01"));
            assert!(ctx.check_new_session("2026-03-02"));
            assert!(!ctx.check_new_session("2026-03-02"));
        }

        #[test]
        fn test_ids_are_stable_within_a_context() {
            let mut ctx = VisitorContext::new(MemoryStorage::new());
            let visitor = ctx.visitor_id();
            let session = ctx.session_id();
            assert_eq!(ctx.visitor_id(), visitor);
            assert_eq!(ctx.session_id(), session);
        }
    }

    mod summary_tests {
        use crate::models::DailyStat;
        use crate::services::analytics::summarize;
        use std::collections::BTreeMap;

        fn day(date: &str, views: i64, source: &str) -> DailyStat {
            let mut traffic_sources = BTreeMap::new();
            traffic_sources.insert(source.to_string(), views);
            DailyStat {
                date: date.to_string(),
                page_views: views,
                unique_visitors: 1,
                new_visitors: 1,
                traffic_sources,
                ..Default::default()
            }
        }

        #[test]
        fn test_summarize_totals_and_top_sources() {
            let overview = summarize(vec![
                day("2026-03-01", 3, "google"),
                day("2026-03-02", 5, "direct"),
                day("2026-03-03", 2, "google"),
            ]);
            assert_eq!(overview.days, 3);
            assert_eq!(overview.page_views, 10);
            assert_eq!(overview.unique_visitors, 3);
            assert_eq!(overview.page_views_max, 5);
            assert_eq!(
                overview.traffic_sources,
                vec![("direct".to_string(), 5), ("google".to_string(), 5)]
            );
        }

        #[test]
        fn test_summarize_empty() {
            let overview = summarize(Vec::new());
            assert_eq!(overview.page_views, 0);
            assert_eq!(overview.page_views_max, 1);
            assert!(overview.series.is_empty());
        }
    }

    mod config_tests {
        use crate::Config;
        use std::path::Path;

        #[test]
        fn test_config_load_missing_file() {
            let result = Config::load(Path::new("/nonexistent/path.toml"));
            assert!(result.is_err());
        }

        #[test]
        fn test_config_load_valid_toml() {
            use std::io::Write;
            let config_path = std::env::temp_dir().join(format!(
                "test_folio_config_{}.toml",
                uuid::Uuid::new_v4()
            ));

            let config_content = r#"
[site]
title = "Test Portfolio"
url = "http://localhost:3000"

[server]
host = "127.0.0.1"
port = 3000

[database]
path = "data/folio.db"

[media]
upload_dir = "uploads"
max_upload_size = "2MB"
"#;

            let mut file = std::fs::File::create(&config_path).unwrap();
            file.write_all(config_content.as_bytes()).unwrap();

            let config = Config::load(&config_path).unwrap();
            assert_eq!(config.site.title, "Test Portfolio");
            assert_eq!(config.server.port, 3000);
            assert_eq!(config.media.max_upload_bytes().unwrap(), 2 * 1024 * 1024);
            assert!(config.analytics.enabled);

            std::fs::remove_file(&config_path).ok();
        }
    }
}
