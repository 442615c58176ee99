use crate::services::analytics::PageViewRecorder;
use crate::services::gate::Gate;
use crate::services::markdown::MarkdownRenderer;
use crate::services::sink::{self, AnalyticsSink};
use crate::services::storage::ObjectStore;
use crate::web::security::{CsrfManager, RateLimiter};
use crate::{Config, Database};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tera::{Tera, Value};

pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub templates: Tera,
    pub markdown: MarkdownRenderer,
    pub store: ObjectStore,
    pub recorder: PageViewRecorder,
    pub production_mode: bool,
    pub csrf: CsrfManager,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: Config, db: Database) -> Result<Self> {
        let sink = sink::from_config(&config.analytics);
        Self::with_sink(config, db, sink)
    }

    pub fn with_sink(config: Config, db: Database, sink: Arc<dyn AnalyticsSink>) -> Result<Self> {
        let mut templates = Tera::default();

        templates.register_filter("format_date", format_date_filter);
        templates.add_raw_templates(vec![
            ("base.html", include_str!("../../templates/base.html")),
            ("index.html", include_str!("../../templates/index.html")),
            ("admin/login.html", include_str!("../../templates/admin/login.html")),
            ("admin/unauthorized.html", include_str!("../../templates/admin/unauthorized.html")),
            ("admin/dashboard.html", include_str!("../../templates/admin/dashboard.html")),
        ])?;

        let store = ObjectStore::new(&config.media.upload_dir, config.media.max_upload_bytes()?);
        let recorder = PageViewRecorder::new(db.clone(), sink);
        let production_mode = config.server.production;

        Ok(Self {
            config,
            db,
            templates,
            markdown: MarkdownRenderer::new(),
            store,
            recorder,
            production_mode,
            csrf: CsrfManager,
            rate_limiter: Arc::new(RateLimiter::default()),
        })
    }

    pub fn gate(&self) -> Gate<'_> {
        Gate::new(
            &self.db,
            self.config.auth.admin_email.as_deref(),
            self.config.auth.session_lifetime_days,
        )
    }
}

/// Formats RFC 3339 timestamps and `YYYY-MM[-DD]` dates; anything else is
/// passed through untouched.
fn format_date_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let date_str = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("format_date requires a string"))?;

    let format = args
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("%B %d, %Y");

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date_str) {
        return Ok(Value::String(dt.format(format).to_string()));
    }

    if let Ok(d) = chrono::NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
        return Ok(Value::String(d.format(format).to_string()));
    }

    if let Ok(d) = chrono::NaiveDate::parse_from_str(&format!("{}-01", date_str), "%Y-%m-%d") {
        return Ok(Value::String(d.format("%B %Y").to_string()));
    }

    Ok(Value::String(date_str.to_string()))
}
