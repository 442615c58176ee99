use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub contact: ContactConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    pub title: String,
    #[serde(default)]
    pub tagline: String,
    pub url: String,
    #[serde(default = "default_language")]
    pub language: String,
    /// Origins allowed to call the public API and the tracking endpoint.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub production: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            production: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediaConfig {
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    #[serde(default = "default_max_upload")]
    pub max_upload_size: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            max_upload_size: default_max_upload(),
        }
    }
}

impl MediaConfig {
    /// Parses sizes such as `10MB`, `512KB` or a bare byte count.
    pub fn max_upload_bytes(&self) -> Result<usize> {
        parse_size(&self.max_upload_size)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// The single email address allowed through the admin gate.
    #[serde(default)]
    pub admin_email: Option<String>,
    #[serde(default = "default_session_lifetime_days")]
    pub session_lifetime_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_email: None,
            session_lifetime_days: default_session_lifetime_days(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Optional third-party endpoint that receives a copy of every page view.
    #[serde(default)]
    pub mirror_endpoint: Option<String>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mirror_endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContactConfig {
    #[serde(default = "default_contact_api")]
    pub api_url: String,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub public_key: Option<String>,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            api_url: default_contact_api(),
            service_id: None,
            template_id: None,
            public_key: None,
        }
    }
}

impl ContactConfig {
    pub fn is_configured(&self) -> bool {
        [&self.service_id, &self.template_id, &self.public_key]
            .iter()
            .all(|v| v.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false))
    }
}

fn default_language() -> String {
    "en".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_true() -> bool {
    true
}

fn default_upload_dir() -> String {
    "./data/media".to_string()
}

fn default_max_upload() -> String {
    "10MB".to_string()
}

fn default_session_lifetime_days() -> i64 {
    7
}

fn default_contact_api() -> String {
    "https://api.emailjs.com/api/v1.0/email/send".to_string()
}

fn parse_size(raw: &str) -> Result<usize> {
    let s = raw.trim().to_uppercase();
    let (digits, multiplier) = if let Some(n) = s.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("KB") {
        (n, 1024)
    } else if let Some(n) = s.strip_suffix('B') {
        (n, 1)
    } else {
        (s.as_str(), 1)
    };
    let value: usize = digits
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid size '{}'", raw))?;
    value
        .checked_mul(multiplier)
        .ok_or_else(|| anyhow::anyhow!("Size '{}' is too large", raw))
}

pub const ENV_ADMIN_EMAIL: &str = "FOLIO_ADMIN_EMAIL";
pub const ENV_DATABASE_PATH: &str = "FOLIO_DATABASE_PATH";
pub const ENV_ANALYTICS_ENDPOINT: &str = "FOLIO_ANALYTICS_ENDPOINT";
pub const ENV_CONTACT_SERVICE_ID: &str = "FOLIO_CONTACT_SERVICE_ID";
pub const ENV_CONTACT_TEMPLATE_ID: &str = "FOLIO_CONTACT_TEMPLATE_ID";
pub const ENV_CONTACT_PUBLIC_KEY: &str = "FOLIO_CONTACT_PUBLIC_KEY";

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!(
                "Could not read config file '{}': {}. Run 'folio init' to create one.",
                path.display(),
                e
            )
        })?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Overlays environment variables on top of the file values. Empty values
    /// are ignored so an exported-but-blank variable does not wipe the file.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_ADMIN_EMAIL) {
            self.auth.admin_email = Some(v);
        }
        if let Some(v) = get(ENV_DATABASE_PATH) {
            self.database.path = v;
        }
        if let Some(v) = get(ENV_ANALYTICS_ENDPOINT) {
            self.analytics.mirror_endpoint = Some(v);
        }
        if let Some(v) = get(ENV_CONTACT_SERVICE_ID) {
            self.contact.service_id = Some(v);
        }
        if let Some(v) = get(ENV_CONTACT_TEMPLATE_ID) {
            self.contact.template_id = Some(v);
        }
        if let Some(v) = get(ENV_CONTACT_PUBLIC_KEY) {
            self.contact.public_key = Some(v);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            anyhow::bail!("database.path must not be empty");
        }
        if self.auth.session_lifetime_days <= 0 {
            anyhow::bail!("auth.session_lifetime_days must be greater than 0");
        }
        self.media.max_upload_bytes()?;
        if let Some(ref endpoint) = self.analytics.mirror_endpoint {
            let parsed = url::Url::parse(endpoint)
                .map_err(|e| anyhow::anyhow!("analytics.mirror_endpoint is not a URL: {}", e))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                anyhow::bail!("analytics.mirror_endpoint must use http or https");
            }
        }
        Ok(())
    }

    /// Logs every feature that is running degraded because of missing settings.
    pub fn report_degraded_features(&self) {
        match self.auth.admin_email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => {}
            _ => tracing::error!(
                "No admin email configured (set auth.admin_email or {}); the admin panel will reject every user",
                ENV_ADMIN_EMAIL
            ),
        }
        if !self.contact.is_configured() {
            tracing::warn!("Contact form credentials missing; the contact endpoint is disabled");
        }
        if !self.analytics.enabled {
            tracing::info!("Page-view analytics disabled by configuration");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sample() -> Config {
        toml::from_str(
            r#"
            [site]
            title = "Jane Doe"
            url = "http://localhost:3000"

            [database]
            path = "./data/folio.db"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = sample();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.session_lifetime_days, 7);
        assert!(config.auth.admin_email.is_none());
        assert!(!config.contact.is_configured());
        assert!(config.analytics.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = sample();
        let env: HashMap<&str, &str> = [
            (ENV_ADMIN_EMAIL, "me@example.com"),
            (ENV_CONTACT_SERVICE_ID, "svc"),
            (ENV_CONTACT_TEMPLATE_ID, "tpl"),
            (ENV_CONTACT_PUBLIC_KEY, "key"),
            (ENV_DATABASE_PATH, "  "),
        ]
        .into_iter()
        .collect();

        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.auth.admin_email.as_deref(), Some("me@example.com"));
        assert!(config.contact.is_configured());
        assert_eq!(config.database.path, "./data/folio.db");
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("10MB").unwrap(), 10 * 1024 * 1024);
        assert_eq!(parse_size("512kb").unwrap(), 512 * 1024);
        assert_eq!(parse_size("2048").unwrap(), 2048);
        assert!(parse_size("lots").is_err());
    }

    #[test]
    fn test_parse_size_overflow_is_an_error() {
        let huge = format!("{}MB", usize::MAX);
        assert!(parse_size(&huge).is_err());
        assert!(parse_size(&usize::MAX.to_string()).is_ok());
    }

    #[test]
    fn test_rejects_non_http_mirror_endpoint() {
        let mut config = sample();
        config.analytics.mirror_endpoint = Some("ftp://collector.example.com".to_string());
        assert!(config.validate().is_err());
    }
}
