use anyhow::Result;
use std::path::PathBuf;

pub async fn run(path: PathBuf, name: Option<String>, admin_email: Option<String>) -> Result<()> {
    let site_name = name.unwrap_or_else(|| "My Portfolio".to_string());
    let config_path = path.join("folio.toml");
    if config_path.exists() {
        anyhow::bail!("{} already exists", config_path.display());
    }

    std::fs::create_dir_all(path.join("data/media"))?;

    let admin_line = match admin_email {
        Some(email) => format!("admin_email = \"{}\"", email.trim()),
        None => "# admin_email = \"you@example.com\"".to_string(),
    };

    let config = format!(
        r#"[site]
title = "{}"
tagline = ""
url = "http://localhost:3000"
language = "en"
allowed_origins = []

[server]
host = "127.0.0.1"
port = 3000
production = false

[database]
path = "./data/folio.db"

[media]
upload_dir = "./data/media"
max_upload_size = "10MB"

[auth]
{}
session_lifetime_days = 7

[analytics]
enabled = true
# mirror_endpoint = "https://collector.example.com/events"

[contact]
# service_id = ""
# template_id = ""
# public_key = ""
"#,
        site_name, admin_line
    );

    std::fs::write(&config_path, config)?;

    tracing::info!("Created new folio site at {:?}", path);
    tracing::info!("Run 'folio migrate' to set up the database");
    tracing::info!("Run 'folio user add --email <you>' to create your admin account");
    tracing::info!("Run 'folio serve' to start the server");

    Ok(())
}
