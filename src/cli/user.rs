use crate::{services::auth, Config, Database};
use anyhow::Result;
use std::path::Path;

use super::UserCommand;

fn prompt_new_password(prompt: &str) -> Result<String> {
    let password = rpassword::prompt_password(prompt)?;
    let password_confirm = rpassword::prompt_password("Confirm password: ")?;
    if password != password_confirm {
        anyhow::bail!("Passwords do not match");
    }
    Ok(password)
}

pub async fn run(config_path: &Path, command: UserCommand) -> Result<()> {
    let config = Config::load(config_path)?;
    let db = Database::open(&config.database.path)?;
    db.migrate()?;

    match command {
        UserCommand::Add {
            email,
            name,
            password,
        } => {
            let password = match password {
                Some(p) => p,
                None => prompt_new_password("Password: ")?,
            };

            auth::create_user(&db, &email, &name, &password)?;
            tracing::info!("User '{}' created", auth::normalize_email(&email));

            let is_admin = crate::services::gate::is_admin_email(
                config.auth.admin_email.as_deref(),
                &email,
            );
            if !is_admin {
                tracing::warn!(
                    "'{}' is not the configured admin email and will be refused by the admin panel",
                    email
                );
            }
        }
        UserCommand::List => {
            let users = auth::list_users(&db)?;
            println!("{:<40} {:<25} {:<25}", "EMAIL", "NAME", "CREATED");
            println!("{}", "-".repeat(90));
            for user in users {
                println!(
                    "{:<40} {:<25} {:<25}",
                    user.email, user.display_name, user.created_at
                );
            }
        }
        UserCommand::Remove { email } => {
            auth::delete_user(&db, &email)?;
            tracing::info!("User '{}' removed", email);
        }
        UserCommand::Passwd { email } => {
            let password = prompt_new_password("New password: ")?;
            auth::update_password(&db, &email, &password)?;
            tracing::info!("Password updated for '{}'", email);
        }
    }

    Ok(())
}
