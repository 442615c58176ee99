pub mod init;
pub mod migrate;
pub mod serve;
pub mod user;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "folio")]
#[command(version)]
#[command(about = "Portfolio site server with a private admin panel and page-view analytics", long_about = None)]
pub struct Cli {
    #[arg(short, long, default_value = "folio.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a folio.toml and data directories
    Init {
        #[arg(default_value = ".")]
        path: PathBuf,
        #[arg(long)]
        name: Option<String>,
        /// Email allowed into the admin panel
        #[arg(long)]
        admin_email: Option<String>,
    },
    /// Run the web server
    Serve {
        #[arg(short = 'H', long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Apply pending database migrations
    Migrate,
    /// Manage admin panel accounts
    User {
        #[command(subcommand)]
        command: UserCommand,
    },
}

#[derive(Subcommand)]
pub enum UserCommand {
    Add {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, env = "FOLIO_USER_PASSWORD")]
        password: Option<String>,
    },
    List,
    Remove {
        email: String,
    },
    Passwd {
        email: String,
    },
}
