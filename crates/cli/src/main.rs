//! JWT Pizza CLI - schema bootstrap and account management.
//!
//! # Usage
//!
//! ```bash
//! # Create the pizza schema and tables if they do not exist
//! pizza-cli db init
//!
//! # Create an admin account
//! pizza-cli admin create -n "Pizza Admin" -e admin@jwt.com -p 'correct horse'
//! ```
//!
//! Both commands read `PIZZA_DATABASE_URL` (or `DATABASE_URL`), optionally
//! from a `.env` file.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pizza-cli")]
#[command(author, version, about = "JWT Pizza CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database management
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Create the schema and tables if absent
    Init,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Email address (login)
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Db { action } => match action {
            DbAction::Init => commands::db::init().await?,
        },
        Commands::Admin { action } => match action {
            AdminAction::Create {
                name,
                email,
                password,
            } => {
                commands::admin::create_user(&name, &email, &password).await?;
            }
        },
    }
    Ok(())
}
