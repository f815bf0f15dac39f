//! diary-user: manage login accounts for the diary API.
//!
//! Passwords are stored as Argon2id PHC strings; the plaintext never reaches
//! the database.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use diary_api::auth::{hash_password, MIN_PASSWORD_LENGTH};
use diary_core::defaults::{DEFAULT_DATABASE_URL, ENV_DATABASE_URL};
use diary_db::{Database, UserRepository};

#[derive(Parser)]
#[command(name = "diary-user")]
#[command(author, version, about = "Manage diary API user accounts")]
#[command(propagate_version = true)]
struct Cli {
    /// PostgreSQL connection string (default: $DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a user with a hashed password
    Create {
        /// Login email
        #[arg(short, long)]
        email: String,

        /// Display name, also accepted as a login
        #[arg(short, long)]
        name: Option<String>,

        /// Password (min 8 characters)
        #[arg(short, long)]
        password: String,
    },

    /// Print the PHC hash of a password without touching the database
    Hash {
        password: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Create {
            email,
            name,
            password,
        } => {
            check_password(&password)?;
            let database_url = cli
                .database_url
                .or_else(|| std::env::var(ENV_DATABASE_URL).ok())
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
            let db = Database::connect(&database_url).await?;
            let hash = hash_password(&password)?;
            let user = db.users.create(email.trim(), name.as_deref(), &hash).await?;
            println!("Created user {} <{}>", user.id, user.email);
        }
        Commands::Hash { password } => {
            check_password(&password)?;
            println!("{}", hash_password(&password)?);
        }
    }
    Ok(())
}

fn check_password(password: &str) -> anyhow::Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        anyhow::bail!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        );
    }
    Ok(())
}
