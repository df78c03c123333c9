//! Studyhall client CLI - session and routing diagnostics.
//!
//! # Usage
//!
//! ```bash
//! # Log in and persist the session
//! studyhall login -e student@example.com -p secret
//!
//! # Show the current session
//! studyhall whoami
//!
//! # Refresh the profile from the server first
//! studyhall whoami --refresh
//!
//! # Evaluate where a navigation attempt would land
//! studyhall guard /admin/users
//!
//! # Clear the session
//! studyhall logout
//! ```
//!
//! # Commands
//!
//! - `login` - Authenticate and persist the session
//! - `whoami` - Print the current session
//! - `guard` - Resolve a navigation attempt against the current session
//! - `logout` - Clear the persisted session

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout)]

use std::sync::Arc;

use clap::{Parser, Subcommand};
use secrecy::SecretString;

use studyhall_client::api::ApiClient;
use studyhall_client::config::ClientConfig;
use studyhall_client::nav::Navigator;
use studyhall_client::notify::{SessionWatch, TracingNotifier};
use studyhall_client::session::storage::{FileStorage, StateStorage};
use studyhall_client::session::{Credentials, SessionRead, SessionStore};
use studyhall_core::Email;

#[derive(Parser)]
#[command(name = "studyhall")]
#[command(author, version, about = "Studyhall client diagnostics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate and persist the session
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Print the current session
    Whoami {
        /// Re-fetch the profile from the server before printing
        #[arg(long)]
        refresh: bool,
    },
    /// Resolve a navigation attempt against the current session
    Guard {
        /// Path to navigate to
        path: String,
    },
    /// Clear the persisted session
    Logout,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studyhall_client=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    let storage: Arc<dyn StateStorage> = Arc::new(FileStorage::new(config.state_file.clone()));
    let api = ApiClient::new(
        &config,
        Arc::clone(&storage),
        Arc::new(TracingNotifier),
        SessionWatch::new(),
    )?;
    let mut session = SessionStore::new(api.clone(), storage);

    match cli.command {
        Commands::Login { email, password } => {
            let credentials = Credentials {
                email: Email::parse(&email)?,
                password: SecretString::from(password),
            };
            session.login(&credentials).await?;
            println!("Logged in as {}", describe(&session));
        }
        Commands::Whoami { refresh } => {
            if refresh {
                session.refresh_from_server().await?;
            }
            println!("{}", describe(&session));
        }
        Commands::Guard { path } => {
            let mut navigator = Navigator::new(api.watch());
            let landed = navigator.navigate(&path, &session);
            println!("{path} -> {landed}");
        }
        Commands::Logout => {
            session.logout();
            println!("Logged out");
        }
    }
    Ok(())
}

fn describe(session: &SessionStore) -> String {
    match session.profile() {
        Some(profile) if session.is_logged_in() => {
            format!("{} <{}> ({})", profile.name, profile.email, profile.role)
        }
        _ => "not logged in".to_string(),
    }
}
