//! Podcheck CLI: command-line client for a running podcheck server.
//!
//! Subcommands: status, login, verify, logout.

mod commands;

use clap::{Parser, Subcommand};

/// Podcheck: verify personal attributes against authority attestations.
#[derive(Parser, Debug)]
#[command(name = "podcheck", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the session and verification status.
    Status(commands::status::StatusArgs),
    /// Start a login and print the provider URL to open.
    Login(commands::login::LoginArgs),
    /// Verify a date of birth or credit score.
    Verify(commands::verify::VerifyArgs),
    /// End the session.
    Logout(commands::logout::LogoutArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Status(args) => commands::status::run(args).await,
        Commands::Login(args) => commands::login::run(args).await,
        Commands::Verify(args) => commands::verify::run(args).await,
        Commands::Logout(args) => commands::logout::run(args).await,
    }
}
