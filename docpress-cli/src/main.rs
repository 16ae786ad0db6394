//! Main entry point for the DocPress CLI.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use client::{ApiError, App};
use dotenv::dotenv;
use shared::config::ClientConfig;
use std::path::PathBuf;

mod commands;
mod logging;

use commands::{
    export::ExportCommand,
    files::FilesCommand,
    manual::ManualCommand,
    navigate::NavigateArgs,
    projects::ProjectsCommand,
    session::{LoginArgs, RegisterArgs},
};

/// DocPress CLI
#[derive(Parser)]
#[command(name = "docpress")]
#[command(about = "Command-line client for the DocPress export service", long_about = None)]
struct Cli {
    /// Path to the configuration file (optional)
    #[arg(
        long,
        short,
        global = true,
        help = "Path to the configuration file (e.g., config.yaml or config.json). If not provided, defaults and DOCPRESS_* variables are used."
    )]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for the DocPress CLI
#[derive(Subcommand)]
enum Commands {
    /// Sign in and persist the session token
    Login(LoginArgs),

    /// Create a new account
    Register(RegisterArgs),

    /// Forget the persisted session token
    Logout,

    /// Verify the persisted session and show the signed-in user
    Whoami,

    /// Manage projects
    #[command(subcommand)]
    Projects(ProjectsCommand),

    /// Upload and attach source files
    #[command(subcommand)]
    Files(FilesCommand),

    /// Edit operation manual sections
    #[command(subcommand)]
    Manual(ManualCommand),

    /// Queue and track PDF exports
    #[command(subcommand)]
    Export(ExportCommand),

    /// Show where the application would take you for a path
    Navigate(NavigateArgs),

    /// Generate a configuration file
    Config {
        /// Format of the configuration file to generate (yaml or json). Defaults to yaml.
        #[arg(
            long,
            short,
            help = "Format of the configuration file to generate (yaml or json). Defaults to yaml."
        )]
        format: Option<String>,
    },

    /// Generate shell completion scripts for the CLI
    Completion {
        /// The shell type for which to generate the completion script
        #[arg(long, short, value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let result = run(cli).await;
    if let Err(err) = &result {
        let expired = err.chain().any(|cause| {
            matches!(
                cause.downcast_ref::<ApiError>(),
                Some(ApiError::Unauthorized)
            )
        });
        if expired {
            eprintln!("hint: run `docpress login` to sign in again");
        }
    }
    result
}

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Completion { shell } => {
            commands::completion::generate_completion(*shell);
            return Ok(());
        }
        Commands::Config { format } => {
            return commands::config::generate_config(format.as_deref().unwrap_or("yaml"));
        }
        _ => {}
    }

    let config = ClientConfig::load_config(cli.config).context("failed to load configuration")?;
    let level = logging::initialize_tracing(&config);
    tracing::debug!(%level, api = %config.api_base_url, "configuration loaded");
    let app = App::new(&config).context("failed to initialise the API client")?;

    match cli.command {
        Commands::Login(args) => commands::session::login(&app, args).await,
        Commands::Register(args) => commands::session::register(&app, args).await,
        Commands::Logout => {
            commands::session::logout(&app);
            Ok(())
        }
        Commands::Whoami => commands::session::whoami(&app).await,
        Commands::Projects(command) => commands::projects::run(&app, command).await,
        Commands::Files(command) => commands::files::run(&app, command).await,
        Commands::Manual(command) => commands::manual::run(&app, command).await,
        Commands::Export(command) => commands::export::run(&app, command).await,
        Commands::Navigate(args) => commands::navigate::navigate(&app, &args).await,
        Commands::Config { .. } | Commands::Completion { .. } => Ok(()),
    }
}
