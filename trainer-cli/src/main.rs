#![forbid(unsafe_code)]

//! Main entry point for the Mongo Trainer CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use dotenv::dotenv;
use std::path::PathBuf;

mod app;
mod commands;
mod logging;

use app::App;
use commands::{
    admin::AdminCommand, assignments::AssignmentsCommand, session::SessionCommand,
    topics::TopicsCommand,
};

/// Mongo Trainer CLI
#[derive(Parser, Debug)]
#[command(name = "trainer")]
#[command(version, about = "Command-line client for the Mongo Trainer", long_about = None)]
pub(crate) struct Cli {
    /// Path to the configuration file (optional)
    #[arg(
        long,
        short,
        global = true,
        help = "Path to the configuration file (trainer.yaml, trainer.json or trainer.toml). If not provided, defaults and TRAINER_* environment variables are used."
    )]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for the Mongo Trainer CLI
#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign up, sign in, inspect or end the stored session
    #[command(subcommand)]
    Session(SessionCommand),

    /// Browse topics
    #[command(subcommand)]
    Topics(TopicsCommand),

    /// Open assignments, submit attempts and review history
    #[command(subcommand)]
    Assignments(AssignmentsCommand),

    /// Admin views: request logs, users, and the topic and assignment catalogues
    #[command(subcommand)]
    Admin(AdminCommand),

    /// Generate shell completion scripts for the CLI
    Completion {
        /// The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)
        #[arg(
            long,
            short,
            value_enum,
            help = "The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)"
        )]
        shell: Shell,
    },

    /// Generate a configuration file
    Config {
        /// Format of the configuration file to generate (yaml, json or toml). Defaults to yaml.
        #[arg(
            long,
            short,
            help = "Format of the configuration file to generate (yaml, json or toml). Defaults to yaml."
        )]
        format: Option<String>,

        /// Where to write the file. Defaults to trainer.<format> in the current directory.
        #[arg(
            long,
            short,
            help = "Where to write the file. Defaults to trainer.<format> in the current directory."
        )]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Completion { shell } => {
            commands::completion::generate_completion(shell);
        }
        Commands::Config { format, output } => {
            commands::config::generate_config(format.as_deref().unwrap_or("yaml"), output)?;
        }
        Commands::Session(command) => {
            let app = App::load(cli.config)?;
            commands::session::run(&app, command).await?;
        }
        Commands::Topics(command) => {
            let app = App::load(cli.config)?;
            commands::topics::run(&app, command).await?;
        }
        Commands::Assignments(command) => {
            let app = App::load(cli.config)?;
            commands::assignments::run(&app, command).await?;
        }
        Commands::Admin(command) => {
            let app = App::load(cli.config)?;
            commands::admin::run(&app, command).await?;
        }
    }

    Ok(())
}
