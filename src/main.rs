//! sqlpractice CLI - practice SQL against bundled sample databases

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "sqlpractice")]
#[command(version)]
#[command(about = "Practice SQL against bundled sample databases and grade your answers")]
#[command(long_about = r#"
sqlpractice loads small sample databases from SQL scripts and lets you:
  • Run ad-hoc queries and export the results
  • Compare your query against a reference query
  • Work through a catalog of graded exercises

Example usage:
  sqlpractice auth register --email ana@example.com
  sqlpractice query rent_a_house "SELECT * FROM cliente"
  sqlpractice exercises solve 2 --query "SELECT * FROM cliente WHERE renta_cli > 2000"
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true, default_value = "sqlpractice.toml")]
    config: PathBuf,

    /// Override the data directory from the config
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// List configured datasets and their state
    Datasets,

    /// Create datasets from their scripts (all configured datasets by default)
    Load {
        /// Dataset name
        dataset: Option<String>,
    },

    /// Delete a dataset so it is rebuilt on next use
    Reset {
        /// Dataset name
        dataset: String,
    },

    /// Run an ad-hoc query and print the result
    Query {
        /// Dataset name
        dataset: String,

        /// SQL to run
        sql: Option<String>,

        /// Read the SQL from a file instead
        #[arg(short, long, conflicts_with = "sql")]
        file: Option<PathBuf>,

        /// Export the result (.csv or .tsv)
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// Compare a query against a reference query
    Check {
        /// Dataset name
        dataset: String,

        /// Your query
        #[arg(short, long)]
        query: String,

        /// Reference query
        #[arg(short, long)]
        reference: String,
    },

    /// Browse and solve graded exercises
    Exercises {
        #[command(subcommand)]
        command: ExerciseCommand,
    },

    /// List slide decks
    Decks,

    /// Manage the local account session
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },

    /// Serve the HTTP API
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

#[derive(Subcommand)]
pub enum ExerciseCommand {
    /// List exercises
    List {
        /// Only show one category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Show one exercise
    Show {
        id: i64,
    },

    /// Grade a query against an exercise
    Solve {
        id: i64,

        /// Your query
        #[arg(short, long)]
        query: String,
    },
}

#[derive(Subcommand)]
pub enum AuthCommand {
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        email: String,
        /// Prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,
        /// Prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Sign out
    Logout,

    /// Show who is signed in
    Whoami,

    /// Request a password reset
    ResetPassword {
        #[arg(short, long)]
        email: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Commands::Init { force } = cli.command {
        return commands::run_init(&cli.config, force);
    }

    let mut config = sqlpractice::config::load_config(Some(&cli.config))?.unwrap_or_default();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir.to_string_lossy().into_owned();
    }
    sqlpractice::config::ensure_data_dir(&config)?;

    let app = commands::App::new(config)?;
    app.run(cli.command)
}
