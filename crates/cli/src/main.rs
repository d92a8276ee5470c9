//! ghdocs CLI, the main entry point.
//!
//! Commands:
//! - `discover`: find, rank and fetch a repository's documentation
//! - `list`: show the ranked documentation without fetching it
//! - `config`: show, locate or validate the configuration
//! - `doctor`: diagnose configuration and GitHub connectivity

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "ghdocs",
    about = "ghdocs: GitHub documentation discovery",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover, rank and fetch the documentation of a repository
    Discover {
        /// `owner/name`, `owner/name@branch` or a github.com URL
        repo: String,

        /// Branch to read (defaults to the repository's default branch)
        #[arg(short, long)]
        branch: Option<String>,

        /// What you are trying to do, used to rank documents
        #[arg(short, long)]
        context: Option<String>,

        /// Fetch every documentation file, skipping classification
        #[arg(short, long)]
        all: bool,

        /// Maximum fetches in flight
        #[arg(long)]
        concurrency: Option<usize>,

        /// Overall deadline for the whole discovery, in seconds
        #[arg(long)]
        deadline: Option<u64>,

        /// Fetch at most this many documents
        #[arg(long)]
        max: Option<usize>,

        /// Print the full summary, including content, as JSON
        #[arg(long)]
        json: bool,
    },

    /// List and rank documentation files without fetching them
    List {
        /// `owner/name`, `owner/name@branch` or a github.com URL
        repo: String,

        /// Branch to read (defaults to the repository's default branch)
        #[arg(short, long)]
        branch: Option<String>,

        /// What you are trying to do, used to rank documents
        #[arg(short, long)]
        context: Option<String>,

        /// Skip classification
        #[arg(short, long)]
        all: bool,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Diagnose configuration and connectivity
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Validate the configuration
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for --json
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Discover {
            repo,
            branch,
            context,
            all,
            concurrency,
            deadline,
            max,
            json,
        } => {
            let args = commands::discover::DiscoverArgs {
                repo,
                branch,
                context,
                all,
                concurrency,
                deadline_secs: deadline,
                max_documents: max,
                json,
            };
            commands::discover::run(args).await?
        }
        Commands::List {
            repo,
            branch,
            context,
            all,
            json,
        } => commands::list::run(repo, branch, context, all, json).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
        },
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
