use std::path::PathBuf;
use std::process::ExitCode;

use bookmark_scout::Result;
use bookmark_scout::commands::{ask_question, chat, count_bookmarks, list_bookmarks, list_models};
use bookmark_scout::config::{Config, resolve_config_dir, run_interactive_config, show_config};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bookmark-scout")]
#[command(about = "Ask questions about your browser bookmarks with a local language model")]
#[command(version)]
struct Cli {
    /// Use this directory instead of the default configuration directory
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure Ollama connection and pipeline settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Count the bookmarks in an exported bookmarks HTML file
    Count {
        /// Bookmarks HTML export
        file: PathBuf,
    },
    /// List the bookmarks in an exported bookmarks HTML file
    List {
        /// Bookmarks HTML export
        file: PathBuf,
    },
    /// Ask one question about your bookmarks
    Ask {
        /// Bookmarks HTML export
        file: PathBuf,
        /// What you are looking for
        question: String,
    },
    /// Load bookmarks once and ask questions interactively
    Chat {
        /// Bookmarks HTML export
        file: PathBuf,
    },
    /// List models available on the configured Ollama server
    Models,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_dir = resolve_config_dir(cli.config_dir.as_deref())?;

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&config_dir)?;
            } else {
                run_interactive_config(&config_dir)?;
            }
        }
        Commands::Count { file } => {
            count_bookmarks(&file)?;
        }
        Commands::List { file } => {
            list_bookmarks(&file)?;
        }
        Commands::Ask { file, question } => {
            let config = Config::load(&config_dir)?;
            if !ask_question(&config, &file, &question)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Chat { file } => {
            let config = Config::load(&config_dir)?;
            chat(&config, &file)?;
        }
        Commands::Models => {
            let config = Config::load(&config_dir)?;
            list_models(&config)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
