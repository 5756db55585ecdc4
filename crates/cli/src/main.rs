//! kgrag CLI: the main entry point.
//!
//! Commands:
//! - `query`: Answer one question over the knowledge graph
//! - `batch`: Answer every question in a dataset, writing JSONL results
//! - `eval`: Score a results file (hits@1/5/10)
//! - `config`: Validate, show or initialise configuration
//! - `doctor`: Diagnose setup

use clap::{Parser, Subcommand, ValueEnum};
use kgrag_config::QueryMode;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "kgrag",
    about = "kgrag: budgeted knowledge-graph context assembly for question answering",
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

/// Retrieval strategy override.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    CrossSet,
    PathRerank,
}

impl From<ModeArg> for QueryMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::CrossSet => QueryMode::CrossSet,
            ModeArg::PathRerank => QueryMode::PathRerank,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single question
    Query {
        /// The question to answer
        question: String,

        /// Triple file to load (overrides graph.triples_path)
        #[arg(short, long)]
        graph: Option<PathBuf>,

        /// Retrieval strategy (overrides query.mode)
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,

        /// Print the assembled context before the answer
        #[arg(long)]
        show_context: bool,

        /// Print the full outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Answer every question in a dataset file
    Batch {
        /// Question.json (JSON lines) or train.json (JSON array)
        #[arg(short, long)]
        dataset: PathBuf,

        /// Where to write JSONL results
        #[arg(short, long)]
        output: PathBuf,

        /// Triple file to load (overrides graph.triples_path)
        #[arg(short, long)]
        graph: Option<PathBuf>,

        /// Retrieval strategy (overrides query.mode)
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,

        /// Only answer the first N questions
        #[arg(long)]
        limit: Option<usize>,

        /// Questions answered concurrently
        #[arg(short, long, default_value_t = 1)]
        concurrency: usize,
    },

    /// Score a results file produced by `batch`
    Eval {
        /// JSONL results file
        #[arg(short, long)]
        results: PathBuf,

        /// Output directory (defaults to <results dir>/evaluation_output)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Diagnose configuration, graph and provider health
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate the configuration file
    Validate,
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
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
        Commands::Query {
            question,
            graph,
            mode,
            show_context,
            json,
        } => {
            let overrides = commands::Overrides {
                graph,
                mode: mode.map(Into::into),
            };
            commands::query::run(&question, overrides, show_context, json).await?
        }
        Commands::Batch {
            dataset,
            output,
            graph,
            mode,
            limit,
            concurrency,
        } => {
            let overrides = commands::Overrides {
                graph,
                mode: mode.map(Into::into),
            };
            commands::batch::run(&dataset, &output, overrides, limit, concurrency).await?
        }
        Commands::Eval {
            results,
            output_dir,
        } => commands::evaluate::run(&results, output_dir).await?,
        Commands::Config { action } => match action {
            ConfigAction::Validate => commands::config_cmd::validate().await?,
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Init { force } => commands::config_cmd::init(force).await?,
        },
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
