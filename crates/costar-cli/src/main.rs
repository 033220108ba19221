//! Costar CLI - Command-line interface for Costar
//!
//! This is the main entry point for running collaboration analyses.
//! It provides commands for importing rosters into a snapshot store and
//! running component, closeness, and triadic-closure analyses over it.

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "costar")]
#[command(author = "Costar Contributors")]
#[command(version)]
#[command(about = "Collaboration analytics over performer/production graphs", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project directory holding .costar (defaults to current directory)
    #[arg(short = 'C', long, global = true, default_value = ".")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Dense,
    Bfs,
}

impl From<StrategyArg> for costar_graph::PathStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Dense => Self::Dense,
            StrategyArg::Bfs => Self::Bfs,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize Costar in the project directory
    Init,

    /// Build the graph from a roster and save a snapshot
    Import {
        /// JSON roster with productions and roles
        roster: PathBuf,

        /// Extra roles in `performer;production;year` lines
        #[arg(long)]
        roles: Option<PathBuf>,

        /// Keep performers and productions without any role
        #[arg(long)]
        keep_isolated: bool,
    },

    /// Show snapshot statistics
    Status,

    /// Show the connected component around a performer
    Component {
        /// Performer name
        performer: String,

        /// Only walk through productions rated at least this high
        #[arg(long)]
        min_stars: Option<f64>,

        /// Replace the stored graph with the component
        #[arg(long)]
        save: bool,

        /// Output as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Narrow the stored graph and prune what becomes isolated
    Prune {
        /// Keep productions rated at least this high
        #[arg(long)]
        min_stars: Option<f64>,

        /// Keep productions with at least this many votes
        #[arg(long)]
        min_votes: Option<u32>,

        /// Keep productions at or above this rating percentile (0-100)
        #[arg(long)]
        min_percentile: Option<f64>,

        /// Keep only the N best rated productions
        #[arg(long)]
        top: Option<usize>,

        /// Keep performers with at least this many roles
        #[arg(long)]
        min_roles: Option<usize>,

        /// Report what would be removed without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Compute shortest paths and closeness centrality
    Closeness {
        /// Restrict to the component around this performer
        #[arg(short, long)]
        performer: Option<String>,

        /// Number of most central nodes to show
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Path algorithm (defaults to the configured one)
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,

        /// Output as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Measure triadic closure across a sweep of years
    Closure {
        #[arg(long)]
        from: Option<i32>,

        #[arg(long)]
        to: Option<i32>,

        #[arg(long)]
        step: Option<usize>,

        /// Years in the before window
        #[arg(long)]
        before: Option<i32>,

        /// Years in the after window
        #[arg(long)]
        after: Option<i32>,

        /// Output as JSON instead of CSV
        #[arg(long)]
        json: bool,
    },

    /// Export the stored snapshot to JSON
    Export {
        /// Output file
        #[arg(short, long, default_value = "costar-graph.json")]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let dir = cli.dir;
    let result = match cli.command {
        Commands::Init => commands::init(&dir),
        Commands::Import {
            roster,
            roles,
            keep_isolated,
        } => commands::import(&dir, &roster, roles.as_deref(), keep_isolated),
        Commands::Status => commands::status(&dir),
        Commands::Component {
            performer,
            min_stars,
            save,
            json,
        } => commands::component(&dir, &performer, min_stars, save, json),
        Commands::Prune {
            min_stars,
            min_votes,
            min_percentile,
            top,
            min_roles,
            dry_run,
        } => commands::prune(
            &dir,
            commands::PruneArgs {
                min_stars,
                min_votes,
                min_percentile,
                top,
                min_roles,
                dry_run,
            },
        ),
        Commands::Closeness {
            performer,
            limit,
            strategy,
            json,
        } => commands::closeness(
            &dir,
            performer.as_deref(),
            limit,
            strategy.map(Into::into),
            json,
        ),
        Commands::Closure {
            from,
            to,
            step,
            before,
            after,
            json,
        } => commands::closure(
            &dir,
            commands::ClosureArgs {
                from,
                to,
                step,
                before,
                after,
            },
            json,
        ),
        Commands::Export { output } => commands::export(&dir, &output),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
