//! cohortgrade CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod config;

#[derive(Parser)]
#[command(
    name = "cohortgrade",
    version,
    about = "Cohort grading, ranking and certificate verification"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every cohort in a gradebook file or directory
    Evaluate {
        /// Path to a .toml gradebook or a directory of them
        #[arg(long)]
        gradebook: PathBuf,

        /// Output directory (defaults to the configured output_dir)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, html, all, none
        #[arg(long)]
        format: Option<String>,

        /// Max cohorts evaluated concurrently
        #[arg(long)]
        parallelism: Option<usize>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show a cohort ranking, or one student's position in it
    Rank {
        /// Path to a .toml gradebook or a directory of them
        #[arg(long)]
        gradebook: PathBuf,

        /// Cohort id
        #[arg(long)]
        cohort: String,

        /// Student id
        #[arg(long)]
        student: Option<String>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Verify a certificate by id or unique code
    Verify {
        /// Path to a .toml gradebook or a directory of them
        #[arg(long)]
        gradebook: PathBuf,

        /// Certificate id or unique code
        key: String,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate gradebook TOML files
    Validate {
        /// Path to a .toml gradebook or a directory of them
        #[arg(long)]
        gradebook: PathBuf,
    },

    /// Compare two cohort reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Minimum change in a student's average (defaults to the configured threshold)
        #[arg(long)]
        threshold: Option<f64>,

        /// Exit code 1 if regressions found
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example gradebook
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cohortgrade=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Evaluate {
            gradebook,
            output,
            format,
            parallelism,
            config,
        } => commands::evaluate::execute(gradebook, output, format, parallelism, config).await,
        Commands::Rank {
            gradebook,
            cohort,
            student,
            format,
        } => commands::rank::execute(gradebook, cohort, student, format).await,
        Commands::Verify {
            gradebook,
            key,
            format,
        } => commands::verify::execute(gradebook, key, format).await,
        Commands::Validate { gradebook } => commands::validate::execute(gradebook),
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
            config,
        } => commands::compare::execute(
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
            config,
        ),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
