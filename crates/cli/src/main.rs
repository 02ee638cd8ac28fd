//! Grade Predictor CLI
//!
//! Trains models locally and queries a running grade predictor service
//! for predictions, model metadata and health.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commands::{health, model, predict, train};
use predictor_lib::predictor::DEFAULT_N_ESTIMATORS;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Grade Predictor CLI
#[derive(Parser)]
#[command(name = "gp")]
#[command(author, version, about = "CLI for the Grade Predictor service", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via GP_API_URL env var)
    #[arg(long, env = "GP_API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train a model locally from a CSV dataset
    Train {
        /// Training dataset
        #[arg(long, env = "GP_DATASET", default_value = "data/notas_dataset.csv")]
        dataset: PathBuf,

        /// Where to save the trained model
        #[arg(long, env = "GP_MODEL_PATH", default_value = "ml_models/modelo_notas.json")]
        model: PathBuf,

        /// Number of trees in the forest
        #[arg(long, default_value_t = DEFAULT_N_ESTIMATORS)]
        n_estimators: usize,

        /// Retrain even if a saved model exists
        #[arg(long)]
        force: bool,
    },

    /// Predict a student's third-trimester score
    Predict(StudentArgs),

    /// Inspect or train the service's model
    #[command(subcommand)]
    Model(ModelCommands),

    /// Show service health
    Health,
}

#[derive(Subcommand)]
pub enum ModelCommands {
    /// Show metadata about the loaded model
    Info,

    /// Train on the service's dataset
    Train {
        /// Retrain even if a saved model exists
        #[arg(long)]
        force: bool,
    },
}

/// Indicators for both trimesters, each between 0 and 100
#[derive(Args)]
pub struct StudentArgs {
    /// Homework average, first trimester
    #[arg(long)]
    tareas_t1: f64,
    /// Exam average, first trimester
    #[arg(long)]
    examenes_t1: f64,
    /// Participation average, first trimester
    #[arg(long)]
    part_t1: f64,
    /// Attendance, first trimester
    #[arg(long)]
    asistencia_t1: f64,
    /// Homework average, second trimester
    #[arg(long)]
    tareas_t2: f64,
    /// Exam average, second trimester
    #[arg(long)]
    examenes_t2: f64,
    /// Participation average, second trimester
    #[arg(long)]
    part_t2: f64,
    /// Attendance, second trimester
    #[arg(long)]
    asistencia_t2: f64,
}

impl StudentArgs {
    fn values(&self) -> [f64; 8] {
        [
            self.tareas_t1,
            self.examenes_t1,
            self.part_t1,
            self.asistencia_t1,
            self.tareas_t2,
            self.examenes_t2,
            self.part_t2,
            self.asistencia_t2,
        ]
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run(cli).await;
    if let Err(e) = &result {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
    result
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Train {
            dataset,
            model,
            n_estimators,
            force,
        } => {
            let settings = train::LocalTraining {
                dataset,
                model,
                n_estimators,
                force,
            };
            train::train_local(settings, cli.format).await?;
        }
        Commands::Predict(student) => {
            let client = client::ApiClient::new(&cli.api_url)?;
            predict::predict(&client, student.values(), cli.format).await?;
        }
        Commands::Model(model_cmd) => {
            let client = client::ApiClient::new(&cli.api_url)?;
            match model_cmd {
                ModelCommands::Info => model::show_info(&client, cli.format).await?,
                ModelCommands::Train { force } => {
                    model::train_remote(&client, force, cli.format).await?
                }
            }
        }
        Commands::Health => {
            let client = client::ApiClient::new(&cli.api_url)?;
            health::show_health(&client, cli.format).await?;
        }
    }

    Ok(())
}
