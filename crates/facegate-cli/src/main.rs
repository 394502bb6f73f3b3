use anyhow::Result;
use clap::{Parser, Subcommand};
use facegate_core::{CorpusStore, Reply};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod config;
mod handle;
mod inventory;

use config::Config;
use handle::{DynFaceService, FaceHandle};

#[derive(Parser)]
#[command(name = "facegate", about = "Enroll and recognize employees from photographs")]
struct Cli {
    /// Corpus root directory (overrides FACEGATE_CORPUS_DIR)
    #[arg(long, global = true)]
    corpus_dir: Option<PathBuf>,

    /// Haar cascade XML file (overrides FACEGATE_CASCADE_PATH)
    #[arg(long, global = true)]
    cascade: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a training photo for an employee
    Enroll {
        /// Employee code the face belongs to
        #[arg(short, long)]
        employee: String,
        /// Photo containing the employee's face
        image: PathBuf,
    },
    /// Identify the employee in a photo
    Recognize {
        /// Photo to identify
        image: PathBuf,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// List enrolled employees and their sample counts
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(dir) = cli.corpus_dir {
        config.corpus_dir = dir;
    }
    if let Some(cascade) = cli.cascade {
        config.cascade_path = cascade;
    }
    tracing::debug!(?config, "configuration loaded");

    let store = CorpusStore::open(&config.corpus_dir)
        .with_holding_dir(config.holding_dir.clone())?;

    match cli.command {
        Commands::Enroll { employee, image } => {
            let bytes = handle::read_upload(&image, interrupted()).await?;
            let handle = FaceHandle::new(build_service(&config, store)?);
            Ok(report(handle.enroll(bytes, employee).await))
        }
        Commands::Recognize { image, json } => {
            let bytes = handle::read_upload(&image, interrupted()).await?;
            let handle = FaceHandle::new(build_service(&config, store)?);
            if json {
                match handle.recognize_outcome(bytes).await {
                    Ok(outcome) => {
                        println!("{}", serde_json::to_string(&outcome)?);
                        Ok(ExitCode::SUCCESS)
                    }
                    Err(failure) => Ok(report(Err(failure))),
                }
            } else {
                Ok(report(handle.recognize(bytes).await))
            }
        }
        Commands::List { json } => {
            let summary = inventory::summarize(&store)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else if summary.is_empty() {
                println!("No employees enrolled");
            } else {
                for row in summary {
                    println!("{:>6}  {} samples", row.identity, row.samples);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Print a reply; failures are client errors and exit with status 2.
fn report(reply: Reply<String>) -> ExitCode {
    match reply {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(failure) => {
            eprintln!("error: {failure}");
            ExitCode::from(2)
        }
    }
}

/// Resolves on Ctrl-C. Never resolves if the signal handler cannot be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("interrupted, abandoning upload");
}

#[cfg(feature = "opencv")]
fn build_service(config: &Config, store: CorpusStore) -> Result<DynFaceService> {
    use facegate_core::opencv_backend::{EigenFaceTrainer, HaarCascade};

    let detector = HaarCascade::load(&config.cascade_path)?;
    let trainer = EigenFaceTrainer::new(config.eigen_components, config.match_threshold);
    Ok(DynFaceService::new(Box::new(detector), Box::new(trainer), store))
}

#[cfg(not(feature = "opencv"))]
fn build_service(config: &Config, _store: CorpusStore) -> Result<DynFaceService> {
    anyhow::bail!(
        "no vision backend compiled in (cascade {}); rebuild with `--features opencv`",
        config.cascade_path.display()
    )
}
