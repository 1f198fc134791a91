//! obsidian-note-gen - command-line entry point
//!
//! ```text
//! obsidian-note-gen "Ancient Bridges"
//! obsidian-note-gen --file subjects.csv
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use notegen::{process_subject, read_subjects, run_batch, HttpInferenceClient};
use notegen_common::{SettingsOverrides, SettingsStore};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for obsidian-note-gen
#[derive(Parser, Debug)]
#[command(name = "obsidian-note-gen")]
#[command(about = "Two-call Obsidian note generator (local inference API)")]
#[command(version)]
struct Args {
    /// Subject text for the note (words are joined with spaces)
    subject: Vec<String>,

    /// CSV or text file of subjects; the first column is used
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Inference endpoint (overrides API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Directory notes are written into (overrides NOTES_DIR)
    #[arg(long)]
    notes_dir: Option<PathBuf>,

    /// Seconds between the metadata and body calls (overrides DELAY_BETWEEN_CALLS_SECONDS)
    #[arg(long)]
    delay_meta: Option<u64>,

    /// Seconds between CSV rows (overrides PER_REQUEST_DELAY_SECONDS)
    #[arg(long)]
    delay_rows: Option<u64>,
}

impl Args {
    /// Positional words joined into one subject
    fn subject(&self) -> String {
        self.subject.join(" ").trim().to_string()
    }

    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            api_url: self.api_url.clone(),
            notes_dir: self.notes_dir.clone(),
            delay_meta_content: self.delay_meta,
            delay_between_rows: self.delay_rows,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notegen=info,notegen_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let subject = args.subject();

    if args.file.is_none() && subject.is_empty() {
        Args::command().print_help()?;
        return Ok(ExitCode::from(2));
    }

    let store = SettingsStore::default_location();
    let settings = store
        .resolve(args.overrides())
        .context("Failed to resolve settings")?;
    info!(
        api_url = %settings.api_url,
        notes_dir = %settings.notes_dir.display(),
        delay_meta_content = settings.delay_meta_content,
        delay_between_rows = settings.delay_between_rows,
        "Settings resolved"
    );

    std::fs::create_dir_all(&settings.notes_dir).with_context(|| {
        format!("Failed to create notes directory {}", settings.notes_dir.display())
    })?;

    let client = HttpInferenceClient::new(settings.api_url.clone())
        .context("Failed to create HTTP client")?;

    if let Some(file) = &args.file {
        let reader = std::fs::File::open(file)
            .with_context(|| format!("Failed to open {}", file.display()))?;
        let subjects = read_subjects(reader)
            .with_context(|| format!("Failed to read subjects from {}", file.display()))?;
        info!("{} subject(s) in {}", subjects.len(), file.display());

        let report = run_batch(&client, &subjects, &settings).await;
        for path in &report.created {
            println!("Created → {}", path.display());
        }
        for failure in &report.failures {
            eprintln!(
                "Failed (line {}) {:?}: {}",
                failure.line, failure.subject, failure.error
            );
        }

        return Ok(if report.failures.is_empty() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let path = process_subject(&client, &subject, &settings)
        .await
        .with_context(|| format!("Failed to generate note for {:?}", subject))?;
    println!("Created → {}", path.display());

    Ok(ExitCode::SUCCESS)
}
