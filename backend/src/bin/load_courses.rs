//! Catalog loader CLI.
//!
//! Reads a JSON [`LoadBatch`] produced by the course scraper and loads it into
//! the configured repository. With `--with-details` it also fetches every
//! loaded course from the course-info service and stores the examinations,
//! examiner, campus and main fields.
//!
//! ```bash
//! REPOSITORY_TYPE=postgres DATABASE_URL=postgres://localhost/planner \
//!   planner-load data/catalog.json --with-details
//! ```
//!
//! Against the local repository the data is discarded on exit, which makes a
//! plain run a validation pass over the batch.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use tracing_subscriber::EnvFilter;

use master_planner::api::LoadBatch;
use master_planner::config::PlannerConfig;
use master_planner::db::repository::FullRepository;
use master_planner::db::RepositoryFactory;
use master_planner::services::{self, CourseInfoSource};

#[derive(Debug, Parser)]
#[command(name = "planner-load", about = "Load a scraped course catalog batch")]
struct Args {
    /// JSON file with `programs`, `profiles` and `courses`
    #[arg(value_name = "BATCH")]
    batch: PathBuf,

    /// Path of repository.toml (defaults to the standard search locations)
    #[arg(long, value_name = "FILE")]
    repository_config: Option<PathBuf>,

    /// Fetch and store extra details for every loaded course
    #[arg(long)]
    with_details: bool,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn read_batch(path: &Path) -> anyhow::Result<LoadBatch> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read batch file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse batch file {}", path.display()))
}

/// Returns (stored, failed).
async fn load_details(
    repo: &dyn FullRepository,
    source: &dyn CourseInfoSource,
    course_codes: &BTreeSet<String>,
) -> (usize, usize) {
    let mut stored = 0;
    let mut failed = 0;
    for code in course_codes {
        let result = match source.fetch_course_info(code).await {
            Ok(info) => services::register_course_details(repo, code, &info)
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match result {
            Ok(()) => stored += 1,
            Err(e) => {
                warn!("Skipping details for {}: {}", code, e);
                failed += 1;
            }
        }
    }
    (stored, failed)
}

#[cfg(feature = "course-info-http")]
fn details_source(config: &PlannerConfig) -> anyhow::Result<Box<dyn CourseInfoSource>> {
    let source = services::HttpCourseInfoSource::from_settings(&config.course_info)
        .context("--with-details needs a course info URL")?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "course-info-http"))]
fn details_source(_config: &PlannerConfig) -> anyhow::Result<Box<dyn CourseInfoSource>> {
    anyhow::bail!("--with-details requires the course-info-http feature")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let batch = read_batch(&args.batch)?;

    let repo = match &args.repository_config {
        Some(path) => RepositoryFactory::from_config_file(path).await?,
        None => RepositoryFactory::from_default_config().await?,
    };

    let report = services::load_batch(repo.as_ref(), &batch)
        .await
        .context("loading batch failed")?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if args.with_details {
        let config = PlannerConfig::load()?;
        let source = details_source(&config)?;
        let codes: BTreeSet<String> = batch
            .courses
            .iter()
            .map(|c| c.course_code.clone())
            .collect();
        let (stored, failed) = load_details(repo.as_ref(), source.as_ref(), &codes).await;
        info!("Stored details for {} courses ({} failed)", stored, failed);
    }

    Ok(())
}
