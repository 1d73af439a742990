//! anotanusa - export entry point
//!
//! Loads a task from the document store and prints its aggregated results.
//!
//! Usage: `anotanusa-export <task-id> [csv|json]`

use anotanusa::aggregate::{participation_stats, rank_summary};
use anotanusa::export::{export, export_file_name, ExportFormat};
use anotanusa::model::TaskType;
use anotanusa::store::{JsonFileTaskStore, TaskStore};
use anotanusa::Config;
use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "anotanusa=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;

    let mut args = std::env::args().skip(1);
    let task_id = args
        .next()
        .context("usage: anotanusa-export <task-id> [csv|json]")?;
    let format = match args.next() {
        Some(value) => value
            .parse::<ExportFormat>()
            .map_err(anyhow::Error::msg)?,
        None => config.export_format,
    };

    let store = JsonFileTaskStore::new(&config.data_dir);
    info!("Reading tasks from {}", store.root().display());
    let task = store
        .read_task(&task_id)
        .await?
        .with_context(|| format!("task {} not found", task_id))?;

    let stats = participation_stats(&task, &config.tracker.rules);
    info!(
        active = stats.active_annotators,
        completed = stats.completed_annotators,
        avg_completion = stats.avg_completion_rate_percent,
        "Participation"
    );
    if task.task_type == TaskType::Ranking {
        let summary = rank_summary(&task);
        info!(
            best = summary.best_avg_rank,
            worst = summary.worst_avg_rank,
            overall = summary.overall_avg_rank,
            "Ranking summary"
        );
    }

    info!("Exporting {}", export_file_name(&task.title, format));
    println!("{}", export(&task, format)?);

    Ok(())
}
