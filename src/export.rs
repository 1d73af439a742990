//! CSV and JSON reports of a task's aggregated results.
//!
//! Classification and generation tasks export one record per item with the
//! majority answer and the full vote distribution. Ranking tasks export the
//! consensus order of each item's choices. JSON carries the same numbers as
//! the aggregator; CSV prints average ranks to two decimals.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::aggregate::ranking::rank_item;
use crate::aggregate::{classification_distribution, RankedChoice};
use crate::model::{Task, TaskType};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to serialize export: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("expected csv or json, got: {}", other)),
        }
    }
}

/// Majority result and vote distribution for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionRecord {
    pub input: String,
    pub most_common_result: Option<String>,
    pub total_respondents: usize,
    pub distribution: IndexMap<String, usize>,
}

/// Consensus ranking for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingRecord {
    pub input: String,
    pub total_respondents: usize,
    pub rankings: Vec<RankedChoice>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskExport {
    Distribution(Vec<DistributionRecord>),
    Ranking(Vec<RankingRecord>),
}

pub fn build_export(task: &Task) -> TaskExport {
    match task.task_type {
        TaskType::Classification | TaskType::Generation => TaskExport::Distribution(
            task.items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    let dist = classification_distribution(task, index);
                    DistributionRecord {
                        input: item.text.clone(),
                        most_common_result: dist.majority,
                        total_respondents: dist.total,
                        distribution: dist.counts,
                    }
                })
                .collect(),
        ),
        TaskType::Ranking => TaskExport::Ranking(
            task.items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    let (rankings, total_respondents) = rank_item(task, index);
                    RankingRecord {
                        input: item.text.clone(),
                        total_respondents,
                        rankings,
                    }
                })
                .collect(),
        ),
    }
}

pub fn export_json(task: &Task) -> Result<String, ExportError> {
    let json = match build_export(task) {
        TaskExport::Distribution(records) => serde_json::to_string_pretty(&records)?,
        TaskExport::Ranking(records) => serde_json::to_string_pretty(&records)?,
    };
    Ok(json)
}

pub fn export_csv(task: &Task) -> String {
    let mut rows = Vec::new();
    match build_export(task) {
        TaskExport::Distribution(records) => {
            rows.push("Input,Majority Result,Total Respondents,Distribution".to_string());
            for record in records {
                let distribution = record
                    .distribution
                    .iter()
                    .map(|(answer, count)| format!("{}:{}", answer, count))
                    .collect::<Vec<_>>()
                    .join(";");
                rows.push(
                    [
                        csv_field(&record.input),
                        csv_field(record.most_common_result.as_deref().unwrap_or("N/A")),
                        record.total_respondents.to_string(),
                        csv_field(&distribution),
                    ]
                    .join(","),
                );
            }
        }
        TaskExport::Ranking(records) => {
            rows.push("Input,Rank,Choice,Total Rank,Average Rank,Votes".to_string());
            for record in records {
                for (position, choice) in record.rankings.iter().enumerate() {
                    rows.push(
                        [
                            csv_field(&record.input),
                            (position + 1).to_string(),
                            csv_field(&choice.choice_text),
                            choice.total_rank.to_string(),
                            format!("{:.2}", choice.avg_rank),
                            choice.vote_count.to_string(),
                        ]
                        .join(","),
                    );
                }
            }
        }
    }
    rows.join("\n")
}

pub fn export(task: &Task, format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Csv => Ok(export_csv(task)),
        ExportFormat::Json => export_json(task),
    }
}

/// `task-<title>-results.<ext>`, with anything but ASCII letters and digits
/// in the title replaced by `_`.
pub fn export_file_name(title: &str, format: ExportFormat) -> String {
    let safe: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("task-{}-results.{}", safe, format.extension())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
