use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

use crate::evaluation::{CaseResult, FailureStage, RunSummary};

const CHART_WIDTH: usize = 40;
const MAX_REASON_CHARS: usize = 80;

/// One CSV row. Field order is the column order of the results file.
#[derive(Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    expected_valid: &'a str,
    expected_invalid: &'a str,
    solver_answer: Option<&'a str>,
    pass: bool,
    judge_reason: Option<&'a str>,
    judge_style_label: Option<&'a str>,
    judge_correct_math: Option<bool>,
}

impl<'a> From<&'a CaseResult> for CsvRow<'a> {
    fn from(r: &'a CaseResult) -> Self {
        Self {
            id: &r.id,
            expected_valid: &r.expected_valid,
            expected_invalid: &r.expected_invalid,
            solver_answer: r.solver_answer.as_deref(),
            pass: r.pass,
            judge_reason: r.judge_reason.as_deref(),
            judge_style_label: r.judge_style_label.as_ref().map(|s| s.as_str()),
            judge_correct_math: r.judge_correct_math,
        }
    }
}

pub fn render_csv(results: &[CaseResult]) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for result in results {
        wtr.serialize(CsvRow::from(result))
            .with_context(|| format!("Failed to serialize row {}", result.id))?;
    }
    // serde-driven headers are only emitted with the first row
    if results.is_empty() {
        wtr.write_record(CSV_COLUMNS)?;
    }
    wtr.into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))
}

pub const CSV_COLUMNS: [&str; 8] = [
    "id",
    "expected_valid",
    "expected_invalid",
    "solver_answer",
    "pass",
    "judge_reason",
    "judge_style_label",
    "judge_correct_math",
];

pub async fn write_results_csv(path: &Path, results: &[CaseResult]) -> Result<()> {
    let bytes = render_csv(results)?;
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write results to {}", path.display()))?;
    info!("Saved results to {}", path.display());
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub solver_model: String,
    pub judge_model: String,
    pub max_workers: usize,
    pub dataset_sha256: String,
}

#[derive(Debug, Serialize)]
struct FailureEntry<'a> {
    id: &'a str,
    stage: FailureStage,
    error: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    #[serde(flatten)]
    metadata: &'a RunMetadata,
    summary: &'a RunSummary,
    pass_rate: f64,
    failures: Vec<FailureEntry<'a>>,
}

impl<'a> RunReport<'a> {
    pub fn new(metadata: &'a RunMetadata, summary: &'a RunSummary, results: &'a [CaseResult]) -> Self {
        let failures = results
            .iter()
            .filter(|r| r.is_failure())
            .map(|r| FailureEntry {
                id: &r.id,
                stage: r.failure_stage,
                error: r.error.as_deref(),
            })
            .collect();
        Self {
            metadata,
            summary,
            pass_rate: summary.pass_rate(),
            failures,
        }
    }
}

pub async fn write_summary_json(path: &Path, report: &RunReport<'_>) -> Result<()> {
    let json = serde_json::to_vec_pretty(report).context("Failed to serialize run summary")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write summary to {}", path.display()))?;
    info!("Saved summary to {}", path.display());
    Ok(())
}

/// Horizontal text bar chart; bars are scaled against the largest count.
pub fn bar_chart(title: &str, entries: &[(String, usize)]) -> Vec<String> {
    let mut lines = vec![title.to_string()];
    let label_width = entries.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let max = entries.iter().map(|(_, c)| *c).max().unwrap_or(0);

    for (label, count) in entries {
        let bar_len = if max == 0 {
            0
        } else {
            (count * CHART_WIDTH).div_ceil(max)
        };
        lines.push(format!(
            "  {:<width$} | {} {}",
            label,
            "█".repeat(bar_len),
            count,
            width = label_width
        ));
    }
    lines
}

pub fn summary_lines(results: &[CaseResult], summary: &RunSummary) -> Vec<String> {
    let id_width = results
        .iter()
        .map(|r| r.id.chars().count())
        .max()
        .unwrap_or(0)
        .max(2);
    let style_width = results
        .iter()
        .filter_map(|r| r.judge_style_label.as_ref())
        .map(|s| s.as_str().chars().count())
        .max()
        .unwrap_or(0)
        .max(5);

    let mut lines = vec![
        "Test Case Summary".to_string(),
        format!(
            "{:<iw$}  {:<5}  {:<sw$}  {:<12}  {:<5}  Reason",
            "ID",
            "PASS?",
            "Style",
            "Correct Math",
            "Stage",
            iw = id_width,
            sw = style_width
        ),
    ];

    for r in results {
        let reason = r
            .judge_reason
            .as_deref()
            .or(r.error.as_deref())
            .unwrap_or_default();
        lines.push(format!(
            "{:<iw$}  {:<5}  {:<sw$}  {:<12}  {:<5}  {}",
            r.id,
            if r.pass { "YES" } else { "NO" },
            r.judge_style_label.as_ref().map(|s| s.as_str()).unwrap_or("-"),
            match r.judge_correct_math {
                Some(true) => "yes",
                Some(false) => "no",
                None => "-",
            },
            r.failure_stage,
            truncate_chars(reason, MAX_REASON_CHARS),
            iw = id_width,
            sw = style_width
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "Total: {}  Passed: {}  Failed: {} (solve: {}, judge: {})  Pass rate: {:.1}%",
        summary.total,
        summary.passed,
        summary.failed,
        summary.solve_failures,
        summary.judge_failures,
        summary.pass_rate() * 100.0
    ));
    lines.push(String::new());
    lines.extend(bar_chart(
        "Pass / Fail",
        &[
            ("PASS".to_string(), summary.passed),
            ("FAIL".to_string(), summary.failed),
        ],
    ));
    lines.push(String::new());
    let styles: Vec<(String, usize)> = summary
        .style_counts
        .iter()
        .map(|(k, v)| (k.clone(), *v))
        .collect();
    lines.extend(bar_chart("Style labels", &styles));
    lines
}

fn truncate_chars(s: &str, max: usize) -> String {
    let single_line = s.replace('\n', " ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    let mut out: String = single_line.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}
