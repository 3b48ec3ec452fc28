use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::result::{CaseResult, FailureStage};
use crate::error::ConsistencyError;
use crate::task::TaskRecord;

/// Style tally key for cases that never received a verdict.
pub const ERROR_BUCKET: &str = "error";

/// Tally key for a judge label that collides with [`ERROR_BUCKET`].
pub const JUDGED_ERROR_LABEL: &str = "error (judge label)";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub solve_failures: usize,
    pub judge_failures: usize,
    pub style_counts: BTreeMap<String, usize>,
}

impl RunSummary {
    pub fn from_results(results: &[CaseResult]) -> Self {
        let mut summary = RunSummary::default();
        for result in results {
            summary.total += 1;
            if result.pass {
                summary.passed += 1;
            } else {
                summary.failed += 1;
            }
            match result.failure_stage {
                FailureStage::None => {}
                FailureStage::Solve => summary.solve_failures += 1,
                FailureStage::Judge => summary.judge_failures += 1,
            }

            *summary.style_counts.entry(style_key(result)).or_insert(0) += 1;
        }
        summary
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.passed as f64 / self.total as f64
    }
}

/// Judge labels never share a key with the failure bucket.
fn style_key(result: &CaseResult) -> String {
    match (&result.failure_stage, &result.judge_style_label) {
        (FailureStage::None, Some(label))
            if label.as_str().trim().eq_ignore_ascii_case(ERROR_BUCKET) =>
        {
            JUDGED_ERROR_LABEL.to_string()
        }
        (FailureStage::None, Some(label)) => label.as_str().to_string(),
        _ => ERROR_BUCKET.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct AggregatedRun {
    pub results: Vec<CaseResult>,
    pub summary: RunSummary,
}

/// Orders results by id and summarises them, checking that every task record
/// produced exactly one result.
pub fn aggregate(
    tasks: &[TaskRecord],
    mut results: Vec<CaseResult>,
) -> Result<AggregatedRun, ConsistencyError> {
    if results.len() != tasks.len() {
        return Err(ConsistencyError::CountMismatch {
            expected: tasks.len(),
            actual: results.len(),
        });
    }

    results.sort_by(|a, b| a.id.cmp(&b.id));

    if let Some(pair) = results.windows(2).find(|w| w[0].id == w[1].id) {
        return Err(ConsistencyError::DuplicateResult(pair[0].id.clone()));
    }
    for task in tasks {
        if results
            .binary_search_by(|r| r.id.as_str().cmp(task.id.as_str()))
            .is_err()
        {
            return Err(ConsistencyError::MissingResult(task.id.clone()));
        }
    }

    let summary = RunSummary::from_results(&results);
    debug!(
        total = summary.total,
        passed = summary.passed,
        failed = summary.failed,
        "Aggregated run"
    );
    Ok(AggregatedRun { results, summary })
}
