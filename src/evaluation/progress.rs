use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

use super::result::CaseResult;

/// Completed-case counter shared by the workers of one run. Informational
/// only; the result set is the source of truth.
pub struct RunProgress {
    total: usize,
    completed: AtomicUsize,
    started_at: Instant,
}

impl RunProgress {
    pub fn new(run_id: Uuid, total: usize) -> Self {
        info!(run_id = %run_id, total = total, "Starting evaluation progress tracking");
        Self {
            total,
            completed: AtomicUsize::new(0),
            started_at: Instant::now(),
        }
    }

    #[cfg(test)]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }

    /// Counts one finished case and logs its outcome. Returns the completed
    /// count including this case.
    pub fn record(&self, result: &CaseResult) -> usize {
        let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;

        let style = result
            .judge_style_label
            .as_ref()
            .map(|s| s.as_str())
            .unwrap_or("-");
        let correct_math = match result.judge_correct_math {
            Some(true) => "yes",
            Some(false) => "no",
            None => "-",
        };

        info!(
            id = %result.id,
            stage = %result.failure_stage,
            duration_ms = result.duration_ms,
            "[{}/{}] {} {} | style: {} | correct math: {}",
            done,
            self.total,
            result.id,
            if result.pass { "PASS" } else { "FAIL" },
            style,
            correct_math
        );
        done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SolveError;
    use crate::evaluation::testing::task;

    fn failed(id: &str) -> CaseResult {
        CaseResult::solve_failed(&task(id), &SolveError::EmptyAnswer)
    }

    #[test]
    fn test_new_progress() {
        let progress = RunProgress::new(Uuid::new_v4(), 4);
        assert_eq!(progress.completed(), 0);
    }

    #[test]
    fn test_record_counts_completed() {
        let progress = RunProgress::new(Uuid::new_v4(), 2);
        assert_eq!(progress.record(&failed("a")), 1);
        assert_eq!(progress.record(&failed("b")), 2);
        assert_eq!(progress.completed(), 2);
    }

    #[test]
    fn test_elapsed_ms() {
        let progress = RunProgress::new(Uuid::new_v4(), 1);
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(progress.elapsed_ms() >= 10);
    }
}
