use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::result::CaseResult;
use crate::adapter::{Judge, JudgeRequest, JudgeVerdict, Solver};
use crate::error::{JudgeError, SolveError};
use crate::metrics::Metrics;
use crate::task::TaskRecord;

const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs solve then judge for a single task record. Every failure is folded
/// into the returned [`CaseResult`]; nothing propagates to the caller.
pub struct CaseEvaluator<S, J> {
    solver: S,
    judge: J,
    solve_timeout: Duration,
    judge_timeout: Duration,
    metrics: Arc<Metrics>,
}

impl<S: Solver, J: Judge> CaseEvaluator<S, J> {
    pub fn new(solver: S, judge: J, metrics: Arc<Metrics>) -> Self {
        Self {
            solver,
            judge,
            solve_timeout: DEFAULT_STAGE_TIMEOUT,
            judge_timeout: DEFAULT_STAGE_TIMEOUT,
            metrics,
        }
    }

    pub fn with_solve_timeout(mut self, timeout: Duration) -> Self {
        self.solve_timeout = timeout;
        self
    }

    pub fn with_judge_timeout(mut self, timeout: Duration) -> Self {
        self.judge_timeout = timeout;
        self
    }

    #[cfg(test)]
    pub fn solver(&self) -> &S {
        &self.solver
    }

    #[cfg(test)]
    pub fn judge(&self) -> &J {
        &self.judge
    }

    pub async fn evaluate(&self, task: &TaskRecord) -> CaseResult {
        let start = Instant::now();
        debug!(id = %task.id, "Starting case");

        let answer = match self.solve(task).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(id = %task.id, stage = "solve", error = %e, "Solver failed");
                return self.finish(CaseResult::solve_failed(task, &e), start);
            }
        };

        let result = match self.grade(task, &answer).await {
            Ok(verdict) => CaseResult::judged(task, answer, verdict),
            Err(e) => {
                warn!(id = %task.id, stage = "judge", error = %e, "Judge failed");
                CaseResult::judge_failed(task, answer, &e)
            }
        };
        self.finish(result, start)
    }

    async fn solve(&self, task: &TaskRecord) -> Result<String, SolveError> {
        let started = Instant::now();
        let result = match tokio::time::timeout(
            self.solve_timeout,
            self.solver.solve(&task.problem_image),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(SolveError::Timeout(self.solve_timeout)),
        };
        self.metrics.record_solve(result.is_ok(), started.elapsed());
        result
    }

    async fn grade(&self, task: &TaskRecord, answer: &str) -> Result<JudgeVerdict, JudgeError> {
        let request = JudgeRequest {
            answer_text: answer,
            problem_image: &task.problem_image,
            answer_image: &task.answer_image,
            expected_valid: &task.expected_valid,
            expected_invalid: &task.expected_invalid,
            problem: task.problem.as_deref(),
        };

        let started = Instant::now();
        let result = match tokio::time::timeout(self.judge_timeout, self.judge.judge(request)).await
        {
            Ok(result) => result,
            Err(_) => Err(JudgeError::Timeout(self.judge_timeout)),
        };
        self.metrics.record_judge(result.is_ok(), started.elapsed());
        result
    }

    fn finish(&self, result: CaseResult, start: Instant) -> CaseResult {
        self.metrics.record_case(result.pass);
        result.with_duration_ms(start.elapsed().as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::StyleLabel;
    use crate::evaluation::result::FailureStage;
    use crate::evaluation::testing::{task, Gauge, MockJudge, MockSolver};
    use std::sync::atomic::Ordering;

    fn evaluator(solver: MockSolver, judge: MockJudge) -> CaseEvaluator<MockSolver, MockJudge> {
        CaseEvaluator::new(solver, judge, Metrics::new())
    }

    #[tokio::test]
    async fn test_evaluate_pass() {
        let gauge = Gauge::new();
        let eval = evaluator(MockSolver::new(gauge.clone()), MockJudge::new(gauge));

        let result = eval.evaluate(&task("a")).await;

        assert!(result.pass);
        assert_eq!(result.failure_stage, FailureStage::None);
        assert_eq!(result.solver_answer.as_deref(), Some("answer for a"));
        assert_eq!(result.judge_reason.as_deref(), Some("graded answer for a"));
        assert_eq!(result.judge_style_label, Some(StyleLabel::StepByStep));
        assert_eq!(result.judge_correct_math, Some(true));
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_solve_failure_skips_judge() {
        let gauge = Gauge::new();
        let eval = evaluator(
            MockSolver::new(gauge.clone()).failing("b"),
            MockJudge::new(gauge),
        );

        let result = eval.evaluate(&task("b")).await;

        assert!(!result.pass);
        assert_eq!(result.failure_stage, FailureStage::Solve);
        assert!(result.solver_answer.is_none());
        assert!(result.judge_reason.is_none());
        assert!(result.judge_style_label.is_none());
        assert!(result.judge_correct_math.is_none());
        assert!(result.error.unwrap().contains("HTTP 500"));
        assert_eq!(eval.solver().call_count(), 1);
        assert_eq!(eval.judge().call_count(), 0);
    }

    #[tokio::test]
    async fn test_judge_failure_keeps_answer() {
        let gauge = Gauge::new();
        let eval = evaluator(
            MockSolver::new(gauge.clone()),
            MockJudge::new(gauge).failing("c"),
        );

        let result = eval.evaluate(&task("c")).await;

        assert!(!result.pass);
        assert_eq!(result.failure_stage, FailureStage::Judge);
        assert_eq!(result.solver_answer.as_deref(), Some("answer for c"));
        assert!(result.judge_reason.is_none());
        assert!(result.judge_style_label.is_none());
        assert!(result.judge_correct_math.is_none());
        assert_eq!(eval.judge().call_count(), 1);
    }

    #[tokio::test]
    async fn test_judge_rejection_is_not_a_failure_stage() {
        let gauge = Gauge::new();
        let eval = evaluator(
            MockSolver::new(gauge.clone()),
            MockJudge::new(gauge).rejecting("d"),
        );

        let result = eval.evaluate(&task("d")).await;

        assert!(!result.pass);
        assert_eq!(result.failure_stage, FailureStage::None);
        assert_eq!(result.judge_style_label, Some(StyleLabel::WrongAnswer));
        assert_eq!(result.judge_correct_math, Some(false));
    }

    #[tokio::test]
    async fn test_solve_timeout_becomes_solve_failure() {
        let gauge = Gauge::new();
        let eval = evaluator(
            MockSolver::new(gauge.clone()).delayed("slow", Duration::from_secs(5)),
            MockJudge::new(gauge),
        )
        .with_solve_timeout(Duration::from_millis(50));

        let result = eval.evaluate(&task("slow")).await;

        assert_eq!(result.failure_stage, FailureStage::Solve);
        assert_eq!(result.error.as_deref(), Some("solver timed out after 50ms"));
        assert_eq!(eval.judge().call_count(), 0);
    }

    #[tokio::test]
    async fn test_judge_timeout_becomes_judge_failure() {
        let gauge = Gauge::new();
        let eval = evaluator(
            MockSolver::new(gauge.clone()),
            MockJudge::new(gauge).delayed("slow", Duration::from_secs(5)),
        )
        .with_judge_timeout(Duration::from_millis(50));

        let result = eval.evaluate(&task("slow")).await;

        assert_eq!(result.failure_stage, FailureStage::Judge);
        assert_eq!(result.solver_answer.as_deref(), Some("answer for slow"));
    }

    #[tokio::test]
    async fn test_metrics_recorded() {
        let gauge = Gauge::new();
        let metrics = Metrics::new();
        let eval = CaseEvaluator::new(
            MockSolver::new(gauge.clone()).failing("x"),
            MockJudge::new(gauge),
            metrics.clone(),
        );

        eval.evaluate(&task("x")).await;
        eval.evaluate(&task("y")).await;

        assert_eq!(metrics.solve_calls.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.solve_failures.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.judge_calls.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.cases_passed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.cases_failed.load(Ordering::Relaxed), 1);
    }
}
