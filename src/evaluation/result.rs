use serde::{Deserialize, Serialize};
use std::fmt;

use crate::adapter::{JudgeVerdict, StyleLabel};
use crate::error::{JudgeError, SolveError};
use crate::task::TaskRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    None,
    Solve,
    Judge,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            FailureStage::None => "none",
            FailureStage::Solve => "solve",
            FailureStage::Judge => "judge",
        })
    }
}

/// Outcome of one task record. Built once by the case evaluator and never
/// revised; `pass` is only true when both stages succeeded and the judge
/// accepted the answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseResult {
    pub id: String,
    pub expected_valid: String,
    pub expected_invalid: String,
    pub solver_answer: Option<String>,
    pub pass: bool,
    pub judge_reason: Option<String>,
    pub judge_style_label: Option<StyleLabel>,
    pub judge_correct_math: Option<bool>,
    pub failure_stage: FailureStage,
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl CaseResult {
    fn base(task: &TaskRecord, failure_stage: FailureStage) -> Self {
        Self {
            id: task.id.clone(),
            expected_valid: task.expected_valid.clone(),
            expected_invalid: task.expected_invalid.clone(),
            solver_answer: None,
            pass: false,
            judge_reason: None,
            judge_style_label: None,
            judge_correct_math: None,
            failure_stage,
            error: None,
            duration_ms: 0,
        }
    }

    pub fn solve_failed(task: &TaskRecord, error: &SolveError) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::base(task, FailureStage::Solve)
        }
    }

    pub fn judge_failed(task: &TaskRecord, answer: String, error: &JudgeError) -> Self {
        Self {
            solver_answer: Some(answer),
            error: Some(error.to_string()),
            ..Self::base(task, FailureStage::Judge)
        }
    }

    pub fn judged(task: &TaskRecord, answer: String, verdict: JudgeVerdict) -> Self {
        Self {
            solver_answer: Some(answer),
            pass: verdict.pass,
            judge_reason: Some(verdict.reason),
            judge_style_label: Some(verdict.style_label),
            judge_correct_math: Some(verdict.correct_math),
            ..Self::base(task, FailureStage::None)
        }
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn is_failure(&self) -> bool {
        self.failure_stage != FailureStage::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn task() -> TaskRecord {
        TaskRecord {
            id: "q1".to_string(),
            problem_image: PathBuf::from("q1.png"),
            answer_image: PathBuf::from("q1-answer.png"),
            expected_valid: "Complete".to_string(),
            expected_invalid: "Wrong Answer".to_string(),
            problem: None,
        }
    }

    #[test]
    fn test_solve_failed_leaves_judge_fields_empty() {
        let r = CaseResult::solve_failed(&task(), &SolveError::EmptyAnswer);
        assert_eq!(r.failure_stage, FailureStage::Solve);
        assert!(!r.pass);
        assert!(r.solver_answer.is_none());
        assert!(r.judge_reason.is_none());
        assert!(r.judge_style_label.is_none());
        assert!(r.judge_correct_math.is_none());
        assert_eq!(r.error.as_deref(), Some("solver returned an empty answer"));
        assert!(r.is_failure());
    }

    #[test]
    fn test_judge_failed_keeps_answer() {
        let err = JudgeError::MalformedVerdict("eof".to_string());
        let r = CaseResult::judge_failed(&task(), "x = 2".to_string(), &err);
        assert_eq!(r.failure_stage, FailureStage::Judge);
        assert!(!r.pass);
        assert_eq!(r.solver_answer.as_deref(), Some("x = 2"));
        assert!(r.judge_style_label.is_none());
    }

    #[test]
    fn test_judged_copies_verdict() {
        let verdict = JudgeVerdict {
            pass: true,
            reason: "Correct.".to_string(),
            style_label: StyleLabel::Complete,
            correct_math: true,
        };
        let r = CaseResult::judged(&task(), "x = 2".to_string(), verdict).with_duration_ms(42);
        assert!(r.pass);
        assert_eq!(r.failure_stage, FailureStage::None);
        assert_eq!(r.judge_reason.as_deref(), Some("Correct."));
        assert_eq!(r.judge_style_label, Some(StyleLabel::Complete));
        assert_eq!(r.judge_correct_math, Some(true));
        assert_eq!(r.expected_valid, "Complete");
        assert_eq!(r.duration_ms, 42);
        assert!(!r.is_failure());
    }

    #[test]
    fn test_failure_stage_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&FailureStage::Solve).unwrap(), "\"solve\"");
        assert_eq!(FailureStage::None.to_string(), "none");
    }
}
