//! Seams between the evaluation pipeline and the model-backed services.
//!
//! The pipeline only sees the [`Solver`] and [`Judge`] traits. Responses are
//! parsed into typed values at this boundary, so anything unusable surfaces as
//! a [`SolveError`] or [`JudgeError`] instead of flowing inward.

pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{JudgeError, SolveError};

pub use openai::{OpenAiJudge, OpenAiSolver};

/// Produces a free-text answer for the problem shown in an image.
#[async_trait]
pub trait Solver: Send + Sync {
    async fn solve(&self, problem_image: &Path) -> Result<String, SolveError>;
}

/// Grades a solver answer against the expected answer image.
#[async_trait]
pub trait Judge: Send + Sync {
    async fn judge(&self, request: JudgeRequest<'_>) -> Result<JudgeVerdict, JudgeError>;
}

#[derive(Debug, Clone, Copy)]
pub struct JudgeRequest<'a> {
    pub answer_text: &'a str,
    pub problem_image: &'a Path,
    pub answer_image: &'a Path,
    pub expected_valid: &'a str,
    pub expected_invalid: &'a str,
    pub problem: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeVerdict {
    pub pass: bool,
    pub reason: String,
    pub style_label: StyleLabel,
    pub correct_math: bool,
}

impl JudgeVerdict {
    /// Parses the judge's JSON reply. Markdown code fences around the object
    /// are tolerated.
    pub fn parse(content: &str) -> Result<Self, JudgeError> {
        let body = strip_code_fence(content.trim());
        serde_json::from_str(body).map_err(|e| JudgeError::MalformedVerdict(e.to_string()))
    }
}

fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Style category assigned by the judge. Unknown labels are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StyleLabel {
    StepByStep,
    Complete,
    Accurate,
    Incomplete,
    WrongAnswer,
    ClarificationNeeded,
    Other(String),
}

impl StyleLabel {
    pub fn as_str(&self) -> &str {
        match self {
            StyleLabel::StepByStep => "Step-by-Step",
            StyleLabel::Complete => "Complete",
            StyleLabel::Accurate => "Accurate",
            StyleLabel::Incomplete => "Incomplete",
            StyleLabel::WrongAnswer => "Wrong Answer",
            StyleLabel::ClarificationNeeded => "Clarification Needed",
            StyleLabel::Other(s) => s,
        }
    }
}

impl From<String> for StyleLabel {
    fn from(s: String) -> Self {
        match s.trim() {
            "Step-by-Step" => StyleLabel::StepByStep,
            "Complete" => StyleLabel::Complete,
            "Accurate" => StyleLabel::Accurate,
            "Incomplete" => StyleLabel::Incomplete,
            "Wrong Answer" => StyleLabel::WrongAnswer,
            "Clarification Needed" => StyleLabel::ClarificationNeeded,
            _ => StyleLabel::Other(s),
        }
    }
}

impl From<StyleLabel> for String {
    fn from(label: StyleLabel) -> Self {
        label.as_str().to_string()
    }
}

impl fmt::Display for StyleLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
