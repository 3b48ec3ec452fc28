use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One evaluation case as read from the dataset. Never mutated after load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    #[serde(rename = "image_path")]
    pub problem_image: PathBuf,
    #[serde(rename = "image_problem_answer_path")]
    pub answer_image: PathBuf,
    pub expected_valid: String,
    pub expected_invalid: String,
    /// Free-text problem description, forwarded to the judge when present.
    #[serde(default)]
    pub problem: Option<String>,
}
