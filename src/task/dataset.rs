use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use super::types::TaskRecord;

/// Task records in file order, plus a digest of the raw file for the run summary.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub tasks: Vec<TaskRecord>,
    pub sha256: String,
}

pub async fn load_dataset(path: &Path) -> Result<Dataset> {
    info!("Loading test cases from {}", path.display());

    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read dataset {}", path.display()))?;
    let sha256 = hex::encode(Sha256::digest(&raw));
    let content = String::from_utf8(raw)
        .with_context(|| format!("Dataset {} is not valid UTF-8", path.display()))?;

    let tasks = parse_dataset(&content)
        .with_context(|| format!("Failed to parse dataset {}", path.display()))?;

    info!("Loaded {} test cases (sha256 {})", tasks.len(), &sha256[..12]);
    Ok(Dataset { tasks, sha256 })
}

/// Parses JSON Lines content. Blank lines are skipped; empty or repeated ids
/// are rejected.
pub fn parse_dataset(content: &str) -> Result<Vec<TaskRecord>> {
    let mut tasks = Vec::new();
    let mut seen = HashSet::new();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let task: TaskRecord = serde_json::from_str(line)
            .with_context(|| format!("Invalid record on line {}", line_no))?;

        if task.id.trim().is_empty() {
            anyhow::bail!("Empty id on line {}", line_no);
        }
        if !seen.insert(task.id.clone()) {
            anyhow::bail!("Duplicate id {:?} on line {}", task.id, line_no);
        }

        debug!(id = %task.id, line = line_no, "Parsed test case");
        tasks.push(task);
    }

    Ok(tasks)
}
