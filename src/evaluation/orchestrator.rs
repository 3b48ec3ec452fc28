use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use super::evaluator::CaseEvaluator;
use super::progress::RunProgress;
use super::result::CaseResult;
use crate::adapter::{Judge, Solver};
use crate::task::TaskRecord;

const DEFAULT_MAX_WORKERS: usize = 12;

/// Runs the case evaluator over a whole dataset with at most `max_workers`
/// cases in flight.
pub struct Orchestrator<S, J> {
    evaluator: Arc<CaseEvaluator<S, J>>,
    max_workers: usize,
}

impl<S: Solver + 'static, J: Judge + 'static> Orchestrator<S, J> {
    pub fn new(evaluator: CaseEvaluator<S, J>) -> Self {
        Self {
            evaluator: Arc::new(evaluator),
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }

    pub fn with_max_workers(mut self, max: usize) -> Self {
        self.max_workers = max.max(1);
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    #[cfg(test)]
    pub fn evaluator(&self) -> &CaseEvaluator<S, J> {
        &self.evaluator
    }

    /// Evaluates every task and returns the results in completion order.
    ///
    /// The spawned cases live in a `JoinSet` owned by this call, so they are
    /// either drained here or aborted when the set is dropped.
    pub async fn run(&self, tasks: Arc<[TaskRecord]>, progress: Arc<RunProgress>) -> Vec<CaseResult> {
        info!(
            total = tasks.len(),
            max_workers = self.max_workers,
            "Dispatching cases"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut set = JoinSet::new();

        for idx in 0..tasks.len() {
            let evaluator = Arc::clone(&self.evaluator);
            let tasks = Arc::clone(&tasks);
            let semaphore = Arc::clone(&semaphore);
            let progress = Arc::clone(&progress);

            set.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return None;
                };
                let result = evaluator.evaluate(&tasks[idx]).await;
                progress.record(&result);
                Some(result)
            });
        }

        let mut results = Vec::with_capacity(tasks.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Some(result)) => results.push(result),
                Ok(None) => warn!("Worker pool closed before a case could start"),
                Err(e) => error!(error = %e, "Case task panicked"),
            }
        }

        info!(
            collected = results.len(),
            elapsed_ms = progress.elapsed_ms(),
            "All cases finished"
        );
        results
    }
}
