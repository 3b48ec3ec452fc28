pub mod aggregator;
pub mod evaluator;
pub mod orchestrator;
pub mod progress;
pub mod result;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregator::{aggregate, RunSummary};
pub use evaluator::CaseEvaluator;
pub use orchestrator::Orchestrator;
pub use progress::RunProgress;
pub use result::{CaseResult, FailureStage};
