mod adapter;
mod config;
mod error;
mod evaluation;
mod metrics;
mod openai;
mod report;
mod task;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::adapter::{OpenAiJudge, OpenAiSolver};
use crate::config::Config;
use crate::evaluation::{aggregate, CaseEvaluator, Orchestrator, RunProgress};
use crate::openai::OpenAiClient;
use crate::report::{RunMetadata, RunReport};
use crate::task::TaskRecord;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();
    init_tracing(&config)?;
    config.print_banner();

    let api_key = config
        .openai_api_key
        .clone()
        .context("Please set the OPENAI_API_KEY environment variable")?;

    let dataset = task::load_dataset(&config.data_file).await?;
    let tasks: Arc<[TaskRecord]> = dataset.tasks.into();

    let metrics = metrics::Metrics::new();
    let client = OpenAiClient::new(&config.openai_base_url, &api_key, config.http_timeout_secs)?;
    let solver = OpenAiSolver::new(client.clone(), &config.solver_model, config.solver_max_tokens);
    let judge = OpenAiJudge::new(client, &config.judge_model, config.judge_max_tokens);
    let evaluator = CaseEvaluator::new(solver, judge, metrics.clone())
        .with_solve_timeout(config.solve_timeout())
        .with_judge_timeout(config.judge_timeout());
    let orchestrator = Orchestrator::new(evaluator).with_max_workers(config.max_workers);

    let run_id = uuid::Uuid::new_v4();
    let started_at = chrono::Utc::now();
    let progress = Arc::new(RunProgress::new(run_id, tasks.len()));

    let results = orchestrator.run(tasks.clone(), progress.clone()).await;

    let run = match aggregate(&tasks, results) {
        Ok(run) => run,
        Err(e) => {
            error!(error = %e, "Result set is inconsistent with the dataset, aborting");
            return Err(e.into());
        }
    };

    let metadata = RunMetadata {
        run_id,
        started_at,
        finished_at: chrono::Utc::now(),
        solver_model: config.solver_model.clone(),
        judge_model: config.judge_model.clone(),
        max_workers: orchestrator.max_workers(),
        dataset_sha256: dataset.sha256,
    };

    report::write_results_csv(&config.results_csv, &run.results).await?;
    report::write_summary_json(
        &config.summary_json,
        &RunReport::new(&metadata, &run.summary, &run.results),
    )
    .await?;
    if let Some(ref path) = config.metrics_file {
        tokio::fs::write(path, metrics.render_prometheus())
            .await
            .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
        info!("Saved metrics to {}", path.display());
    }

    for line in report::summary_lines(&run.results, &run.summary) {
        info!("{}", line);
    }
    info!(
        run_id = %run_id,
        elapsed_ms = progress.elapsed_ms(),
        passed = run.summary.passed,
        total = run.summary.total,
        "Run complete"
    );
    if let Some(ref path) = config.log_file {
        info!("Log saved to {}", path.display());
    }

    Ok(())
}

fn init_tracing(config: &Config) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("math_judge=info".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    let file_layer = match config.log_file {
        Some(ref path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
    Ok(())
}
