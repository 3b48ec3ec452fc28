use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-5.1";
const DEFAULT_DATA_FILE: &str = "data/test_cases.jsonl";
const DEFAULT_RESULTS_CSV: &str = "results.csv";
const DEFAULT_SUMMARY_JSON: &str = "summary.json";
const DEFAULT_LOG_FILE: &str = "run.log";
const DEFAULT_MAX_WORKERS: usize = 12;
const DEFAULT_SOLVER_MAX_TOKENS: u32 = 800;
const DEFAULT_JUDGE_MAX_TOKENS: u32 = 400;
const DEFAULT_SOLVE_TIMEOUT: u64 = 120;
const DEFAULT_JUDGE_TIMEOUT: u64 = 120;
const DEFAULT_HTTP_TIMEOUT: u64 = 180;

/// Run configuration, read once at startup and handed to each component.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub solver_model: String,
    pub judge_model: String,
    pub data_file: PathBuf,
    pub results_csv: PathBuf,
    pub summary_json: PathBuf,
    pub log_file: Option<PathBuf>,
    pub metrics_file: Option<PathBuf>,
    pub max_workers: usize,
    pub solver_max_tokens: u32,
    pub judge_max_tokens: u32,
    pub solve_timeout_secs: u64,
    pub judge_timeout_secs: u64,
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            openai_api_key: env_string("OPENAI_API_KEY"),
            openai_base_url: env_string("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            solver_model: env_string("MODEL_SOLVER").unwrap_or_else(|| DEFAULT_MODEL.into()),
            judge_model: env_string("MODEL_JUDGE").unwrap_or_else(|| DEFAULT_MODEL.into()),
            data_file: env_path("DATA_FILE", DEFAULT_DATA_FILE),
            results_csv: env_path("RESULTS_CSV", DEFAULT_RESULTS_CSV),
            summary_json: env_path("SUMMARY_JSON", DEFAULT_SUMMARY_JSON),
            log_file: match std::env::var("LOG_FILE") {
                Ok(v) if v.trim().is_empty() => None,
                Ok(v) => Some(PathBuf::from(v)),
                Err(_) => Some(PathBuf::from(DEFAULT_LOG_FILE)),
            },
            metrics_file: env_string("METRICS_FILE").map(PathBuf::from),
            max_workers: env_parse("MAX_WORKERS", DEFAULT_MAX_WORKERS).max(1),
            solver_max_tokens: env_parse("SOLVER_MAX_TOKENS", DEFAULT_SOLVER_MAX_TOKENS),
            judge_max_tokens: env_parse("JUDGE_MAX_TOKENS", DEFAULT_JUDGE_MAX_TOKENS),
            solve_timeout_secs: env_secs("SOLVE_TIMEOUT_SECS", DEFAULT_SOLVE_TIMEOUT),
            judge_timeout_secs: env_secs("JUDGE_TIMEOUT_SECS", DEFAULT_JUDGE_TIMEOUT),
            http_timeout_secs: env_secs("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT),
        }
    }

    pub fn solve_timeout(&self) -> Duration {
        Duration::from_secs(self.solve_timeout_secs)
    }

    pub fn judge_timeout(&self) -> Duration {
        Duration::from_secs(self.judge_timeout_secs)
    }

    pub fn print_banner(&self) {
        let log_file = self
            .log_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "disabled".into());

        tracing::info!("╔══════════════════════════════════════════════════╗");
        tracing::info!("║           math-judge v{:<27}║", env!("CARGO_PKG_VERSION"));
        tracing::info!("╠══════════════════════════════════════════════════╣");
        tracing::info!("║  API key:           {:<28}║", if self.openai_api_key.is_some() { "set" } else { "missing" });
        tracing::info!("║  Solver model:      {:<28}║", self.solver_model);
        tracing::info!("║  Judge model:       {:<28}║", self.judge_model);
        tracing::info!("║  Workers:           {:<28}║", self.max_workers);
        tracing::info!("║  Solve timeout:     {:<25}s ║", self.solve_timeout_secs);
        tracing::info!("║  Judge timeout:     {:<25}s ║", self.judge_timeout_secs);
        tracing::info!("║  Dataset:           {:<28}║", self.data_file.display());
        tracing::info!("║  Results:           {:<28}║", self.results_csv.display());
        tracing::info!("║  Summary:           {:<28}║", self.summary_json.display());
        tracing::info!("║  Log file:          {:<28}║", log_file);
        tracing::info!("╚══════════════════════════════════════════════════╝");
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_path(key: &str, default: &str) -> PathBuf {
    PathBuf::from(env_string(key).unwrap_or_else(|| default.into()))
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Like `env_parse`, clamped to at least one second.
fn env_secs(key: &str, default: u64) -> u64 {
    env_parse(key, default).max(1)
}
