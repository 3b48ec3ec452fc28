//! Scripted adapters shared by the evaluation tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::adapter::{Judge, JudgeRequest, JudgeVerdict, Solver, StyleLabel};
use crate::error::{JudgeError, SolveError};
use crate::openai::client::ApiError;
use crate::task::TaskRecord;

pub fn task(id: &str) -> TaskRecord {
    TaskRecord {
        id: id.to_string(),
        problem_image: PathBuf::from(format!("{id}.png")),
        answer_image: PathBuf::from(format!("{id}-answer.png")),
        expected_valid: "Step-by-Step".to_string(),
        expected_invalid: "Incomplete".to_string(),
        problem: None,
    }
}

fn case_id(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    stem.trim_end_matches("-answer").to_string()
}

/// Tracks how many adapter calls are outstanding at once.
#[derive(Debug, Default)]
pub struct Gauge {
    current: AtomicUsize,
    max: AtomicUsize,
}

impl Gauge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn enter(&self) -> GaugeGuard<'_> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
        GaugeGuard(self)
    }

    pub fn max(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }
}

pub struct GaugeGuard<'a>(&'a Gauge);

impl Drop for GaugeGuard<'_> {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct MockSolver {
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
    gauge: Arc<Gauge>,
}

impl MockSolver {
    pub fn new(gauge: Arc<Gauge>) -> Self {
        Self {
            failing: HashSet::new(),
            delays: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            gauge,
        }
    }

    pub fn failing(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn delayed(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(id.to_string(), delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl Solver for MockSolver {
    async fn solve(&self, problem_image: &Path) -> Result<String, SolveError> {
        let id = case_id(problem_image);
        self.calls.lock().push(id.clone());
        let _outstanding = self.gauge.enter();

        if let Some(delay) = self.delays.get(&id) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(&id) {
            return Err(SolveError::Api(ApiError::Status {
                status: 500,
                body: "mock solver failure".to_string(),
            }));
        }
        Ok(format!("answer for {id}"))
    }
}

pub struct MockJudge {
    failing: HashSet<String>,
    panicking: HashSet<String>,
    rejecting: HashSet<String>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
    gauge: Arc<Gauge>,
}

impl MockJudge {
    pub fn new(gauge: Arc<Gauge>) -> Self {
        Self {
            failing: HashSet::new(),
            panicking: HashSet::new(),
            rejecting: HashSet::new(),
            delays: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            gauge,
        }
    }

    pub fn failing(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn panicking(mut self, id: &str) -> Self {
        self.panicking.insert(id.to_string());
        self
    }

    pub fn rejecting(mut self, id: &str) -> Self {
        self.rejecting.insert(id.to_string());
        self
    }

    pub fn delayed(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(id.to_string(), delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn was_called_for(&self, id: &str) -> bool {
        self.calls.lock().iter().any(|c| c == id)
    }
}

#[async_trait]
impl Judge for MockJudge {
    async fn judge(&self, request: JudgeRequest<'_>) -> Result<JudgeVerdict, JudgeError> {
        let id = case_id(request.answer_image);
        self.calls.lock().push(id.clone());
        let _outstanding = self.gauge.enter();

        if let Some(delay) = self.delays.get(&id) {
            tokio::time::sleep(*delay).await;
        }
        if self.panicking.contains(&id) {
            panic!("mock judge panicked on {id}");
        }
        if self.failing.contains(&id) {
            return Err(JudgeError::MalformedVerdict("mock judge failure".to_string()));
        }

        let pass = !self.rejecting.contains(&id);
        Ok(JudgeVerdict {
            pass,
            reason: format!("graded {}", request.answer_text),
            style_label: if pass {
                StyleLabel::StepByStep
            } else {
                StyleLabel::WrongAnswer
            },
            correct_math: pass,
        })
    }
}
