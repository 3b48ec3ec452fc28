use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
pub struct Metrics {
    pub cases_total: AtomicU64,
    pub cases_passed: AtomicU64,
    pub cases_failed: AtomicU64,
    pub solve_calls: AtomicU64,
    pub solve_failures: AtomicU64,
    pub solve_duration_ms_sum: AtomicU64,
    pub judge_calls: AtomicU64,
    pub judge_failures: AtomicU64,
    pub judge_duration_ms_sum: AtomicU64,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_solve(&self, ok: bool, elapsed: Duration) {
        self.solve_calls.fetch_add(1, Ordering::Relaxed);
        self.solve_duration_ms_sum
            .fetch_add(elapsed.as_millis() as u64, Ordering::Relaxed);
        if !ok {
            self.solve_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_judge(&self, ok: bool, elapsed: Duration) {
        self.judge_calls.fetch_add(1, Ordering::Relaxed);
        self.judge_duration_ms_sum
            .fetch_add(elapsed.as_millis() as u64, Ordering::Relaxed);
        if !ok {
            self.judge_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_case(&self, passed: bool) {
        self.cases_total.fetch_add(1, Ordering::Relaxed);
        if passed {
            self.cases_passed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cases_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn render_prometheus(&self) -> String {
        let cases_total = self.cases_total.load(Ordering::Relaxed);
        let cases_passed = self.cases_passed.load(Ordering::Relaxed);
        let cases_failed = self.cases_failed.load(Ordering::Relaxed);
        let solve_calls = self.solve_calls.load(Ordering::Relaxed);
        let solve_failures = self.solve_failures.load(Ordering::Relaxed);
        let solve_ms = self.solve_duration_ms_sum.load(Ordering::Relaxed);
        let judge_calls = self.judge_calls.load(Ordering::Relaxed);
        let judge_failures = self.judge_failures.load(Ordering::Relaxed);
        let judge_ms = self.judge_duration_ms_sum.load(Ordering::Relaxed);

        format!(
            "# HELP math_judge_cases_total Cases evaluated.\n\
             # TYPE math_judge_cases_total counter\n\
             math_judge_cases_total {}\n\
             # HELP math_judge_cases_passed Cases the judge passed.\n\
             # TYPE math_judge_cases_passed counter\n\
             math_judge_cases_passed {}\n\
             # HELP math_judge_cases_failed Cases that failed at any stage.\n\
             # TYPE math_judge_cases_failed counter\n\
             math_judge_cases_failed {}\n\
             # HELP math_judge_solve_calls_total Solver invocations.\n\
             # TYPE math_judge_solve_calls_total counter\n\
             math_judge_solve_calls_total {}\n\
             # HELP math_judge_solve_failures_total Solver invocations that failed.\n\
             # TYPE math_judge_solve_failures_total counter\n\
             math_judge_solve_failures_total {}\n\
             # HELP math_judge_solve_duration_ms_sum Sum of solver latencies in ms.\n\
             # TYPE math_judge_solve_duration_ms_sum counter\n\
             math_judge_solve_duration_ms_sum {}\n\
             # HELP math_judge_judge_calls_total Judge invocations.\n\
             # TYPE math_judge_judge_calls_total counter\n\
             math_judge_judge_calls_total {}\n\
             # HELP math_judge_judge_failures_total Judge invocations that failed.\n\
             # TYPE math_judge_judge_failures_total counter\n\
             math_judge_judge_failures_total {}\n\
             # HELP math_judge_judge_duration_ms_sum Sum of judge latencies in ms.\n\
             # TYPE math_judge_judge_duration_ms_sum counter\n\
             math_judge_judge_duration_ms_sum {}\n",
            cases_total,
            cases_passed,
            cases_failed,
            solve_calls,
            solve_failures,
            solve_ms,
            judge_calls,
            judge_failures,
            judge_ms
        )
    }
}
