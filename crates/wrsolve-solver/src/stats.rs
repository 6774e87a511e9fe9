//! Running counters for a study run.

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceStats {
    pub problems_solved: u64,
    pub failures: u64,
    pub attempts: u64,
    pub analyses: u64,
    pub build_ms: f64,
    pub load_ms: f64,
    pub solve_ms: f64,
    pub analysis_ms: f64,
}

impl PerformanceStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_build(&mut self, ms: f64) {
        self.build_ms += ms;
    }

    pub fn record_attempt(&mut self, load_ms: f64, solve_ms: f64) {
        self.attempts += 1;
        self.load_ms += load_ms;
        self.solve_ms += solve_ms;
    }

    pub fn record_outcome(&mut self, success: bool) {
        if success {
            self.problems_solved += 1;
        } else {
            self.failures += 1;
        }
    }

    pub fn record_analysis(&mut self, ms: f64) {
        self.analyses += 1;
        self.analysis_ms += ms;
    }

    /// Mean backend solve time per attempt.
    pub fn average_solve_ms(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.solve_ms / self.attempts as f64
        }
    }

    pub fn log_summary(&self) {
        tracing::info!(
            component = "engine",
            operation = "summary",
            status = "success",
            problems_solved = self.problems_solved,
            failures = self.failures,
            attempts = self.attempts,
            analyses = self.analyses,
            build_ms = self.build_ms,
            load_ms = self.load_ms,
            solve_ms = self.solve_ms,
            analysis_ms = self.analysis_ms,
            average_solve_ms = self.average_solve_ms(),
            "Solver performance summary"
        );
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let mut stats = PerformanceStats::new();
        assert_eq!(stats.average_solve_ms(), 0.0);

        stats.record_build(1.5);
        stats.record_attempt(2.0, 10.0);
        stats.record_attempt(1.0, 30.0);
        stats.record_outcome(true);
        stats.record_outcome(false);
        stats.record_analysis(4.0);

        assert_eq!(stats.attempts, 2);
        assert_eq!(stats.problems_solved, 1);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.analyses, 1);
        assert_eq!(stats.load_ms, 3.0);
        assert_eq!(stats.average_solve_ms(), 20.0);
    }

    #[test]
    fn summary_logs_with_test_subscriber() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
        PerformanceStats::new().log_summary();
    }
}
