//! Solver configuration types.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wrsolve_core::model::DEFAULT_ZERO_TOLERANCE;
use wrsolve_core::{BuildOptions, MAX_VALUE, ViolationPolicy, WarmStartSchedule};

pub const DEFAULT_PRIMAL_TOLERANCE: f64 = 1e-9;
pub const DEFAULT_RELAXED_PRIMAL_TOLERANCE: f64 = 1e-7;
pub const DEFAULT_WARM_PRIMAL_TOLERANCE: f64 = 1e-9;
pub const DEFAULT_INTEGER_TOLERANCE: f64 = 1e-9;
pub const DEFAULT_INTEGER_CHECK_TOLERANCE: f64 = 1e-8;
pub const DEFAULT_IIS_TIME_BUDGET_SECS: f64 = 100.0;
pub const DEFAULT_IIS_PENALTY: f64 = 9000.0;
pub const DEFAULT_STUCK_THRESHOLD_SECS: f64 = 10.0;

/// Configuration options for the solve engine.
///
/// Every field is optional; accessors of the same name resolve the default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    /// Primal feasibility tolerance for `2` and `c` attempts.
    pub primal_tolerance: Option<f64>,
    /// Coarser tolerance for `2R` and `cR` attempts.
    pub relaxed_primal_tolerance: Option<f64>,
    /// Tolerance for warm-started attempts.
    pub warm_primal_tolerance: Option<f64>,
    /// Integer feasibility tolerance handed to the backend.
    pub integer_tolerance: Option<f64>,
    /// Post-solve distance allowed from the nearest integer.
    pub integer_check_tolerance: Option<f64>,
    /// How far a zero-floored column may fall below 0.
    pub lower_bound_zero_check: Option<f64>,
    /// Magnitudes below this snap to 0 when building rows.
    pub zero_tolerance: Option<f64>,
    /// Clamp magnitude and infinity sentinel.
    pub max_value: Option<f64>,
    pub warm_start: Option<WarmStartSchedule>,
    pub violation_check: Option<bool>,
    /// Escalate the cascade on a violation instead of accepting the values.
    pub violation_retry: Option<bool>,
    pub solution_rounding: Option<bool>,
    /// Run the infeasibility analyzer when the cascade fails.
    pub analyze_infeasibility: Option<bool>,
    /// Wall-clock budget for the analyzer in seconds.
    pub iis_time_budget: Option<f64>,
    pub iis_penalty: Option<f64>,
    /// Constraints searched exclusively first by the analyzer.
    pub iis_priority: Option<Vec<String>>,
    /// Attempts slower than this (seconds) write a model dump.
    pub stuck_threshold: Option<f64>,
    /// Write `.cols`/`.rows` trace files for every attempt.
    pub trace: Option<bool>,
    pub diagnostics_dir: Option<PathBuf>,
    /// Time limit per backend solve in seconds. `None` means no limit.
    pub time_limit: Option<f64>,
    /// Relative MIP gap tolerance. `None` uses solver default.
    pub mip_gap: Option<f64>,
    /// Verbosity level. `None` uses solver default.
    pub verbosity: Option<u32>,
    /// Number of threads to use. `None` uses solver default.
    pub threads: Option<u32>,
    /// Log solver output to console. `None` uses solver default.
    pub log_to_console: Option<bool>,
}

fn seconds(value: Option<f64>, default: f64) -> Duration {
    value
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .unwrap_or_else(|| Duration::from_secs_f64(default))
}

impl SolverConfig {
    /// Create a new configuration with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_primal_tolerance(mut self, tol: f64) -> Self {
        self.primal_tolerance = Some(tol);
        self
    }

    pub fn with_relaxed_primal_tolerance(mut self, tol: f64) -> Self {
        self.relaxed_primal_tolerance = Some(tol);
        self
    }

    pub fn with_warm_primal_tolerance(mut self, tol: f64) -> Self {
        self.warm_primal_tolerance = Some(tol);
        self
    }

    pub fn with_integer_tolerance(mut self, tol: f64) -> Self {
        self.integer_tolerance = Some(tol);
        self
    }

    pub fn with_integer_check_tolerance(mut self, tol: f64) -> Self {
        self.integer_check_tolerance = Some(tol);
        self
    }

    pub fn with_lower_bound_zero_check(mut self, tol: f64) -> Self {
        self.lower_bound_zero_check = Some(tol);
        self
    }

    pub fn with_zero_tolerance(mut self, tol: f64) -> Self {
        self.zero_tolerance = Some(tol);
        self
    }

    pub fn with_max_value(mut self, value: f64) -> Self {
        self.max_value = Some(value);
        self
    }

    pub fn with_warm_start(mut self, schedule: WarmStartSchedule) -> Self {
        self.warm_start = Some(schedule);
        self
    }

    pub fn with_violation_check(mut self, enabled: bool) -> Self {
        self.violation_check = Some(enabled);
        self
    }

    pub fn with_violation_retry(mut self, enabled: bool) -> Self {
        self.violation_retry = Some(enabled);
        self
    }

    pub fn with_solution_rounding(mut self, enabled: bool) -> Self {
        self.solution_rounding = Some(enabled);
        self
    }

    pub fn with_analyze_infeasibility(mut self, enabled: bool) -> Self {
        self.analyze_infeasibility = Some(enabled);
        self
    }

    pub fn with_iis_time_budget(mut self, seconds: f64) -> Self {
        self.iis_time_budget = Some(seconds);
        self
    }

    pub fn with_iis_penalty(mut self, penalty: f64) -> Self {
        self.iis_penalty = Some(penalty);
        self
    }

    pub fn with_iis_priority<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.iis_priority = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_stuck_threshold(mut self, seconds: f64) -> Self {
        self.stuck_threshold = Some(seconds);
        self
    }

    pub fn with_trace(mut self, enabled: bool) -> Self {
        self.trace = Some(enabled);
        self
    }

    pub fn with_diagnostics_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.diagnostics_dir = Some(dir.into());
        self
    }

    /// Set the time limit in seconds.
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    /// Set the relative MIP gap tolerance.
    pub fn with_mip_gap(mut self, gap: f64) -> Self {
        self.mip_gap = Some(gap);
        self
    }

    pub fn with_verbosity(mut self, level: u32) -> Self {
        self.verbosity = Some(level);
        self
    }

    pub fn with_threads(mut self, count: u32) -> Self {
        self.threads = Some(count);
        self
    }

    pub fn with_log_to_console(mut self, enabled: bool) -> Self {
        self.log_to_console = Some(enabled);
        self
    }

    /// Check if this configuration is completely empty (all defaults).
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn primal_tolerance(&self) -> f64 {
        self.primal_tolerance.unwrap_or(DEFAULT_PRIMAL_TOLERANCE)
    }

    pub fn relaxed_primal_tolerance(&self) -> f64 {
        self.relaxed_primal_tolerance
            .unwrap_or(DEFAULT_RELAXED_PRIMAL_TOLERANCE)
    }

    pub fn warm_primal_tolerance(&self) -> f64 {
        self.warm_primal_tolerance
            .unwrap_or(DEFAULT_WARM_PRIMAL_TOLERANCE)
    }

    pub fn integer_tolerance(&self) -> f64 {
        self.integer_tolerance.unwrap_or(DEFAULT_INTEGER_TOLERANCE)
    }

    pub fn integer_check_tolerance(&self) -> f64 {
        self.integer_check_tolerance
            .unwrap_or(DEFAULT_INTEGER_CHECK_TOLERANCE)
    }

    /// Defaults to `max(relaxed * 10, 1e-6)`.
    pub fn lower_bound_zero_check(&self) -> f64 {
        self.lower_bound_zero_check
            .unwrap_or_else(|| (self.relaxed_primal_tolerance() * 10.0).max(1e-6))
    }

    pub fn zero_tolerance(&self) -> f64 {
        self.zero_tolerance.unwrap_or(DEFAULT_ZERO_TOLERANCE)
    }

    pub fn max_value(&self) -> f64 {
        self.max_value.unwrap_or(MAX_VALUE)
    }

    pub fn warm_start(&self) -> WarmStartSchedule {
        self.warm_start.clone().unwrap_or_default()
    }

    pub fn violation_check(&self) -> bool {
        self.violation_check.unwrap_or(true)
    }

    pub fn violation_retry(&self) -> bool {
        self.violation_retry.unwrap_or(true)
    }

    pub fn solution_rounding(&self) -> bool {
        self.solution_rounding.unwrap_or(true)
    }

    pub fn analyze_infeasibility(&self) -> bool {
        self.analyze_infeasibility.unwrap_or(true)
    }

    pub fn iis_time_budget(&self) -> Duration {
        seconds(self.iis_time_budget, DEFAULT_IIS_TIME_BUDGET_SECS)
    }

    pub fn iis_penalty(&self) -> f64 {
        self.iis_penalty.unwrap_or(DEFAULT_IIS_PENALTY)
    }

    pub fn iis_priority(&self) -> Option<&[String]> {
        self.iis_priority
            .as_deref()
            .filter(|names| !names.is_empty())
    }

    pub fn stuck_threshold(&self) -> Duration {
        seconds(self.stuck_threshold, DEFAULT_STUCK_THRESHOLD_SECS)
    }

    pub fn trace(&self) -> bool {
        self.trace.unwrap_or(false)
    }

    pub fn log_to_console(&self) -> bool {
        self.log_to_console.unwrap_or(false)
    }

    /// Thresholds for row construction.
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions::default()
            .with_zero_tolerance(self.zero_tolerance())
            .with_max_value(self.max_value())
    }

    /// Thresholds for the post-solve check.
    pub fn violation_policy(&self) -> ViolationPolicy {
        ViolationPolicy {
            enabled: self.violation_check(),
            integer_check: self.integer_check_tolerance(),
            lower_bound_zero_check: self.lower_bound_zero_check(),
            rounding: self.solution_rounding(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use wrsolve_core::CycleId;

    #[test]
    fn test_config_new_is_empty() {
        let config = SolverConfig::new();
        assert!(config.is_empty());
    }

    #[test]
    fn test_defaults_resolve() {
        let config = SolverConfig::new();
        assert_eq!(config.primal_tolerance(), 1e-9);
        assert_eq!(config.relaxed_primal_tolerance(), 1e-7);
        assert_eq!(config.warm_primal_tolerance(), 1e-9);
        assert_eq!(config.integer_check_tolerance(), 1e-8);
        assert_eq!(config.lower_bound_zero_check(), 1e-6);
        assert_eq!(config.zero_tolerance(), 1e-11);
        assert_eq!(config.max_value(), 1e28);
        assert_eq!(config.iis_time_budget(), Duration::from_secs(100));
        assert_eq!(config.iis_penalty(), 9000.0);
        assert_eq!(config.stuck_threshold(), Duration::from_secs(10));
        assert!(config.violation_check());
        assert!(config.violation_retry());
        assert!(config.solution_rounding());
        assert!(!config.trace());
        assert!(!config.warm_start().enabled);
    }

    #[test]
    fn test_lower_bound_check_follows_relaxed_tolerance() {
        let config = SolverConfig::new().with_relaxed_primal_tolerance(1e-5);
        assert!((config.lower_bound_zero_check() - 1e-4).abs() < 1e-15);

        let config = config.with_lower_bound_zero_check(1e-3);
        assert_eq!(config.lower_bound_zero_check(), 1e-3);
    }

    #[test]
    fn test_config_builder_pattern() {
        let config = SolverConfig::new()
            .with_time_limit(60.0)
            .with_mip_gap(0.01)
            .with_threads(4)
            .with_iis_priority(["a", "b"])
            .with_violation_retry(false);

        assert!(!config.is_empty());
        assert_eq!(config.time_limit, Some(60.0));
        assert_eq!(config.mip_gap, Some(0.01));
        assert_eq!(config.threads, Some(4));
        assert_eq!(config.iis_priority().map(<[String]>::len), Some(2));
        assert!(!config.violation_retry());
    }

    #[test]
    fn test_empty_priority_is_none() {
        let config = SolverConfig::new().with_iis_priority(Vec::<String>::new());
        assert!(config.iis_priority().is_none());
    }

    #[test]
    fn test_invalid_duration_falls_back() {
        let config = SolverConfig::new()
            .with_iis_time_budget(-1.0)
            .with_stuck_threshold(f64::NAN);
        assert_eq!(config.iis_time_budget(), Duration::from_secs(100));
        assert_eq!(config.stuck_threshold(), Duration::from_secs(10));
    }

    #[test]
    fn test_policy_and_build_options() {
        let config = SolverConfig::new()
            .with_solution_rounding(false)
            .with_zero_tolerance(1e-6);
        let policy = config.violation_policy();
        assert!(policy.enabled);
        assert!(!policy.rounding);
        assert_eq!(config.build_options().zero_tolerance, 1e-6);
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "relaxed_primal_tolerance": 1e-6,
            "iis_time_budget": 5,
            "warm_start": {"enabled": true, "save_cycles": [2], "use_cycles": [2]}
        }"#;
        let config: SolverConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.relaxed_primal_tolerance(), 1e-6);
        assert_eq!(config.iis_time_budget(), Duration::from_secs(5));
        assert!(config.warm_start().is_use_eligible(CycleId::new(2)));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(serde_json::from_str::<SolverConfig>(r#"{"tolerance": 1}"#).is_err());
    }
}
