//! The solve cascade: one parameterized loop over a strategy table.
//!
//! | tag  | strategy            | tolerance | mode     | on failure | on violation |
//! |------|---------------------|-----------|----------|------------|--------------|
//! | `whs`| `WarmStart`         | warm      | standard | `2`        | `2`          |
//! | `2`  | `Standard`          | primal    | standard | `2R`       | `c`          |
//! | `2R` | `RelaxedStandard`   | relaxed   | standard | `c`        | `c`          |
//! | `c`  | `FullSearch`        | primal    | full     | failed     | `cR`         |
//! | `cR` | `RelaxedFullSearch` | relaxed   | full     | failed     | failed       |
//!
//! Every attempt rebuilds the instance from the unchanged evaluator output,
//! so attempts never observe each other's state.

use std::time::Instant;

use serde::Serialize;
use wrsolve_core::{ModelBuilder, ModelInstance, Violation};

use crate::backend::{Backend, SearchMode, SolveParams, run_instance, start_vector};
use crate::config::SolverConfig;
use crate::diagnostics::Diagnostics;
use crate::error::SolverError;
use crate::stats::PerformanceStats;
use crate::status::{SolverStatus, StatusPair};

/// One row of the strategy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    WarmStart,
    Standard,
    RelaxedStandard,
    FullSearch,
    RelaxedFullSearch,
}

impl Strategy {
    pub fn tag(self) -> &'static str {
        match self {
            Strategy::WarmStart => "whs",
            Strategy::Standard => "2",
            Strategy::RelaxedStandard => "2R",
            Strategy::FullSearch => "c",
            Strategy::RelaxedFullSearch => "cR",
        }
    }

    pub fn mode(self) -> SearchMode {
        match self {
            Strategy::WarmStart | Strategy::Standard | Strategy::RelaxedStandard => {
                SearchMode::Standard
            }
            Strategy::FullSearch | Strategy::RelaxedFullSearch => SearchMode::Full,
        }
    }

    /// Next strategy after the backend reports a non-optimal status.
    pub fn next_on_failure(self) -> Option<Strategy> {
        match self {
            Strategy::WarmStart => Some(Strategy::Standard),
            Strategy::Standard => Some(Strategy::RelaxedStandard),
            Strategy::RelaxedStandard => Some(Strategy::FullSearch),
            Strategy::FullSearch | Strategy::RelaxedFullSearch => None,
        }
    }

    /// Next strategy after an optimal solution fails the violation checks.
    pub fn next_on_violation(self) -> Option<Strategy> {
        match self {
            Strategy::WarmStart => Some(Strategy::Standard),
            Strategy::Standard | Strategy::RelaxedStandard => Some(Strategy::FullSearch),
            Strategy::FullSearch => Some(Strategy::RelaxedFullSearch),
            Strategy::RelaxedFullSearch => None,
        }
    }

    pub fn primal_tolerance(self, config: &SolverConfig) -> f64 {
        match self {
            Strategy::WarmStart => config.warm_primal_tolerance(),
            Strategy::Standard | Strategy::FullSearch => config.primal_tolerance(),
            Strategy::RelaxedStandard | Strategy::RelaxedFullSearch => {
                config.relaxed_primal_tolerance()
            }
        }
    }

    pub fn params(self, config: &SolverConfig) -> SolveParams {
        SolveParams {
            mode: self.mode(),
            primal_tolerance: self.primal_tolerance(config),
            integer_tolerance: config.integer_tolerance(),
            time_limit: config.time_limit,
            mip_gap: config.mip_gap,
            threads: config.threads,
            presolve: None,
            verbosity: config.verbosity,
            log_to_console: config.log_to_console(),
        }
    }
}

/// Where the cascade stands between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeState {
    Attempt(Strategy),
    Success(Strategy),
    Failed,
}

/// How one attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptResult {
    Accepted,
    Violation,
    Failure,
}

impl CascadeState {
    /// First strategy of a run.
    pub fn entry(warm_start: bool) -> Strategy {
        if warm_start {
            Strategy::WarmStart
        } else {
            Strategy::Standard
        }
    }

    /// Transition after `strategy` ended with `result`.
    ///
    /// Warm-started solutions always fall back on a violation; other
    /// strategies only escalate when `violation_retry` is set and otherwise
    /// keep the checked values.
    pub fn after(strategy: Strategy, result: AttemptResult, violation_retry: bool) -> Self {
        let next = match result {
            AttemptResult::Accepted => return CascadeState::Success(strategy),
            AttemptResult::Violation if strategy != Strategy::WarmStart && !violation_retry => {
                return CascadeState::Success(strategy);
            }
            AttemptResult::Violation => strategy.next_on_violation(),
            AttemptResult::Failure => strategy.next_on_failure(),
        };
        next.map_or(CascadeState::Failed, CascadeState::Attempt)
    }
}

/// Record of one backend solve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveAttempt {
    pub strategy: Strategy,
    pub tag: &'static str,
    pub status: StatusPair,
    pub primal_tolerance: f64,
    pub violations: usize,
    pub duration_ms: f64,
}

/// The solution the cascade settled on.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedSolution {
    pub strategy: Strategy,
    /// Checked and corrected values, one per column of the instance.
    pub values: Vec<f64>,
    pub objective: f64,
    pub duals: Option<Vec<f64>>,
    pub reduced_costs: Option<Vec<f64>>,
    /// Violations accepted because violation retry was off.
    pub violations: Vec<Violation>,
}

/// Everything a cascade run produced.
#[derive(Debug, Clone)]
pub struct CascadeReport {
    pub attempts: Vec<SolveAttempt>,
    pub accepted: Option<AcceptedSolution>,
    /// Instance of the last attempt; column indices of `accepted` refer to it.
    pub instance: ModelInstance,
    pub final_status: StatusPair,
}

impl CascadeReport {
    pub fn is_success(&self) -> bool {
        self.accepted.is_some()
    }

    pub fn tags(&self) -> Vec<&'static str> {
        self.attempts.iter().map(|attempt| attempt.tag).collect()
    }
}

/// Drives a backend through the strategy table for one cycle.
#[derive(Debug, Clone)]
pub struct SolveCascade<'a> {
    config: &'a SolverConfig,
    builder: ModelBuilder<'a>,
    hints: Option<Vec<(usize, f64)>>,
}

enum Checked {
    Accepted(AcceptedSolution),
    Violation(Vec<Violation>),
    Failure,
}

impl<'a> SolveCascade<'a> {
    pub fn new(config: &'a SolverConfig, builder: ModelBuilder<'a>) -> Self {
        Self {
            config,
            builder,
            hints: None,
        }
    }

    /// Start with a warm-started attempt seeded from `hints`.
    ///
    /// Column indices stay valid across attempts because rebuilding the same
    /// input yields the same column order.
    pub fn with_warm_start(mut self, hints: Vec<(usize, f64)>) -> Self {
        self.hints = Some(hints);
        self
    }

    /// Run attempts until one is accepted or the table is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error only for model construction failures; backend faults
    /// count as failed attempts.
    pub fn run<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        diagnostics: &mut Diagnostics,
        stats: &mut PerformanceStats,
    ) -> Result<CascadeReport, SolverError> {
        let started = Instant::now();
        let mut attempts = Vec::new();
        let mut strategy = CascadeState::entry(self.hints.is_some());

        loop {
            let build_started = Instant::now();
            let instance = self.builder.build()?;
            stats.record_build(build_started.elapsed().as_secs_f64() * 1000.0);
            if let Err(err) = diagnostics.trace(&instance, strategy.tag()) {
                warn_artifact(&err);
            }

            let (attempt, checked) = self.attempt(backend, &instance, strategy, diagnostics, stats)?;
            let result = match &checked {
                Checked::Accepted(_) => AttemptResult::Accepted,
                Checked::Violation(_) => AttemptResult::Violation,
                Checked::Failure => AttemptResult::Failure,
            };
            let final_status = attempt.status;
            attempts.push(attempt);

            let state = CascadeState::after(strategy, result, self.config.violation_retry());
            match (state, checked) {
                (CascadeState::Attempt(next), _) => {
                    diagnostics.note(format!(
                        "solveName: {} failed ({}), trying {}",
                        strategy.tag(),
                        final_status,
                        next.tag()
                    ));
                    tracing::debug!(
                        component = "cascade",
                        operation = "fallback",
                        status = "retry",
                        from = strategy.tag(),
                        to = next.tag(),
                        solver_status = final_status.status.as_str(),
                        "Falling back to next strategy"
                    );
                    strategy = next;
                }
                (CascadeState::Success(_), Checked::Accepted(accepted)) => {
                    return Ok(self.finish(attempts, Some(accepted), instance, final_status, started));
                }
                (CascadeState::Success(_), Checked::Violation(violations)) => {
                    diagnostics.note(format!(
                        "solveName: {} accepted with {} violations",
                        strategy.tag(),
                        violations.len()
                    ));
                    let accepted = self.accept(backend, &instance, strategy, violations)?;
                    return Ok(self.finish(attempts, Some(accepted), instance, final_status, started));
                }
                (_, checked) => {
                    let suffix = if matches!(checked, Checked::Violation(_)) {
                        "_violation"
                    } else {
                        "_infeasible"
                    };
                    if let Err(err) = diagnostics.dump(&instance, suffix) {
                        warn_artifact(&err);
                    }
                    for message in final_status.messages() {
                        diagnostics.note(format!("Error! {message}"));
                    }
                    return Ok(self.finish(attempts, None, instance, final_status, started));
                }
            }
        }
    }

    fn attempt<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        instance: &ModelInstance,
        strategy: Strategy,
        diagnostics: &mut Diagnostics,
        stats: &mut PerformanceStats,
    ) -> Result<(SolveAttempt, Checked), SolverError> {
        let params = strategy.params(self.config);
        let start = match (&self.hints, strategy) {
            (Some(hints), Strategy::WarmStart) => Some(start_vector(instance, hints)),
            _ => None,
        };
        diagnostics.note(format!(
            "solveName: {} primalT: {:e}",
            strategy.tag(),
            params.primal_tolerance
        ));

        let started = Instant::now();
        let outcome = run_instance(backend, instance, &params, start.as_deref());
        let elapsed = started.elapsed();

        let (status, checked) = match outcome {
            Ok(outcome) => {
                stats.record_attempt(outcome.load_ms, outcome.solve_ms);
                let checked = match (&outcome.values, outcome.status.is_success()) {
                    (Some(values), true) => {
                        let report = self.config.violation_policy().check(instance, values)?;
                        if report.is_clean() {
                            Checked::Accepted(AcceptedSolution {
                                strategy,
                                values: report.values,
                                objective: outcome.objective.unwrap_or(f64::NAN),
                                duals: backend.row_duals(),
                                reduced_costs: backend.reduced_costs(),
                                violations: Vec::new(),
                            })
                        } else {
                            for violation in &report.violations {
                                diagnostics.note(violation.to_string());
                            }
                            Checked::Violation(report.violations)
                        }
                    }
                    _ => Checked::Failure,
                };
                (outcome.status, checked)
            }
            Err(err) => {
                tracing::warn!(
                    component = "cascade",
                    operation = "attempt",
                    status = "error",
                    strategy = strategy.tag(),
                    error = %err,
                    "Backend fault treated as failed attempt"
                );
                diagnostics.note(format!("solveName: {} backend fault: {err}", strategy.tag()));
                (StatusPair::of(SolverStatus::Error), Checked::Failure)
            }
        };

        if elapsed >= self.config.stuck_threshold() {
            let secs = elapsed.as_secs();
            diagnostics.note(format!("solveName: {} stuck for {secs} s", strategy.tag()));
            if let Err(err) = diagnostics.dump(instance, &format!("_stuck_{secs}")) {
                warn_artifact(&err);
            }
        }

        let violations = match &checked {
            Checked::Violation(violations) => violations.len(),
            _ => 0,
        };
        let duration_ms = elapsed.as_secs_f64() * 1000.0;
        tracing::debug!(
            component = "cascade",
            operation = "attempt",
            status = status.status.as_str(),
            strategy = strategy.tag(),
            primal_tolerance = params.primal_tolerance,
            violations,
            duration_ms,
            "Solve attempt finished"
        );
        Ok((
            SolveAttempt {
                strategy,
                tag: strategy.tag(),
                status,
                primal_tolerance: params.primal_tolerance,
                violations,
                duration_ms,
            },
            checked,
        ))
    }

    /// Accept the values of an attempt whose violations are tolerated.
    fn accept<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        instance: &ModelInstance,
        strategy: Strategy,
        violations: Vec<Violation>,
    ) -> Result<AcceptedSolution, SolverError> {
        let values = backend.column_values()?;
        let report = self.config.violation_policy().check(instance, &values)?;
        Ok(AcceptedSolution {
            strategy,
            values: report.values,
            objective: backend.objective_value().unwrap_or(f64::NAN),
            duals: backend.row_duals(),
            reduced_costs: backend.reduced_costs(),
            violations,
        })
    }

    fn finish(
        &self,
        attempts: Vec<SolveAttempt>,
        accepted: Option<AcceptedSolution>,
        instance: ModelInstance,
        final_status: StatusPair,
        started: Instant,
    ) -> CascadeReport {
        let report = CascadeReport {
            attempts,
            accepted,
            instance,
            final_status,
        };
        tracing::info!(
            component = "cascade",
            operation = "run",
            status = if report.is_success() { "success" } else { "failed" },
            attempts = report.attempts.len(),
            tags = %report.tags().join(","),
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Solve cascade finished"
        );
        report
    }
}

fn warn_artifact(err: &SolverError) {
    tracing::warn!(
        component = "cascade",
        operation = "diagnostics",
        status = "error",
        error = %err,
        "Failed to write diagnostic artifact"
    );
}
