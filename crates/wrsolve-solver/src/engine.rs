//! The driver-facing solve engine.
//!
//! One engine serves a whole study run: it owns the backend, the warm-start
//! store, the counters and the diagnostics writer, and holds the cycle
//! definition the driver is currently filling in.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use serde::Serialize;
use wrsolve_core::{
    ColumnKind, Constraint, CycleDefinition, CycleId, ModelBuilder, ModelInstance, Variable,
    WarmStartStore, Weights,
};
use wrsolve_tools::MemoryProbe;

use crate::backend::Backend;
use crate::cascade::{CascadeReport, SolveAttempt, SolveCascade, Strategy};
use crate::config::SolverConfig;
use crate::diagnostics::Diagnostics;
use crate::error::SolverError;
use crate::iis::{InfeasibilityAnalyzer, InfeasibilityReport};
use crate::stats::PerformanceStats;
use crate::status::{SolverStatus, StatusPair};

/// Marks the engine busy for the lifetime of one solve.
#[derive(Debug)]
pub struct BusyGuard {
    flag: Arc<AtomicBool>,
}

impl BusyGuard {
    /// # Errors
    ///
    /// Returns [`SolverError::EngineBusy`] if the flag is already set.
    pub fn acquire(flag: &Arc<AtomicBool>) -> Result<Self, SolverError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SolverError::EngineBusy)?;
        Ok(Self {
            flag: Arc::clone(flag),
        })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Outcome of one engine solve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveResult {
    pub model: String,
    pub cycle: CycleId,
    pub status: SolverStatus,
    pub primary_status: i32,
    pub secondary_status: i32,
    pub result_code: i32,
    pub objective: Option<f64>,
    pub variable_values: BTreeMap<String, f64>,
    /// Values of slack and surplus columns the constraints introduced.
    pub slack_values: BTreeMap<String, f64>,
    pub duals: BTreeMap<String, f64>,
    pub reduced_costs: BTreeMap<String, f64>,
    pub message: String,
    pub solve_time_ms: f64,
    /// Strategy whose solution was accepted.
    pub strategy: Option<Strategy>,
    pub attempts: Vec<SolveAttempt>,
    pub infeasibility: Option<InfeasibilityReport>,
    pub notes: Vec<String>,
}

impl SolveResult {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// # Errors
    ///
    /// Returns [`SolverError::SolveFailure`] unless the solve was accepted.
    pub fn ensure_success(&self) -> Result<(), SolverError> {
        if self.is_success() {
            return Ok(());
        }
        Err(SolverError::SolveFailure {
            status: self.status,
            attempts: self.attempts.len(),
        })
    }
}

/// Backend-agnostic implementation of the driver solve contract.
pub struct SolveEngine<B: Backend> {
    backend: B,
    config: SolverConfig,
    warm_start: WarmStartStore,
    stats: PerformanceStats,
    diagnostics: Diagnostics,
    memory: MemoryProbe,
    in_use: Arc<AtomicBool>,
    initialized: bool,
    disposed: bool,
    model: Option<CycleDefinition>,
    last: Option<SolveResult>,
}

impl<B: Backend> SolveEngine<B> {
    /// # Errors
    ///
    /// Returns an error if the configured diagnostics directory cannot be
    /// created.
    pub fn new(backend: B, config: SolverConfig) -> Result<Self, SolverError> {
        let diagnostics = match &config.diagnostics_dir {
            Some(dir) => Diagnostics::new(dir, config.trace())?,
            None => Diagnostics::disabled(),
        };
        Ok(Self {
            backend,
            warm_start: WarmStartStore::new(config.warm_start()),
            config,
            stats: PerformanceStats::new(),
            diagnostics,
            memory: MemoryProbe::new(),
            in_use: Arc::new(AtomicBool::new(false)),
            initialized: false,
            disposed: false,
            model: None,
            last: None,
        })
    }

    /// Prepare the backend for a study run.
    ///
    /// # Errors
    ///
    /// Returns an error after `dispose` or if the backend cannot be reset.
    pub fn initialize(&mut self) -> Result<(), SolverError> {
        self.ensure_live()?;
        self.backend.reset()?;
        self.initialized = true;
        tracing::info!(
            component = "engine",
            operation = "initialize",
            status = "success",
            backend = self.backend.name(),
            version = %self.backend.version(),
            warm_start = self.config.warm_start().enabled,
            diagnostics = self.diagnostics.dir().is_some(),
            "Solve engine initialized"
        );
        Ok(())
    }

    /// Start a new cycle model; variables, constraints and weights follow.
    ///
    /// # Errors
    ///
    /// Returns an error after `dispose`.
    pub fn load_new_model(&mut self, name: impl Into<String>, cycle: CycleId) -> Result<(), SolverError> {
        self.ensure_live()?;
        if !self.initialized {
            self.initialize()?;
        }
        let name = name.into();
        self.diagnostics.set_model_name(name.clone());
        self.model = Some(CycleDefinition {
            name,
            cycle,
            variables: Vec::new(),
            constraints: Vec::new(),
            weights: Weights::default(),
        });
        self.last = None;
        Ok(())
    }

    /// Load a complete cycle definition at once.
    ///
    /// # Errors
    ///
    /// Returns an error after `dispose`.
    pub fn load_cycle(&mut self, definition: CycleDefinition) -> Result<(), SolverError> {
        self.load_new_model(definition.name.clone(), definition.cycle)?;
        self.model = Some(definition);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`SolverError::NoModel`] before `load_new_model`.
    pub fn set_variables(&mut self, variables: Vec<Variable>) -> Result<(), SolverError> {
        self.current_model_mut()?.variables = variables;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`SolverError::NoModel`] before `load_new_model`.
    pub fn set_constraints(&mut self, constraints: Vec<Constraint>) -> Result<(), SolverError> {
        self.current_model_mut()?.constraints = constraints;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`SolverError::NoModel`] before `load_new_model`.
    pub fn set_weights(&mut self, weights: Weights) -> Result<(), SolverError> {
        self.current_model_mut()?.weights = weights;
        Ok(())
    }

    /// Run the solve cascade for the current model.
    ///
    /// A failed cascade is reported through the result status, not as an
    /// error; use [`SolveResult::ensure_success`] to abort on it.
    ///
    /// # Errors
    ///
    /// Returns an error for construction failures, a busy or disposed engine
    /// or a missing model.
    pub fn solve(&mut self) -> Result<SolveResult, SolverError> {
        self.solve_inner(None)
    }

    /// Solve and, on failure, always analyze the infeasibility and write the
    /// report as JSON to `output`.
    ///
    /// # Errors
    ///
    /// Same as [`SolveEngine::solve`], plus a failure to write `output`.
    pub fn solve_with_infeasibility_analysis(&mut self, output: &Path) -> Result<SolveResult, SolverError> {
        self.solve_inner(Some(output))
    }

    fn solve_inner(&mut self, output: Option<&Path>) -> Result<SolveResult, SolverError> {
        self.ensure_live()?;
        let _guard = BusyGuard::acquire(&self.in_use)?;
        if self.model.is_none() {
            return Err(SolverError::NoModel);
        }
        let started = Instant::now();
        self.record_memory("solve_start");

        let result = self.run_model(output, started);

        self.record_memory("solve_end");
        let mut result = match result {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(
                    component = "engine",
                    operation = "solve",
                    status = "error",
                    error = %err,
                    "Cycle solve aborted"
                );
                self.diagnostics.note(format!("Error! {err}"));
                return Err(err);
            }
        };
        result.notes = self.diagnostics.notes_mut().take_lines();
        result.solve_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        tracing::info!(
            component = "engine",
            operation = "solve",
            status = result.status.as_str(),
            model = result.model.as_str(),
            cycle = result.cycle.inner(),
            attempts = result.attempts.len(),
            objective = result.objective.unwrap_or(f64::NAN),
            duration_ms = result.solve_time_ms,
            "Cycle solve finished"
        );
        self.last = Some(result.clone());
        Ok(result)
    }

    fn run_model(&mut self, output: Option<&Path>, started: Instant) -> Result<SolveResult, SolverError> {
        let Some(model) = self.model.as_ref() else {
            return Err(SolverError::NoModel);
        };
        let builder = ModelBuilder::new(&model.variables, &model.constraints)
            .with_weights(&model.weights)
            .with_options(self.config.build_options());

        let hints = if self.warm_start.schedule().is_use_eligible(model.cycle) {
            let instance = builder.build()?;
            self.warm_start.hints(model.cycle, &instance)
        } else {
            None
        };

        let mut cascade = SolveCascade::new(&self.config, builder.clone());
        if let Some(hints) = hints {
            cascade = cascade.with_warm_start(hints);
        }
        let report = cascade.run(&mut self.backend, &mut self.diagnostics, &mut self.stats)?;
        self.stats.record_outcome(report.is_success());

        let mut result = solve_result(model, &report, started);
        if let Some(accepted) = &report.accepted {
            self.warm_start
                .save_solution(model.cycle, &report.instance, &accepted.values);
            return Ok(result);
        }

        if output.is_some() || self.config.analyze_infeasibility() {
            let analysis_started = Instant::now();
            let analysis = InfeasibilityAnalyzer::new(builder, &self.config).run(&mut self.backend);
            self.stats
                .record_analysis(analysis_started.elapsed().as_secs_f64() * 1000.0);
            match analysis {
                Ok(analysis) => {
                    for line in analysis.note_lines() {
                        self.diagnostics.note(line);
                    }
                    if let Some(path) = output {
                        write_report(path, &analysis)?;
                    }
                    result.infeasibility = Some(analysis);
                }
                Err(err) => {
                    tracing::warn!(
                        component = "engine",
                        operation = "analyze",
                        status = "error",
                        error = %err,
                        "Infeasibility analysis failed"
                    );
                    self.diagnostics
                        .note(format!("Infeasibility analysis failed: {err}"));
                }
            }
        }
        Ok(result)
    }

    /// Status of the last solve.
    pub fn model_status(&self) -> Option<SolverStatus> {
        self.last.as_ref().map(|result| result.status)
    }

    /// Objective of the last accepted solve, NaN otherwise.
    pub fn objective_value(&self) -> f64 {
        self.last
            .as_ref()
            .and_then(|result| result.objective)
            .unwrap_or(f64::NAN)
    }

    /// Value of a decision or slack column, NaN when unknown.
    pub fn variable_value(&self, name: &str) -> f64 {
        self.last
            .as_ref()
            .and_then(|result| {
                result
                    .variable_values
                    .get(name)
                    .or_else(|| result.slack_values.get(name))
            })
            .copied()
            .unwrap_or(f64::NAN)
    }

    pub fn variable_values(&self) -> Option<&BTreeMap<String, f64>> {
        self.last.as_ref().map(|result| &result.variable_values)
    }

    pub fn last_result(&self) -> Option<&SolveResult> {
        self.last.as_ref()
    }

    pub fn solver_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn supports_sensitivity_analysis(&self) -> bool {
        self.backend.supports_sensitivity_analysis()
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn stats(&self) -> &PerformanceStats {
        &self.stats
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn warm_start_store(&self) -> &WarmStartStore {
        &self.warm_start
    }

    pub fn memory(&self) -> &MemoryProbe {
        &self.memory
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Shared in-use flag, for callers that hand the engine across threads.
    pub fn busy_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.in_use)
    }

    /// End the study run: log counters and drop per-run state.
    pub fn close(&mut self) {
        self.stats.log_summary();
        if let Some(peak) = self.memory.peak_bytes() {
            tracing::info!(
                component = "engine",
                operation = "close",
                status = "success",
                peak_rss_mib = peak as f64 / (1024.0 * 1024.0),
                "Peak memory during study run"
            );
        }
        self.warm_start.clear();
        self.memory.clear();
        self.model = None;
        self.initialized = false;
    }

    /// Release the backend; every later call fails.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::EngineBusy`] while a solve is running.
    pub fn dispose(&mut self) -> Result<(), SolverError> {
        if self.disposed {
            return Ok(());
        }
        let _guard = BusyGuard::acquire(&self.in_use)?;
        self.close();
        if let Err(err) = self.backend.reset() {
            tracing::warn!(
                component = "engine",
                operation = "dispose",
                status = "error",
                error = %err,
                "Backend reset failed during dispose"
            );
        }
        self.last = None;
        self.disposed = true;
        Ok(())
    }

    fn ensure_live(&self) -> Result<(), SolverError> {
        if self.disposed {
            Err(SolverError::EngineDisposed)
        } else {
            Ok(())
        }
    }

    fn current_model_mut(&mut self) -> Result<&mut CycleDefinition, SolverError> {
        self.ensure_live()?;
        self.model.as_mut().ok_or(SolverError::NoModel)
    }

    fn record_memory(&mut self, stage: &str) {
        match self.memory.record(stage) {
            Ok(snapshot) => tracing::debug!(
                component = "engine",
                operation = "memory",
                status = "success",
                stage,
                rss_mib = snapshot.rss_mib(),
                "Memory snapshot"
            ),
            Err(err) => tracing::debug!(
                component = "engine",
                operation = "memory",
                status = "error",
                stage,
                error = %err,
                "Memory snapshot unavailable"
            ),
        }
    }
}

fn solve_result(model: &CycleDefinition, report: &CascadeReport, started: Instant) -> SolveResult {
    // A violation that survived every retry leaves an optimal backend status.
    let status = match (&report.accepted, report.final_status.is_success()) {
        (None, true) => StatusPair::new(
            SolverStatus::NumericalDifficulty,
            report.final_status.primary,
            report.final_status.secondary,
        ),
        _ => report.final_status,
    };
    let message = if report.accepted.is_none() && report.final_status.is_success() {
        "Solution rejected by violation checks.".to_string()
    } else {
        status.messages().join(" ")
    };

    let mut result = SolveResult {
        model: model.name.clone(),
        cycle: model.cycle,
        status: status.status,
        primary_status: status.primary,
        secondary_status: status.secondary,
        result_code: status.status.result_code(),
        objective: None,
        variable_values: BTreeMap::new(),
        slack_values: BTreeMap::new(),
        duals: BTreeMap::new(),
        reduced_costs: BTreeMap::new(),
        message,
        solve_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        strategy: None,
        attempts: report.attempts.clone(),
        infeasibility: None,
        notes: Vec::new(),
    };

    if let Some(accepted) = &report.accepted {
        let instance = &report.instance;
        result.objective = Some(accepted.objective);
        result.strategy = Some(accepted.strategy);
        for (column, value) in instance.columns().iter().zip(&accepted.values) {
            match column.kind {
                ColumnKind::Decision => {
                    result.variable_values.insert(column.name.clone(), *value);
                }
                ColumnKind::Auxiliary => {
                    result.slack_values.insert(column.name.clone(), *value);
                }
                ColumnKind::Elastic { .. } => {}
            }
        }
        if let Some(duals) = &accepted.duals {
            result.duals = by_row_name(instance, duals);
        }
        if let Some(costs) = &accepted.reduced_costs {
            result.reduced_costs = instance
                .columns()
                .iter()
                .zip(costs)
                .map(|(column, cost)| (column.name.clone(), *cost))
                .collect();
        }
    }
    result
}

fn by_row_name(instance: &ModelInstance, values: &[f64]) -> BTreeMap<String, f64> {
    instance
        .rows()
        .iter()
        .zip(values)
        .map(|(row, value)| (row.name.clone(), *value))
        .collect()
}

fn write_report(path: &Path, report: &InfeasibilityReport) -> Result<(), SolverError> {
    let io_error = |message: String| SolverError::Diagnostics {
        path: path.to_path_buf(),
        message,
    };
    let json = serde_json::to_string_pretty(report).map_err(|err| io_error(err.to_string()))?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| io_error(err.to_string()))?;
    }
    fs::write(path, json).map_err(|err| io_error(err.to_string()))?;
    tracing::info!(
        component = "engine",
        operation = "write_report",
        status = "success",
        path = %path.display(),
        confirmed = report.confirmed.len(),
        "Wrote infeasibility report"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::testing::{StubBackend, StubResponse};
    use wrsolve_core::{Bounds, Sign, WarmStartSchedule};

    fn variables() -> Vec<Variable> {
        vec![
            Variable::continuous("x", Bounds::new(0.0, 10.0)).with_weight(1.0),
            Variable::integer("n", Bounds::new(0.0, 5.0)),
            Variable::integer("m", Bounds::new(0.0, 5.0)),
            Variable::integer("k", Bounds::new(0.0, 5.0)),
        ]
    }

    fn constraints() -> Vec<Constraint> {
        vec![
            Constraint::new("cap", Sign::LessEqual, 0.0)
                .term("x", 1.0)
                .term("n", -2.0)
                .term("surplus_cap", 1.0),
        ]
    }

    fn engine(backend: StubBackend, config: SolverConfig) -> SolveEngine<StubBackend> {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
        let mut engine = SolveEngine::new(backend, config).unwrap();
        engine.initialize().unwrap();
        engine
    }

    fn load(engine: &mut SolveEngine<StubBackend>, cycle: u32) {
        engine.load_new_model("1921_10_c1", CycleId::new(cycle)).unwrap();
        engine.set_variables(variables()).unwrap();
        engine.set_constraints(constraints()).unwrap();
        engine
            .set_weights(Weights::new().with_primary("x", 2.0))
            .unwrap();
    }

    fn solved(values: &[f64]) -> Result<StubResponse, crate::backend::BackendError> {
        Ok(StubResponse::optimal(values.to_vec()))
    }

    #[test]
    fn solve_reports_decision_and_slack_values() {
        let mut engine = engine(
            StubBackend::scripted(vec![solved(&[4.0, 2.0, 1.0, 0.0, 0.5])]),
            SolverConfig::new(),
        );
        load(&mut engine, 1);

        let result = engine.solve().unwrap();
        assert!(result.is_success());
        assert_eq!(result.result_code, 1);
        assert_eq!(result.strategy, Some(Strategy::Standard));
        assert_eq!(result.variable_values.len(), 4);
        assert_eq!(result.slack_values["surplus_cap"], 0.5);
        assert_eq!(engine.variable_value("x"), 4.0);
        assert_eq!(engine.variable_value("surplus_cap"), 0.5);
        assert!(engine.variable_value("missing").is_nan());
        assert_eq!(engine.model_status(), Some(SolverStatus::Optimal));
        assert_eq!(engine.solver_name(), "stub");
        assert!(!engine.supports_sensitivity_analysis());
        assert_eq!(engine.stats().problems_solved, 1);
        assert!(!result.notes.is_empty());
    }

    #[test]
    fn weights_override_objective() {
        let mut engine = engine(
            StubBackend::scripted(vec![solved(&[0.0; 5])]),
            SolverConfig::new(),
        );
        load(&mut engine, 1);
        engine.solve().unwrap();
        assert_eq!(engine.backend().model().columns[0].objective, 2.0);
    }

    #[test]
    fn calls_require_a_loaded_model() {
        let mut engine = engine(StubBackend::always(SolverStatus::Optimal), SolverConfig::new());
        assert_eq!(engine.set_variables(variables()).unwrap_err().code(), "ENGINE_NO_MODEL");
        assert_eq!(engine.solve().unwrap_err().code(), "ENGINE_NO_MODEL");
        assert!(engine.objective_value().is_nan());
        assert!(engine.model_status().is_none());
    }

    #[test]
    fn busy_engine_rejects_solve() {
        let mut engine = engine(StubBackend::always(SolverStatus::Optimal), SolverConfig::new());
        load(&mut engine, 1);
        let flag = engine.busy_flag();
        flag.store(true, Ordering::Release);
        assert_eq!(engine.solve().unwrap_err().code(), "ENGINE_IN_USE");
        flag.store(false, Ordering::Release);
        assert!(engine.solve().is_ok());
        assert!(!flag.load(Ordering::Acquire));
    }

    #[test]
    fn construction_error_is_noted() {
        let mut engine = engine(StubBackend::always(SolverStatus::Optimal), SolverConfig::new());
        load(&mut engine, 1);
        let mut duplicated = variables();
        duplicated.push(Variable::continuous("x", Bounds::new(0.0, 1.0)));
        engine.set_variables(duplicated).unwrap();

        let err = engine.solve().unwrap_err();
        assert_eq!(err.code(), "VARIABLE_DUPLICATE_NAME");
        assert!(
            engine
                .diagnostics()
                .notes()
                .lines()
                .iter()
                .any(|note| note.contains("Error! [VARIABLE_DUPLICATE_NAME]"))
        );
        assert!(engine.backend().solves.is_empty());
    }

    #[test]
    fn disposed_engine_rejects_calls() {
        let mut engine = engine(StubBackend::always(SolverStatus::Optimal), SolverConfig::new());
        engine.dispose().unwrap();
        assert!(engine.dispose().is_ok());
        let err = engine.load_new_model("late", CycleId::new(1)).unwrap_err();
        assert_eq!(err.code(), "ENGINE_DISPOSED");
        assert_eq!(engine.solve().unwrap_err().code(), "ENGINE_DISPOSED");
    }

    #[test]
    fn failed_cascade_runs_analysis() {
        let mut engine = engine(StubBackend::always(SolverStatus::Infeasible), SolverConfig::new());
        load(&mut engine, 1);

        let result = engine.solve().unwrap();
        assert_eq!(result.status, SolverStatus::Infeasible);
        assert_eq!(result.result_code, 3);
        assert_eq!(result.attempts.len(), 3);
        assert!(result.infeasibility.is_some());
        assert_eq!(result.ensure_success().unwrap_err().code(), "SOLVER_INFEASIBLE");
        assert_eq!(engine.stats().failures, 1);
        assert_eq!(engine.stats().analyses, 1);
    }

    #[test]
    fn analysis_can_be_disabled() {
        let config = SolverConfig::new().with_analyze_infeasibility(false);
        let mut engine = engine(StubBackend::always(SolverStatus::Infeasible), config);
        load(&mut engine, 1);
        let result = engine.solve().unwrap();
        assert!(result.infeasibility.is_none());
        assert_eq!(engine.stats().analyses, 0);
    }

    #[test]
    fn surviving_violation_is_numerical_failure() {
        let bad = [1.0, 2.5, 0.0, 0.0, 0.0];
        let mut engine = engine(
            StubBackend::with_responder(move |_, _| Ok(StubResponse::optimal(bad.to_vec()))),
            SolverConfig::new().with_analyze_infeasibility(false),
        );
        load(&mut engine, 1);
        let result = engine.solve().unwrap();
        assert_eq!(result.status, SolverStatus::NumericalDifficulty);
        assert_eq!(result.message, "Solution rejected by violation checks.");
        assert!(result.objective.is_none());
    }

    #[test]
    fn warm_start_snapshot_seeds_next_solve() {
        let config = SolverConfig::new().with_warm_start(WarmStartSchedule::for_cycles([CycleId::new(1)]));
        let mut engine = engine(
            StubBackend::scripted(vec![
                solved(&[4.0, 2.0, 1.0, 3.0, 0.0]),
                solved(&[4.0, 2.0, 1.0, 3.0, 0.0]),
            ]),
            config,
        );

        load(&mut engine, 1);
        let first = engine.solve().unwrap();
        assert_eq!(first.attempts[0].tag, "2");
        assert!(engine.warm_start_store().load(CycleId::new(1)).is_some());

        load(&mut engine, 1);
        let second = engine.solve().unwrap();
        assert_eq!(second.attempts[0].tag, "whs");
        assert_eq!(engine.backend().model().start, Some(vec![0.0, 2.0, 1.0, 3.0, 0.0]));
    }

    #[test]
    fn ineligible_cycle_skips_snapshot() {
        let config = SolverConfig::new().with_warm_start(WarmStartSchedule::for_cycles([CycleId::new(2)]));
        let mut engine = engine(
            StubBackend::scripted(vec![solved(&[4.0, 2.0, 1.0, 3.0, 0.0])]),
            config,
        );
        load(&mut engine, 1);
        engine.solve().unwrap();
        assert!(engine.warm_start_store().load(CycleId::new(2)).is_none());
    }

    #[test]
    fn analysis_report_is_written_as_json() {
        let dir = std::env::temp_dir().join(format!("wrsolve-engine-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let output = dir.join("iis.json");

        let mut engine = engine(StubBackend::always(SolverStatus::Infeasible), SolverConfig::new());
        load(&mut engine, 1);
        let result = engine.solve_with_infeasibility_analysis(&output).unwrap();
        assert!(!result.is_success());

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert!(json["confirmed"].as_array().unwrap().is_empty());
        assert_eq!(json["passes"], 1);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_cycle_accepts_full_definition() {
        let mut engine = engine(
            StubBackend::scripted(vec![solved(&[1.0, 1.0, 1.0, 1.0, 0.0])]),
            SolverConfig::new(),
        );
        engine
            .load_cycle(CycleDefinition {
                name: "cycle".to_string(),
                cycle: CycleId::new(3),
                variables: variables(),
                constraints: constraints(),
                weights: Weights::default(),
            })
            .unwrap();
        let result = engine.solve().unwrap();
        assert_eq!(result.cycle, CycleId::new(3));
        assert_eq!(engine.objective_value(), 0.0);
        engine.close();
        assert_eq!(engine.solve().unwrap_err().code(), "ENGINE_NO_MODEL");
    }
}
