//! Elastic-relaxation infeasibility analysis.
//!
//! Each pass solves an elastic instance in which every row not yet enforced
//! may relax at a penalty. Rows that relax are the candidates of the pass.
//! A candidate is confirmed when the model without the candidates solves,
//! and putting the candidate back (alone among them) makes it infeasible
//! again. All candidates are enforced for the next pass, so every pass
//! reaches a different part of the conflict set.

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use serde::Serialize;
use wrsolve_core::{ElasticSpec, ModelBuilder, ModelInstance};

use crate::backend::{Backend, SearchMode, SolveParams, run_instance};
use crate::config::SolverConfig;
use crate::error::SolverError;

const ELASTIC_TOLERANCE: f64 = 1e-9;

/// A constraint implicated in the conflict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub constraint: String,
    /// The row as written, e.g. `total: x + y = 10`.
    pub expression: String,
    /// Declared bounds of the variables in the row.
    pub bounds: Vec<String>,
    /// Pass in which the row first relaxed.
    pub pass: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InfeasibilityReport {
    /// Rows proven to take part in the conflict.
    pub confirmed: Vec<Finding>,
    /// Rows that relaxed but could not be confirmed.
    pub possible: Vec<Finding>,
    pub passes: usize,
    /// `false` when the time budget ran out first.
    pub complete: bool,
    pub elapsed_ms: f64,
    pub notes: Vec<String>,
}

impl InfeasibilityReport {
    pub fn confirmed_names(&self) -> Vec<&str> {
        self.confirmed
            .iter()
            .map(|finding| finding.constraint.as_str())
            .collect()
    }

    pub fn possible_names(&self) -> Vec<&str> {
        self.possible
            .iter()
            .map(|finding| finding.constraint.as_str())
            .collect()
    }

    /// Lines for the note log.
    pub fn note_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for finding in &self.confirmed {
            lines.push(format!("IIS confirmed: {}", finding.expression));
            lines.extend(finding.bounds.iter().map(|b| format!("    {b}")));
        }
        for finding in &self.possible {
            lines.push(format!("IIS possible: {}", finding.expression));
        }
        lines.extend(self.notes.iter().cloned());
        lines
    }
}

/// Runs the elastic passes for one infeasible cycle.
#[derive(Debug, Clone)]
pub struct InfeasibilityAnalyzer<'a> {
    builder: ModelBuilder<'a>,
    penalty: f64,
    priority: Option<BTreeSet<String>>,
    budget: Duration,
    params: SolveParams,
}

impl<'a> InfeasibilityAnalyzer<'a> {
    pub fn new(builder: ModelBuilder<'a>, config: &SolverConfig) -> Self {
        let mut params = SolveParams::new(SearchMode::Full, 1e-9, 1e-9);
        params.threads = config.threads;
        params.log_to_console = config.log_to_console();
        Self {
            builder,
            penalty: config.iis_penalty(),
            priority: config
                .iis_priority()
                .map(|names| names.iter().cloned().collect()),
            budget: config.iis_time_budget(),
            params,
        }
    }

    /// Only let these rows relax until they are exhausted.
    pub fn with_priority<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        self.priority = (!names.is_empty()).then_some(names);
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Search for the conflict set.
    ///
    /// # Errors
    ///
    /// Returns model construction errors and backend faults.
    pub fn run<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
    ) -> Result<InfeasibilityReport, SolverError> {
        let started = Instant::now();
        let original = self.builder.build()?;
        let mut report = InfeasibilityReport::default();
        let mut enforced: BTreeSet<String> = BTreeSet::new();
        let mut priority = self.priority.clone();
        let mut relaxed_in: BTreeMap<String, usize> = BTreeMap::new();
        let mut confirmed: Vec<(String, usize)> = Vec::new();

        report.complete = loop {
            if started.elapsed() >= self.budget {
                report.notes.push(format!(
                    "IIS search stopped after {} passes: time budget of {:?} exhausted",
                    report.passes, self.budget
                ));
                break false;
            }
            report.passes += 1;
            let pass = report.passes;

            let mut spec = ElasticSpec::new(self.penalty).with_enforced(enforced.iter().cloned());
            if let Some(names) = &priority {
                spec = spec.with_priority(names.iter().cloned());
            }
            let elastic = self.builder.build_elastic(&spec)?;
            let outcome = run_instance(backend, &elastic, &self.params, None)?;
            let solved = outcome.status.is_success();
            let candidates = match (&outcome.values, solved) {
                (Some(values), true) => elastic.relaxed_rows(values, ELASTIC_TOLERANCE)?,
                _ => Vec::new(),
            };
            tracing::debug!(
                component = "iis",
                operation = "pass",
                status = outcome.status.status.as_str(),
                pass,
                enforced = enforced.len(),
                priority = priority.is_some(),
                candidates = candidates.len(),
                "Elastic pass finished"
            );

            if candidates.is_empty() {
                if priority.take().is_some() {
                    report
                        .notes
                        .push(format!("Pass {pass}: priority rows exhausted, relaxing all rows"));
                    continue;
                }
                if !solved && enforced.is_empty() {
                    report.notes.push(
                        "Elastic model is infeasible: the conflict lies in variable bounds"
                            .to_string(),
                    );
                }
                break true;
            }

            for name in &candidates {
                relaxed_in.entry(name.clone()).or_insert(pass);
            }

            let confirmation = self.confirm(backend, &candidates, started)?;
            confirmed.extend(confirmation.found.into_iter().map(|name| (name, pass)));
            if confirmation.timed_out {
                report.notes.push(format!(
                    "IIS search stopped in pass {pass}: time budget of {:?} exhausted",
                    self.budget
                ));
                break false;
            }

            enforced.extend(candidates);
            if let Some(names) = &mut priority {
                names.retain(|name| !enforced.contains(name));
                if names.is_empty() {
                    priority = None;
                    report
                        .notes
                        .push(format!("Pass {pass}: priority rows exhausted, relaxing all rows"));
                }
            }
        };

        let confirmed_names: BTreeSet<&str> = confirmed.iter().map(|(name, _)| name.as_str()).collect();
        report.possible = relaxed_in
            .iter()
            .filter(|(name, _)| !confirmed_names.contains(name.as_str()))
            .filter_map(|(name, pass)| finding(&original, name, *pass))
            .collect();
        report.possible.sort_by_key(|finding| finding.pass);
        report.confirmed = confirmed
            .iter()
            .filter_map(|(name, pass)| finding(&original, name, *pass))
            .collect();
        report.elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        tracing::info!(
            component = "iis",
            operation = "analyze",
            status = if report.complete { "success" } else { "partial" },
            passes = report.passes,
            confirmed = report.confirmed.len(),
            possible = report.possible.len(),
            duration_ms = report.elapsed_ms,
            "Infeasibility analysis finished"
        );
        Ok(report)
    }

    /// Confirmed names among `candidates`. A run out of budget keeps what
    /// it confirmed before the deadline.
    fn confirm<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        candidates: &[String],
        started: Instant,
    ) -> Result<Confirmation, SolverError> {
        let mut confirmation = Confirmation::default();
        if !self.is_feasible(backend, candidates)? {
            return Ok(confirmation);
        }
        if let [single] = candidates {
            confirmation.found.push(single.clone());
            return Ok(confirmation);
        }

        for candidate in candidates {
            if started.elapsed() >= self.budget {
                confirmation.timed_out = true;
                break;
            }
            let others = candidates.iter().filter(|name| *name != candidate);
            if !self.is_feasible(backend, others)? {
                confirmation.found.push(candidate.clone());
            }
        }
        Ok(confirmation)
    }

    /// Whether the original model without `skipped` has a solution.
    fn is_feasible<B, I, S>(&self, backend: &mut B, skipped: I) -> Result<bool, SolverError>
    where
        B: Backend + ?Sized,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let instance = self.builder.clone().skip_constraints(skipped).build()?;
        let outcome = run_instance(backend, &instance, &self.params, None)?;
        Ok(outcome.status.status.has_solution())
    }
}

#[derive(Debug, Default)]
struct Confirmation {
    found: Vec<String>,
    timed_out: bool,
}

fn finding(instance: &ModelInstance, name: &str, pass: usize) -> Option<Finding> {
    let row = instance.row_index(name)?;
    Some(Finding {
        constraint: name.to_string(),
        expression: instance.describe_row(row)?,
        bounds: instance.describe_row_bounds(row),
        pass,
    })
}
