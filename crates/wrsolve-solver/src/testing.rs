//! In-memory backend for unit tests.

use std::collections::VecDeque;

use wrsolve_core::Sense;

use crate::backend::{Backend, BackendError, SolveParams};
use crate::status::{SolverStatus, StatusPair};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StubColumn {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    pub objective: f64,
    pub is_integer: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StubRow {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    pub columns: Vec<usize>,
    pub coefficients: Vec<f64>,
}

/// Whatever was loaded since the last reset.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct StubModel {
    pub sense: Option<Sense>,
    pub columns: Vec<StubColumn>,
    pub rows: Vec<StubRow>,
    pub start: Option<Vec<f64>>,
}

impl StubModel {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    pub fn has_row(&self, name: &str) -> bool {
        self.rows.iter().any(|row| row.name == name)
    }

    pub fn is_elastic(&self) -> bool {
        self.sense == Some(Sense::Minimize)
    }

    /// Whether the row's positive elastic column enters it.
    pub fn is_relaxable(&self, name: &str) -> bool {
        let Some(col) = self.column_index(&format!("{name}_p")) else {
            return false;
        };
        self.rows
            .iter()
            .filter(|row| row.name == name)
            .any(|row| row.columns.contains(&col))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StubResponse {
    pub status: SolverStatus,
    /// `None` fills zeros for every column.
    pub values: Option<Vec<f64>>,
    pub objective: f64,
}

impl StubResponse {
    pub fn status(status: SolverStatus) -> Self {
        Self {
            status,
            values: None,
            objective: 0.0,
        }
    }

    pub fn optimal(values: Vec<f64>) -> Self {
        Self {
            status: SolverStatus::Optimal,
            values: Some(values),
            objective: 0.0,
        }
    }
}

type Responder = Box<dyn FnMut(&StubModel, &SolveParams) -> Result<StubResponse, BackendError>>;

pub(crate) struct StubBackend {
    model: StubModel,
    responder: Responder,
    last: Option<(SolverStatus, Vec<f64>, f64)>,
    pub resets: usize,
    pub solves: Vec<SolveParams>,
}

impl StubBackend {
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: FnMut(&StubModel, &SolveParams) -> Result<StubResponse, BackendError> + 'static,
    {
        Self {
            model: StubModel::default(),
            responder: Box::new(responder),
            last: None,
            resets: 0,
            solves: Vec::new(),
        }
    }

    pub fn always(status: SolverStatus) -> Self {
        Self::with_responder(move |_, _| Ok(StubResponse::status(status)))
    }

    /// Responses in call order; once exhausted every solve reports `Error`.
    pub fn scripted(responses: Vec<Result<StubResponse, BackendError>>) -> Self {
        let mut queue: VecDeque<_> = responses.into();
        Self::with_responder(move |_, _| {
            queue
                .pop_front()
                .unwrap_or_else(|| Ok(StubResponse::status(SolverStatus::Error)))
        })
    }

    pub fn model(&self) -> &StubModel {
        &self.model
    }
}

impl Backend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn version(&self) -> String {
        "0.0.0".to_string()
    }

    fn reset(&mut self) -> Result<(), BackendError> {
        self.model = StubModel::default();
        self.last = None;
        self.resets += 1;
        Ok(())
    }

    fn set_objective_sense(&mut self, sense: Sense) -> Result<(), BackendError> {
        self.model.sense = Some(sense);
        Ok(())
    }

    fn add_column(
        &mut self,
        name: &str,
        lower: f64,
        upper: f64,
        objective: f64,
        is_integer: bool,
    ) -> Result<usize, BackendError> {
        self.model.columns.push(StubColumn {
            name: name.to_string(),
            lower,
            upper,
            objective,
            is_integer,
        });
        Ok(self.model.columns.len() - 1)
    }

    fn add_row(
        &mut self,
        name: &str,
        lower: f64,
        upper: f64,
        columns: &[usize],
        coefficients: &[f64],
    ) -> Result<usize, BackendError> {
        self.model.rows.push(StubRow {
            name: name.to_string(),
            lower,
            upper,
            columns: columns.to_vec(),
            coefficients: coefficients.to_vec(),
        });
        Ok(self.model.rows.len() - 1)
    }

    fn set_start(&mut self, values: &[f64]) -> Result<(), BackendError> {
        self.model.start = Some(values.to_vec());
        Ok(())
    }

    fn solve(&mut self, params: &SolveParams) -> Result<StatusPair, BackendError> {
        self.solves.push(params.clone());
        let response = (self.responder)(&self.model, params)?;
        let values = response
            .values
            .unwrap_or_else(|| vec![0.0; self.model.columns.len()]);
        self.last = Some((response.status, values, response.objective));
        Ok(StatusPair::of(response.status))
    }

    fn column_values(&self) -> Result<Vec<f64>, BackendError> {
        self.last
            .as_ref()
            .map(|(_, values, _)| values.clone())
            .ok_or_else(|| BackendError::new("stub", "STUB_NO_SOLUTION", "nothing solved"))
    }

    fn objective_value(&self) -> Option<f64> {
        self.last.as_ref().map(|(_, _, objective)| *objective)
    }
}
