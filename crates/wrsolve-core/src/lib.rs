//! Cycle model construction for wrsolve.
//!
//! Evaluator output ([`Variable`], [`Constraint`], [`Weights`]) is translated
//! into a [`ModelInstance`] for each solve attempt. Post-solve checks and
//! warm-start snapshots also live here because they only need the instance.

pub mod ids;
pub mod index_map;
pub mod model;
pub mod types;
pub mod violation;
pub mod warm_start;

pub use ids::CycleId;
pub use index_map::IndexMap;
pub use model::{
    BuildOptions, Column, ColumnKind, ElasticDirection, ElasticSpec, ModelBuilder, ModelError,
    ModelInstance, Row, format_bounds, format_number,
};
pub use types::{
    Bounds, Constraint, CycleDefinition, MAX_VALUE, Sense, Sign, Variable, Weights,
};
pub use violation::{Violation, ViolationKind, ViolationPolicy, ViolationReport};
pub use warm_start::{MIN_OVERLAP, WarmStartSchedule, WarmStartSnapshot, WarmStartStore};
