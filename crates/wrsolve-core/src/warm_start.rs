//! Integer solutions carried between time steps to seed warm-started solves.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ids::CycleId;
use crate::model::ModelInstance;

/// A snapshot is only used when it shares more than this many integer
/// columns with the current instance.
pub const MIN_OVERLAP: usize = 2;

/// Which cycles save and which cycles use warm-start snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarmStartSchedule {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub save_cycles: BTreeSet<CycleId>,
    #[serde(default)]
    pub use_cycles: BTreeSet<CycleId>,
}

impl WarmStartSchedule {
    /// Save and use on every listed cycle.
    pub fn for_cycles<I>(cycles: I) -> Self
    where
        I: IntoIterator<Item = CycleId>,
    {
        let cycles: BTreeSet<CycleId> = cycles.into_iter().collect();
        Self {
            enabled: true,
            save_cycles: cycles.clone(),
            use_cycles: cycles,
        }
    }

    pub fn is_save_eligible(&self, cycle: CycleId) -> bool {
        self.enabled && self.save_cycles.contains(&cycle)
    }

    pub fn is_use_eligible(&self, cycle: CycleId) -> bool {
        self.enabled && self.use_cycles.contains(&cycle)
    }
}

/// Integer column values from the last accepted solve of a cycle.
pub type WarmStartSnapshot = BTreeMap<String, f64>;

/// Per-cycle snapshot storage gated by a [`WarmStartSchedule`].
#[derive(Debug, Clone, Default)]
pub struct WarmStartStore {
    schedule: WarmStartSchedule,
    snapshots: BTreeMap<CycleId, WarmStartSnapshot>,
}

impl WarmStartStore {
    pub fn new(schedule: WarmStartSchedule) -> Self {
        Self {
            schedule,
            snapshots: BTreeMap::new(),
        }
    }

    pub fn schedule(&self) -> &WarmStartSchedule {
        &self.schedule
    }

    /// Replace the snapshot for `cycle` if the schedule allows saving.
    ///
    /// Returns whether the snapshot was stored.
    pub fn save(&mut self, cycle: CycleId, snapshot: WarmStartSnapshot) -> bool {
        if !self.schedule.is_save_eligible(cycle) {
            return false;
        }
        tracing::debug!(
            component = "warm_start",
            operation = "save",
            status = "success",
            cycle = cycle.inner(),
            integers = snapshot.len(),
            "Saved warm-start snapshot"
        );
        self.snapshots.insert(cycle, snapshot);
        true
    }

    /// Save the integer columns of an accepted solution.
    pub fn save_solution(&mut self, cycle: CycleId, instance: &ModelInstance, values: &[f64]) -> bool {
        let snapshot: WarmStartSnapshot = instance
            .integer_columns()
            .filter_map(|(col, column)| values.get(col).map(|value| (column.name.clone(), value.round())))
            .collect();
        self.save(cycle, snapshot)
    }

    /// The snapshot for `cycle`, if the schedule allows using one.
    pub fn load(&self, cycle: CycleId) -> Option<&WarmStartSnapshot> {
        if !self.schedule.is_use_eligible(cycle) {
            return None;
        }
        self.snapshots.get(&cycle)
    }

    /// `(column, value)` hints for the integer columns of `instance`.
    ///
    /// `None` when nothing is stored or the overlap is not above
    /// [`MIN_OVERLAP`].
    pub fn hints(&self, cycle: CycleId, instance: &ModelInstance) -> Option<Vec<(usize, f64)>> {
        let snapshot = self.load(cycle)?;
        let hints: Vec<(usize, f64)> = instance
            .integer_columns()
            .filter_map(|(col, column)| snapshot.get(&column.name).map(|value| (col, *value)))
            .collect();
        if hints.len() <= MIN_OVERLAP {
            tracing::debug!(
                component = "warm_start",
                operation = "hints",
                status = "skipped",
                cycle = cycle.inner(),
                overlap = hints.len(),
                "Warm-start overlap too small"
            );
            return None;
        }
        Some(hints)
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelBuilder;
    use crate::types::{Bounds, Variable};

    fn instance(integers: usize) -> ModelInstance {
        let mut variables = vec![Variable::continuous("flow", Bounds::new(0.0, 10.0))];
        variables.extend((0..integers).map(|i| Variable::binary(format!("on_{i}"))));
        ModelBuilder::new(&variables, &[]).build().unwrap()
    }

    fn snapshot(names: &[&str]) -> WarmStartSnapshot {
        names.iter().map(|name| ((*name).to_string(), 1.0)).collect()
    }

    #[test]
    fn save_respects_schedule() {
        let schedule = WarmStartSchedule {
            enabled: true,
            save_cycles: [CycleId::new(1)].into_iter().collect(),
            use_cycles: BTreeSet::new(),
        };
        let mut store = WarmStartStore::new(schedule);
        assert!(store.save(CycleId::new(1), snapshot(&["a"])));
        assert!(!store.save(CycleId::new(2), snapshot(&["a"])));
        assert!(store.load(CycleId::new(1)).is_none());
    }

    #[test]
    fn disabled_schedule_never_saves() {
        let mut store = WarmStartStore::new(WarmStartSchedule {
            enabled: false,
            ..WarmStartSchedule::for_cycles([CycleId::new(1)])
        });
        assert!(!store.save(CycleId::new(1), snapshot(&["a"])));
    }

    #[test]
    fn save_replaces_whole_snapshot() {
        let cycle = CycleId::new(3);
        let mut store = WarmStartStore::new(WarmStartSchedule::for_cycles([cycle]));
        store.save(cycle, snapshot(&["a", "b"]));
        store.save(cycle, snapshot(&["c"]));
        let loaded = store.load(cycle).unwrap();
        assert_eq!(loaded.keys().collect::<Vec<_>>(), vec!["c"]);
    }

    #[test]
    fn hints_require_overlap_above_minimum() {
        let cycle = CycleId::new(1);
        let mut store = WarmStartStore::new(WarmStartSchedule::for_cycles([cycle]));
        store.save(cycle, snapshot(&["on_0", "on_1"]));
        assert!(store.hints(cycle, &instance(4)).is_none());

        store.save(cycle, snapshot(&["on_0", "on_1", "on_2", "gone"]));
        let hints = store.hints(cycle, &instance(4)).unwrap();
        assert_eq!(hints, vec![(1, 1.0), (2, 1.0), (3, 1.0)]);
    }

    #[test]
    fn save_solution_keeps_rounded_integers_only() {
        let cycle = CycleId::new(1);
        let mut store = WarmStartStore::new(WarmStartSchedule::for_cycles([cycle]));
        let instance = instance(2);
        assert!(store.save_solution(cycle, &instance, &[4.5, 0.9999999, 0.0]));
        let loaded = store.load(cycle).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get("on_0"), Some(&1.0));
        assert!(!loaded.contains_key("flow"));
    }
}
