use super::support::{bounded, two_reservoir_cycle};
use super::*;
use crate::types::{Constraint, MAX_VALUE};

#[test]
fn test_elastic_build_adds_priced_pair_per_row() {
    let (variables, constraints) = two_reservoir_cycle();
    let instance = ModelBuilder::new(&variables, &constraints)
        .build_elastic(&ElasticSpec::new(9000.0))
        .unwrap();

    assert_eq!(instance.sense(), Sense::Minimize);
    let elastic: Vec<_> = instance.elastic_columns().collect();
    assert_eq!(elastic.len(), 4);

    let demand_p = instance.index_map().index_of("demand_p").unwrap();
    let demand_n = instance.index_map().index_of("demand_n").unwrap();
    for col in [demand_p, demand_n] {
        let column = instance.column(col).unwrap();
        assert_eq!(column.objective, 9000.0);
        assert_eq!(column.bounds, Bounds::new(0.0, MAX_VALUE));
    }

    let row = &instance.rows()[0];
    let entries: Vec<(usize, f64)> = row.entries().collect();
    assert!(entries.contains(&(demand_p, 1.0)));
    assert!(entries.contains(&(demand_n, -1.0)));
}

#[test]
fn test_elastic_build_zeroes_decision_objective() {
    let (variables, constraints) = two_reservoir_cycle();
    let instance = ModelBuilder::new(&variables, &constraints)
        .build_elastic(&ElasticSpec::default())
        .unwrap();
    assert!(
        instance
            .columns()
            .iter()
            .filter(|column| !matches!(column.kind, ColumnKind::Elastic { .. }))
            .all(|column| column.objective == 0.0)
    );
}

#[test]
fn test_enforced_row_keeps_columns_without_entries() {
    let (variables, constraints) = two_reservoir_cycle();
    let relaxed = ModelBuilder::new(&variables, &constraints)
        .build_elastic(&ElasticSpec::default())
        .unwrap();
    let enforced = ModelBuilder::new(&variables, &constraints)
        .build_elastic(&ElasticSpec::default().with_enforced(["demand"]))
        .unwrap();

    assert_eq!(relaxed.index_map().names(), enforced.index_map().names());
    let demand = &enforced.rows()[0];
    assert_eq!(demand.len(), 3);
    assert_eq!(enforced.rows()[1].len(), relaxed.rows()[1].len());
}

#[test]
fn test_priority_subset_limits_relaxation() {
    let (variables, constraints) = two_reservoir_cycle();
    let spec = ElasticSpec::default().with_priority(["pump_cap"]);
    assert!(spec.is_relaxable("pump_cap"));
    assert!(!spec.is_relaxable("demand"));

    let instance = ModelBuilder::new(&variables, &constraints)
        .build_elastic(&spec)
        .unwrap();
    assert_eq!(instance.rows()[0].len(), 3);
    assert_eq!(instance.rows()[1].len(), 4);
}

#[test]
fn test_enforced_wins_over_priority() {
    let spec = ElasticSpec::default()
        .with_priority(["a", "b"])
        .with_enforced(["a"]);
    assert!(!spec.is_relaxable("a"));
    assert!(spec.is_relaxable("b"));
    assert!(!spec.is_relaxable("c"));
}

#[test]
fn test_relaxed_rows_reports_positive_elastic_values() {
    let variables = vec![bounded("x", 0.0, 5.0), bounded("y", 0.0, 3.0)];
    let constraints = vec![
        Constraint::new("total", Sign::Equal, -10.0)
            .term("x", 1.0)
            .term("y", 1.0),
        Constraint::new("cap", Sign::LessEqual, -4.0).term("y", 1.0),
    ];
    let instance = ModelBuilder::new(&variables, &constraints)
        .build_elastic(&ElasticSpec::default())
        .unwrap();

    let mut values = vec![0.0; instance.num_columns()];
    values[0] = 5.0;
    values[1] = 3.0;
    let total_p = instance.index_map().index_of("total_p").unwrap();
    values[total_p] = 2.0;
    let cap_n = instance.index_map().index_of("cap_n").unwrap();
    values[cap_n] = 1e-13;

    let relaxed = instance.relaxed_rows(&values, 1e-11).unwrap();
    assert_eq!(relaxed, vec!["total".to_string()]);
}

#[test]
fn test_invalid_penalty_is_rejected() {
    let (variables, constraints) = two_reservoir_cycle();
    let err = ModelBuilder::new(&variables, &constraints)
        .build_elastic(&ElasticSpec::new(-1.0))
        .unwrap_err();
    assert_eq!(err.code(), "ELASTIC_INVALID_PENALTY");
}

#[test]
fn test_describe_row_skips_elastic_columns() {
    let variables = vec![bounded("x", 0.0, 5.0), bounded("y", 0.0, 3.0)];
    let constraints = vec![
        Constraint::new("total", Sign::Equal, -10.0)
            .term("x", 1.0)
            .term("y", 1.0),
    ];
    let instance = ModelBuilder::new(&variables, &constraints)
        .build_elastic(&ElasticSpec::default())
        .unwrap();
    assert_eq!(
        instance.describe_row(0).as_deref(),
        Some("total: x + y = 10")
    );
}
