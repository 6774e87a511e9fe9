use wrsolve_highs::{HighsModel, HighsStatus, ObjectiveSense};

#[test]
fn test_minimize_simple() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    // minimize x subject to x >= 1
    let mut model = HighsModel::new();
    let x = model.add_col(1.0, f64::INFINITY, 1.0);
    model.set_objective_sense(ObjectiveSense::Minimize);

    assert_eq!(model.columns(), 1);
    model
        .set_primal_start(vec![2.0])
        .expect("failed to set primal start");

    let status = model.solve();
    assert_eq!(status, HighsStatus::Optimal);
    assert_eq!(model.columns(), 0);

    let obj_value = model.objective_value().expect("missing objective value");
    let snapshot = model.solution_snapshot().expect("missing solution");
    assert!(
        (obj_value - 1.0).abs() < 1e-6,
        "Expected objective value ~1.0, got {}",
        obj_value
    );
    assert!((snapshot.col_values()[x] - 1.0).abs() < 1e-6);
}

#[test]
fn test_sentinel_bounds_are_infinite() {
    let mut model = HighsModel::new();
    let x = model.add_col(-1e28, 1e28, 1.0);
    model
        .add_row(3.0, 1e28, &[x], &[1.0])
        .expect("failed to add row");
    model.set_objective_sense(ObjectiveSense::Minimize);

    assert_eq!(model.solve(), HighsStatus::Optimal);
    let snapshot = model.solution_snapshot().expect("missing solution");
    assert!((snapshot.col_values()[x] - 3.0).abs() < 1e-6);
}

#[test]
fn test_reset_allows_rebuild() {
    let mut model = HighsModel::new();
    let x = model.add_integer_col(0.0, 10.0, 1.0);
    model
        .add_row(f64::NEG_INFINITY, 1.5, &[x], &[1.0])
        .expect("failed to add row");
    model.set_objective_sense(ObjectiveSense::Maximize);
    assert_eq!(model.solve(), HighsStatus::Optimal);

    model.reset();
    let y = model.add_col(0.0, 2.0, 1.0);
    model.set_objective_sense(ObjectiveSense::Maximize);
    assert_eq!(model.solve(), HighsStatus::Optimal);
    let snapshot = model.solution_snapshot().expect("missing solution");
    assert!((snapshot.col_values()[y] - 2.0).abs() < 1e-6);
}

#[test]
fn test_primal_start_length_mismatch() {
    let mut model = HighsModel::new();
    model.add_col(0.0, 1.0, 1.0);

    let err = model.set_primal_start(vec![0.0, 1.0]).unwrap_err();
    assert_eq!(err.code(), "HIGHS_START_LENGTH_MISMATCH");
}
