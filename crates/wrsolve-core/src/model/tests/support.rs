use crate::types::{Bounds, Constraint, Sign, Variable};

/// Two reservoirs feeding one demand node; `surplus_d` is never declared.
pub(super) fn two_reservoir_cycle() -> (Vec<Variable>, Vec<Constraint>) {
    let variables = vec![
        Variable::continuous("release_a", Bounds::new(0.0, 50.0)).with_weight(1.0),
        Variable::continuous("release_b", Bounds::new(0.0, 30.0)).with_weight(2.0),
        Variable::integer("pump_on", Bounds::new(0.0, 1.0)),
    ];
    let constraints = vec![
        Constraint::new("demand", Sign::Equal, -40.0)
            .term("release_a", 1.0)
            .term("release_b", 1.0)
            .term("surplus_d", -1.0),
        Constraint::new("pump_cap", Sign::LessEqual, 0.0)
            .term("release_b", 1.0)
            .term("pump_on", -30.0),
    ];
    (variables, constraints)
}

pub(super) fn bounded(name: &str, lower: f64, upper: f64) -> Variable {
    Variable::continuous(name, Bounds::new(lower, upper))
}
