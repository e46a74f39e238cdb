//! Built-in scheduling strategies, aggregation, and registration-time
//! conflict detection. [`watchpost_types::SchedulingStrategy`] is defined in
//! `watchpost-types` itself (it needs to name [`Check`]); this crate supplies
//! the implementations and the composition/conflict logic around them.

mod strategies;

pub use strategies::{
    DetectImpossibleCombination, MustRunAgainstGivenTargetEnvironment, MustRunInGivenExecutionEnvironment,
    MustRunInTargetEnvironment,
};

use std::sync::Arc;

use watchpost_types::{Check, Environment, SchedulingDecision, SchedulingStrategy, WatchpostError};

/// The maximum decision over every strategy in the check's effective set —
/// "strictest wins." An empty set defaults to [`SchedulingDecision::Schedule`].
pub fn decide(
    strategies: &[Arc<dyn SchedulingStrategy>],
    check: &Check,
    execution_env: &str,
    target_env: &Environment,
) -> SchedulingDecision {
    SchedulingDecision::aggregate(strategies.iter().map(|s| s.decide(check, execution_env, target_env)))
}

/// Union a check's own strategies with those declared on its datasources,
/// its factories, and the engine defaults. Order doesn't matter for
/// aggregation (it's a max), so this is a plain concatenation.
pub fn effective_strategies(
    check_strategies: &[Arc<dyn SchedulingStrategy>],
    datasource_strategies: &[Arc<dyn SchedulingStrategy>],
    factory_strategies: &[Arc<dyn SchedulingStrategy>],
    engine_defaults: &[Arc<dyn SchedulingStrategy>],
) -> Vec<Arc<dyn SchedulingStrategy>> {
    check_strategies
        .iter()
        .chain(datasource_strategies)
        .chain(factory_strategies)
        .chain(engine_defaults)
        .cloned()
        .collect()
}

/// Verify that at least one execution environment could satisfy every
/// `MustRunInGivenExecutionEnvironment` constraint attached to the check —
/// i.e. that their allowed sets intersect. Other strategy kinds don't
/// statically constrain a fixed set of execution environments and are
/// skipped (see [`SchedulingStrategy::execution_env_constraint`]).
pub fn detect_conflicts(check_id: &str, strategies: &[Arc<dyn SchedulingStrategy>]) -> Result<(), WatchpostError> {
    let constrained: Vec<&Arc<dyn SchedulingStrategy>> =
        strategies.iter().filter(|s| s.execution_env_constraint().is_some()).collect();

    if constrained.len() < 2 {
        return Ok(());
    }

    let mut intersection = constrained[0].execution_env_constraint().unwrap().clone();
    for s in &constrained[1..] {
        let set = s.execution_env_constraint().unwrap();
        intersection.retain(|env| set.contains(env));
    }

    if intersection.is_empty() {
        let names: Vec<&str> = constrained.iter().map(|s| s.name()).collect();
        return Err(WatchpostError::invalid_check_configuration(
            check_id,
            format!(
                "no execution environment satisfies every constraint: {}",
                names.join(", ")
            ),
        ));
    }

    Ok(())
}
