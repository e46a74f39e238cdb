use std::collections::HashSet;

use watchpost_types::{Check, Environment, SchedulingDecision, SchedulingStrategy};

/// SCHEDULE if `execution_env` is in the allowed set, else DONT_SCHEDULE.
pub struct MustRunInGivenExecutionEnvironment {
    allowed: HashSet<String>,
}

impl MustRunInGivenExecutionEnvironment {
    pub fn new(allowed: impl IntoIterator<Item = String>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }
}

impl SchedulingStrategy for MustRunInGivenExecutionEnvironment {
    fn decide(&self, _check: &Check, execution_env: &str, _target_env: &Environment) -> SchedulingDecision {
        if self.allowed.contains(execution_env) {
            SchedulingDecision::Schedule
        } else {
            SchedulingDecision::DontSchedule
        }
    }

    fn name(&self) -> &str {
        "MustRunInGivenExecutionEnvironment"
    }

    fn execution_env_constraint(&self) -> Option<&HashSet<String>> {
        Some(&self.allowed)
    }
}

/// SCHEDULE if `target_env` is in the allowed set, else DONT_SCHEDULE.
pub struct MustRunAgainstGivenTargetEnvironment {
    allowed: HashSet<String>,
}

impl MustRunAgainstGivenTargetEnvironment {
    pub fn new(allowed: impl IntoIterator<Item = String>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }
}

impl SchedulingStrategy for MustRunAgainstGivenTargetEnvironment {
    fn decide(&self, _check: &Check, _execution_env: &str, target_env: &Environment) -> SchedulingDecision {
        if self.allowed.contains(target_env.name()) {
            SchedulingDecision::Schedule
        } else {
            SchedulingDecision::DontSchedule
        }
    }

    fn name(&self) -> &str {
        "MustRunAgainstGivenTargetEnvironment"
    }
}

/// SCHEDULE only when the engine's execution environment is the same as the
/// target environment being evaluated (a check observing "its own" env).
pub struct MustRunInTargetEnvironment;

impl SchedulingStrategy for MustRunInTargetEnvironment {
    fn decide(&self, _check: &Check, execution_env: &str, target_env: &Environment) -> SchedulingDecision {
        if execution_env == target_env.name() {
            SchedulingDecision::Schedule
        } else {
            SchedulingDecision::DontSchedule
        }
    }

    fn name(&self) -> &str {
        "MustRunInTargetEnvironment"
    }
}

/// Never emits SCHEDULE/SKIP/DONT_SCHEDULE at runtime — it exists purely so a
/// check declaration can opt into registration-time conflict analysis (see
/// [`crate::detect_conflicts`]) without otherwise influencing scheduling.
pub struct DetectImpossibleCombination;

impl SchedulingStrategy for DetectImpossibleCombination {
    fn decide(&self, _check: &Check, _execution_env: &str, _target_env: &Environment) -> SchedulingDecision {
        SchedulingDecision::Schedule
    }

    fn name(&self) -> &str {
        "DetectImpossibleCombination"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use watchpost_types::{CacheFor, CheckOutcome, CheckResult, Dispatch, HostnameStrategy};

    fn dummy_check() -> Check {
        Check {
            id: "m.check".to_string(),
            service_name: "svc".to_string(),
            service_labels: Default::default(),
            target_environments: vec![Environment::new("prod")],
            cache_for: CacheFor::None,
            hostname_strategy: HostnameStrategy::Unset,
            error_handlers: vec![],
            signature_plan: vec![],
            dispatch: Dispatch::Sync,
            function: Arc::new(|_| Ok(CheckOutcome::Single(CheckResult::ok("fine")))),
        }
    }

    #[test]
    fn must_run_in_given_execution_environment_rejects_outside_set() {
        let strategy = MustRunInGivenExecutionEnvironment::new(["prod".to_string()]);
        let check = dummy_check();
        let env = Environment::new("prod");
        assert_eq!(strategy.decide(&check, "prod", &env), SchedulingDecision::Schedule);
        assert_eq!(strategy.decide(&check, "staging", &env), SchedulingDecision::DontSchedule);
    }

    #[test]
    fn must_run_against_given_target_environment_checks_target_name() {
        let strategy = MustRunAgainstGivenTargetEnvironment::new(["prod".to_string()]);
        let check = dummy_check();
        let prod = Environment::new("prod");
        let staging = Environment::new("staging");
        assert_eq!(strategy.decide(&check, "any", &prod), SchedulingDecision::Schedule);
        assert_eq!(strategy.decide(&check, "any", &staging), SchedulingDecision::DontSchedule);
    }

    #[test]
    fn detect_impossible_combination_never_schedules_anything_but_schedule() {
        let strategy = DetectImpossibleCombination;
        let check = dummy_check();
        let env = Environment::new("prod");
        assert_eq!(strategy.decide(&check, "prod", &env), SchedulingDecision::Schedule);
    }
}
