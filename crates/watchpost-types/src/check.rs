use std::any::Any;
use std::sync::Arc;

use crate::builder::ResultBuilder;
use crate::environment::Environment;
use crate::result::{CheckResult, ExecutionResult};
use crate::scheduling::SchedulingDecision;

/// One parameter of a registered check's callable signature, bound at
/// registration time. No parameter-name string matching happens at execution
/// time — the plan is walked positionally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamBinding {
    /// Inject the current target [`Environment`].
    Environment,
    /// Inject the registered datasource of `type_name`, constructing and
    /// memoizing it on first use.
    Datasource { type_name: String },
    /// Inject an instance produced by `factory_type`, called with `args`.
    Factory { factory_type: String, args: Vec<String> },
}

/// The registration-time description of what to inject where for one check.
/// Computed once from the check's declared parameters; invalid plans
/// (unknown types, unresolved factories) fail registration rather than
/// failing at call time.
pub type SignaturePlan = Vec<ParamBinding>;

/// Whether a check's body runs on the worker-thread pool or the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Sync,
    Async,
}

/// Where to source the piggyback host for a check's results when the result
/// itself doesn't override it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostnameStrategy {
    /// No check-level override; fall through to environment/engine defaults.
    Unset,
    Static(String),
    /// `{placeholders}` filled from the environment and result at resolve time.
    Template(String),
}

/// How long a result stays cached, or that it is never cached at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheFor {
    Duration(std::time::Duration),
    None,
}

/// Transforms the `ExecutionResult` list produced when a check throws.
/// Built-ins multiply the list; `Custom` handlers may implement anything a
/// closure can express.
#[derive(Clone)]
pub enum ErrorHandler {
    ExpandByHostname(Vec<String>),
    ExpandByNameSuffix(Vec<String>),
    Custom(Arc<dyn Fn(&[ExecutionResult]) -> Vec<ExecutionResult> + Send + Sync>),
}

impl ErrorHandler {
    /// Apply this handler to the current list of results, producing its
    /// (possibly multiplied) replacement. Built-in handlers never shrink the
    /// input; `Custom` handlers may do anything.
    pub fn apply(&self, results: &[ExecutionResult]) -> Vec<ExecutionResult> {
        match self {
            ErrorHandler::ExpandByHostname(hosts) => results
                .iter()
                .flat_map(|r| {
                    hosts.iter().map(move |host| ExecutionResult {
                        piggyback_host: host.clone(),
                        ..r.clone()
                    })
                })
                .collect(),
            ErrorHandler::ExpandByNameSuffix(suffixes) => results
                .iter()
                .flat_map(|r| {
                    suffixes.iter().map(move |suffix| ExecutionResult {
                        service_name: format!("{}{}", r.service_name, suffix),
                        ..r.clone()
                    })
                })
                .collect(),
            ErrorHandler::Custom(f) => f(results),
        }
    }
}

impl std::fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorHandler::ExpandByHostname(hosts) => {
                f.debug_tuple("ExpandByHostname").field(hosts).finish()
            }
            ErrorHandler::ExpandByNameSuffix(suffixes) => {
                f.debug_tuple("ExpandByNameSuffix").field(suffixes).finish()
            }
            ErrorHandler::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// What a check's callable hands back, before engine normalization.
pub enum CheckOutcome {
    Single(CheckResult),
    Many(Vec<CheckResult>),
    Builder(ResultBuilder),
}

impl CheckOutcome {
    /// Drain to the ordered sequence of [`CheckResult`]s the engine applies
    /// post-processing to.
    pub fn into_results(self) -> Vec<CheckResult> {
        match self {
            CheckOutcome::Single(r) => vec![r],
            CheckOutcome::Many(rs) => rs,
            CheckOutcome::Builder(b) => vec![b.finish()],
        }
    }
}

/// Arguments resolved from a [`SignaturePlan`], passed positionally into a
/// check's callable.
pub type ResolvedArgs = Vec<Box<dyn Any + Send>>;

/// A registered check's callable body.
pub type CheckFn = Arc<dyn Fn(ResolvedArgs) -> anyhow::Result<CheckOutcome> + Send + Sync>;

/// A registered check: stable identity, scheduling/caching/injection metadata,
/// and the user callable. Produced once at registration time and immutable
/// thereafter.
#[derive(Clone)]
pub struct Check {
    pub id: String,
    pub service_name: String,
    pub service_labels: std::collections::BTreeMap<String, String>,
    pub target_environments: Vec<Environment>,
    pub cache_for: CacheFor,
    pub hostname_strategy: HostnameStrategy,
    pub error_handlers: Vec<ErrorHandler>,
    pub signature_plan: SignaturePlan,
    pub dispatch: Dispatch,
    pub function: CheckFn,
}

impl std::fmt::Debug for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Check")
            .field("id", &self.id)
            .field("service_name", &self.service_name)
            .field("target_environments", &self.target_environments.len())
            .field("cache_for", &self.cache_for)
            .field("dispatch", &self.dispatch)
            .finish()
    }
}

impl Check {
    /// Key used for dedup and cache lookups: `(check_id, env_name)`.
    pub fn key_for(&self, env_name: &str) -> String {
        format!("{}::{}", self.id, env_name)
    }
}

/// A scheduling rule: maps (check, execution_env, target_env) to a decision.
/// Defined here (rather than in `watchpost-policy`) because [`Check`] is
/// already a `watchpost-types` type and strategies need to reference it;
/// `watchpost-policy` supplies the built-in implementations.
pub trait SchedulingStrategy: Send + Sync {
    fn decide(&self, check: &Check, execution_env: &str, target_env: &Environment) -> SchedulingDecision;

    /// Human-readable name used in conflict diagnostics.
    fn name(&self) -> &str;

    /// For strategies that constrain the check to a fixed set of execution
    /// environments, the set itself — used by registration-time conflict
    /// detection to find an empty intersection across several such
    /// constraints on the same check. Strategies that don't impose such a
    /// constraint (or whose constraint isn't statically knowable) return
    /// `None`.
    fn execution_env_constraint(&self) -> Option<&std::collections::HashSet<String>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::NO_PIGGYBACK;
    use crate::state::CheckState;

    fn sample_result(service_name: &str) -> ExecutionResult {
        ExecutionResult {
            piggyback_host: NO_PIGGYBACK.to_string(),
            service_name: service_name.to_string(),
            service_labels: Default::default(),
            environment_name: "prod".to_string(),
            state: CheckState::Unknown,
            summary: "failed".to_string(),
            details: "boom".to_string(),
            metrics: vec![],
            check_id: "m.check".to_string(),
        }
    }

    #[test]
    fn expand_by_hostname_multiplies_per_host() {
        let handler = ErrorHandler::ExpandByHostname(vec!["h1".into(), "h2".into(), "h3".into()]);
        let expanded = handler.apply(&[sample_result("svc")]);
        assert_eq!(expanded.len(), 3);
        let hosts: Vec<&str> = expanded.iter().map(|r| r.piggyback_host.as_str()).collect();
        assert_eq!(hosts, ["h1", "h2", "h3"]);
    }

    #[test]
    fn expand_by_name_suffix_appends_to_service_name() {
        let handler = ErrorHandler::ExpandByNameSuffix(vec!["-a".into(), "-b".into()]);
        let expanded = handler.apply(&[sample_result("svc")]);
        assert_eq!(expanded.len(), 2);
        let names: Vec<&str> = expanded.iter().map(|r| r.service_name.as_str()).collect();
        assert_eq!(names, ["svc-a", "svc-b"]);
    }

    #[test]
    fn handlers_compose_multiplicatively() {
        let first = ErrorHandler::ExpandByHostname(vec!["h1".into(), "h2".into()]);
        let second = ErrorHandler::ExpandByNameSuffix(vec!["-a".into(), "-b".into(), "-c".into()]);
        let after_first = first.apply(&[sample_result("svc")]);
        let after_second = second.apply(&after_first);
        assert_eq!(after_second.len(), 2 * 3);
    }

    #[test]
    fn check_key_combines_id_and_environment() {
        let check = Check {
            id: "mymodule.check_disk".to_string(),
            service_name: "disk".to_string(),
            service_labels: Default::default(),
            target_environments: vec![Environment::new("prod")],
            cache_for: CacheFor::None,
            hostname_strategy: HostnameStrategy::Unset,
            error_handlers: vec![],
            signature_plan: vec![],
            dispatch: Dispatch::Sync,
            function: Arc::new(|_| Ok(CheckOutcome::Single(CheckResult::ok("fine")))),
        };
        assert_eq!(check.key_for("prod"), "mymodule.check_disk::prod");
    }
}
