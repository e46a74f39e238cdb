use std::collections::BTreeMap;
use std::sync::Arc;

use watchpost_registry::{DatasourceRegistry, SignatureBuilder};
use watchpost_types::{
    CacheFor, Check, Dispatch, ErrorHandler, Environment, EnvironmentRegistry, HostnameStrategy, CheckFn,
    ParamBinding, SchedulingStrategy, WatchpostError,
};

/// One check's registration input, before its signature has been validated
/// against a [`DatasourceRegistry`]. Everything here is immutable after
/// [`CheckRegistry::register_check`] turns it into a [`RegisteredCheck`].
pub struct CheckSpec {
    pub id: String,
    pub service_name: String,
    pub service_labels: BTreeMap<String, String>,
    pub target_environments: Vec<Environment>,
    pub cache_for: CacheFor,
    pub hostname_strategy: HostnameStrategy,
    pub scheduling_strategies: Vec<Arc<dyn SchedulingStrategy>>,
    pub error_handlers: Vec<ErrorHandler>,
    pub signature: SignatureBuilder,
    pub dispatch: Dispatch,
    pub function: CheckFn,
}

/// A fully validated check plus the scheduling strategies effective for it —
/// the union of its own, its datasources', its factories', and the engine
/// defaults (§4.3's composition rule). `watchpost_types::Check` itself has no
/// room for this list since it's a registry-side concern, not a property of
/// the check descriptor.
pub struct RegisteredCheck {
    pub check: Check,
    pub strategies: Vec<Arc<dyn SchedulingStrategy>>,
}

/// Holds the environment and datasource registries plus every validated
/// check. Registration fails fast per check (unknown datasource/factory
/// type), but [`CheckRegistry::register_check`] never panics — callers
/// collect every failure before deciding whether to start the engine.
#[derive(Default)]
pub struct CheckRegistry {
    pub(crate) environments: EnvironmentRegistry,
    pub(crate) datasources: DatasourceRegistry,
    pub(crate) checks: Vec<RegisteredCheck>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_environment(&mut self, env: Environment) -> &mut Self {
        self.environments.insert(env);
        self
    }

    pub fn datasources_mut(&mut self) -> &mut DatasourceRegistry {
        &mut self.datasources
    }

    pub fn environments(&self) -> &EnvironmentRegistry {
        &self.environments
    }

    /// Validate `spec`'s signature against the registered datasources,
    /// aggregate its effective scheduling strategies, and run the
    /// registration-time conflict check — all before it becomes part of the
    /// registry. `engine_defaults` are unioned in per §4.3(d).
    pub fn register_check(
        &mut self,
        spec: CheckSpec,
        engine_defaults: &[Arc<dyn SchedulingStrategy>],
    ) -> Result<(), WatchpostError> {
        if spec.target_environments.is_empty() {
            return Err(WatchpostError::invalid_check_configuration(
                spec.id.as_str(),
                "target_environments must be non-empty",
            ));
        }

        let plan = spec.signature.build(&self.datasources, &spec.id)?;

        let mut datasource_strategies = Vec::new();
        let mut factory_strategies = Vec::new();
        for binding in &plan {
            match binding {
                ParamBinding::Environment => {}
                ParamBinding::Datasource { type_name } => {
                    datasource_strategies.extend(self.datasources.strategies_for_direct(type_name).iter().cloned());
                }
                ParamBinding::Factory { factory_type, .. } => {
                    factory_strategies.extend(self.datasources.strategies_for_factory(factory_type).iter().cloned());
                }
            }
        }

        let effective = watchpost_policy::effective_strategies(
            &spec.scheduling_strategies,
            &datasource_strategies,
            &factory_strategies,
            engine_defaults,
        );

        watchpost_policy::detect_conflicts(&spec.id, &effective)?;

        let check = Check {
            id: spec.id,
            service_name: spec.service_name,
            service_labels: spec.service_labels,
            target_environments: spec.target_environments,
            cache_for: spec.cache_for,
            hostname_strategy: spec.hostname_strategy,
            error_handlers: spec.error_handlers,
            signature_plan: plan,
            dispatch: spec.dispatch,
            function: spec.function,
        };

        self.checks.push(RegisteredCheck { check, strategies: effective });
        Ok(())
    }

    pub fn checks(&self) -> &[RegisteredCheck] {
        &self.checks
    }
}
