use watchpost_types::{Environment, ParamBinding, ResolvedArgs, SignaturePlan, WatchpostError};

use crate::registry::DatasourceRegistry;

/// Builds a [`SignaturePlan`] for one check, validating every binding against
/// the registry eagerly (at registration time) rather than leaving unknown
/// types or factories to surface as runtime failures.
#[derive(Default)]
pub struct SignatureBuilder {
    bindings: Vec<ParamBinding>,
}

impl SignatureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next parameter is the current target environment.
    pub fn environment(mut self) -> Self {
        self.bindings.push(ParamBinding::Environment);
        self
    }

    /// Next parameter is the registered datasource of `type_name`.
    pub fn datasource(mut self, type_name: impl Into<String>) -> Self {
        self.bindings.push(ParamBinding::Datasource {
            type_name: type_name.into(),
        });
        self
    }

    /// Next parameter is produced by `factory_type`, called with `args`.
    pub fn factory(mut self, factory_type: impl Into<String>, args: Vec<String>) -> Self {
        self.bindings.push(ParamBinding::Factory {
            factory_type: factory_type.into(),
            args,
        });
        self
    }

    /// Validate every binding against `registry` and produce the plan.
    /// Fails fast on the first unknown datasource or factory type so
    /// misconfiguration is caught during check registration, not at the
    /// first time the check happens to run.
    pub fn build(self, registry: &DatasourceRegistry, check_id: &str) -> Result<SignaturePlan, WatchpostError> {
        for binding in &self.bindings {
            match binding {
                ParamBinding::Environment => {}
                ParamBinding::Datasource { type_name } => {
                    if !registry.has_direct(type_name) {
                        return Err(WatchpostError::invalid_check_configuration(
                            check_id,
                            format!("unknown datasource type `{type_name}`"),
                        ));
                    }
                }
                ParamBinding::Factory { factory_type, .. } => {
                    if !registry.has_factory(factory_type) {
                        return Err(WatchpostError::invalid_check_configuration(
                            check_id,
                            format!("unknown factory type `{factory_type}`"),
                        ));
                    }
                }
            }
        }
        Ok(self.bindings)
    }
}

/// Walk a validated [`SignaturePlan`], producing the positional arguments a
/// check's callable expects. Datasource and factory instances are resolved
/// (and, per the registry's memoization, possibly constructed) here; this
/// runs once per check execution.
pub fn resolve(
    plan: &SignaturePlan,
    registry: &DatasourceRegistry,
    target_env: &Environment,
) -> Result<ResolvedArgs, WatchpostError> {
    plan.iter()
        .map(|binding| match binding {
            ParamBinding::Environment => {
                let env: Box<dyn std::any::Any + Send> = Box::new(target_env.clone());
                Ok(env)
            }
            ParamBinding::Datasource { type_name } => {
                let instance = registry.resolve_direct(type_name)?;
                Ok(Box::new(instance) as Box<dyn std::any::Any + Send>)
            }
            ParamBinding::Factory { factory_type, args } => {
                let instance = registry.resolve_factory(factory_type, args)?;
                Ok(Box::new(instance) as Box<dyn std::any::Any + Send>)
            }
        })
        .collect()
}
