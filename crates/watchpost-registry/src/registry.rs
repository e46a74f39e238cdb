use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use watchpost_types::{SchedulingStrategy, WatchpostError};

type Instance = Arc<dyn Any + Send + Sync>;
type Constructor = Arc<dyn Fn() -> anyhow::Result<Instance> + Send + Sync>;
type FactoryConstructor = Arc<dyn Fn(&[String]) -> anyhow::Result<Instance> + Send + Sync>;

struct DirectEntry {
    constructor: Constructor,
    strategies: Vec<Arc<dyn SchedulingStrategy>>,
    instance: Mutex<Option<Instance>>,
}

struct FactoryEntry {
    constructor: FactoryConstructor,
    strategies: Vec<Arc<dyn SchedulingStrategy>>,
    instances: Mutex<HashMap<String, Instance>>,
}

/// Maps a datasource or factory type name to its instantiation recipe.
/// Direct registrations are singletons, lazily constructed and memoized for
/// the registry's lifetime; factory registrations are memoized per distinct
/// argument list.
#[derive(Default)]
pub struct DatasourceRegistry {
    direct: HashMap<String, DirectEntry>,
    factories: HashMap<String, FactoryEntry>,
}

impl DatasourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a direct datasource type with its constructor and any
    /// scheduling strategies declared on it.
    pub fn register_direct<F>(&mut self, type_name: impl Into<String>, constructor: F, strategies: Vec<Arc<dyn SchedulingStrategy>>)
    where
        F: Fn() -> anyhow::Result<Instance> + Send + Sync + 'static,
    {
        self.direct.insert(
            type_name.into(),
            DirectEntry {
                constructor: Arc::new(constructor),
                strategies,
                instance: Mutex::new(None),
            },
        );
    }

    /// Register a factory type with its constructor (parameterized by the
    /// args given at the call site) and any scheduling strategies declared
    /// on it.
    pub fn register_factory<F>(&mut self, factory_type: impl Into<String>, constructor: F, strategies: Vec<Arc<dyn SchedulingStrategy>>)
    where
        F: Fn(&[String]) -> anyhow::Result<Instance> + Send + Sync + 'static,
    {
        self.factories.insert(
            factory_type.into(),
            FactoryEntry {
                constructor: Arc::new(constructor),
                strategies,
                instances: Mutex::new(HashMap::new()),
            },
        );
    }

    pub fn has_direct(&self, type_name: &str) -> bool {
        self.direct.contains_key(type_name)
    }

    pub fn has_factory(&self, factory_type: &str) -> bool {
        self.factories.contains_key(factory_type)
    }

    pub fn strategies_for_direct(&self, type_name: &str) -> &[Arc<dyn SchedulingStrategy>] {
        self.direct.get(type_name).map(|e| e.strategies.as_slice()).unwrap_or(&[])
    }

    pub fn strategies_for_factory(&self, factory_type: &str) -> &[Arc<dyn SchedulingStrategy>] {
        self.factories.get(factory_type).map(|e| e.strategies.as_slice()).unwrap_or(&[])
    }

    /// Resolve (constructing and memoizing on first use) the singleton
    /// instance for a direct registration.
    pub fn resolve_direct(&self, type_name: &str) -> Result<Instance, WatchpostError> {
        let entry = self
            .direct
            .get(type_name)
            .ok_or_else(|| WatchpostError::invalid_check_configuration(type_name, "no direct registration for this type"))?;

        let mut slot = entry.instance.lock().expect("datasource instance mutex poisoned");
        if let Some(instance) = slot.as_ref() {
            return Ok(instance.clone());
        }

        let instance = (entry.constructor)().map_err(|e| WatchpostError::datasource_unavailable(type_name, e.to_string()))?;
        *slot = Some(instance.clone());
        Ok(instance)
    }

    /// Resolve (constructing and memoizing per distinct `args`) the instance
    /// produced by a factory registration.
    pub fn resolve_factory(&self, factory_type: &str, args: &[String]) -> Result<Instance, WatchpostError> {
        let entry = self
            .factories
            .get(factory_type)
            .ok_or_else(|| WatchpostError::invalid_check_configuration(factory_type, "no factory registration for this type"))?;

        let key = args.join("\u{1}");
        let mut instances = entry.instances.lock().expect("factory instance map mutex poisoned");
        if let Some(instance) = instances.get(&key) {
            return Ok(instance.clone());
        }

        let instance =
            (entry.constructor)(args).map_err(|e| WatchpostError::datasource_unavailable(factory_type, e.to_string()))?;
        instances.insert(key, instance.clone());
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn direct_registration_is_memoized() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let mut registry = DatasourceRegistry::new();
        registry.register_direct(
            "Db",
            || {
                CALLS.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(42i32) as Instance)
            },
            vec![],
        );

        registry.resolve_direct("Db").unwrap();
        registry.resolve_direct("Db").unwrap();
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn resolving_unknown_direct_type_fails() {
        let registry = DatasourceRegistry::new();
        assert!(registry.resolve_direct("Unknown").is_err());
    }

    #[test]
    fn factory_is_memoized_per_distinct_args() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let mut registry = DatasourceRegistry::new();
        registry.register_factory(
            "ClientFactory",
            |args| {
                CALLS.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(args.to_vec()) as Instance)
            },
            vec![],
        );

        registry.resolve_factory("ClientFactory", &["a".to_string()]).unwrap();
        registry.resolve_factory("ClientFactory", &["a".to_string()]).unwrap();
        registry.resolve_factory("ClientFactory", &["b".to_string()]).unwrap();

        assert_eq!(CALLS.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn datasource_constructor_error_becomes_datasource_unavailable() {
        let mut registry = DatasourceRegistry::new();
        registry.register_direct("Flaky", || anyhow::bail!("connection refused"), vec![]);
        let err = registry.resolve_direct("Flaky").unwrap_err();
        assert!(matches!(err, WatchpostError::DatasourceUnavailable { .. }));
    }
}
