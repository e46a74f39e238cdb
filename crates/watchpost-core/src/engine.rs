use std::sync::Arc;

use watchpost_cache::Cache;
use watchpost_executor::Executor;
use watchpost_registry::resolve as resolve_args;
use watchpost_storage::InMemoryStorage;
use watchpost_types::{
    CacheFor, Check, Dispatch, EngineStatistics, ErroredEntry, ExecutionResult, SchedulingDecision,
    SchedulingStrategy, WatchpostError,
};

use crate::registry::{CheckRegistry, RegisteredCheck};
use crate::reporter::Reporter;

const SCHEDULED_SKIP_NO_CACHE: &str = "scheduled-skip-no-cache";

/// Per-invocation knobs for [`Engine::run_once`]; CLI flags and HTTP query
/// parameters both funnel into one of these.
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub execution_env: String,
    /// `None` defers to the engine's configured default.
    pub cache_enabled: Option<bool>,
    pub filter_prefix: Option<String>,
    pub filter_contains: Option<String>,
    /// Forces every check onto one backend regardless of its own
    /// [`Dispatch`], for the CLI's `--sync`/`--async` flags.
    pub dispatch_override: Option<Dispatch>,
}

impl RuntimeOptions {
    pub fn new(execution_env: impl Into<String>) -> Self {
        Self {
            execution_env: execution_env.into(),
            cache_enabled: None,
            filter_prefix: None,
            filter_contains: None,
            dispatch_override: None,
        }
    }

    fn matches(&self, check_id: &str) -> bool {
        self.filter_prefix.as_deref().is_none_or(|p| check_id.starts_with(p))
            && self.filter_contains.as_deref().is_none_or(|s| check_id.contains(s))
    }
}

/// Assembles a [`CheckRegistry`] and, once every check has validated, an
/// [`Engine`]. Registration failures accumulate across every `register_check`
/// call rather than stopping at the first one, so `build()` can report every
/// configuration problem in one diagnostic — mirrors `run_preflight`'s
/// fail-with-everything-named style.
pub struct EngineBuilder {
    registry: CheckRegistry,
    engine_defaults: Vec<Arc<dyn SchedulingStrategy>>,
    cache_enabled: bool,
    hostname_engine_default: Option<String>,
    coerce_rfc1123: bool,
    worker_threads: usize,
    queue_capacity: usize,
    storage: Option<Arc<dyn watchpost_storage::StorageBackend>>,
    errors: Vec<WatchpostError>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            registry: CheckRegistry::new(),
            engine_defaults: Vec::new(),
            cache_enabled: true,
            hostname_engine_default: None,
            coerce_rfc1123: true,
            worker_threads: 2 * num_cpus::get(),
            queue_capacity: 256,
            storage: None,
            errors: Vec::new(),
        }
    }

    /// Seed every field from a loaded [`watchpost_config::Config`].
    pub fn from_config(config: &watchpost_config::Config) -> Result<Self, WatchpostError> {
        let mut builder = Self::new();
        builder.cache_enabled = config.cache.enabled;
        builder.hostname_engine_default = config.hostname.engine_default.clone();
        builder.coerce_rfc1123 = config.hostname.coerce_rfc1123;
        builder.worker_threads = config.engine.worker_threads;
        builder.queue_capacity = config.engine.queue_capacity;
        builder.engine_defaults = config.resolve_default_strategies()?;
        Ok(builder)
    }

    pub fn with_storage(mut self, storage: Arc<dyn watchpost_storage::StorageBackend>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn environment(mut self, env: watchpost_types::Environment) -> Self {
        self.registry.register_environment(env);
        self
    }

    pub fn datasources_mut(&mut self) -> &mut watchpost_registry::DatasourceRegistry {
        self.registry.datasources_mut()
    }

    /// Validate and add one check. Failures are collected, not raised
    /// immediately — call [`EngineBuilder::build`] to find out whether
    /// registration as a whole succeeded.
    pub fn register_check(mut self, spec: crate::registry::CheckSpec) -> Self {
        let defaults = self.engine_defaults.clone();
        if let Err(e) = self.registry.register_check(spec, &defaults) {
            self.errors.push(e);
        }
        self
    }

    pub fn build(self) -> Result<Engine, watchpost_types::ConfigurationErrors> {
        if !self.errors.is_empty() {
            return Err(watchpost_types::ConfigurationErrors(self.errors));
        }

        let storage = self.storage.unwrap_or_else(|| Arc::new(InMemoryStorage::new()));
        Ok(Engine {
            registry: self.registry,
            cache: if self.cache_enabled { Some(Cache::new(storage)) } else { None },
            executor: Executor::new(self.worker_threads, self.queue_capacity),
            hostname_engine_default: self.hostname_engine_default,
            coerce_rfc1123: self.coerce_rfc1123,
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The top-level orchestrator: immutable registries, a mutable cache, and an
/// executor. Owns one poll's worth of orchestration per call to
/// [`Engine::run_once`]; nothing here is mutated between polls except the
/// cache's contents and the executor's rolling statistics.
pub struct Engine {
    registry: CheckRegistry,
    cache: Option<Cache>,
    executor: Executor,
    hostname_engine_default: Option<String>,
    coerce_rfc1123: bool,
}

impl Engine {
    /// One full pass over every registered (check, target_env) pair, per
    /// §4.6 steps 1-8. Results are emitted in enumeration order.
    pub fn run_once(&self, opts: &RuntimeOptions, reporter: &mut dyn Reporter) -> anyhow::Result<Vec<ExecutionResult>> {
        let mut out = Vec::new();

        for registered in self.registry.checks() {
            if !opts.matches(&registered.check.id) {
                continue;
            }

            for env in &registered.check.target_environments {
                let results = self.run_one_pair(registered, env, opts, reporter);
                out.extend(results);
            }
        }

        Ok(out)
    }

    fn run_one_pair(
        &self,
        registered: &RegisteredCheck,
        env: &watchpost_types::Environment,
        opts: &RuntimeOptions,
        reporter: &mut dyn Reporter,
    ) -> Vec<ExecutionResult> {
        let check = &registered.check;
        let key = check.key_for(env.name());

        let decision = watchpost_policy::decide(&registered.strategies, check, &opts.execution_env, env);

        match decision {
            SchedulingDecision::DontSchedule => Vec::new(),
            SchedulingDecision::Skip => self.run_skip(check, env, &key, reporter),
            SchedulingDecision::Schedule => self.run_schedule(check, env, &key, opts, reporter),
        }
    }

    fn cache_enabled_for(&self, opts: &RuntimeOptions) -> bool {
        self.cache.is_some() && opts.cache_enabled.unwrap_or(true)
    }

    fn run_skip(
        &self,
        check: &Check,
        env: &watchpost_types::Environment,
        key: &str,
        reporter: &mut dyn Reporter,
    ) -> Vec<ExecutionResult> {
        if let Some(cache) = &self.cache {
            if let Ok(Some(entry)) = cache.get(key, true) {
                if let Ok(results) = serde_json::from_slice::<Vec<ExecutionResult>>(&entry.value) {
                    return results;
                }
            }
        }

        reporter.info(&format!("skipping `{key}`: no cached result available"));
        vec![self.synthesize(check, env, SCHEDULED_SKIP_NO_CACHE, "no cached result available for a skipped check")]
    }

    fn run_schedule(
        &self,
        check: &Check,
        env: &watchpost_types::Environment,
        key: &str,
        opts: &RuntimeOptions,
        reporter: &mut dyn Reporter,
    ) -> Vec<ExecutionResult> {
        let caching = self.cache_enabled_for(opts) && !matches!(check.cache_for, CacheFor::None);

        // `Cache::get(key, false)` already implements the grace-read contract:
        // a live entry is returned plainly, and an expired one is returned
        // exactly once (then deleted) rather than forcing a rerun on its own.
        if caching {
            if let Some(cache) = &self.cache {
                if let Ok(Some(entry)) = cache.get(key, false) {
                    if let Ok(results) = serde_json::from_slice::<Vec<ExecutionResult>>(&entry.value) {
                        return results;
                    }
                }
            }
        }

        let dispatch = opts.dispatch_override.unwrap_or(check.dispatch);
        let (job_result, threw) = self.execute(check, env, key, dispatch, reporter);

        let mut results = self.to_unresolved_results(check, env, job_result);
        if threw {
            for handler in &check.error_handlers {
                results = handler.apply(&results);
            }
        }
        let results: Vec<ExecutionResult> =
            results.into_iter().map(|r| self.resolve_hostname_or_fallback(check, env, r)).collect();

        if caching && !threw {
            if let Some(cache) = &self.cache {
                if let CacheFor::Duration(ttl) = check.cache_for {
                    if let Ok(bytes) = serde_json::to_vec(&results) {
                        let chrono_ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::max_value());
                        if let Err(e) = cache.store(key, bytes, chrono_ttl) {
                            reporter.warn(&format!("failed to cache results for `{key}`: {e}"));
                        }
                    }
                }
            }
        }

        results
    }

    /// Resolve the check's dependencies and submit it to the executor,
    /// returning the raw job outcome plus whether it came from a thrown
    /// error (as opposed to a check-returned UNKNOWN).
    fn execute(
        &self,
        check: &Check,
        env: &watchpost_types::Environment,
        key: &str,
        dispatch: Dispatch,
        reporter: &mut dyn Reporter,
    ) -> (Result<Vec<watchpost_types::CheckResult>, WatchpostError>, bool) {
        let args = match resolve_args(&check.signature_plan, &self.registry.datasources, env) {
            Ok(args) => args,
            Err(e) => return (Err(e), true),
        };

        let function = check.function.clone();
        let check_id = check.id.clone();
        let work: watchpost_executor::Work = Box::new(move || {
            function(args).map(|outcome| outcome.into_results()).map_err(|e| {
                WatchpostError::UnhandledCheckError { check_id: check_id.clone(), reason: e.to_string() }
            })
        });

        let handle = match self.executor.submit(key, dispatch, work) {
            Ok(handle) => handle,
            Err(e) => return (Err(e), true),
        };

        let outcome = handle.join();
        match outcome.as_ref() {
            Ok(results) => (Ok(results.clone()), false),
            Err(e) => {
                reporter.error(&format!("check `{}` failed: {e}", check.id));
                (Err(clone_error(e)), true)
            }
        }
    }

    /// Build the engine-internal result list from a job's raw outcome
    /// (§4.6 step 4). `piggyback_host` carries only an explicit
    /// `hostname_override`, if any — the resolution hierarchy (step 6) and
    /// any error-handler expansion (step 5) both still need to run on this
    /// list before it's ready to cache or emit.
    fn to_unresolved_results(
        &self,
        check: &Check,
        env: &watchpost_types::Environment,
        job_result: Result<Vec<watchpost_types::CheckResult>, WatchpostError>,
    ) -> Vec<ExecutionResult> {
        let check_results = match job_result {
            Ok(results) => results,
            Err(e) => vec![watchpost_types::CheckResult::unknown(e.to_string())],
        };

        check_results
            .into_iter()
            .map(|cr| {
                let service_name = match &cr.name_suffix {
                    Some(suffix) => format!("{}{}", check.service_name, suffix),
                    None => check.service_name.clone(),
                };
                let details = cr.details.as_ref().map(|d| d.render()).unwrap_or_default();

                ExecutionResult {
                    piggyback_host: cr.hostname_override.clone().unwrap_or_default(),
                    service_name,
                    service_labels: check.service_labels.clone(),
                    environment_name: env.name().to_string(),
                    state: cr.state,
                    summary: cr.summary,
                    details,
                    metrics: cr.metrics,
                    check_id: check.id.clone(),
                }
            })
            .collect()
    }

    /// Walk the hostname resolution hierarchy for an already-built
    /// [`ExecutionResult`]; a resolution failure degrades to the
    /// "no-piggyback" sentinel rather than dropping the result, since a
    /// per-result hostname problem is never fatal to the poll.
    fn resolve_hostname_or_fallback(
        &self,
        check: &Check,
        env: &watchpost_types::Environment,
        unresolved: ExecutionResult,
    ) -> ExecutionResult {
        let fallback_summary = unresolved.summary.clone();
        let fallback_details = unresolved.details.clone();
        watchpost_hostname::resolve_into_result(
            check,
            env,
            unresolved,
            self.hostname_engine_default.as_deref(),
            self.coerce_rfc1123,
        )
        .unwrap_or_else(|_| ExecutionResult {
            piggyback_host: watchpost_types::NO_PIGGYBACK.to_string(),
            service_name: check.service_name.clone(),
            service_labels: check.service_labels.clone(),
            environment_name: env.name().to_string(),
            state: watchpost_types::CheckState::Unknown,
            summary: fallback_summary,
            details: fallback_details,
            metrics: vec![],
            check_id: check.id.clone(),
        })
    }

    fn synthesize(
        &self,
        check: &Check,
        env: &watchpost_types::Environment,
        summary: &str,
        details: &str,
    ) -> ExecutionResult {
        let unresolved = ExecutionResult {
            piggyback_host: String::new(),
            service_name: check.service_name.clone(),
            service_labels: check.service_labels.clone(),
            environment_name: env.name().to_string(),
            state: watchpost_types::CheckState::Unknown,
            summary: summary.to_string(),
            details: details.to_string(),
            metrics: vec![],
            check_id: check.id.clone(),
        };
        self.resolve_hostname_or_fallback(check, env, unresolved)
    }

    /// `{id}({param: type}, ...)` per check, for the `list-checks` CLI
    /// surface. Parameters have no declared name in the signature plan (the
    /// plan is positional, not name-aware), so positions are rendered as
    /// `arg0`, `arg1`, ...
    pub fn list_checks(&self) -> Vec<String> {
        self.registry
            .checks()
            .iter()
            .map(|registered| {
                let check = &registered.check;
                let params = check
                    .signature_plan
                    .iter()
                    .enumerate()
                    .map(|(i, binding)| {
                        let type_name = match binding {
                            watchpost_types::ParamBinding::Environment => "Environment".to_string(),
                            watchpost_types::ParamBinding::Datasource { type_name } => type_name.clone(),
                            watchpost_types::ParamBinding::Factory { factory_type, .. } => factory_type.clone(),
                        };
                        format!("arg{i}: {type_name}")
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{}({})", check.id, params)
            })
            .collect()
    }

    /// Resolved hostname for every (check, target_env) pair without running
    /// anything, for the `get-check-hostnames` CLI surface.
    pub fn resolve_hostnames(&self) -> Result<Vec<(String, String, String)>, WatchpostError> {
        let mut out = Vec::new();
        for registered in self.registry.checks() {
            let check = &registered.check;
            for env in &check.target_environments {
                let hostname = watchpost_hostname::resolve(
                    check,
                    env,
                    None,
                    self.hostname_engine_default.as_deref(),
                    self.coerce_rfc1123,
                )?;
                out.push((check.id.clone(), env.name().to_string(), hostname));
            }
        }
        Ok(out)
    }

    pub fn executor_statistics(&self) -> EngineStatistics {
        self.executor.statistics()
    }

    pub fn executor_errored(&self) -> Vec<ErroredEntry> {
        self.executor.errored_snapshot()
    }

    pub fn shutdown(&mut self, drain: bool) {
        self.executor.shutdown(drain);
    }
}


fn clone_error(e: &WatchpostError) -> WatchpostError {
    match e {
        WatchpostError::InvalidCheckConfiguration { check_id, reason } => {
            WatchpostError::InvalidCheckConfiguration { check_id: check_id.clone(), reason: reason.clone() }
        }
        WatchpostError::DatasourceUnavailable { datasource_type, reason } => {
            WatchpostError::DatasourceUnavailable { datasource_type: datasource_type.clone(), reason: reason.clone() }
        }
        WatchpostError::UnhandledCheckError { check_id, reason } => {
            WatchpostError::UnhandledCheckError { check_id: check_id.clone(), reason: reason.clone() }
        }
        WatchpostError::HostnameResolutionError { check_id, env_name, reason } => {
            WatchpostError::HostnameResolutionError { check_id: check_id.clone(), env_name: env_name.clone(), reason: reason.clone() }
        }
        WatchpostError::StorageError(s) => WatchpostError::StorageError(s.clone()),
        WatchpostError::ExecutorSaturated { key } => WatchpostError::ExecutorSaturated { key: key.clone() },
    }
}
