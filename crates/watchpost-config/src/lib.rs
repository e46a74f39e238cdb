//! Configuration file handling for watchpost. Loads a `.watchpost.toml`
//! (engine defaults: executor pool size, default cache TTL, hostname
//! coercion, default scheduling strategies) and merges it over built-in
//! defaults.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use watchpost_types::{SchedulingStrategy, WatchpostError};

pub const CONFIG_FILE: &str = ".watchpost.toml";

fn default_execution_env() -> String {
    "default".to_string()
}

fn default_worker_threads() -> usize {
    2 * num_cpus_or_fallback()
}

fn num_cpus_or_fallback() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}

fn default_queue_capacity() -> usize {
    256
}

fn default_cache_ttl() -> Duration {
    Duration::from_secs(300)
}

fn default_cache_enabled() -> bool {
    true
}

fn default_coerce() -> bool {
    true
}

/// Complete watchpost configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub hostname: HostnameConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `self` with `other`, with `other` taking precedence field by
    /// field, compared against each field's own default.
    pub fn merge(&self, other: &Config) -> Config {
        Config {
            engine: EngineConfig {
                execution_env: pick(&other.engine.execution_env, &self.engine.execution_env, &default_execution_env()),
                worker_threads: pick_copy(other.engine.worker_threads, self.engine.worker_threads, default_worker_threads()),
                queue_capacity: pick_copy(other.engine.queue_capacity, self.engine.queue_capacity, default_queue_capacity()),
            },
            cache: CacheConfig {
                enabled: pick_copy(other.cache.enabled, self.cache.enabled, default_cache_enabled()),
                default_ttl: pick_copy(other.cache.default_ttl, self.cache.default_ttl, default_cache_ttl()),
                storage_root: other.cache.storage_root.clone().or_else(|| self.cache.storage_root.clone()),
            },
            hostname: HostnameConfig {
                coerce_rfc1123: pick_copy(other.hostname.coerce_rfc1123, self.hostname.coerce_rfc1123, default_coerce()),
                engine_default: other.hostname.engine_default.clone().or_else(|| self.hostname.engine_default.clone()),
                default_strategies: if other.hostname.default_strategies.is_empty() {
                    self.hostname.default_strategies.clone()
                } else {
                    other.hostname.default_strategies.clone()
                },
            },
        }
    }

    /// Resolve `hostname.default_strategies`' names into engine-wide
    /// scheduling strategies. Only the zero-argument built-ins can be named
    /// from config; parameterized strategies are attached in code at check
    /// registration.
    pub fn resolve_default_strategies(&self) -> Result<Vec<Arc<dyn SchedulingStrategy>>, WatchpostError> {
        self.hostname
            .default_strategies
            .iter()
            .map(|name| match name.as_str() {
                "must_run_in_target_environment" => {
                    Ok(Arc::new(watchpost_policy::MustRunInTargetEnvironment) as Arc<dyn SchedulingStrategy>)
                }
                "detect_impossible_combination" => {
                    Ok(Arc::new(watchpost_policy::DetectImpossibleCombination) as Arc<dyn SchedulingStrategy>)
                }
                other => Err(WatchpostError::invalid_check_configuration(
                    "<config>",
                    format!("unknown default scheduling strategy `{other}`"),
                )),
            })
            .collect()
    }
}

fn pick(value: &str, fallback: &str, default: &str) -> String {
    if value != default {
        value.to_string()
    } else {
        fallback.to_string()
    }
}

fn pick_copy<T: PartialEq + Copy>(value: T, fallback: T, default: T) -> T {
    if value != default {
        value
    } else {
        fallback
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_execution_env")]
    pub execution_env: String,
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            execution_env: default_execution_env(),
            worker_threads: default_worker_threads(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(
        default = "default_cache_ttl",
        serialize_with = "watchpost_duration::serialize_duration",
        deserialize_with = "watchpost_duration::deserialize_duration"
    )]
    pub default_ttl: Duration,
    #[serde(default)]
    pub storage_root: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            default_ttl: default_cache_ttl(),
            storage_root: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostnameConfig {
    #[serde(default = "default_coerce")]
    pub coerce_rfc1123: bool,
    #[serde(default)]
    pub engine_default: Option<String>,
    #[serde(default)]
    pub default_strategies: Vec<String>,
}

pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE)
}

pub fn load_config(dir: &Path) -> Result<Config> {
    load_config_from_file(&config_path(dir))
}

pub fn load_config_from_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    toml::from_str(&content).with_context(|| format!("failed to parse config file: {}", path.display()))
}

pub fn save_config(dir: &Path, config: &Config) -> Result<()> {
    let path = config_path(dir);
    let content = toml::to_string_pretty(config).context("failed to serialize config to TOML")?;
    std::fs::write(&path, content).with_context(|| format!("failed to write config file: {}", path.display()))
}

/// Walk up from `start_dir` looking for `.watchpost.toml`.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir;
    loop {
        let candidate = current.join(CONFIG_FILE);
        if candidate.exists() {
            return Some(candidate);
        }
        current = current.parent()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_has_sane_defaults() {
        let config = Config::new();
        assert_eq!(config.engine.execution_env, "default");
        assert!(config.cache.enabled);
        assert_eq!(config.cache.default_ttl, Duration::from_secs(300));
        assert!(config.hostname.coerce_rfc1123);
    }

    #[test]
    fn load_missing_config_returns_default() {
        let td = tempdir().expect("tempdir");
        let config = load_config(td.path()).expect("load");
        assert_eq!(config.engine.execution_env, "default");
    }

    #[test]
    fn save_and_load_round_trips() {
        let td = tempdir().expect("tempdir");
        let mut config = Config::new();
        config.engine.execution_env = "prod".to_string();
        config.engine.worker_threads = 16;

        save_config(td.path(), &config).expect("save");
        let loaded = load_config(td.path()).expect("load");

        assert_eq!(loaded.engine.execution_env, "prod");
        assert_eq!(loaded.engine.worker_threads, 16);
    }

    #[test]
    fn load_config_accepts_string_or_integer_ttl() {
        let td = tempdir().expect("tempdir");
        let path = td.path().join(CONFIG_FILE);
        std::fs::write(&path, "[cache]\ndefault_ttl = \"5m\"\n").expect("write");
        let config = load_config(td.path()).expect("load");
        assert_eq!(config.cache.default_ttl, Duration::from_secs(300));
    }

    #[test]
    fn merge_prefers_other_over_defaulted_self() {
        let base = Config::new();
        let mut overrides = Config::new();
        overrides.engine.execution_env = "staging".to_string();

        let merged = base.merge(&overrides);
        assert_eq!(merged.engine.execution_env, "staging");
        assert_eq!(merged.engine.worker_threads, base.engine.worker_threads);
    }

    #[test]
    fn merge_lets_other_turn_off_a_default_true_flag() {
        let base = Config::new();
        let mut overrides = Config::new();
        overrides.cache.enabled = false;
        overrides.hostname.coerce_rfc1123 = false;

        let merged = base.merge(&overrides);
        assert!(!merged.cache.enabled);
        assert!(!merged.hostname.coerce_rfc1123);
    }

    #[test]
    fn resolve_default_strategies_rejects_unknown_name() {
        let mut config = Config::new();
        config.hostname.default_strategies = vec!["not_a_real_strategy".to_string()];
        assert!(config.resolve_default_strategies().is_err());
    }

    #[test]
    fn resolve_default_strategies_accepts_known_names() {
        let mut config = Config::new();
        config.hostname.default_strategies = vec![
            "must_run_in_target_environment".to_string(),
            "detect_impossible_combination".to_string(),
        ];
        let strategies = config.resolve_default_strategies().unwrap();
        assert_eq!(strategies.len(), 2);
    }

    #[test]
    fn find_config_walks_up_directory_tree() {
        let td = tempdir().expect("tempdir");
        let nested = td.path().join("a").join("b");
        std::fs::create_dir_all(&nested).expect("create dirs");
        let path = td.path().join(CONFIG_FILE);
        std::fs::write(&path, "[engine]\nexecution_env = \"prod\"\n").expect("write");

        let found = find_config(&nested);
        assert_eq!(found, Some(path));
    }
}
