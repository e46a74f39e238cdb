use thiserror::Error;

/// Errors callers must be able to match on by kind, per the error taxonomy.
/// Everything else in the workspace returns `anyhow::Error` with `.context`.
#[derive(Debug, Error)]
pub enum WatchpostError {
    /// Registration-time failure: unknown datasource type, an unresolved
    /// factory, an impossible scheduling-strategy combination, or a
    /// malformed duration string. Aggregated into a multi-error and raised
    /// at startup; the engine never starts with one of these pending.
    #[error("invalid check configuration for `{check_id}`: {reason}")]
    InvalidCheckConfiguration { check_id: String, reason: String },

    /// A datasource method signaled a transient external failure. The
    /// engine turns the check into UNKNOWN; per spec this deliberately does
    /// NOT fall back to a cached value — the cache's own grace-read policy
    /// already covers the unavailability window.
    #[error("datasource `{datasource_type}` unavailable: {reason}")]
    DatasourceUnavailable { datasource_type: String, reason: String },

    /// A check body failed in a way not covered by a more specific variant.
    #[error("check `{check_id}` failed: {reason}")]
    UnhandledCheckError { check_id: String, reason: String },

    /// Hostname resolution produced an empty hostname with coercion disabled.
    #[error("hostname resolution failed for `{check_id}`/`{env_name}`: {reason}")]
    HostnameResolutionError {
        check_id: String,
        env_name: String,
        reason: String,
    },

    /// A storage backend's I/O failed. Always degrades to a cache miss at
    /// the call site; recorded here only so the engine can log it.
    #[error("storage error: {0}")]
    StorageError(String),

    /// The executor's backpressure limit was exceeded for a submission.
    #[error("executor saturated: rejected `{key}`")]
    ExecutorSaturated { key: String },
}

impl WatchpostError {
    pub fn invalid_check_configuration(check_id: impl Into<String>, reason: impl Into<String>) -> Self {
        WatchpostError::InvalidCheckConfiguration {
            check_id: check_id.into(),
            reason: reason.into(),
        }
    }

    pub fn datasource_unavailable(datasource_type: impl Into<String>, reason: impl Into<String>) -> Self {
        WatchpostError::DatasourceUnavailable {
            datasource_type: datasource_type.into(),
            reason: reason.into(),
        }
    }
}

/// Several [`WatchpostError::InvalidCheckConfiguration`]s raised together at
/// startup, so every registration problem is reported in one diagnostic
/// rather than failing on the first.
#[derive(Debug, Error)]
#[error("{} configuration error(s) prevented startup:\n{}", .0.len(), format_errors(.0))]
pub struct ConfigurationErrors(pub Vec<WatchpostError>);

fn format_errors(errors: &[WatchpostError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_check_configuration_message_names_check_and_reason() {
        let err = WatchpostError::invalid_check_configuration("m.check_disk", "unknown datasource `Foo`");
        let msg = err.to_string();
        assert!(msg.contains("m.check_disk"));
        assert!(msg.contains("unknown datasource `Foo`"));
    }

    #[test]
    fn configuration_errors_aggregate_names_each_one() {
        let errors = ConfigurationErrors(vec![
            WatchpostError::invalid_check_configuration("a", "bad"),
            WatchpostError::invalid_check_configuration("b", "worse"),
        ]);
        let msg = errors.to_string();
        assert!(msg.contains("2 configuration error"));
        assert!(msg.contains('a'));
        assert!(msg.contains('b'));
    }
}
