use watchpost_types::{Check, Environment, ExecutionResult, HostnameStrategy, WatchpostError};

/// Context available to a `{placeholder}`-style hostname template: the
/// fields of the environment and the fully-resolved result that would
/// otherwise need reflection to reach.
pub struct TemplateContext<'a> {
    pub service_name: &'a str,
    pub environment_name: &'a str,
    pub environment_hostname: Option<&'a str>,
}

/// Replace every `{field}` placeholder recognized in `template` with the
/// matching field from `ctx`. Unrecognized placeholders are left as-is.
pub fn render_template(template: &str, ctx: &TemplateContext) -> String {
    template
        .replace("{service_name}", ctx.service_name)
        .replace("{environment_name}", ctx.environment_name)
        .replace("{environment_hostname}", ctx.environment_hostname.unwrap_or(""))
}

/// Walk the resolution hierarchy: result override, then check-level
/// strategy, then the environment's own hostname, then `engine_default`,
/// then the synthesized `{service_name}-{environment_name}` fallback.
/// Applies RFC1123 coercion afterward if `coerce` is set; an empty result
/// with coercion disabled is a [`WatchpostError::HostnameResolutionError`].
pub fn resolve(
    check: &Check,
    env: &Environment,
    result_override: Option<&str>,
    engine_default: Option<&str>,
    coerce: bool,
) -> Result<String, WatchpostError> {
    let ctx = TemplateContext {
        service_name: &check.service_name,
        environment_name: env.name(),
        environment_hostname: env.hostname(),
    };

    let resolved = if let Some(override_value) = result_override {
        override_value.to_string()
    } else {
        match &check.hostname_strategy {
            HostnameStrategy::Static(hostname) => hostname.clone(),
            HostnameStrategy::Template(template) => render_template(template, &ctx),
            HostnameStrategy::Unset => env
                .hostname()
                .map(str::to_string)
                .or_else(|| engine_default.map(str::to_string))
                .unwrap_or_else(|| format!("{}-{}", check.service_name, env.name())),
        }
    };

    let final_value = if coerce {
        crate::coerce::coerce_rfc1123(&resolved)
    } else {
        resolved
    };

    if final_value.is_empty() {
        return Err(WatchpostError::HostnameResolutionError {
            check_id: check.id.clone(),
            env_name: env.name().to_string(),
            reason: "hostname resolution produced an empty value with coercion disabled".to_string(),
        });
    }

    Ok(final_value)
}

/// Apply [`resolve`] to an already-produced [`ExecutionResult`], returning a
/// copy with `piggyback_host` filled in. Used by the engine's step-6
/// post-processing pass.
pub fn resolve_into_result(
    check: &Check,
    env: &Environment,
    mut result: ExecutionResult,
    engine_default: Option<&str>,
    coerce: bool,
) -> Result<ExecutionResult, WatchpostError> {
    let override_value = if result.piggyback_host.is_empty() {
        None
    } else {
        Some(result.piggyback_host.as_str())
    };
    result.piggyback_host = resolve(check, env, override_value, engine_default, coerce)?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use watchpost_types::{CacheFor, CheckOutcome, CheckResult, Dispatch};

    fn check_with_strategy(strategy: HostnameStrategy) -> Check {
        Check {
            id: "m.check_disk".to_string(),
            service_name: "disk".to_string(),
            service_labels: Default::default(),
            target_environments: vec![],
            cache_for: CacheFor::None,
            hostname_strategy: strategy,
            error_handlers: vec![],
            signature_plan: vec![],
            dispatch: Dispatch::Sync,
            function: Arc::new(|_| Ok(CheckOutcome::Single(CheckResult::ok("fine")))),
        }
    }

    #[test]
    fn result_override_wins_over_everything() {
        let check = check_with_strategy(HostnameStrategy::Static("static-host".into()));
        let env = Environment::new("prod").with_hostname("env-host");
        let resolved = resolve(&check, &env, Some("override-host"), Some("engine-default"), false).unwrap();
        assert_eq!(resolved, "override-host");
    }

    #[test]
    fn static_strategy_used_when_no_override() {
        let check = check_with_strategy(HostnameStrategy::Static("static-host".into()));
        let env = Environment::new("prod").with_hostname("env-host");
        let resolved = resolve(&check, &env, None, Some("engine-default"), false).unwrap();
        assert_eq!(resolved, "static-host");
    }

    #[test]
    fn template_strategy_renders_placeholders() {
        let check = check_with_strategy(HostnameStrategy::Template("{service_name}.{environment_name}".into()));
        let env = Environment::new("prod");
        let resolved = resolve(&check, &env, None, None, false).unwrap();
        assert_eq!(resolved, "disk.prod");
    }

    #[test]
    fn unset_falls_back_to_environment_hostname() {
        let check = check_with_strategy(HostnameStrategy::Unset);
        let env = Environment::new("prod").with_hostname("env-host");
        let resolved = resolve(&check, &env, None, Some("engine-default"), false).unwrap();
        assert_eq!(resolved, "env-host");
    }

    #[test]
    fn unset_falls_back_to_engine_default_without_environment_hostname() {
        let check = check_with_strategy(HostnameStrategy::Unset);
        let env = Environment::new("prod");
        let resolved = resolve(&check, &env, None, Some("engine-default"), false).unwrap();
        assert_eq!(resolved, "engine-default");
    }

    #[test]
    fn unset_synthesizes_default_with_nothing_configured() {
        let check = check_with_strategy(HostnameStrategy::Unset);
        let env = Environment::new("prod");
        let resolved = resolve(&check, &env, None, None, false).unwrap();
        assert_eq!(resolved, "disk-prod");
    }

    #[test]
    fn empty_resolution_with_coercion_disabled_is_an_error() {
        let check = check_with_strategy(HostnameStrategy::Static(String::new()));
        let env = Environment::new("prod");
        let err = resolve(&check, &env, None, None, false).unwrap_err();
        assert!(matches!(err, WatchpostError::HostnameResolutionError { .. }));
    }

    #[test]
    fn coercion_is_applied_when_enabled() {
        let check = check_with_strategy(HostnameStrategy::Static("MY_Host!".into()));
        let env = Environment::new("prod");
        let resolved = resolve(&check, &env, None, None, true).unwrap();
        assert_eq!(resolved, "my-host");
    }
}
