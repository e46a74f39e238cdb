//! HTTP adapter over [`watchpost_core::Engine`] — the four routes described in
//! the external interfaces contract (`GET /`, `/healthcheck`,
//! `/executor/statistics`, `/executor/errored`). No logic beyond calling the
//! engine and templating its output, the same thin-adapter role
//! `dashflow-observability::metrics_server` plays over its own registry.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;
use watchpost_core::{Engine, Reporter, RuntimeOptions};

/// Shared state handed to every handler: the engine plus the execution
/// environment this process identifies as (fed into every [`RuntimeOptions`]).
#[derive(Clone)]
struct AppState {
    engine: Arc<Engine>,
    execution_env: String,
}

/// Build the router. `execution_env` is the value every request's
/// [`RuntimeOptions::execution_env`] is built from — the HTTP surface has no
/// per-request override, unlike the CLI's flags.
pub fn router(engine: Arc<Engine>, execution_env: impl Into<String>) -> Router {
    let state = AppState { engine, execution_env: execution_env.into() };

    Router::new()
        .route("/", get(feed_handler))
        .route("/healthcheck", get(healthcheck_handler))
        .route("/executor/statistics", get(statistics_handler))
        .route("/executor/errored", get(errored_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve `router` until the process is killed.
pub async fn serve(router: Router, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

/// `GET /` — one full poll, rendered to the Checkmk piggyback wire format.
/// Always 200; a failed check is encoded in the body as an UNKNOWN result, not
/// as an HTTP error.
async fn feed_handler(State(state): State<AppState>) -> Response {
    let opts = RuntimeOptions::new(state.execution_env.clone());
    let mut reporter = EprintlnReporter;
    match state.engine.run_once(&opts, &mut reporter) {
        Ok(results) => {
            let body = watchpost_output::render(&results);
            ([(header::CONTENT_TYPE, "text/plain")], body).into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn healthcheck_handler() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn statistics_handler(State(state): State<AppState>) -> Response {
    let stats = state.engine.executor_statistics();
    axum::Json(stats).into_response()
}

async fn errored_handler(State(state): State<AppState>) -> Response {
    let errored = state.engine.executor_errored();
    axum::Json(errored).into_response()
}

/// Logs to stderr; used where no caller-supplied [`Reporter`] makes sense
/// (one poll per request, not a long-lived CLI invocation).
struct EprintlnReporter;

impl Reporter for EprintlnReporter {
    fn info(&mut self, msg: &str) {
        eprintln!("info: {msg}");
    }

    fn warn(&mut self, msg: &str) {
        eprintln!("warn: {msg}");
    }

    fn error(&mut self, msg: &str) {
        eprintln!("error: {msg}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchpost_core::EngineBuilder;

    fn empty_engine() -> Arc<Engine> {
        Arc::new(EngineBuilder::new().build().unwrap())
    }

    #[tokio::test]
    async fn feed_handler_renders_empty_poll_as_empty_body() {
        let state = AppState { engine: empty_engine(), execution_env: "prod".to_string() };
        let response = feed_handler(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn healthcheck_returns_no_content() {
        assert_eq!(healthcheck_handler().await, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn statistics_handler_returns_zeroed_snapshot_for_idle_engine() {
        let state = AppState { engine: empty_engine(), execution_env: "prod".to_string() };
        let response = statistics_handler(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn router_builds_without_panicking() {
        let _ = router(empty_engine(), "prod");
    }
}
