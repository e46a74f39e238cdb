//! # Watchpost Core
//!
//! The engine that turns registered checks into a poll's worth of status
//! results, per the scheduling/caching/hostname-resolution pipeline described
//! in `engine.rs`.
//!
//! ## Pipeline
//!
//! One call to [`Engine::run_once`] walks every registered (check,
//! target_environment) pair:
//!
//! 1. [`watchpost_policy::decide`] turns a check's effective strategies into a
//!    don't-schedule/skip/schedule decision.
//! 2. A skip reads the cache (allowing an expired entry) or synthesizes an
//!    UNKNOWN result; a schedule reads a live cache entry or submits the
//!    check to the executor.
//! 3. A thrown check error runs through the check's error handlers; a
//!    normally-returned result never does, even if its state is UNKNOWN.
//! 4. Hostnames are resolved against the check/environment/engine hierarchy
//!    only after error handlers have had a chance to set `piggyback_host`
//!    explicitly.
//! 5. A successful, cacheable run is written back with the check's own TTL.
//!
//! ## Modules
//!
//! - [`engine`] — [`EngineBuilder`]/[`Engine`]: registration, scheduling,
//!   caching, and hostname resolution.
//! - [`registry`] — [`CheckRegistry`]: signature validation and effective
//!   scheduling-strategy aggregation per check.
//! - [`reporter`] — [`Reporter`]: the progress-message sink threaded through
//!   every entry point.

mod engine;
mod registry;
mod reporter;

pub use engine::{Engine, EngineBuilder, RuntimeOptions};
pub use registry::{CheckRegistry, CheckSpec, RegisteredCheck};
pub use reporter::{NoopReporter, Reporter};
