//! Domain types shared across the watchpost workspace: result model,
//! check descriptors, scheduling decisions, cache entries, and the error
//! taxonomy callers are expected to match on.

pub mod builder;
pub mod cache_entry;
pub mod check;
pub mod environment;
pub mod error;
pub mod metric;
pub mod result;
pub mod scheduling;
pub mod state;
pub mod stats;

pub use builder::ResultBuilder;
pub use cache_entry::CacheEntry;
pub use check::{
    Check, CheckFn, CheckOutcome, Dispatch, CacheFor, ErrorHandler, HostnameStrategy, ParamBinding,
    ResolvedArgs, SchedulingStrategy, SignaturePlan,
};
pub use environment::{Environment, EnvironmentRegistry};
pub use error::{ConfigurationErrors, WatchpostError};
pub use metric::{Boundaries, Metric, Thresholds};
pub use result::{CheckResult, Details, ExecutionResult, NO_PIGGYBACK};
pub use scheduling::SchedulingDecision;
pub use state::CheckState;
pub use stats::{EngineStatistics, ErroredEntry};
