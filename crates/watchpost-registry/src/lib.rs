//! Datasource registration and dependency injection. Check callables declare
//! their required parameters via [`SignatureBuilder`] at registration time;
//! [`resolve`] walks the resulting plan at execution time to produce the
//! positional arguments the callable expects.

mod registry;
mod signature;

pub use registry::DatasourceRegistry;
pub use signature::{resolve, SignatureBuilder};
