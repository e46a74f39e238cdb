//! Hostname resolution hierarchy and RFC1123 coercion. Small, pure,
//! heavily-unit-tested utility functions — no shared state, no I/O.

mod coerce;
mod resolve;

pub use coerce::coerce_rfc1123;
pub use resolve::{render_template, resolve, resolve_into_result, TemplateContext};
