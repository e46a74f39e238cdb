use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::metric::Metric;
use crate::state::CheckState;

/// Sentinel `piggyback_host` for a result that isn't routed to any host.
pub const NO_PIGGYBACK: &str = "no-piggyback";

/// The `details` payload a check can hand back, before the engine renders it
/// to the final string carried by [`ExecutionResult`].
#[derive(Debug, Clone, PartialEq)]
pub enum Details {
    Text(String),
    Mapping(BTreeMap<String, String>),
    Error(String),
}

impl Details {
    /// Render to the flat string `ExecutionResult::details` carries.
    pub fn render(&self) -> String {
        match self {
            Details::Text(s) => s.clone(),
            Details::Error(s) => s.clone(),
            Details::Mapping(m) => m
                .iter()
                .map(|(k, v)| format!("{k}: {v}"))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// What a check function (or its [`crate::builder::ResultBuilder`]) hands back
/// to the engine, before dependency-free fields like `piggyback_host` are
/// resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub state: CheckState,
    pub summary: String,
    pub details: Option<Details>,
    pub name_suffix: Option<String>,
    pub hostname_override: Option<String>,
    pub metrics: Vec<Metric>,
}

impl CheckResult {
    pub fn new(state: CheckState, summary: impl Into<String>) -> Self {
        Self {
            state,
            summary: summary.into(),
            details: None,
            name_suffix: None,
            hostname_override: None,
            metrics: Vec::new(),
        }
    }

    pub fn ok(summary: impl Into<String>) -> Self {
        Self::new(CheckState::Ok, summary)
    }

    pub fn warn(summary: impl Into<String>) -> Self {
        Self::new(CheckState::Warn, summary)
    }

    pub fn crit(summary: impl Into<String>) -> Self {
        Self::new(CheckState::Crit, summary)
    }

    pub fn unknown(summary: impl Into<String>) -> Self {
        Self::new(CheckState::Unknown, summary)
    }

    pub fn with_details(mut self, details: Details) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_name_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.name_suffix = Some(suffix.into());
        self
    }

    pub fn with_hostname_override(mut self, hostname: impl Into<String>) -> Self {
        self.hostname_override = Some(hostname.into());
        self
    }

    pub fn with_metrics(mut self, metrics: Vec<Metric>) -> Self {
        self.metrics = metrics;
        self
    }
}

/// The engine-internal, fully resolved record streamed to the output
/// formatter. Unlike [`CheckResult`], every field here has already been
/// settled: the piggyback host is resolved, labels are carried explicitly,
/// and `details` is a plain rendered string (error tracebacks included).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub piggyback_host: String,
    pub service_name: String,
    pub service_labels: BTreeMap<String, String>,
    pub environment_name: String,
    pub state: CheckState,
    pub summary: String,
    pub details: String,
    pub metrics: Vec<Metric>,
    /// Stable id of the check descriptor this result came from.
    pub check_id: String,
}

impl ExecutionResult {
    pub fn is_well_formed(&self) -> bool {
        !self.service_name.is_empty() && !self.piggyback_host.is_empty()
    }
}

// CheckState needs Serialize/Deserialize for ExecutionResult's derive to work.
impl Serialize for CheckState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.wire_value())
    }
}

impl<'de> Deserialize<'de> for CheckState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let v = u8::deserialize(deserializer)?;
        match v {
            0 => Ok(CheckState::Ok),
            1 => Ok(CheckState::Warn),
            2 => Ok(CheckState::Crit),
            3 => Ok(CheckState::Unknown),
            other => Err(serde::de::Error::custom(format!(
                "invalid CheckState wire value: {other}"
            ))),
        }
    }
}
