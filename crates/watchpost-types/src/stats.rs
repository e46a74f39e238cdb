use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rolling snapshot of executor activity, served at `/executor/statistics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatistics {
    pub running: u64,
    pub completed: u64,
    pub errored: u64,
}

/// One entry in the executor's bounded errored-work buffer, served at
/// `/executor/errored`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErroredEntry {
    pub key: String,
    pub error: String,
    #[serde(rename = "at")]
    pub occurred_at: DateTime<Utc>,
}

impl ErroredEntry {
    pub fn new(key: impl Into<String>, error: impl Into<String>, occurred_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            error: error.into(),
            occurred_at,
        }
    }
}
