use std::cmp::Ordering;
use std::fmt;

/// Checkmk service state.
///
/// Two orderings matter here and they disagree: the wire value Checkmk expects
/// on the output line (`OK=0, WARN=1, CRIT=2, UNKNOWN=3`) and the severity order
/// used when aggregating several states into one worst-of (`OK < WARN < UNKNOWN
/// < CRIT`). [`CheckState::wire_value`] gives the former; [`Ord`]/[`PartialOrd`]
/// implement the latter, so `Ord::max` over a set of states is the severity
/// aggregation rule directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckState {
    Ok,
    Warn,
    Unknown,
    Crit,
}

impl CheckState {
    /// Checkmk's wire numeric value for this state (not the severity rank).
    pub fn wire_value(self) -> u8 {
        match self {
            CheckState::Ok => 0,
            CheckState::Warn => 1,
            CheckState::Crit => 2,
            CheckState::Unknown => 3,
        }
    }

    /// Severity rank used for aggregation; higher is worse.
    fn severity_rank(self) -> u8 {
        match self {
            CheckState::Ok => 0,
            CheckState::Warn => 1,
            CheckState::Unknown => 2,
            CheckState::Crit => 3,
        }
    }
}

impl PartialOrd for CheckState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CheckState {
    fn cmp(&self, other: &Self) -> Ordering {
        self.severity_rank().cmp(&other.severity_rank())
    }
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CheckState::Ok => "OK",
            CheckState::Warn => "WARN",
            CheckState::Crit => "CRIT",
            CheckState::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}
