/// Decision a scheduling strategy hands back for one (check, execution_env,
/// target_env) triple. Declaration order is the total order required —
/// `SCHEDULE < SKIP < DONT_SCHEDULE`, "strictest wins" — so aggregating
/// several decisions is exactly `Ord::max` over this enum, without a
/// separate comparison function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SchedulingDecision {
    Schedule,
    Skip,
    DontSchedule,
}

impl SchedulingDecision {
    /// Fold a set of per-strategy decisions into one effective decision.
    /// Empty input defaults to `Schedule` (no strategy opposed running it).
    pub fn aggregate(decisions: impl IntoIterator<Item = SchedulingDecision>) -> SchedulingDecision {
        decisions.into_iter().max().unwrap_or(SchedulingDecision::Schedule)
    }
}
