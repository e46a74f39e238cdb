use crate::metric::Metric;
use crate::result::CheckResult;
use crate::state::CheckState;

struct Call {
    state: CheckState,
    message: String,
}

/// Accumulates `.ok()`/`.warn()`/`.crit()`/`.unknown()` calls and folds them
/// into one [`CheckResult`] on [`ResultBuilder::finish`].
///
/// The final state is the severity-maximum over every call made (not the
/// numeric/wire-value maximum — see [`CheckState`]). The summary is
/// `ok_summary` when that state is OK, else `fail_summary`. Details are the
/// optional base details followed by a bulleted list of every non-OK message;
/// OK messages only contribute to the details when no non-OK message exists.
/// Folding is idempotent: recording the same call twice never changes the
/// finalized state.
pub struct ResultBuilder {
    ok_summary: String,
    fail_summary: String,
    base_details: Option<String>,
    calls: Vec<Call>,
    metrics: Vec<Metric>,
    name_suffix: Option<String>,
    hostname_override: Option<String>,
}

impl ResultBuilder {
    pub fn new(ok_summary: impl Into<String>, fail_summary: impl Into<String>) -> Self {
        Self {
            ok_summary: ok_summary.into(),
            fail_summary: fail_summary.into(),
            base_details: None,
            calls: Vec::new(),
            metrics: Vec::new(),
            name_suffix: None,
            hostname_override: None,
        }
    }

    pub fn with_base_details(mut self, details: impl Into<String>) -> Self {
        self.base_details = Some(details.into());
        self
    }

    pub fn ok(&mut self, message: impl Into<String>) -> &mut Self {
        self.record(CheckState::Ok, message)
    }

    pub fn warn(&mut self, message: impl Into<String>) -> &mut Self {
        self.record(CheckState::Warn, message)
    }

    pub fn crit(&mut self, message: impl Into<String>) -> &mut Self {
        self.record(CheckState::Crit, message)
    }

    pub fn unknown(&mut self, message: impl Into<String>) -> &mut Self {
        self.record(CheckState::Unknown, message)
    }

    fn record(&mut self, state: CheckState, message: impl Into<String>) -> &mut Self {
        self.calls.push(Call {
            state,
            message: message.into(),
        });
        self
    }

    pub fn metric(&mut self, metric: Metric) -> &mut Self {
        self.metrics.push(metric);
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

    /// The severity-maximum over all recorded calls, defaulting to OK when
    /// nothing was recorded.
    pub fn state(&self) -> CheckState {
        self.calls
            .iter()
            .map(|c| c.state)
            .max()
            .unwrap_or(CheckState::Ok)
    }

    pub fn finish(self) -> CheckResult {
        let state = self.state();
        let summary = if state == CheckState::Ok {
            self.ok_summary.clone()
        } else {
            self.fail_summary.clone()
        };

        let non_ok: Vec<&Call> = self.calls.iter().filter(|c| c.state != CheckState::Ok).collect();
        let bullets: Vec<&Call> = if non_ok.is_empty() {
            self.calls.iter().collect()
        } else {
            non_ok
        };

        let mut details = String::new();
        if let Some(base) = &self.base_details {
            details.push_str(base);
        }
        for call in bullets {
            if !details.is_empty() {
                details.push('\n');
            }
            details.push_str(&format!("- [{}] {}", call.state, call.message));
        }

        let mut result = CheckResult::new(state, summary).with_metrics(self.metrics);
        if !details.is_empty() {
            result = result.with_details(crate::result::Details::Text(details));
        }
        if let Some(suffix) = self.name_suffix {
            result = result.with_name_suffix(suffix);
        }
        if let Some(hostname) = self.hostname_override {
            result = result.with_hostname_override(hostname);
        }
        result
    }
}
