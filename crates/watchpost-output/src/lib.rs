//! Renders a poll's [`ExecutionResult`]s into the Checkmk local-check
//! piggyback wire format. A thin adapter over a precisely specified wire
//! format: no logic beyond templating what the engine already computed.

use watchpost_types::{ExecutionResult, NO_PIGGYBACK};

/// Render `results` (already in emission order) grouped by `piggyback_host`,
/// preserving the first-seen order of each host. The `"no-piggyback"`
/// sentinel omits the `<<<<host>>>>` / `<<<<>>>>` framing.
pub fn render(results: &[ExecutionResult]) -> String {
    let mut host_order: Vec<&str> = Vec::new();
    let mut groups: Vec<(&str, Vec<&ExecutionResult>)> = Vec::new();

    for result in results {
        let host = result.piggyback_host.as_str();
        match host_order.iter().position(|h| *h == host) {
            Some(idx) => groups[idx].1.push(result),
            None => {
                host_order.push(host);
                groups.push((host, vec![result]));
            }
        }
    }

    let mut out = String::new();
    for (host, items) in groups {
        let piggybacked = host != NO_PIGGYBACK;
        if piggybacked {
            out.push_str("<<<<");
            out.push_str(host);
            out.push_str(">>>>\n");
        }
        out.push_str("<<<local:sep(0)>>>\n");
        for result in items {
            out.push_str(&render_line(result));
        }
        if piggybacked {
            out.push_str("<<<<>>>>\n");
        }
    }
    out
}

fn render_line(result: &ExecutionResult) -> String {
    let metrics_or_hyphen = if result.metrics.is_empty() {
        "-".to_string()
    } else {
        result.metrics.iter().map(|m| m.to_perfdata()).collect::<Vec<_>>().join("|")
    };

    format!(
        "{} \"{}\" {} {}\n{}\n",
        result.state.wire_value(),
        result.service_name,
        metrics_or_hyphen,
        result.summary,
        result.details,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchpost_types::{CheckState, Metric};

    fn result(piggyback_host: &str, service_name: &str, state: CheckState) -> ExecutionResult {
        ExecutionResult {
            piggyback_host: piggyback_host.to_string(),
            service_name: service_name.to_string(),
            service_labels: Default::default(),
            environment_name: "prod".to_string(),
            state,
            summary: "summary text".to_string(),
            details: "detail text".to_string(),
            metrics: vec![],
            check_id: "m.check".to_string(),
        }
    }

    #[test]
    fn renders_piggyback_framing_for_named_host() {
        let rendered = render(&[result("host-a", "svc", CheckState::Ok)]);
        assert!(rendered.starts_with("<<<<host-a>>>>\n<<<local:sep(0)>>>\n"));
        assert!(rendered.trim_end().ends_with("<<<<>>>>"));
        assert!(rendered.contains("0 \"svc\" - summary text\ndetail text\n"));
    }

    #[test]
    fn omits_framing_for_no_piggyback_sentinel() {
        let rendered = render(&[result(NO_PIGGYBACK, "svc", CheckState::Crit)]);
        assert!(!rendered.contains("<<<<"));
        assert!(rendered.starts_with("<<<local:sep(0)>>>\n"));
        assert!(rendered.contains("2 \"svc\" - summary text\n"));
    }

    #[test]
    fn groups_multiple_results_under_one_host_block() {
        let results = vec![
            result("host-a", "svc1", CheckState::Ok),
            result("host-a", "svc2", CheckState::Warn),
        ];
        let rendered = render(&results);
        assert_eq!(rendered.matches("<<<<host-a>>>>").count(), 1);
        assert_eq!(rendered.matches("<<<local:sep(0)>>>").count(), 1);
        assert!(rendered.contains("\"svc1\""));
        assert!(rendered.contains("\"svc2\""));
    }

    #[test]
    fn preserves_first_seen_host_order() {
        let results = vec![
            result("host-b", "svc", CheckState::Ok),
            result("host-a", "svc", CheckState::Ok),
            result("host-b", "svc2", CheckState::Ok),
        ];
        let rendered = render(&results);
        let b_pos = rendered.find("<<<<host-b>>>>").unwrap();
        let a_pos = rendered.find("<<<<host-a>>>>").unwrap();
        assert!(b_pos < a_pos);
    }

    #[test]
    fn renders_metrics_as_perfdata() {
        let mut r = result("host-a", "svc", CheckState::Ok);
        r.metrics = vec![Metric::new("latency", 12.5).with_unit("ms")];
        let rendered = render(&[r]);
        assert!(rendered.contains("latency=12.5ms"));
    }

    #[test]
    fn empty_result_list_renders_empty_string() {
        assert_eq!(render(&[]), "");
    }
}
