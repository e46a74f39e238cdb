use unicode_normalization::UnicodeNormalization;

const MAX_LABEL_LEN: usize = 63;
const MAX_TOTAL_LEN: usize = 253;

/// Coerce an arbitrary string into an RFC1123-safe hostname: lowercased,
/// transliterated to ASCII (NFKD, combining marks stripped), anything
/// outside `[a-z0-9-.]` replaced with `-`, each label trimmed of leading and
/// trailing `-` and capped at 63 characters, empty labels dropped, total
/// length capped at 253.
pub fn coerce_rfc1123(input: &str) -> String {
    let lowered = input.to_lowercase();

    let ascii_folded: String = lowered
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    let sanitized: String = ascii_folded
        .chars()
        .map(|c| if is_rfc1123_safe(c) { c } else { '-' })
        .collect();

    let labels: Vec<String> = sanitized
        .split('.')
        .map(trim_and_cap_label)
        .filter(|label| !label.is_empty())
        .collect();

    let mut result = labels.join(".");
    if result.len() > MAX_TOTAL_LEN {
        result.truncate(MAX_TOTAL_LEN);
        // Truncation may leave a trailing '.' or '-'; trim it so the result
        // stays a well-formed label boundary.
        while result.ends_with('.') || result.ends_with('-') {
            result.pop();
        }
    }

    result
}

fn is_rfc1123_safe(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.'
}

fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F)
}

fn trim_and_cap_label(label: &str) -> String {
    let trimmed = label.trim_matches('-');
    if trimmed.len() > MAX_LABEL_LEN {
        trimmed[..MAX_LABEL_LEN].trim_end_matches('-').to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_keeps_safe_characters() {
        assert_eq!(coerce_rfc1123("My-Host.example.com"), "my-host.example.com");
    }

    #[test]
    fn replaces_unsafe_characters_with_hyphen() {
        // Trailing hyphens produced by the substitution are trimmed per label.
        assert_eq!(coerce_rfc1123("host_name!@#.com"), "host-name.com");
    }

    #[test]
    fn strips_combining_marks_from_accented_text() {
        assert_eq!(coerce_rfc1123("café"), "cafe");
    }

    #[test]
    fn trims_leading_and_trailing_hyphens_per_label() {
        assert_eq!(coerce_rfc1123("-host-.-example-"), "host.example");
    }

    #[test]
    fn drops_empty_labels() {
        assert_eq!(coerce_rfc1123("a..b"), "a.b");
    }

    #[test]
    fn caps_label_length_at_63() {
        let long_label = "a".repeat(100);
        let coerced = coerce_rfc1123(&long_label);
        assert_eq!(coerced.len(), 63);
    }

    #[test]
    fn caps_total_length_at_253() {
        let long_host = (0..10).map(|_| "a".repeat(30)).collect::<Vec<_>>().join(".");
        let coerced = coerce_rfc1123(&long_host);
        assert!(coerced.len() <= 253);
    }

    #[test]
    fn purely_unsafe_input_coerces_to_empty() {
        // Every character maps to '-', which is then trimmed from the label.
        assert_eq!(coerce_rfc1123("!!!"), "");
    }

    #[test]
    fn coercion_is_idempotent() {
        let input = "Some Host_Name™ 2.Example.COM";
        let once = coerce_rfc1123(input);
        let twice = coerce_rfc1123(&once);
        assert_eq!(once, twice);
    }

    proptest::proptest! {
        #[test]
        fn coercion_is_idempotent_for_arbitrary_strings(s in ".*") {
            let once = coerce_rfc1123(&s);
            let twice = coerce_rfc1123(&once);
            proptest::prop_assert_eq!(once, twice);
        }
    }
}
