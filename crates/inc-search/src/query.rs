//! FTS5 `MATCH` expression construction.

use std::collections::HashSet;

const SEVERITY_LEVELS: [&str; 3] = ["sev1", "sev2", "sev3"];
const SEVERITY_TERMS: [&str; 4] = ["sev", "severity", "rubric", "policy"];

/// Lower-cased `[A-Za-z0-9_]+` runs of `text`.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Whether the query asks about severity classification.
fn mentions_severity(lower: &str) -> bool {
    SEVERITY_LEVELS.iter().any(|lvl| lower.contains(lvl))
        || lower.contains("severity")
        || lower.contains("rubric")
}

/// Boost tags use underscores where the corpus tags do (`checkout-api` -> `checkout_api`).
fn boost_terms(tag: Option<&str>) -> Vec<String> {
    tag.map(|t| tokenize(&t.replace('-', "_"))).unwrap_or_default()
}

fn quoted(terms: &[String], sep: &str) -> String {
    terms
        .iter()
        .map(|t| format!("\"{t}\""))
        .collect::<Vec<_>>()
        .join(sep)
}

/// Build a safe FTS5 expression from free text plus optional boosts.
///
/// Query words must all match (implicit AND). A severity question is
/// rewritten to an OR over the rubric vocabulary. Boost tags are OR-ed
/// around the base expression so they widen the result set without
/// narrowing it.
///
/// Returns `None` when the text has no word tokens; the caller treats that
/// as an empty result rather than an error.
#[must_use]
pub fn build_match_query(
    text: &str,
    incident_type: Option<&str>,
    service: Option<&str>,
) -> Option<String> {
    let lower = text.to_lowercase();
    let mut seen = HashSet::new();
    let (terms, sep) = if mentions_severity(&lower) {
        let terms: Vec<String> = SEVERITY_TERMS
            .iter()
            .chain(SEVERITY_LEVELS.iter().filter(|lvl| lower.contains(*lvl)))
            .map(|t| (*t).to_string())
            .collect();
        (terms, " OR ")
    } else {
        (tokenize(text), " ")
    };
    let terms: Vec<String> = terms.into_iter().filter(|t| seen.insert(t.clone())).collect();
    if terms.is_empty() {
        return None;
    }
    let base = quoted(&terms, sep);

    let boosts: Vec<String> = boost_terms(incident_type)
        .into_iter()
        .chain(boost_terms(service))
        .filter(|t| seen.insert(t.clone()))
        .collect();
    if boosts.is_empty() {
        return Some(base);
    }
    Some(format!("({base}) OR {}", quoted(&boosts, " OR ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn tokens_are_lowercased_words() {
        assert_eq!(
            tokenize("Gateway TIMEOUT: checkout_api (v2)!"),
            vec!["gateway", "timeout", "checkout_api", "v2"]
        );
    }

    #[test]
    fn operators_in_user_text_are_quoted() {
        assert_eq!(
            build_match_query("timeout NEAR(gateway) -deploy", None, None).as_deref(),
            Some("\"timeout\" \"near\" \"gateway\" \"deploy\"")
        );
    }

    #[test]
    fn query_words_are_all_required() {
        assert_eq!(
            build_match_query("Gateway gateway timeout", None, None).as_deref(),
            Some("\"gateway\" \"timeout\"")
        );
    }

    #[rstest]
    #[case("what is SEV1?", "\"sev\" OR \"severity\" OR \"rubric\" OR \"policy\" OR \"sev1\"")]
    #[case("severity rubric", "\"sev\" OR \"severity\" OR \"rubric\" OR \"policy\"")]
    #[case("sev2 vs sev3", "\"sev\" OR \"severity\" OR \"rubric\" OR \"policy\" OR \"sev2\" OR \"sev3\"")]
    fn severity_rewrite(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(build_match_query(text, None, None).as_deref(), Some(expected));
    }

    #[test]
    fn boosts_are_or_ed_around_the_words() {
        assert_eq!(
            build_match_query("gateway timeout", Some("payments_failing"), Some("checkout-api"))
                .as_deref(),
            Some("(\"gateway\" \"timeout\") OR \"payments_failing\" OR \"checkout_api\"")
        );
        assert_eq!(
            build_match_query("gateway", Some("gateway"), None).as_deref(),
            Some("\"gateway\"")
        );
    }

    #[rstest]
    #[case("?!")]
    #[case("--- ...")]
    fn punctuation_only_has_no_query(#[case] text: &str) {
        assert_eq!(build_match_query(text, Some("payments_failing"), None), None);
    }
}
