//! Search-term normalization and query parsing.
//!
//! Free-text lookup goes through a persisted term index; this module owns
//! the text side of it: turning raw words into normalized tokens and
//! splitting a query string into clauses the index can evaluate.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize one word for term matching: Unicode canonical decomposition,
/// drop combining marks, lowercase. Idempotent.
pub fn normalize(word: &str) -> String {
    word.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Split free text on whitespace and normalize every token.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(normalize).collect()
}

/// One parsed query clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub word: String,
    /// Leading `-`: subtract matches instead of intersecting them.
    pub negated: bool,
    /// Wrapped in double quotes: match the term by equality, not substring.
    pub exact: bool,
}

/// Parse a query string into clauses.
///
/// Grammar: whitespace-separated words; a leading `-` negates, surrounding
/// double quotes force an exact term match, and the two combine as
/// `-"word"`. The word is normalized after both markers are stripped.
pub fn parse_query(query: &str) -> Vec<Clause> {
    query
        .split_whitespace()
        .map(|raw| {
            let (negated, raw) = match raw.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, raw),
            };
            let (exact, raw) = match raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
                Some(inner) => (true, inner),
                None => (false, raw),
            };
            Clause {
                word: normalize(raw),
                negated,
                exact,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_diacritics() {
        assert_eq!(normalize("Rezistór"), "rezistor");
        assert_eq!(normalize("kondenzátor"), "kondenzator");
        assert_eq!(normalize("Müller"), "muller");
    }

    #[test]
    fn test_normalize_lowercases() {
        assert_eq!(normalize("YAGEO"), "yageo");
        assert_eq!(normalize("0805"), "0805");
    }

    #[test]
    fn test_normalize_idempotent() {
        for s in ["Rezistór", "10k", "ŘEŠENÍ", "plain", ""] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_tokenize_splits_on_whitespace() {
        assert_eq!(
            tokenize("10k  Rezistór\tSMD"),
            vec!["10k", "rezistor", "smd"]
        );
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_parse_query_plain() {
        let clauses = parse_query("resistor 10k");
        assert_eq!(
            clauses,
            vec![
                Clause {
                    word: "resistor".into(),
                    negated: false,
                    exact: false
                },
                Clause {
                    word: "10k".into(),
                    negated: false,
                    exact: false
                },
            ]
        );
    }

    #[test]
    fn test_parse_query_negated() {
        let clauses = parse_query("resistor -smd");
        assert!(!clauses[0].negated);
        assert!(clauses[1].negated);
        assert_eq!(clauses[1].word, "smd");
    }

    #[test]
    fn test_parse_query_exact() {
        let clauses = parse_query("\"0805\"");
        assert_eq!(clauses.len(), 1);
        assert!(clauses[0].exact);
        assert_eq!(clauses[0].word, "0805");
    }

    #[test]
    fn test_parse_query_negated_exact() {
        let clauses = parse_query("-\"SMD\"");
        assert_eq!(clauses.len(), 1);
        assert!(clauses[0].negated);
        assert!(clauses[0].exact);
        assert_eq!(clauses[0].word, "smd");
    }

    #[test]
    fn test_parse_query_normalizes_words() {
        let clauses = parse_query("Rezistór");
        assert_eq!(clauses[0].word, "rezistor");
    }

    #[test]
    fn test_parse_query_empty() {
        assert!(parse_query("").is_empty());
        assert!(parse_query("   ").is_empty());
    }
}
