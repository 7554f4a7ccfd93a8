//! Expected status code patterns such as `20*` or `4*4`
//!
//! A `*` stands for one or more digits. The pattern is anchored at both
//! ends, so `20*` accepts `200` and `204` but never `1200`.

use regex::Regex;
use std::fmt;

/// Compiled form of an `expected_http_code` pattern
#[derive(Debug, Clone)]
pub struct StatusPattern {
    raw: String,
    regex: Regex,
}

impl StatusPattern {
    /// Default pattern when a monitor declares none
    pub const DEFAULT: &'static str = "20*";

    /// Compile a pattern. Everything but `*` is matched literally.
    pub fn new(pattern: &str) -> std::result::Result<Self, regex::Error> {
        let translated = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("[0-9]+");
        let regex = Regex::new(&format!("^{}$", translated))?;

        Ok(Self {
            raw: pattern.to_string(),
            regex,
        })
    }

    /// Check an observed code against the pattern using its decimal form
    pub fn matches<C: fmt::Display>(&self, code: C) -> bool {
        self.regex.is_match(&code.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for StatusPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// One-shot match of `code` against `pattern`. Never fails: a pattern that
/// cannot be compiled simply matches nothing.
pub fn status_matches<C: fmt::Display>(code: C, pattern: &str) -> bool {
    StatusPattern::new(pattern)
        .map(|compiled| compiled.matches(code))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_wildcard_patterns() {
        assert!(status_matches(200, "20*"));
        assert!(status_matches(201, "20*"));
        assert!(!status_matches(404, "20*"));
        assert!(status_matches(404, "4*4"));
        assert!(!status_matches(4, "4*4"));
        assert!(status_matches(302, "3*"));
    }

    #[test]
    fn test_exact_patterns() {
        assert!(status_matches(200, "200"));
        assert!(!status_matches(2000, "200"));
        assert!(!status_matches(20, "200"));
    }

    #[test]
    fn test_match_is_anchored() {
        assert!(!status_matches(1200, "20*"));
        assert!(!status_matches(5003, "500"));
    }

    #[test]
    fn test_literal_characters_are_escaped() {
        // '.' must not behave like a regex wildcard
        assert!(!status_matches(200, "2.0"));
        assert!(status_matches("2.0", "2.0"));
    }

    #[test]
    fn test_string_codes() {
        assert!(status_matches("503", "5*"));
        assert!(!status_matches("abc", "*"));
    }

    #[test]
    fn test_compiled_pattern_display() {
        let pattern = StatusPattern::new(StatusPattern::DEFAULT).unwrap();
        assert_eq!(pattern.to_string(), "20*");
        assert_eq!(pattern.as_str(), "20*");
        assert!(pattern.matches(204u16));
    }

    fn pattern_strategy() -> impl Strategy<Value = Vec<Option<u8>>> {
        prop::collection::vec(prop::option::of(0u8..10), 1..5)
    }

    proptest! {
        #[test]
        fn test_digit_only_patterns_require_equality(code in 0u32..100_000, other in 0u32..100_000) {
            let pattern = other.to_string();
            prop_assert_eq!(status_matches(code, &pattern), code == other);
        }

        #[test]
        fn test_filled_wildcards_always_match(
            pattern in pattern_strategy(),
            fill in prop::collection::vec("[0-9]{1,3}", 5),
        ) {
            let raw: String = pattern
                .iter()
                .map(|slot| slot.map(|d| d.to_string()).unwrap_or_else(|| "*".to_string()))
                .collect();
            let code: String = pattern
                .iter()
                .zip(fill.iter())
                .map(|(slot, digits)| slot.map(|d| d.to_string()).unwrap_or_else(|| digits.clone()))
                .collect();

            prop_assert!(status_matches(&code, &raw));
        }

        #[test]
        fn test_changed_literal_digit_never_matches(
            pattern in pattern_strategy(),
            position in 0usize..5,
        ) {
            let slots: Vec<u8> = pattern.iter().map(|slot| slot.unwrap_or(0)).collect();
            let position = position % slots.len();
            prop_assume!(pattern[position].is_some());

            let raw: String = pattern
                .iter()
                .map(|slot| slot.map(|d| d.to_string()).unwrap_or_else(|| "*".to_string()))
                .collect();
            let code: String = slots
                .iter()
                .enumerate()
                .map(|(i, d)| if i == position { ((d + 1) % 10).to_string() } else { d.to_string() })
                .collect();

            prop_assert!(!status_matches(&code, &raw));
        }
    }
}
