//! Judge response interpretation
//!
//! The judge is asked for a bare integer but answers in free text, so the
//! score is pulled out of the raw reply with a pattern match. The first
//! standalone run of 1-3 digits wins, even when a later number was meant
//! ("87/100" yields 87).

use once_cell::sync::Lazy;
use regex::Regex;

/// Lowest valid judged score
pub const MIN_SCORE: u32 = 1;

/// Highest valid judged score
pub const MAX_SCORE: u32 = 100;

/// Sentinel for "no score found"; distinct from the minimum valid score
pub const NO_SCORE: u32 = 0;

static SCORE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[0-9]{1,3}\b").expect("score pattern is valid"));

/// Extract the first 1-3 digit run from `raw` and clamp it to `[1, 100]`.
///
/// Returns [`NO_SCORE`] when no digit run is present.
pub fn parse_score(raw: &str) -> u32 {
    SCORE_PATTERN
        .find(raw)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map(|value| value.clamp(MIN_SCORE, MAX_SCORE))
        .unwrap_or(NO_SCORE)
}

/// Normalize a numeric score reported by a judge endpoint.
///
/// Non-positive values are treated as the sentinel; anything else is clamped.
pub fn normalize_output(value: i64) -> u32 {
    if value < i64::from(MIN_SCORE) {
        NO_SCORE
    } else {
        value.min(i64::from(MAX_SCORE)) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_integer() {
        assert_eq!(parse_score("42"), 42);
        assert_eq!(parse_score("  7\n"), 7);
    }

    #[test]
    fn test_first_run_wins() {
        assert_eq!(parse_score("Score: 87/100 great job"), 87);
        assert_eq!(parse_score("I'd say 12, maybe 90"), 12);
    }

    #[test]
    fn test_clamped_to_range() {
        assert_eq!(parse_score("0"), 1);
        assert_eq!(parse_score("000"), 1);
        assert_eq!(parse_score("100"), 100);
        assert_eq!(parse_score("250"), 100);
        assert_eq!(parse_score("999 points"), 100);
    }

    #[test]
    fn test_no_digits_is_sentinel() {
        assert_eq!(parse_score(""), NO_SCORE);
        assert_eq!(parse_score("I cannot score this drawing."), NO_SCORE);
    }

    #[test]
    fn test_runs_longer_than_three_digits_do_not_match() {
        assert_eq!(parse_score("1234"), NO_SCORE);
        assert_eq!(parse_score("1234 or 56"), 56);
    }

    #[test]
    fn test_digits_glued_to_letters_do_not_match() {
        assert_eq!(parse_score("abc87"), NO_SCORE);
        assert_eq!(parse_score("v2 says 64"), 64);
    }

    #[test]
    fn test_clamp_law_over_all_three_digit_values() {
        for d in 0..1000u32 {
            let raw = format!("score {} of 100", d);
            assert_eq!(parse_score(&raw), d.clamp(1, 100), "raw = {}", raw);
        }
    }

    #[test]
    fn test_normalize_output() {
        assert_eq!(normalize_output(-5), NO_SCORE);
        assert_eq!(normalize_output(0), NO_SCORE);
        assert_eq!(normalize_output(1), 1);
        assert_eq!(normalize_output(55), 55);
        assert_eq!(normalize_output(1_000), 100);
    }
}
