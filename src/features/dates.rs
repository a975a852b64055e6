//! Date normalization
//!
//! Box-score dates arrive as year-less strings with doubleheader and
//! suspension markers ("Apr 28 (1)", "Jul 8 susp"); pitch-level dates are
//! usually already ISO. Both are repaired into a single canonical
//! `NaiveDate`.

use chrono::NaiveDate;
use regex::Regex;

/// Parses and repairs heterogeneous raw date strings
///
/// Pure transform: returns `None` for unparseable input rather than
/// erroring. The caller decides whether to drop the row.
pub struct DateNormalizer {
    parenthetical: Regex,
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl DateNormalizer {
    pub fn new() -> Self {
        DateNormalizer {
            // Doubleheader game markers: "(1)", "(2)", or any other
            // parenthetical suffix
            parenthetical: Regex::new(r"\(.*?\)").unwrap(),
        }
    }

    /// Normalize a raw date string, using `year` to repair year-less
    /// box-score dates
    ///
    /// Idempotent on already-canonical ISO input.
    pub fn normalize(&self, raw: &str, year: i32) -> Option<NaiveDate> {
        let cleaned = self.strip_noise(raw);
        if cleaned.is_empty() {
            return None;
        }

        // Fixed priority order: ISO first (idempotence), then the two
        // box-score textual formats, then the year-repaired variants.
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, "%Y-%m-%d") {
            return Some(date);
        }
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, "%B-%d-%Y") {
            return Some(date);
        }
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, "%b %d, %Y") {
            return Some(date);
        }

        let with_year = format!("{}, {}", cleaned, year);
        if let Ok(date) = NaiveDate::parse_from_str(&with_year, "%b %d, %Y") {
            return Some(date);
        }
        if let Ok(date) = NaiveDate::parse_from_str(&with_year, "%B %d, %Y") {
            return Some(date);
        }

        None
    }

    /// Strip doubleheader markers and suspended-game suffixes
    fn strip_noise(&self, raw: &str) -> String {
        let no_parens = self.parenthetical.replace_all(raw, "");
        let truncated = match no_parens.find("susp") {
            Some(idx) => &no_parens[..idx],
            None => &no_parens,
        };
        truncated.trim().to_string()
    }
}
