//! Credit-hour ("hp") parsing and level categories.
//!
//! Course weights arrive from the scraper as short strings such as `"6"`,
//! `"7,5"` or `"8*"`. A trailing [`PARTIAL_CREDIT_MARKER`] means the course is
//! split over two periods and each half counts for half of the value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Suffix marking a course whose credits are split across two periods.
pub const PARTIAL_CREDIT_MARKER: char = '*';

/// Error returned when a credit-hour string cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid credit hours '{raw}': {reason}")]
pub struct CreditParseError {
    pub raw: String,
    pub reason: &'static str,
}

/// Parsed credit-hour value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CreditHours {
    /// Numeric weight as written (without the marker)
    pub value: f64,
    /// Whether the partial-credit marker was present
    pub partial: bool,
}

impl CreditHours {
    pub fn new(value: f64, partial: bool) -> Self {
        Self { value, partial }
    }

    /// Parse a raw credit-hour string.
    ///
    /// Accepts surrounding whitespace, a decimal comma or point, and an
    /// optional trailing partial-credit marker.
    pub fn parse(raw: &str) -> Result<Self, CreditParseError> {
        let trimmed = raw.trim();
        let (number, partial) = match trimmed.strip_suffix(PARTIAL_CREDIT_MARKER) {
            Some(rest) => (rest.trim_end(), true),
            None => (trimmed, false),
        };

        if number.is_empty() {
            return Err(CreditParseError {
                raw: raw.to_string(),
                reason: "missing numeric value",
            });
        }

        let value: f64 = number
            .replace(',', ".")
            .parse()
            .map_err(|_| CreditParseError {
                raw: raw.to_string(),
                reason: "not a number",
            })?;

        if !value.is_finite() || value < 0.0 {
            return Err(CreditParseError {
                raw: raw.to_string(),
                reason: "must be a finite, non-negative number",
            });
        }

        Ok(Self { value, partial })
    }

    /// Amount this course adds to an aggregate sum.
    pub fn contribution(&self) -> f64 {
        if self.partial {
            self.value / 2.0
        } else {
            self.value
        }
    }
}

impl FromStr for CreditHours {
    type Err = CreditParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CreditHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)?;
        if self.partial {
            write!(f, "{}", PARTIAL_CREDIT_MARKER)?;
        }
        Ok(())
    }
}

/// Whether a raw credit string carries the partial-credit marker.
pub fn is_partial_credit(raw: &str) -> bool {
    raw.trim_end().ends_with(PARTIAL_CREDIT_MARKER)
}

/// Lenient contribution used by aggregation: unparseable strings count as 0.
pub fn credit_contribution(raw: &str) -> f64 {
    match CreditHours::parse(raw) {
        Ok(credits) => credits.contribution(),
        Err(e) => {
            log::warn!("{}; counting as 0", e);
            0.0
        }
    }
}

/// Course level category derived from the level code (e.g. `A1X`, `G2F`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelCategory {
    /// Advanced level ("avancerad nivå")
    Advanced,
    /// Basic level ("grundnivå")
    Basic,
    Other,
}

impl LevelCategory {
    pub fn from_level(level: &str) -> Self {
        match level.trim().chars().next().map(|c| c.to_ascii_uppercase()) {
            Some('A') => Self::Advanced,
            Some('G') => Self::Basic,
            _ => Self::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_whole_credits() {
        let credits = CreditHours::parse("8").unwrap();
        assert_eq!(credits.value, 8.0);
        assert!(!credits.partial);
        assert_eq!(credits.contribution(), 8.0);
    }

    #[test]
    fn test_parse_partial_credits() {
        let credits = CreditHours::parse("8*").unwrap();
        assert_eq!(credits.value, 8.0);
        assert!(credits.partial);
        assert_eq!(credits.contribution(), 4.0);
    }

    #[test]
    fn test_parse_decimal_comma() {
        let credits = CreditHours::parse(" 7,5 ").unwrap();
        assert_eq!(credits.value, 7.5);
        assert_eq!(credits.to_string(), "7.5");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(CreditHours::parse("").is_err());
        assert!(CreditHours::parse("*").is_err());
        assert!(CreditHours::parse("abc").is_err());
        assert!(CreditHours::parse("-6").is_err());
    }

    #[test]
    fn test_lenient_contribution_defaults_to_zero() {
        assert_eq!(credit_contribution("n/a"), 0.0);
        assert_eq!(credit_contribution("6"), 6.0);
    }

    #[test]
    fn test_level_category() {
        assert_eq!(LevelCategory::from_level("A1X"), LevelCategory::Advanced);
        assert_eq!(LevelCategory::from_level("g2f"), LevelCategory::Basic);
        assert_eq!(LevelCategory::from_level(""), LevelCategory::Other);
        assert_eq!(LevelCategory::from_level("X"), LevelCategory::Other);
    }

    proptest! {
        #[test]
        fn prop_partial_marker_halves_contribution(value in 0u32..100) {
            let whole = CreditHours::parse(&value.to_string()).unwrap();
            let partial = CreditHours::parse(&format!("{}*", value)).unwrap();
            prop_assert_eq!(whole.contribution(), value as f64);
            prop_assert_eq!(partial.contribution() * 2.0, whole.contribution());
            prop_assert!(is_partial_credit(&partial.to_string()));
        }
    }
}
