//! Delivery quality heuristics.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref NUMBER: Regex = Regex::new(r"\d+(?:[.,]\d+)?").unwrap();
}

/// Advisory only; a failed check never blocks delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    pub numbers_match: bool,
}

/// Numeric tokens in `text`, sorted lexicographically.
pub fn extract_numbers(text: &str) -> Vec<&str> {
    let mut numbers: Vec<&str> = NUMBER.find_iter(text).map(|m| m.as_str()).collect();
    numbers.sort_unstable();
    numbers
}

/// Compares the numbers found in source and target as sorted lists.
///
/// Reformatted numerals (for example added thousands separators) count as a
/// mismatch even when the translation is right.
pub fn run_quality_checks(source: &str, target: &str) -> QualityReport {
    QualityReport {
        numbers_match: extract_numbers(source) == extract_numbers(target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_match_regardless_of_order() {
        let report = run_quality_checks("Price: 10.50 and 3 items", "Precio: 3 y 10.50 articulos");
        assert!(report.numbers_match);
    }

    #[test]
    fn test_missing_number() {
        assert!(!run_quality_checks("5 items", "six items").numbers_match);
    }

    #[test]
    fn test_comma_decimal_is_a_different_token() {
        assert!(!run_quality_checks("10.50", "10,50").numbers_match);
        assert_eq!(extract_numbers("1,5 and 2.25"), vec!["1,5", "2.25"]);
    }

    #[test]
    fn test_duplicates_matter() {
        assert!(!run_quality_checks("3 and 3", "3").numbers_match);
    }

    #[test]
    fn test_no_numbers_on_either_side() {
        assert!(run_quality_checks("hello", "ciao").numbers_match);
    }

    #[test]
    fn test_lexicographic_sort() {
        assert_eq!(extract_numbers("100 20 3"), vec!["100", "20", "3"]);
    }
}
