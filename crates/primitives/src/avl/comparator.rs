//! Per-component key ordering.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Ordering of one component of a composite key.
///
/// A tree is built with one comparator per key component; components are
/// compared left to right and the first non-equal result decides.
pub trait KeyComparator: Send + Sync {
    /// Compare two components.
    fn compare(&self, a: &str, b: &str) -> Ordering;
}

/// Byte-wise string order
#[derive(Debug, Default, Clone, Copy)]
pub struct Lexicographic;

impl KeyComparator for Lexicographic {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        a.cmp(b)
    }
}

/// Smallest integer first
///
/// Components are parsed as `i64`. Integers sort before anything that does
/// not parse, and unparseable components fall back to byte-wise order, so
/// the ordering stays total.
#[derive(Debug, Default, Clone, Copy)]
pub struct NumericAscending;

impl KeyComparator for NumericAscending {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        match (a.parse::<i64>(), b.parse::<i64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => a.cmp(b),
        }
    }
}

/// Largest integer first
///
/// Integers still sort before unparseable components, which keep byte-wise
/// order.
#[derive(Debug, Default, Clone, Copy)]
pub struct NumericDescending;

impl KeyComparator for NumericDescending {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        match (a.parse::<i64>(), b.parse::<i64>()) {
            (Ok(x), Ok(y)) => y.cmp(&x),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => a.cmp(b),
        }
    }
}

/// Named choice of comparator, for configuration and the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyOrder {
    /// [`Lexicographic`]
    #[serde(rename = "lex")]
    Lexicographic,
    /// [`NumericAscending`]
    #[serde(rename = "asc")]
    Ascending,
    /// [`NumericDescending`]
    #[serde(rename = "desc")]
    Descending,
}

impl KeyOrder {
    /// Build the comparator this order names.
    pub fn comparator(&self) -> Box<dyn KeyComparator> {
        match self {
            KeyOrder::Lexicographic => Box::new(Lexicographic),
            KeyOrder::Ascending => Box::new(NumericAscending),
            KeyOrder::Descending => Box::new(NumericDescending),
        }
    }

    /// Parse a comma-separated list such as `"desc,lex"`.
    pub fn parse_list(s: &str) -> Result<Vec<KeyOrder>, String> {
        s.split(',').map(|part| part.trim().parse()).collect()
    }
}

impl FromStr for KeyOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lex" => Ok(KeyOrder::Lexicographic),
            "asc" => Ok(KeyOrder::Ascending),
            "desc" => Ok(KeyOrder::Descending),
            other => Err(format!(
                "unknown key order {:?} (expected lex, asc or desc)",
                other
            )),
        }
    }
}

impl fmt::Display for KeyOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyOrder::Lexicographic => "lex",
            KeyOrder::Ascending => "asc",
            KeyOrder::Descending => "desc",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexicographic() {
        assert_eq!(Lexicographic.compare("a", "b"), Ordering::Less);
        assert_eq!(Lexicographic.compare("10", "9"), Ordering::Less);
        assert_eq!(Lexicographic.compare("x", "x"), Ordering::Equal);
    }

    #[test]
    fn test_numeric_ascending() {
        assert_eq!(NumericAscending.compare("9", "10"), Ordering::Less);
        assert_eq!(NumericAscending.compare("-3", "2"), Ordering::Less);
        assert_eq!(NumericAscending.compare("007", "7"), Ordering::Equal);
    }

    #[test]
    fn test_numeric_descending() {
        assert_eq!(NumericDescending.compare("9", "10"), Ordering::Greater);
        assert_eq!(NumericDescending.compare("10", "9"), Ordering::Less);
    }

    #[test]
    fn test_unparseable_sorts_after_numbers() {
        for cmp in [
            &NumericAscending as &dyn KeyComparator,
            &NumericDescending as &dyn KeyComparator,
        ] {
            assert_eq!(cmp.compare("5", "abc"), Ordering::Less);
            assert_eq!(cmp.compare("abc", "5"), Ordering::Greater);
            assert_eq!(cmp.compare("abc", "abd"), Ordering::Less);
        }
    }

    #[test]
    fn test_key_order_parse() {
        assert_eq!(
            KeyOrder::parse_list("desc, lex").unwrap(),
            vec![KeyOrder::Descending, KeyOrder::Lexicographic]
        );
        assert!(KeyOrder::parse_list("asc,up").is_err());
        assert_eq!(KeyOrder::Ascending.to_string(), "asc");
    }

    #[test]
    fn test_key_order_builds_matching_comparator() {
        let cmp = KeyOrder::Descending.comparator();
        assert_eq!(cmp.compare("1", "2"), Ordering::Greater);
    }
}
