//! Cleaning rules for street names and postcodes.
//!
//! Name normalisation is deliberately shallow: the first rule whose
//! abbreviation occurs in the name is applied and the rest are ignored. A
//! name with two abbreviations only has the first-listed one expanded, and a
//! rule key that is a substring of another rule's expansion (`St` inside
//! `Street`) rewrites names that were already clean. Both are known
//! limitations kept for parity with the published cleaning tables.

use crate::detect::is_integer;

/// Required length of a postcode, in characters.
pub const POSTCODE_LENGTH: usize = 6;

/// Regional prefix every accepted postcode starts with.
pub const POSTCODE_PREFIX: &str = "10";

/// Check a postcode against the regional convention.
///
/// A postcode passes when it is an integer, is exactly six characters long
/// and starts with `10`. Surrounding whitespace counts against the length.
///
/// # Examples
/// ```
/// use wrangle_core::check_postcode;
///
/// assert!(check_postcode("100101"));
/// assert!(!check_postcode("20012"));
/// assert!(!check_postcode("ABCDEF"));
/// assert!(!check_postcode("200101"));
/// ```
#[must_use]
pub fn check_postcode(raw: &str) -> bool {
    is_integer(raw)
        && raw.trim() == raw
        && raw.chars().count() == POSTCODE_LENGTH
        && raw.starts_with(POSTCODE_PREFIX)
}

/// A single abbreviation expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRule {
    /// Substring to look for.
    pub abbreviation: String,
    /// Replacement for every occurrence of the abbreviation.
    pub expansion: String,
}

impl NameRule {
    /// Build a rule.
    pub fn new(abbreviation: impl Into<String>, expansion: impl Into<String>) -> Self {
        Self {
            abbreviation: abbreviation.into(),
            expansion: expansion.into(),
        }
    }
}

/// Ordered table of name rules. Order is significant: the first rule whose
/// abbreviation is present is the only one applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRules {
    rules: Vec<NameRule>,
}

const DEFAULT_RULES: [(&str, &str); 10] = [
    ("Hu tong", "Hutong"),
    ("Bldg", "Building"),
    ("Rd.", "Road"),
    ("Str", "Street"),
    ("St", "Street"),
    ("Ave", "Avenue"),
    ("road", "Road"),
    ("Lu", "Road"),
    ("lu", " Road"),
    ("jie", "Street"),
];

impl Default for NameRules {
    fn default() -> Self {
        DEFAULT_RULES.into_iter().collect()
    }
}

impl<A, E> FromIterator<(A, E)> for NameRules
where
    A: Into<String>,
    E: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (A, E)>>(iter: T) -> Self {
        Self {
            rules: iter
                .into_iter()
                .map(|(abbreviation, expansion)| NameRule::new(abbreviation, expansion))
                .collect(),
        }
    }
}

impl NameRules {
    /// Rules in application order.
    #[must_use]
    pub fn rules(&self) -> &[NameRule] {
        &self.rules
    }

    /// First rule whose abbreviation occurs in `name`.
    #[must_use]
    pub fn first_match(&self, name: &str) -> Option<&NameRule> {
        self.rules
            .iter()
            .find(|rule| !rule.abbreviation.is_empty() && name.contains(rule.abbreviation.as_str()))
    }
}

/// Expand the first matching abbreviation in `name`.
///
/// Every occurrence of the matched abbreviation is replaced; no further
/// rules are consulted. Names without a matching abbreviation are returned
/// unchanged.
///
/// # Examples
/// ```
/// use wrangle_core::{NameRules, normalise_name};
///
/// let rules = NameRules::default();
/// assert_eq!(normalise_name("North Jianguomen Str", &rules), "North Jianguomen Street");
/// assert_eq!(normalise_name("Fucheng Lu", &rules), "Fucheng Road");
/// assert_eq!(normalise_name("Wangfujing", &rules), "Wangfujing");
/// ```
#[must_use]
pub fn normalise_name(name: &str, rules: &NameRules) -> String {
    rules.first_match(name).map_or_else(
        || name.to_owned(),
        |rule| name.replace(rule.abbreviation.as_str(), &rule.expansion),
    )
}
