//! Fact extraction: walks every element of a target taxonomy namespace and
//! pairs it with its resolved context and unit.
//!
//! The walk is lazy and restartable; it holds no consumption state of its
//! own beyond the resolver's shared memo caches. Per-element problems are
//! logged and the element skipped, so one malformed fact never aborts a
//! multi-thousand-fact document.

use chrono::NaiveDate;
use roxmltree::Node;
use serde::{Deserialize, Serialize};

use super::error::{Result, XbrlError};
use super::instance::XbrlInstance;

/// Default taxonomy prefix for SEC filings.
pub const DEFAULT_NAMESPACE: &str = "us-gaap";

/// Default bound on the integer-digit count of a fact value.
pub const MAX_VALUE_DIGITS: usize = 18;

/// Decimal places assumed when a fact declares `decimals="INF"`.
const INF_DECIMALS: i32 = 6;

/// One reported value for a concept under a specific context and unit.
///
/// Transient: produced, validated and handed to the persistence
/// collaborator. For an instant fact `start_date == end_date`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    /// Taxonomy namespace URI, without Clark-notation braces.
    pub namespace: String,
    /// Concept local name, e.g. `Assets`.
    pub name: String,
    /// Trimmed raw text value.
    pub value: String,
    /// Unit name from `unitRef`.
    pub unit: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Decimal-places hint from the `decimals` attribute.
    pub decimals: i32,
}

impl<'a> XbrlInstance<'a> {
    /// Lazily yields every reportable fact under the given taxonomy
    /// prefix, in document order. Re-invoking re-walks the tree; resolver
    /// caches are shared across calls within the same document.
    ///
    /// An undeclared prefix yields an empty stream; the caller treats a
    /// factless document as "no usable XBRL data".
    pub fn facts<'b>(&'b self, prefix: &str) -> impl Iterator<Item = Fact> + 'b {
        let uri = self.namespace_uri(prefix).map(str::to_string);
        if uri.is_none() {
            log::warn!("namespace prefix {:?} not declared by document", prefix);
        }
        self.doc
            .descendants()
            .filter(Node::is_element)
            .filter_map(move |node| {
                let uri = uri.as_deref()?;
                if node.tag_name().namespace() != Some(uri) {
                    return None;
                }
                self.fact_from_element(&node, uri)
            })
    }

    /// Validates one candidate element. `None` means "not a reportable
    /// fact here"; the skip conditions are part of the extraction
    /// contract, not errors.
    fn fact_from_element(&self, node: &Node<'_, 'a>, uri: &str) -> Option<Fact> {
        let name = node.tag_name().name();

        // No decimals attribute means an abstract or non-numeric concept.
        let decimals = match parse_decimals(name, node.attribute("decimals")?) {
            Ok(d) => d,
            Err(err) => {
                log::warn!("skipping fact: {}", err);
                return None;
            }
        };

        let context_ref = node.attribute("contextRef")?;
        let start_date = match self.resolve_start(context_ref) {
            Ok(Some(date)) => date,
            Ok(None) => return None,
            Err(err) => {
                log::warn!("skipping {}: {}", name, err);
                return None;
            }
        };
        let end_date = match self.resolve_end(context_ref) {
            Ok(Some(date)) => date,
            // An instant's single date serves as both start and end. A
            // duration context missing its endDate stays unusable.
            Ok(None) if self.is_instant_context(context_ref) => start_date,
            Ok(None) => return None,
            Err(err) => {
                log::warn!("skipping {}: {}", name, err);
                return None;
            }
        };

        let unit = node.attribute("unitRef")?.trim();
        if unit.is_empty() {
            return None;
        }

        let value = node.text()?.trim();
        if value.is_empty() {
            return None;
        }
        if let Err(err) = check_value_digits(name, value, self.max_value_digits) {
            log::warn!("skipping fact: {}", err);
            return None;
        }

        Some(Fact {
            namespace: uri.to_string(),
            name: name.to_string(),
            value: value.to_string(),
            unit: unit.to_string(),
            start_date,
            end_date,
            decimals,
        })
    }
}

/// `INF` maps to a fixed precision; anything else must be an integer
/// decimal-places count.
fn parse_decimals(concept: &str, raw: &str) -> Result<i32> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("INF") {
        return Ok(INF_DECIMALS);
    }
    raw.parse::<i32>().map_err(|_| XbrlError::ValueFormat {
        concept: concept.to_string(),
        field: "decimals",
        text: raw.to_string(),
    })
}

/// Bounds the digit count of the value's integer part so it stays
/// representable in the persistence layer's fixed-precision column.
fn check_value_digits(concept: &str, value: &str, max: usize) -> Result<()> {
    let int_part = value.split('.').next().unwrap_or(value);
    let digits = int_part.chars().filter(char::is_ascii_digit).count();
    if digits > max {
        return Err(XbrlError::ValueRange {
            concept: concept.to_string(),
            digits,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inf_decimals_map_to_six() {
        assert_eq!(parse_decimals("Assets", "INF").unwrap(), 6);
        assert_eq!(parse_decimals("Assets", "inf").unwrap(), 6);
    }

    #[test]
    fn integer_decimals_parse() {
        assert_eq!(parse_decimals("Assets", "-6").unwrap(), -6);
        assert_eq!(parse_decimals("Assets", "0").unwrap(), 0);
    }

    #[test]
    fn malformed_decimals_are_a_value_format_error() {
        let err = parse_decimals("Assets", "lots").unwrap_err();
        assert!(matches!(err, XbrlError::ValueFormat { field: "decimals", .. }));
    }

    #[test]
    fn digit_bound_is_inclusive() {
        assert!(check_value_digits("Assets", "123456789012345678", 18).is_ok());
        let err = check_value_digits("Assets", "1234567890123456789", 18).unwrap_err();
        assert!(matches!(err, XbrlError::ValueRange { digits: 19, .. }));
    }

    #[test]
    fn digit_bound_ignores_sign_and_fraction() {
        assert!(check_value_digits("Assets", "-123456789012345678.99", 18).is_ok());
    }
}
