//! Context resolution: maps an opaque `contextRef` id to calendar dates.
//!
//! Lookups are lazy and memoized per document because the same context id
//! is referenced by many facts. Start and end dates live in independent
//! caches; a fact may need one without the other.

use chrono::NaiveDate;
use roxmltree::Node;

use super::error::{Result, XbrlError};
use super::instance::{is_xbrli, XbrlInstance};

impl<'a> XbrlInstance<'a> {
    /// Start date of a context: `period/startDate`, falling back to
    /// `period/instant` (an instant's single date serves as its start).
    ///
    /// `Ok(None)` means the context is unknown or carries no usable date;
    /// callers skip the fact. A date that is present but not ISO
    /// `YYYY-MM-DD` is a [`XbrlError::DateFormat`] error.
    pub fn resolve_start(&self, context_id: &str) -> Result<Option<NaiveDate>> {
        if let Some(cached) = self.start_dates.borrow().get(context_id) {
            return Ok(*cached);
        }
        let text = self
            .period_child_text(context_id, "startDate")
            .or_else(|| self.period_child_text(context_id, "instant"));
        let date = match text {
            Some(text) => Some(parse_iso_date(context_id, text)?),
            None => None,
        };
        self.start_dates
            .borrow_mut()
            .insert(context_id.to_string(), date);
        Ok(date)
    }

    /// End date of a context: `period/endDate` only, no instant fallback.
    pub fn resolve_end(&self, context_id: &str) -> Result<Option<NaiveDate>> {
        if let Some(cached) = self.end_dates.borrow().get(context_id) {
            return Ok(*cached);
        }
        let date = match self.period_child_text(context_id, "endDate") {
            Some(text) => Some(parse_iso_date(context_id, text)?),
            None => None,
        };
        self.end_dates
            .borrow_mut()
            .insert(context_id.to_string(), date);
        Ok(date)
    }

    /// Whether the context's period is an instant (a single point in time
    /// rather than a date range).
    pub fn is_instant_context(&self, context_id: &str) -> bool {
        self.period_child_text(context_id, "instant").is_some()
    }

    fn context_node(&self, context_id: &str) -> Option<Node<'_, 'a>> {
        self.contexts
            .get(context_id)
            .and_then(|id| self.doc.get_node(*id))
    }

    fn period_child_text(&self, context_id: &str, tag: &str) -> Option<&str> {
        let context = self.context_node(context_id)?;
        let period = context.children().find(|n| is_xbrli(n, "period"))?;
        let node = period.children().find(|n| is_xbrli(n, tag))?;
        let text = node.text()?.trim();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

fn parse_iso_date(context_id: &str, text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| XbrlError::DateFormat {
        context_id: context_id.to_string(),
        text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance"
            xmlns:dei="http://xbrl.sec.gov/dei/2014-01-31">
  <xbrli:context id="inst">
    <xbrli:entity><xbrli:identifier scheme="cik">1</xbrli:identifier></xbrli:entity>
    <xbrli:period><xbrli:instant>2015-12-31</xbrli:instant></xbrli:period>
  </xbrli:context>
  <xbrli:context id="dur">
    <xbrli:entity><xbrli:identifier scheme="cik">1</xbrli:identifier></xbrli:entity>
    <xbrli:period>
      <xbrli:startDate>2015-01-01</xbrli:startDate>
      <xbrli:endDate>2015-12-31</xbrli:endDate>
    </xbrli:period>
  </xbrli:context>
  <xbrli:context id="bad">
    <xbrli:entity><xbrli:identifier scheme="cik">1</xbrli:identifier></xbrli:entity>
    <xbrli:period><xbrli:instant>12/31/2015</xbrli:instant></xbrli:period>
  </xbrli:context>
  <dei:DocumentPeriodEndDate contextRef="dur">2015-12-31</dei:DocumentPeriodEndDate>
</xbrli:xbrl>"#;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn duration_context_resolves_both_dates() {
        let instance = XbrlInstance::parse(DOC).unwrap();
        assert_eq!(instance.resolve_start("dur").unwrap(), Some(date("2015-01-01")));
        assert_eq!(instance.resolve_end("dur").unwrap(), Some(date("2015-12-31")));
        assert!(!instance.is_instant_context("dur"));
    }

    #[test]
    fn instant_context_start_falls_back_to_instant() {
        let instance = XbrlInstance::parse(DOC).unwrap();
        assert_eq!(instance.resolve_start("inst").unwrap(), Some(date("2015-12-31")));
        assert_eq!(instance.resolve_end("inst").unwrap(), None);
        assert!(instance.is_instant_context("inst"));
    }

    #[test]
    fn unknown_context_resolves_to_none() {
        let instance = XbrlInstance::parse(DOC).unwrap();
        assert_eq!(instance.resolve_start("nope").unwrap(), None);
        assert_eq!(instance.resolve_end("nope").unwrap(), None);
    }

    #[test]
    fn malformed_date_is_an_error() {
        let instance = XbrlInstance::parse(DOC).unwrap();
        let err = instance.resolve_start("bad").unwrap_err();
        assert!(matches!(err, XbrlError::DateFormat { .. }));
    }

    #[test]
    fn repeated_lookups_hit_the_memo_cache() {
        let instance = XbrlInstance::parse(DOC).unwrap();
        let first = instance.resolve_start("dur").unwrap();
        let again = instance.resolve_start("dur").unwrap();
        assert_eq!(first, again);
        // second call for a different context must not disturb the first
        instance.resolve_start("inst").unwrap();
        assert_eq!(instance.resolve_start("dur").unwrap(), first);
    }
}
