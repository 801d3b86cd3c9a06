use chrono::NaiveDate;
use roxmltree::{Document, Node, NodeId};
use std::cell::RefCell;
use std::collections::HashMap;

use super::error::{Result, XbrlError};

/// The XBRL instance namespace, home of `context`, `period` and `unit`
/// elements. Some filings never declare an explicit prefix for it, so the
/// `xbrli` and `xlmns` aliases are always injected into the prefix map on
/// top of whatever the document declares.
pub const XBRL_INSTANCE_NS: &str = "http://www.xbrl.org/2003/instance";

/// Prefix of the document-and-entity-information taxonomy.
pub const DEI_PREFIX: &str = "dei";

const DOCUMENT_PERIOD_END_DATE: &str = "DocumentPeriodEndDate";

/// One parsed XBRL instance document plus everything derived from it at
/// load time: the prefix→URI map, the `dei` document fields, the context
/// index and the two "root" context ids whose period matches
/// `DocumentPeriodEndDate`.
///
/// An instance (and its memo caches) lives for the processing of a single
/// filing and is never shared across filings or threads.
pub struct XbrlInstance<'a> {
    pub(super) doc: Document<'a>,
    pub(super) namespaces: HashMap<String, String>,
    fields: HashMap<String, String>,
    pub(super) contexts: HashMap<String, NodeId>,
    context_for_instants: String,
    context_for_durations: String,
    pub(super) start_dates: RefCell<HashMap<String, Option<NaiveDate>>>,
    pub(super) end_dates: RefCell<HashMap<String, Option<NaiveDate>>>,
    pub(super) max_value_digits: usize,
}

impl<'a> XbrlInstance<'a> {
    /// Parses an instance document and loads its base information.
    ///
    /// Fails with [`XbrlError::Parse`] on malformed XML and with
    /// [`XbrlError::ContextResolution`] when `DocumentPeriodEndDate` or
    /// either root context cannot be found. Both are fatal for the filing.
    pub fn parse(xml: &'a str) -> Result<Self> {
        let doc = Document::parse(xml)?;

        let mut namespaces = HashMap::new();
        for ns in doc.root_element().namespaces() {
            if let Some(prefix) = ns.name() {
                namespaces.insert(prefix.to_string(), ns.uri().to_string());
            }
        }
        namespaces.insert("xbrli".to_string(), XBRL_INSTANCE_NS.to_string());
        namespaces.insert("xlmns".to_string(), XBRL_INSTANCE_NS.to_string());

        let mut contexts = HashMap::new();
        for node in doc.descendants().filter(|n| is_xbrli(n, "context")) {
            if let Some(id) = node.attribute("id") {
                // first declaration wins for a (malformed) duplicate id
                contexts.entry(id.to_string()).or_insert_with(|| node.id());
            }
        }

        let fields = load_dei_fields(&doc, &namespaces);

        let period_end = fields
            .get(DOCUMENT_PERIOD_END_DATE)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                XbrlError::ContextResolution(
                    "document has no DocumentPeriodEndDate field".to_string(),
                )
            })?
            .to_string();

        let context_for_instants = find_root_context(&doc, "instant", &period_end)?;
        let context_for_durations = find_root_context(&doc, "endDate", &period_end)?;

        Ok(XbrlInstance {
            doc,
            namespaces,
            fields,
            contexts,
            context_for_instants,
            context_for_durations,
            start_dates: RefCell::new(HashMap::new()),
            end_dates: RefCell::new(HashMap::new()),
            max_value_digits: super::facts::MAX_VALUE_DIGITS,
        })
    }

    /// All `dei` document fields, keyed by concept local name.
    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }

    /// One document field by concept local name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn registrant_name(&self) -> Option<&str> {
        self.field("EntityRegistrantName")
    }

    pub fn central_index_key(&self) -> Option<&str> {
        self.field("EntityCentralIndexKey")
    }

    pub fn trading_symbol(&self) -> Option<&str> {
        self.field("TradingSymbol")
    }

    pub fn document_type(&self) -> Option<&str> {
        self.field("DocumentType")
    }

    pub fn fiscal_year_focus(&self) -> Option<&str> {
        self.field("DocumentFiscalYearFocus")
    }

    pub fn fiscal_period_focus(&self) -> Option<&str> {
        self.field("DocumentFiscalPeriodFocus")
    }

    pub fn filer_category(&self) -> Option<&str> {
        self.field("EntityFilerCategory")
    }

    pub fn current_fiscal_year_end(&self) -> Option<&str> {
        self.field("CurrentFiscalYearEndDate")
    }

    /// Guaranteed non-empty; parse fails without it.
    pub fn document_period_end_date(&self) -> &str {
        self.fields[DOCUMENT_PERIOD_END_DATE].trim()
    }

    /// Id of the segment-free context whose `instant` equals
    /// `DocumentPeriodEndDate`.
    pub fn context_for_instants(&self) -> &str {
        &self.context_for_instants
    }

    /// Id of the segment-free context whose `endDate` equals
    /// `DocumentPeriodEndDate`.
    pub fn context_for_durations(&self) -> &str {
        &self.context_for_durations
    }

    /// URI bound to a namespace prefix, with the injected `xbrli`/`xlmns`
    /// aliases included.
    pub fn namespace_uri(&self, prefix: &str) -> Option<&str> {
        self.namespaces.get(prefix).map(String::as_str)
    }

    /// Caps the integer-digit count accepted by the fact extractor.
    pub fn set_max_value_digits(&mut self, max: usize) {
        self.max_value_digits = max;
    }
}

impl std::fmt::Debug for XbrlInstance<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XbrlInstance")
            .field("period_end", &self.document_period_end_date())
            .field("contexts", &self.contexts.len())
            .field("context_for_instants", &self.context_for_instants)
            .field("context_for_durations", &self.context_for_durations)
            .finish()
    }
}

pub(super) fn is_xbrli(node: &Node<'_, '_>, local: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local
        && node.tag_name().namespace() == Some(XBRL_INSTANCE_NS)
}

/// Collects every element in the `dei` namespace into a field map keyed by
/// the tag's local name. Iteration is document order; a duplicate tag
/// overwrites the earlier value, which the format leaves unspecified for
/// malformed documents.
fn load_dei_fields(doc: &Document<'_>, namespaces: &HashMap<String, String>) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    let Some(dei_uri) = namespaces.get(DEI_PREFIX) else {
        log::warn!("document declares no {} namespace", DEI_PREFIX);
        return fields;
    };
    for node in doc.descendants().filter(Node::is_element) {
        if node.tag_name().namespace() == Some(dei_uri.as_str()) {
            if let Some(text) = node.text() {
                fields.insert(node.tag_name().name().to_string(), text.to_string());
            }
        }
    }
    fields
}

/// First context in document order whose `period/<date_tag>` text equals
/// the document period end date and whose entity carries no `segment`
/// (i.e. no dimensional qualifiers). The first-match tie-break mirrors the
/// original importer and stays until a canonical ordering is confirmed.
fn find_root_context(doc: &Document<'_>, date_tag: &str, period_end: &str) -> Result<String> {
    for node in doc.descendants().filter(|n| is_xbrli(n, "context")) {
        let Some(id) = node.attribute("id") else {
            continue;
        };
        let period_matches = node
            .children()
            .find(|n| is_xbrli(n, "period"))
            .map(|period| {
                period
                    .children()
                    .filter(|n| is_xbrli(n, date_tag))
                    .any(|n| n.text().map(str::trim) == Some(period_end))
            })
            .unwrap_or(false);
        if !period_matches {
            continue;
        }
        let has_segment = node
            .children()
            .find(|n| is_xbrli(n, "entity"))
            .map(|entity| entity.children().any(|n| is_xbrli(&n, "segment")))
            .unwrap_or(false);
        if !has_segment {
            return Ok(id.to_string());
        }
    }
    Err(XbrlError::ContextResolution(format!(
        "no segment-free context with {} = {}",
        date_tag, period_end
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance"
            xmlns:dei="http://xbrl.sec.gov/dei/2014-01-31"
            xmlns:us-gaap="http://fasb.org/us-gaap/2015-01-31"
            xmlns:xbrldi="http://xbrl.org/2006/xbrldi">
  <xbrli:context id="seg">
    <xbrli:entity>
      <xbrli:identifier scheme="http://www.sec.gov/CIK">0000320193</xbrli:identifier>
      <xbrli:segment>
        <xbrldi:explicitMember dimension="us-gaap:StatementClassOfStockAxis">us-gaap:CommonStockMember</xbrldi:explicitMember>
      </xbrli:segment>
    </xbrli:entity>
    <xbrli:period><xbrli:instant>2015-12-31</xbrli:instant></xbrli:period>
  </xbrli:context>
  <xbrli:context id="c1">
    <xbrli:entity>
      <xbrli:identifier scheme="http://www.sec.gov/CIK">0000320193</xbrli:identifier>
    </xbrli:entity>
    <xbrli:period><xbrli:instant>2015-12-31</xbrli:instant></xbrli:period>
  </xbrli:context>
  <xbrli:context id="c2">
    <xbrli:entity>
      <xbrli:identifier scheme="http://www.sec.gov/CIK">0000320193</xbrli:identifier>
    </xbrli:entity>
    <xbrli:period>
      <xbrli:startDate>2015-01-01</xbrli:startDate>
      <xbrli:endDate>2015-12-31</xbrli:endDate>
    </xbrli:period>
  </xbrli:context>
  <xbrli:unit id="USD"><xbrli:measure>iso4217:USD</xbrli:measure></xbrli:unit>
  <dei:DocumentType contextRef="c2">10-K</dei:DocumentType>
  <dei:DocumentPeriodEndDate contextRef="c2">2015-12-31</dei:DocumentPeriodEndDate>
  <dei:EntityRegistrantName contextRef="c2">Apple Inc.</dei:EntityRegistrantName>
  <dei:EntityCentralIndexKey contextRef="c2">0000320193</dei:EntityCentralIndexKey>
  <dei:TradingSymbol contextRef="c2">AAPL</dei:TradingSymbol>
</xbrli:xbrl>"#;

    #[test]
    fn loads_dei_fields() {
        let instance = XbrlInstance::parse(DOC).unwrap();
        assert_eq!(instance.registrant_name(), Some("Apple Inc."));
        assert_eq!(instance.central_index_key(), Some("0000320193"));
        assert_eq!(instance.trading_symbol(), Some("AAPL"));
        assert_eq!(instance.document_type(), Some("10-K"));
        assert_eq!(instance.document_period_end_date(), "2015-12-31");
    }

    #[test]
    fn resolves_root_contexts_skipping_segments() {
        let instance = XbrlInstance::parse(DOC).unwrap();
        // "seg" matches the instant date but carries a segment; "c1" is
        // the first segment-free match in document order.
        assert_eq!(instance.context_for_instants(), "c1");
        assert_eq!(instance.context_for_durations(), "c2");
    }

    #[test]
    fn injects_instance_namespace_aliases() {
        let no_xbrli = DOC.replace("xmlns:xbrli", "xmlns:bx").replace("xbrli:", "bx:");
        let instance = XbrlInstance::parse(&no_xbrli).unwrap();
        assert_eq!(instance.namespace_uri("xbrli"), Some(XBRL_INSTANCE_NS));
        assert_eq!(instance.namespace_uri("xlmns"), Some(XBRL_INSTANCE_NS));
        assert_eq!(instance.context_for_instants(), "c1");
    }

    #[test]
    fn missing_period_end_date_is_fatal() {
        let doc = DOC.replace(
            "<dei:DocumentPeriodEndDate contextRef=\"c2\">2015-12-31</dei:DocumentPeriodEndDate>",
            "",
        );
        let err = XbrlInstance::parse(&doc).unwrap_err();
        assert!(matches!(err, XbrlError::ContextResolution(_)));
    }

    #[test]
    fn missing_root_context_is_fatal() {
        let doc = DOC.replace("<xbrli:instant>2015-12-31</xbrli:instant>", "<xbrli:instant>2014-12-31</xbrli:instant>");
        let err = XbrlInstance::parse(&doc).unwrap_err();
        assert!(matches!(err, XbrlError::ContextResolution(_)));
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        let err = XbrlInstance::parse("<xbrl><unclosed>").unwrap_err();
        assert!(matches!(err, XbrlError::Parse(_)));
    }
}
