use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::Value;

/// Field map returned by one named data source.
pub type SourceFields = BTreeMap<String, Value>;

/// Pre-resolved data-source lookups, keyed by source name.
///
/// A source that yielded nothing is represented by an empty field map; a
/// source that was never resolved is simply absent. Conditions treat both the
/// same way, templates only consult sources that are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataSources {
    sources: HashMap<String, SourceFields>,
}

impl DataSources {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single field of a source, creating the source if needed.
    #[must_use]
    pub fn set(mut self, source: &str, field: &str, value: impl Into<Value>) -> Self {
        self.sources
            .entry(source.to_owned())
            .or_default()
            .insert(field.to_owned(), value.into());
        self
    }

    /// Register a source with no fields.
    #[must_use]
    pub fn empty_source(mut self, source: &str) -> Self {
        self.sources.entry(source.to_owned()).or_default();
        self
    }

    /// Replace a source's whole field map.
    pub fn insert(&mut self, source: &str, fields: SourceFields) {
        self.sources.insert(source.to_owned(), fields);
    }

    #[must_use]
    pub fn get(&self, source: &str) -> Option<&SourceFields> {
        self.sources.get(source)
    }

    /// Look up `field` inside `source`. No path handling.
    #[must_use]
    pub fn field(&self, source: &str, field: &str) -> Option<&Value> {
        self.sources.get(source)?.get(field)
    }

    #[must_use]
    pub fn contains(&self, source: &str) -> bool {
        self.sources.contains_key(source)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_field() {
        let ds = DataSources::new().set("fehbp_address", "MailingAddress", "PO Box 1");
        assert_eq!(
            ds.field("fehbp_address", "MailingAddress"),
            Some(&Value::from("PO Box 1"))
        );
        assert_eq!(ds.field("fehbp_address", "Other"), None);
        assert_eq!(ds.field("missing", "MailingAddress"), None);
    }

    #[test]
    fn empty_source_is_present() {
        let ds = DataSources::new().empty_source("group_details");
        assert!(ds.contains("group_details"));
        assert!(ds.get("group_details").unwrap().is_empty());
    }

    #[test]
    fn deserializes_from_json() {
        let ds: DataSources = serde_json::from_str(
            r#"{"group_details": {"FundingTypeCode": "E"}, "fehbp_address": {}}"#,
        )
        .unwrap();
        assert_eq!(
            ds.field("group_details", "FundingTypeCode"),
            Some(&Value::from("E"))
        );
        assert!(ds.contains("fehbp_address"));
    }
}
