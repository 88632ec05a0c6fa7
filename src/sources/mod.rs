//! Option sources for selection widgets
//!
//! This module defines the collaborators that resolve the authoritative list
//! of selectable options: field metadata for picklists and externally fetched
//! lookups. Every source normalizes its results into [`SelectOption`].

pub mod lookup;
pub mod metadata;

pub use lookup::{FieldLookup, FnLookup, HttpLookupFetcher};
pub use metadata::{CatalogObject, InMemoryMetadata, MetadataCatalog};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tokio::sync::watch;

/// A selectable option in its uniform shape
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

impl From<(&str, &str)> for SelectOption {
    fn from((value, label): (&str, &str)) -> Self {
        Self::new(value, label)
    }
}

impl From<PicklistEntry> for SelectOption {
    fn from(entry: PicklistEntry) -> Self {
        Self {
            value: entry.value,
            label: entry.label,
        }
    }
}

/// Picklist entry as delivered by field metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PicklistEntry {
    pub value: String,
    pub label: String,
    /// Controlling field indices this entry is valid for
    #[serde(default)]
    pub valid_for: Vec<u32>,
    #[serde(default)]
    pub attributes: Option<serde_json::Value>,
}

impl PicklistEntry {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            valid_for: Vec::new(),
            attributes: None,
        }
    }
}

/// Object-level metadata needed to resolve picklists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectInfo {
    pub api_name: String,
    pub default_record_type_id: Option<String>,
}

/// Enumerated values of one field for one record type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PicklistValues {
    #[serde(default)]
    pub default_value: Option<PicklistEntry>,
    #[serde(default)]
    pub values: Vec<PicklistEntry>,
}

impl PicklistValues {
    pub fn into_options(self) -> Vec<SelectOption> {
        self.values.into_iter().map(SelectOption::from).collect()
    }
}

/// Result type for source operations
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Failures while resolving options
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Object '{0}' not found")]
    ObjectNotFound(String),

    #[error("Field '{field}' has no picklist for record type '{record_type_id}'")]
    FieldNotFound {
        record_type_id: String,
        field: String,
    },

    #[error("Object '{0}' has no default record type")]
    MissingRecordType(String),

    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode option payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolves field metadata into enumerated values
#[async_trait]
pub trait MetadataResolver: Send + Sync + Debug {
    /// Get object metadata, including its default record type
    async fn object_info(&self, object_api_name: &str) -> SourceResult<ObjectInfo>;

    /// Get the enumerated values of a field for a record type
    async fn picklist_values(
        &self,
        record_type_id: &str,
        field_api_name: &str,
    ) -> SourceResult<PicklistValues>;

    /// Change feed for upstream metadata. Resolvers whose data can change
    /// return a receiver that is bumped on every mutation.
    fn subscribe(&self) -> Option<watch::Receiver<u64>> {
        None
    }
}

/// Resolves lookup values keyed on a field identifier
#[async_trait]
pub trait LookupService: Send + Sync + Debug {
    async fn lookup_values(
        &self,
        field_api_name: &str,
        query: Option<&str>,
    ) -> SourceResult<Vec<SelectOption>>;
}

/// Fetch function producing lookup options, optionally narrowed by a query
#[async_trait]
pub trait LookupFetcher: Send + Sync + Debug {
    fn name(&self) -> &str {
        "lookup"
    }

    async fn fetch(&self, query: Option<&str>) -> SourceResult<Vec<SelectOption>>;
}

/// Drop options whose value was already seen, keeping source order
pub fn dedupe_options(options: Vec<SelectOption>) -> Vec<SelectOption> {
    let mut seen = std::collections::HashSet::new();
    options
        .into_iter()
        .filter(|option| seen.insert(option.value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picklist_payload_normalizes_to_options() {
        let payload = r#"{
            "defaultValue": null,
            "values": [
                {"value": "hot", "label": "Hot", "validFor": [0, 1]},
                {"value": "cold", "label": "Cold"}
            ]
        }"#;

        let values: PicklistValues = serde_json::from_str(payload).unwrap();
        assert_eq!(values.values[0].valid_for, vec![0, 1]);

        let options = values.into_options();
        assert_eq!(
            options,
            vec![SelectOption::new("hot", "Hot"), SelectOption::new("cold", "Cold")]
        );
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let options = vec![
            SelectOption::from(("a", "Apple")),
            SelectOption::from(("b", "Banana")),
            SelectOption::from(("a", "Avocado")),
        ];

        let deduped = dedupe_options(options);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].label, "Apple");
        assert_eq!(deduped[1].value, "b");
    }
}
