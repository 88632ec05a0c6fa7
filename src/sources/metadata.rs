//! In-memory field metadata
//!
//! A [`MetadataResolver`] backed by a JSON catalog of objects, their default
//! record types, and picklist values per field. Mutations publish on a watch
//! channel so bound widgets re-resolve.

use super::{
    MetadataResolver, ObjectInfo, PicklistEntry, PicklistValues, SourceError, SourceResult,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::{watch, RwLock};
use tracing::debug;

/// Catalog of objects keyed by API name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataCatalog {
    #[serde(default)]
    pub objects: HashMap<String, CatalogObject>,
}

/// One object in the catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogObject {
    pub default_record_type_id: Option<String>,
    /// Picklist values keyed by field API name
    #[serde(default)]
    pub picklists: HashMap<String, Vec<PicklistEntry>>,
}

#[derive(Debug)]
pub struct InMemoryMetadata {
    catalog: RwLock<MetadataCatalog>,
    revision: watch::Sender<u64>,
}

impl InMemoryMetadata {
    pub fn new(catalog: MetadataCatalog) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            catalog: RwLock::new(catalog),
            revision,
        }
    }

    /// Load a catalog from a JSON file
    pub async fn from_file(path: impl AsRef<Path>) -> SourceResult<Self> {
        let path = path.as_ref();
        debug!("Loading metadata catalog from: {}", path.display());
        let content = tokio::fs::read_to_string(path).await?;
        let catalog: MetadataCatalog = serde_json::from_str(&content)?;
        Ok(Self::new(catalog))
    }

    /// Replace the picklist values of a field
    pub async fn set_values(&self, object_api_name: &str, field_api_name: &str, values: Vec<PicklistEntry>) {
        {
            let mut catalog = self.catalog.write().await;
            catalog
                .objects
                .entry(object_api_name.to_string())
                .or_default()
                .picklists
                .insert(field_api_name.to_string(), values);
        }
        self.publish();
    }

    /// Change the default record type of an object
    pub async fn set_default_record_type(&self, object_api_name: &str, record_type_id: impl Into<String>) {
        {
            let mut catalog = self.catalog.write().await;
            catalog
                .objects
                .entry(object_api_name.to_string())
                .or_default()
                .default_record_type_id = Some(record_type_id.into());
        }
        self.publish();
    }

    fn publish(&self) {
        self.revision.send_modify(|revision| *revision += 1);
        debug!("Metadata catalog revision: {}", *self.revision.borrow());
    }
}

#[async_trait]
impl MetadataResolver for InMemoryMetadata {
    async fn object_info(&self, object_api_name: &str) -> SourceResult<ObjectInfo> {
        let catalog = self.catalog.read().await;
        let object = catalog
            .objects
            .get(object_api_name)
            .ok_or_else(|| SourceError::ObjectNotFound(object_api_name.to_string()))?;

        Ok(ObjectInfo {
            api_name: object_api_name.to_string(),
            default_record_type_id: object.default_record_type_id.clone(),
        })
    }

    async fn picklist_values(
        &self,
        record_type_id: &str,
        field_api_name: &str,
    ) -> SourceResult<PicklistValues> {
        let catalog = self.catalog.read().await;
        let values = catalog
            .objects
            .values()
            .filter(|object| object.default_record_type_id.as_deref() == Some(record_type_id))
            .find_map(|object| object.picklists.get(field_api_name))
            .ok_or_else(|| SourceError::FieldNotFound {
                record_type_id: record_type_id.to_string(),
                field: field_api_name.to_string(),
            })?;

        Ok(PicklistValues {
            default_value: None,
            values: values.clone(),
        })
    }

    fn subscribe(&self) -> Option<watch::Receiver<u64>> {
        Some(self.revision.subscribe())
    }
}
