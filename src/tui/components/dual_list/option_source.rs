//! Option source resolution
//!
//! Produces the working option set from exactly one strategy: a static list
//! supplied by the caller, field picklist metadata, or a lookup fetch. The
//! strategy is chosen at connect time from the configured inputs.

use crate::sources::{
    dedupe_options, FieldLookup, LookupFetcher, LookupService, MetadataResolver, SelectOption,
    SourceError, SourceResult,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Strategy that produces the working option set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionSourceKind {
    Static,
    PicklistMetadata,
    RemoteLookup,
}

/// Whether the display string joins labels instead of raw values.
///
/// Lookups always join labels. Any other source is treated the same way
/// when its first caller-supplied option has a value that differs from its
/// label; only the first option is inspected.
pub fn is_lookup_like(kind: OptionSourceKind, initial: &[SelectOption]) -> bool {
    kind == OptionSourceKind::RemoteLookup
        || initial
            .first()
            .is_some_and(|option| option.value != option.label)
}

/// Value to label mapping used to derive display strings
pub trait LabelLookup {
    fn is_lookup_like(&self) -> bool;
    fn label_for(&self, value: &str) -> Option<&str>;
}

/// Dependency tracking for picklist metadata inputs
///
/// Local input changes bump `revision`; upstream metadata changes arrive on
/// the resolver's watch channel. Either makes the binding stale. A failed
/// resolution counts as an attempt, so it is retried only after one of them
/// changes again.
#[derive(Debug, Default)]
pub struct MetadataBinding {
    object_api_name: Option<String>,
    field_api_name: Option<String>,
    revision: u64,
    attempted_revision: Option<u64>,
    record_type_id: Option<String>,
    upstream: Option<watch::Receiver<u64>>,
}

impl MetadataBinding {
    pub fn new(object_api_name: Option<String>, field_api_name: Option<String>) -> Self {
        Self {
            object_api_name,
            field_api_name,
            ..Default::default()
        }
    }

    pub fn object_api_name(&self) -> Option<&str> {
        self.object_api_name.as_deref()
    }

    pub fn field_api_name(&self) -> Option<&str> {
        self.field_api_name.as_deref()
    }

    pub fn record_type_id(&self) -> Option<&str> {
        self.record_type_id.as_deref()
    }

    pub fn set_object_api_name(&mut self, name: Option<String>) {
        if self.object_api_name != name {
            self.object_api_name = name;
            self.revision += 1;
        }
    }

    pub fn set_field_api_name(&mut self, name: Option<String>) {
        if self.field_api_name != name {
            self.field_api_name = name;
            self.revision += 1;
        }
    }

    fn subscribe(&mut self, upstream: Option<watch::Receiver<u64>>) {
        self.upstream = upstream;
    }

    pub fn is_stale(&self) -> bool {
        self.attempted_revision != Some(self.revision)
            || self
                .upstream
                .as_ref()
                .is_some_and(|upstream| upstream.has_changed().unwrap_or(false))
    }

    fn mark_attempted(&mut self, revision: u64) {
        if let Some(upstream) = &mut self.upstream {
            upstream.borrow_and_update();
        }
        self.attempted_revision = Some(revision);
    }

    fn mark_resolved(&mut self, revision: u64, record_type_id: String) {
        self.mark_attempted(revision);
        self.record_type_id = Some(record_type_id);
    }
}

#[derive(Debug)]
pub struct OptionSource {
    kind: OptionSourceKind,
    initial: Vec<SelectOption>,
    working: Vec<SelectOption>,
    binding: MetadataBinding,
    metadata: Option<Arc<dyn MetadataResolver>>,
    lookup_service: Option<Arc<dyn LookupService>>,
    getter: Option<Arc<dyn LookupFetcher>>,
    fetcher: Option<Arc<dyn LookupFetcher>>,
    lookup_like: bool,
    connected: bool,
}

impl OptionSource {
    /// Create a source from the caller's configuration inputs
    pub fn new(
        options: Vec<SelectOption>,
        object_api_name: Option<String>,
        field_api_name: Option<String>,
    ) -> Self {
        let options = dedupe_options(options);
        Self {
            kind: OptionSourceKind::Static,
            initial: options.clone(),
            working: options,
            binding: MetadataBinding::new(object_api_name, field_api_name),
            metadata: None,
            lookup_service: None,
            getter: None,
            fetcher: None,
            lookup_like: false,
            connected: false,
        }
    }

    pub fn with_metadata(mut self, metadata: Arc<dyn MetadataResolver>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Field-keyed lookup used when a field is configured without an object
    pub fn with_lookup_service(mut self, service: Arc<dyn LookupService>) -> Self {
        self.lookup_service = Some(service);
        self
    }

    /// Injected fetch function
    pub fn with_getter(mut self, getter: Arc<dyn LookupFetcher>) -> Self {
        self.getter = Some(getter);
        self
    }

    pub fn kind(&self) -> OptionSourceKind {
        self.kind
    }

    pub fn is_lookup_like(&self) -> bool {
        self.lookup_like
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn options(&self) -> &[SelectOption] {
        &self.working
    }

    pub fn binding(&self) -> &MetadataBinding {
        &self.binding
    }

    /// Fetcher for per-query lookups, present only for lookup sources
    pub fn fetcher(&self) -> Option<Arc<dyn LookupFetcher>> {
        match self.kind {
            OptionSourceKind::RemoteLookup => self.fetcher.clone(),
            _ => None,
        }
    }

    pub fn label_for(&self, value: &str) -> Option<&str> {
        self.working
            .iter()
            .find(|option| option.value == value)
            .map(|option| option.label.as_str())
    }

    pub fn contains(&self, value: &str) -> bool {
        self.working.iter().any(|option| option.value == value)
    }

    /// Replace the working set wholesale
    pub fn replace(&mut self, options: Vec<SelectOption>) {
        self.working = dedupe_options(options);
        debug!("Working option set replaced: {} options", self.working.len());
    }

    pub fn set_object_api_name(&mut self, name: Option<String>) {
        self.binding.set_object_api_name(name);
    }

    pub fn set_field_api_name(&mut self, name: Option<String>) {
        self.binding.set_field_api_name(name);
    }

    fn detect_kind(&mut self) {
        let object = self.binding.object_api_name().map(str::to_string);
        let field = self.binding.field_api_name().map(str::to_string);

        self.fetcher = match (&self.getter, &object, &field, &self.lookup_service) {
            (Some(getter), _, _, _) => Some(getter.clone()),
            (None, None, Some(field), Some(service)) => {
                Some(Arc::new(FieldLookup::new(service.clone(), field.clone())))
            }
            _ => None,
        };

        self.kind = match (&object, &field) {
            (Some(_), Some(_)) if self.metadata.is_some() => OptionSourceKind::PicklistMetadata,
            (Some(object), Some(field)) => {
                warn!(
                    "No metadata resolver for {}.{}, falling back",
                    object, field
                );
                self.fallback_kind()
            }
            _ => self.fallback_kind(),
        };

        if self.kind == OptionSourceKind::Static && object.is_none() && field.is_some() && self.fetcher.is_none() {
            warn!("Field configured without object or lookup service, using static options");
        }

        self.lookup_like = is_lookup_like(self.kind, &self.initial);
    }

    fn fallback_kind(&self) -> OptionSourceKind {
        if self.fetcher.is_some() {
            OptionSourceKind::RemoteLookup
        } else {
            OptionSourceKind::Static
        }
    }

    /// Connect-time resolution. On failure the working set keeps its last
    /// value and the error is returned to the caller.
    pub async fn resolve_initial(&mut self) -> SourceResult<()> {
        self.detect_kind();
        self.connected = true;
        info!("Resolving options with {:?} source", self.kind);

        match self.kind {
            OptionSourceKind::Static => Ok(()),
            OptionSourceKind::PicklistMetadata => {
                if let Some(metadata) = &self.metadata {
                    self.binding.subscribe(metadata.subscribe());
                }
                self.resolve_picklist().await
            }
            OptionSourceKind::RemoteLookup => {
                let options = self.resolve_for_query(None).await?;
                self.replace(options);
                Ok(())
            }
        }
    }

    /// Fetch options for a query without touching the working set
    pub async fn resolve_for_query(&self, query: Option<&str>) -> SourceResult<Vec<SelectOption>> {
        let fetcher = self
            .fetcher()
            .ok_or_else(|| SourceError::Lookup("source has no lookup fetcher".to_string()))?;
        fetcher.fetch(query).await
    }

    /// Re-resolve picklist values when inputs or upstream metadata changed.
    /// Returns whether the working set was replaced.
    pub async fn sync(&mut self) -> SourceResult<bool> {
        if self.kind != OptionSourceKind::PicklistMetadata || !self.connected {
            return Ok(false);
        }
        if !self.binding.is_stale() {
            return Ok(false);
        }
        self.resolve_picklist().await?;
        Ok(true)
    }

    async fn resolve_picklist(&mut self) -> SourceResult<()> {
        let revision = self.binding.revision;
        let (Some(metadata), Some(object), Some(field)) = (
            self.metadata.clone(),
            self.binding.object_api_name().map(str::to_string),
            self.binding.field_api_name().map(str::to_string),
        ) else {
            return Ok(());
        };

        let resolved = async {
            let info = metadata.object_info(&object).await?;
            let record_type_id = info
                .default_record_type_id
                .ok_or_else(|| SourceError::MissingRecordType(object.clone()))?;
            let values = metadata.picklist_values(&record_type_id, &field).await?;
            Ok::<_, SourceError>((record_type_id, values))
        }
        .await;
        let (record_type_id, values) = match resolved {
            Ok(resolved) => resolved,
            Err(error) => {
                self.binding.mark_attempted(revision);
                return Err(error);
            }
        };

        debug!(
            "Resolved {} picklist values for {}.{} (record type {})",
            values.values.len(),
            object,
            field,
            record_type_id
        );
        self.replace(values.into_options());
        self.binding.mark_resolved(revision, record_type_id);
        Ok(())
    }
}

impl LabelLookup for OptionSource {
    fn is_lookup_like(&self) -> bool {
        self.lookup_like
    }

    fn label_for(&self, value: &str) -> Option<&str> {
        OptionSource::label_for(self, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{
        CatalogObject, FnLookup, InMemoryMetadata, MetadataCatalog, PicklistEntry,
    };
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fruit() -> Vec<SelectOption> {
        vec![
            SelectOption::new("a", "Apple"),
            SelectOption::new("b", "Banana"),
        ]
    }

    fn metadata() -> Arc<InMemoryMetadata> {
        let mut picklists = HashMap::new();
        picklists.insert(
            "Industry".to_string(),
            vec![
                PicklistEntry::new("Energy", "Energy"),
                PicklistEntry::new("Retail", "Retail"),
            ],
        );
        let mut objects = HashMap::new();
        objects.insert(
            "Account".to_string(),
            CatalogObject {
                default_record_type_id: Some("rt-default".to_string()),
                picklists,
            },
        );
        Arc::new(InMemoryMetadata::new(MetadataCatalog { objects }))
    }

    #[derive(Debug, Default)]
    struct FailingMetadata {
        calls: AtomicUsize,
        revision: Option<watch::Sender<u64>>,
    }

    impl FailingMetadata {
        fn watched() -> Self {
            let (sender, _) = watch::channel(0);
            Self {
                calls: AtomicUsize::new(0),
                revision: Some(sender),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn touch(&self) {
            if let Some(revision) = &self.revision {
                revision.send_modify(|revision| *revision += 1);
            }
        }
    }

    #[async_trait::async_trait]
    impl MetadataResolver for FailingMetadata {
        async fn object_info(&self, object_api_name: &str) -> SourceResult<crate::sources::ObjectInfo> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(SourceError::ObjectNotFound(object_api_name.to_string()))
        }

        async fn picklist_values(
            &self,
            _record_type_id: &str,
            _field_api_name: &str,
        ) -> SourceResult<crate::sources::PicklistValues> {
            unreachable!("object_info always fails")
        }

        fn subscribe(&self) -> Option<watch::Receiver<u64>> {
            self.revision.as_ref().map(|revision| revision.subscribe())
        }
    }

    #[test]
    fn test_lookup_like_predicate() {
        assert!(is_lookup_like(OptionSourceKind::RemoteLookup, &[]));
        assert!(is_lookup_like(OptionSourceKind::Static, &fruit()));
        assert!(!is_lookup_like(OptionSourceKind::Static, &[]));

        // Only the first option decides
        let mixed = vec![SelectOption::new("x", "x"), SelectOption::new("y", "Yak")];
        assert!(!is_lookup_like(OptionSourceKind::Static, &mixed));
    }

    #[tokio::test]
    async fn test_static_source_adopts_options() {
        let mut source = OptionSource::new(fruit(), None, None);
        source.resolve_initial().await.unwrap();

        assert_eq!(source.kind(), OptionSourceKind::Static);
        assert_eq!(source.options(), fruit().as_slice());
        assert!(source.is_lookup_like());
        assert_eq!(source.label_for("b"), Some("Banana"));
        assert_eq!(source.label_for("z"), None);
        assert!(source.fetcher().is_none());
    }

    #[tokio::test]
    async fn test_picklist_source_resolves_through_record_type() {
        let mut source = OptionSource::new(Vec::new(), Some("Account".into()), Some("Industry".into()))
            .with_metadata(metadata());
        source.resolve_initial().await.unwrap();

        assert_eq!(source.kind(), OptionSourceKind::PicklistMetadata);
        assert_eq!(source.options().len(), 2);
        assert_eq!(source.binding().record_type_id(), Some("rt-default"));
        assert!(!source.is_lookup_like());
        assert!(!source.binding().is_stale());
    }

    #[tokio::test]
    async fn test_picklist_reresolves_on_upstream_change() {
        let metadata = metadata();
        let mut source = OptionSource::new(Vec::new(), Some("Account".into()), Some("Industry".into()))
            .with_metadata(metadata.clone());
        source.resolve_initial().await.unwrap();
        assert!(!source.sync().await.unwrap());

        metadata
            .set_values("Account", "Industry", vec![PicklistEntry::new("Media", "Media")])
            .await;

        assert!(source.binding().is_stale());
        assert!(source.sync().await.unwrap());
        assert_eq!(source.options(), &[SelectOption::new("Media", "Media")]);
        assert!(!source.sync().await.unwrap());
    }

    #[tokio::test]
    async fn test_picklist_reresolves_on_input_change() {
        let metadata = metadata();
        metadata
            .set_values("Account", "Rating", vec![PicklistEntry::new("Hot", "Hot")])
            .await;

        let mut source = OptionSource::new(Vec::new(), Some("Account".into()), Some("Industry".into()))
            .with_metadata(metadata);
        source.resolve_initial().await.unwrap();

        source.set_field_api_name(Some("Rating".into()));
        assert!(source.sync().await.unwrap());
        assert_eq!(source.options()[0].value, "Hot");
    }

    #[tokio::test]
    async fn test_failure_keeps_last_working_set() {
        let mut source = OptionSource::new(fruit(), Some("Account".into()), Some("Industry".into()))
            .with_metadata(Arc::new(FailingMetadata::default()));

        let result = source.resolve_initial().await;
        assert!(matches!(result, Err(SourceError::ObjectNotFound(_))));
        assert_eq!(source.options(), fruit().as_slice());
        assert!(!source.binding().is_stale());
    }

    #[tokio::test]
    async fn test_failed_resolution_waits_for_a_change() {
        let metadata = Arc::new(FailingMetadata::watched());
        let mut source = OptionSource::new(Vec::new(), Some("Acount".into()), Some("Industry".into()))
            .with_metadata(metadata.clone());

        assert!(source.resolve_initial().await.is_err());
        assert_eq!(metadata.calls(), 1);

        for _ in 0..10 {
            assert!(!source.sync().await.unwrap());
        }
        assert_eq!(metadata.calls(), 1);

        // Local input change
        source.set_object_api_name(Some("Account".into()));
        assert!(source.sync().await.is_err());
        assert_eq!(metadata.calls(), 2);
        assert!(!source.sync().await.unwrap());
        assert_eq!(metadata.calls(), 2);

        // Upstream metadata change
        metadata.touch();
        assert!(source.binding().is_stale());
        assert!(source.sync().await.is_err());
        assert_eq!(metadata.calls(), 3);
        assert!(!source.sync().await.unwrap());
        assert_eq!(metadata.calls(), 3);
    }

    #[tokio::test]
    async fn test_getter_selects_remote_lookup() {
        let getter = FnLookup::new("accounts", |_query: Option<String>| async {
            Ok(vec![SelectOption::new("001", "Acme")])
        });
        let mut source = OptionSource::new(Vec::new(), None, None).with_getter(Arc::new(getter));
        source.resolve_initial().await.unwrap();

        assert_eq!(source.kind(), OptionSourceKind::RemoteLookup);
        assert!(source.is_lookup_like());
        assert_eq!(source.label_for("001"), Some("Acme"));
        assert!(source.fetcher().is_some());
    }

    #[tokio::test]
    async fn test_field_without_object_and_service_stays_static() {
        let mut source = OptionSource::new(fruit(), None, Some("OwnerId".into()));
        source.resolve_initial().await.unwrap();
        assert_eq!(source.kind(), OptionSourceKind::Static);
    }

    #[tokio::test]
    async fn test_duplicate_values_are_dropped() {
        let mut source = OptionSource::new(Vec::new(), None, None);
        source.replace(vec![
            SelectOption::new("a", "Apple"),
            SelectOption::new("a", "Apricot"),
        ]);
        assert_eq!(source.options().len(), 1);
        assert_eq!(source.label_for("a"), Some("Apple"));
    }
}
