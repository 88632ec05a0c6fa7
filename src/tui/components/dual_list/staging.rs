//! Selection staging with explicit commit and revert
//!
//! The committed selection is the widget's authoritative value. While the
//! modal is open edits go to a staged copy, which is either folded back on
//! commit or discarded on revert.

use super::option_source::LabelLookup;
use tracing::debug;

/// Separator of the canonical value
pub const VALUE_SEPARATOR: &str = ";";
/// Separator of the display string
pub const DISPLAY_SEPARATOR: &str = ", ";

/// Notification that the committed value changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub name: String,
}

pub type ChangeListener = Box<dyn Fn(&ChangeEvent) + Send + Sync>;

/// Split a canonical value into its selected values
pub fn split_value(value: &str) -> Vec<String> {
    value
        .split(VALUE_SEPARATOR)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Display string for `values`: labels when the source is lookup-like,
/// raw values otherwise. Values without a known label are skipped.
pub fn display_string(values: &[String], labels: &impl LabelLookup) -> String {
    if labels.is_lookup_like() {
        values
            .iter()
            .filter_map(|value| labels.label_for(value))
            .collect::<Vec<_>>()
            .join(DISPLAY_SEPARATOR)
    } else {
        values.join(DISPLAY_SEPARATOR)
    }
}

fn unique(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

pub struct SelectionStaging {
    name: String,
    committed: Vec<String>,
    display: String,
    staged: Option<Vec<String>>,
    listeners: Vec<ChangeListener>,
}

impl std::fmt::Debug for SelectionStaging {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionStaging")
            .field("name", &self.name)
            .field("committed", &self.committed)
            .field("display", &self.display)
            .field("staged", &self.staged)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl SelectionStaging {
    pub fn new(name: impl Into<String>, initial: Vec<String>) -> Self {
        Self {
            name: name.into(),
            committed: unique(initial),
            display: String::new(),
            staged: None,
            listeners: Vec::new(),
        }
    }

    pub fn add_change_listener<F>(&mut self, listener: F)
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn committed(&self) -> &[String] {
        &self.committed
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    /// Values joined by the canonical separator
    pub fn canonical_value(&self) -> String {
        self.committed.join(VALUE_SEPARATOR)
    }

    pub fn staged(&self) -> Option<&[String]> {
        self.staged.as_deref()
    }

    pub fn is_staging(&self) -> bool {
        self.staged.is_some()
    }

    /// Re-derive the display string, e.g. after options were resolved
    pub fn refresh_display(&mut self, labels: &impl LabelLookup) {
        self.display = display_string(&self.committed, labels);
    }

    /// Begin staging from the committed selection
    pub fn open_stage(&mut self) -> bool {
        if self.staged.is_some() {
            return false;
        }
        self.staged = Some(self.committed.clone());
        true
    }

    /// Replace the staged selection wholesale
    pub fn edit(&mut self, values: Vec<String>) -> bool {
        match &mut self.staged {
            Some(staged) => {
                *staged = unique(values);
                true
            }
            None => {
                debug!("Selection edit ignored while not staging");
                false
            }
        }
    }

    /// Fold the staged selection into the committed one and notify
    pub fn commit(&mut self, labels: &impl LabelLookup) -> bool {
        let Some(staged) = self.staged.take() else {
            return false;
        };
        self.committed = staged;
        self.refresh_display(labels);
        debug!("Committed selection: {}", self.canonical_value());
        self.notify();
        true
    }

    /// Discard the staged selection
    pub fn revert(&mut self) -> bool {
        self.staged.take().is_some()
    }

    /// Empty the committed selection and notify
    pub fn clear(&mut self) {
        self.committed.clear();
        self.display.clear();
        self.staged = None;
        self.notify();
    }

    fn notify(&self) {
        let event = ChangeEvent {
            name: self.name.clone(),
        };
        for listener in &self.listeners {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SelectOption;
    use crate::tui::components::dual_list::option_source::OptionSource;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn source(options: Vec<SelectOption>) -> OptionSource {
        OptionSource::new(options, None, None)
    }

    async fn connected(options: Vec<SelectOption>) -> OptionSource {
        let mut source = source(options);
        source.resolve_initial().await.unwrap();
        source
    }

    fn counted(staging: &mut SelectionStaging) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        staging.add_change_listener(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    fn values(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_value() {
        assert_eq!(split_value("a;b"), values(&["a", "b"]));
        assert!(split_value("").is_empty());
        assert_eq!(split_value(";a;;"), values(&["a"]));
    }

    #[tokio::test]
    async fn test_commit_folds_staged_and_notifies_once() {
        let source = connected(vec![
            SelectOption::new("a", "Apple"),
            SelectOption::new("b", "Banana"),
        ])
        .await;
        let mut staging = SelectionStaging::new("fruit", values(&["a"]));
        let count = counted(&mut staging);

        assert!(staging.open_stage());
        assert!(staging.edit(values(&["a", "b", "a"])));
        assert!(staging.commit(&source));

        assert_eq!(staging.committed(), values(&["a", "b"]).as_slice());
        assert_eq!(staging.canonical_value(), "a;b");
        assert_eq!(staging.display(), "Apple, Banana");
        assert!(!staging.is_staging());
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // Nothing staged, nothing committed
        assert!(!staging.commit(&source));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_display_joins_raw_values_when_not_lookup_like() {
        let source = connected(vec![
            SelectOption::new("Energy", "Energy"),
            SelectOption::new("Retail", "Retail"),
        ])
        .await;
        let mut staging = SelectionStaging::new("industry", Vec::new());

        staging.open_stage();
        staging.edit(values(&["Retail", "Energy"]));
        staging.commit(&source);

        assert_eq!(staging.display(), "Retail, Energy");
        assert_eq!(staging.canonical_value(), "Retail;Energy");
    }

    #[tokio::test]
    async fn test_display_skips_values_without_label() {
        let source = connected(vec![SelectOption::new("a", "Apple")]).await;
        let mut staging = SelectionStaging::new("fruit", values(&["a", "gone"]));
        staging.refresh_display(&source);

        assert_eq!(staging.display(), "Apple");
        assert_eq!(staging.canonical_value(), "a;gone");
    }

    #[test]
    fn test_revert_leaves_committed_untouched() {
        let mut staging = SelectionStaging::new("fruit", values(&["a"]));
        let count = counted(&mut staging);

        staging.open_stage();
        staging.edit(values(&["b", "c"]));
        assert!(staging.revert());

        assert_eq!(staging.committed(), values(&["a"]).as_slice());
        assert!(staging.staged().is_none());
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!staging.revert());
    }

    #[test]
    fn test_edit_requires_open_stage() {
        let mut staging = SelectionStaging::new("fruit", Vec::new());
        assert!(!staging.edit(values(&["a"])));
        assert!(staging.open_stage());
        assert!(!staging.open_stage());
    }

    #[test]
    fn test_clear_resets_and_notifies() {
        let mut staging = SelectionStaging::new("fruit", values(&["a", "b"]));
        let count = counted(&mut staging);
        staging.open_stage();

        staging.clear();

        assert!(staging.committed().is_empty());
        assert_eq!(staging.canonical_value(), "");
        assert_eq!(staging.display(), "");
        assert!(staging.staged().is_none());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
