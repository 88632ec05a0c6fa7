//! Dual-list selection
//!
//! Pick a subset of options from a candidate set. Edits are staged while
//! the modal is open and either committed on save or discarded on cancel.

pub mod debounce;
pub mod option_source;
pub mod search_filter;
pub mod staging;
pub mod view;
pub mod widget;

pub use debounce::{DebouncedQuery, Debouncer, DEFAULT_DEBOUNCE};
pub use option_source::{is_lookup_like, LabelLookup, OptionSource, OptionSourceKind};
pub use search_filter::{filter_options, FilterOutcome, SearchFilter, SearchPolicy};
pub use staging::{split_value, ChangeEvent, SelectionStaging, DISPLAY_SEPARATOR, VALUE_SEPARATOR};
pub use view::{DualListView, Pane, ViewAction};
pub use widget::{DualListWidget, OpenOutcome};
