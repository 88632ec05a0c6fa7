//! Dual-list selection widget for ratatui terminal applications.
//!
//! The widget lets a user pick a subset of options from a candidate set,
//! stages the choice behind a confirm/cancel modal overlay, and commits or
//! discards it atomically. Options come from a static list, field picklist
//! metadata, or an externally fetched lookup.

pub mod config;
pub mod sources;
pub mod tui;

pub use config::Config;
pub use sources::{SelectOption, SourceError};
pub use tui::components::dual_list::{DualListWidget, OptionSourceKind};
pub use tui::components::modal::ModalOverlay;
