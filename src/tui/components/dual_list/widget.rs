//! Dual-list selection widget
//!
//! Wires option resolution, search, staging and the modal overlay into the
//! open/cancel/save protocol. Outside the modal the widget is a read-only
//! input showing the committed display string.
//!
//! Remote lookups run as spawned tasks. Their results come back over a
//! channel tagged with the generation they were issued under, and only the
//! most recently issued query may replace the working set.

use super::debounce::DebouncedQuery;
use super::option_source::{LabelLookup, OptionSource, OptionSourceKind};
use super::search_filter::{FilterOutcome, SearchFilter, SearchPolicy};
use super::staging::{ChangeEvent, SelectionStaging};
use super::view::{available_options, DualListView, ViewAction};
use crate::config::WidgetConfig;
use crate::sources::{
    LookupFetcher, LookupService, MetadataResolver, SelectOption, SourceError, SourceResult,
};
use crate::tui::components::modal::{ModalConfig, ModalOverlay};
use crate::tui::components::{Component, ComponentState};
use crate::tui::{themes::Theme, Frame};
use anyhow::Result;
use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    widgets::{Block, Borders, Paragraph},
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Result of an open request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened,
    /// The input no longer showed the committed selection, so it was cleared
    Cleared,
    AlreadyOpen,
}

/// Working set and search text captured when the modal opens
#[derive(Debug, Clone)]
struct OpenSnapshot {
    options: Vec<SelectOption>,
    filter_text: String,
}

#[derive(Debug)]
enum SourceUpdate {
    Query {
        generation: u64,
        query: String,
        result: SourceResult<Vec<SelectOption>>,
    },
}

/// Labels from the current working set, falling back to the one captured
/// at open time. Remote results may no longer contain earlier picks.
struct MergedLabels<'a> {
    current: &'a OptionSource,
    fallback: &'a [SelectOption],
}

impl LabelLookup for MergedLabels<'_> {
    fn is_lookup_like(&self) -> bool {
        self.current.is_lookup_like()
    }

    fn label_for(&self, value: &str) -> Option<&str> {
        self.current.label_for(value).or_else(|| {
            self.fallback
                .iter()
                .find(|option| option.value == value)
                .map(|option| option.label.as_str())
        })
    }
}

pub struct DualListWidget {
    name: String,
    label: String,
    state: ComponentState,
    source: OptionSource,
    filter: SearchFilter,
    staging: SelectionStaging,
    modal: ModalOverlay,
    view: DualListView,
    snapshot: Option<OpenSnapshot>,
    input_text: String,
    last_error: Option<SourceError>,
    updates_tx: mpsc::UnboundedSender<SourceUpdate>,
    updates_rx: mpsc::UnboundedReceiver<SourceUpdate>,
}

impl std::fmt::Debug for DualListWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DualListWidget")
            .field("name", &self.name)
            .field("kind", &self.source.kind())
            .field("staging", &self.staging)
            .field("is_open", &self.is_open())
            .finish()
    }
}

impl DualListWidget {
    pub fn new(config: &WidgetConfig) -> Self {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();

        let mut modal = ModalOverlay::new(ModalConfig::new().with_close_button(true));
        modal.set_header(config.header.clone().unwrap_or_else(|| config.label.clone()));
        if let Some(styles) = &config.modal_styles {
            modal.override_styles(styles);
        }

        Self {
            name: config.name.clone(),
            label: config.label.clone(),
            state: ComponentState::new(),
            source: OptionSource::new(
                config.options.clone(),
                config.object_api_name.clone(),
                config.field_api_name.clone(),
            ),
            filter: SearchFilter::default(),
            staging: SelectionStaging::new(config.name.clone(), config.initial_selection()),
            modal,
            view: DualListView::new(),
            snapshot: None,
            input_text: String::new(),
            last_error: None,
            updates_tx,
            updates_rx,
        }
    }

    pub fn with_metadata(mut self, metadata: Arc<dyn MetadataResolver>) -> Self {
        self.source = self.source.with_metadata(metadata);
        self
    }

    pub fn with_lookup_service(mut self, service: Arc<dyn LookupService>) -> Self {
        self.source = self.source.with_lookup_service(service);
        self
    }

    pub fn with_getter(mut self, getter: Arc<dyn LookupFetcher>) -> Self {
        self.source = self.source.with_getter(getter);
        self
    }

    pub fn with_search_policy(mut self, policy: SearchPolicy) -> Self {
        self.filter = SearchFilter::new(policy);
        self
    }

    /// Resolve the working set and derive the initial display string.
    /// Resolution failures are recorded, never returned.
    pub async fn connect(&mut self) {
        if let Err(error) = self.source.resolve_initial().await {
            self.record_error(error);
        }
        self.filter.restore("", self.source.options());
        self.staging.refresh_display(&self.source);
        self.input_text = self.staging.display().to_string();
        info!(
            "Connected '{}' with {} options ({:?})",
            self.name,
            self.source.options().len(),
            self.source.kind()
        );
    }

    /// Re-resolve picklist metadata if its inputs or upstream data changed.
    /// Returns whether the working set was replaced.
    pub async fn sync_metadata(&mut self) -> bool {
        match self.source.sync().await {
            Ok(true) => {
                self.last_error = None;
                if let Some(snapshot) = &mut self.snapshot {
                    snapshot.options = self.source.options().to_vec();
                }
                self.filter.refresh(self.source.options());
                true
            }
            Ok(false) => false,
            Err(error) => {
                self.record_error(error);
                false
            }
        }
    }

    pub fn set_object_api_name(&mut self, name: Option<String>) {
        self.source.set_object_api_name(name);
    }

    pub fn set_field_api_name(&mut self, name: Option<String>) {
        self.source.set_field_api_name(name);
    }

    /// Empty the committed selection and search text. Closes the modal if
    /// it was open.
    pub fn clear(&mut self) {
        if self.staging.is_staging() {
            self.close_modal();
        }
        self.staging.clear();
        self.filter.restore("", self.source.options());
        self.input_text.clear();
        info!("Selection '{}' cleared", self.name);
    }

    pub fn on_search_input(&mut self, text: &str) -> FilterOutcome {
        self.on_search_input_at(text, Instant::now())
    }

    pub fn on_search_input_at(&mut self, text: &str, now: Instant) -> FilterOutcome {
        if self.filter.policy().remote_search && self.source.fetcher().is_some() {
            if text.is_empty() {
                return self.restore_unfiltered();
            }
            return self.filter.schedule_remote(text, now);
        }
        let base = match &self.snapshot {
            Some(snapshot) => snapshot.options.as_slice(),
            None => self.source.options(),
        };
        self.filter.apply(text, base)
    }

    /// Show the full option set again without a round trip. Drops any
    /// pending or in-flight remote query.
    fn restore_unfiltered(&mut self) -> FilterOutcome {
        if let Some(snapshot) = &self.snapshot {
            self.source.replace(snapshot.options.clone());
        }
        self.filter.restore("", self.source.options());
        FilterOutcome::Filtered {
            matched: self.filter.displayed().len(),
        }
    }

    /// Fire a due remote query and apply any results that arrived
    pub fn tick_at(&mut self, now: Instant) {
        if let Some(query) = self.filter.poll_remote(now) {
            self.issue_query(query);
        }
        while let Ok(update) = self.updates_rx.try_recv() {
            self.apply_update(update);
        }
    }

    /// Wait for the next remote result and apply it. Returns whether it
    /// replaced the working set.
    pub async fn wait_for_update(&mut self) -> bool {
        match self.updates_rx.recv().await {
            Some(update) => self.apply_update(update),
            None => false,
        }
    }

    fn issue_query(&mut self, query: DebouncedQuery) {
        let Some(fetcher) = self.source.fetcher() else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime, dropping lookup query '{}'", query.query);
            return;
        };

        let DebouncedQuery { generation, query } = query;
        debug!("Issuing lookup '{}' via {} (generation {})", query, fetcher.name(), generation);
        let updates = self.updates_tx.clone();
        handle.spawn(async move {
            let narrowed = if query.is_empty() { None } else { Some(query.as_str()) };
            let result = fetcher.fetch(narrowed).await;
            // The widget may already be gone
            let _ = updates.send(SourceUpdate::Query {
                generation,
                query,
                result,
            });
        });
    }

    fn apply_update(&mut self, update: SourceUpdate) -> bool {
        match update {
            SourceUpdate::Query {
                generation,
                query,
                result,
            } => {
                if !self.filter.is_current(generation) {
                    debug!("Discarding superseded lookup result for '{}'", query);
                    return false;
                }
                match result {
                    Ok(options) => {
                        self.source.replace(options);
                        self.filter.accept_remote(self.source.options());
                        self.last_error = None;
                        true
                    }
                    Err(error) => {
                        self.record_error(error);
                        false
                    }
                }
            }
        }
    }

    fn record_error(&mut self, error: SourceError) {
        warn!("Option source for '{}' failed: {}", self.name, error);
        self.last_error = Some(error);
    }

    /// Replace the staged selection. Ignored while closed.
    pub fn on_selection_changed(&mut self, values: Vec<String>) -> bool {
        self.staging.edit(values)
    }

    pub fn on_open_requested(&mut self, current_display_text: &str) -> OpenOutcome {
        if self.staging.is_staging() {
            return OpenOutcome::AlreadyOpen;
        }
        if current_display_text != self.staging.display() {
            debug!("Input no longer shows the committed selection, clearing");
            self.clear();
            return OpenOutcome::Cleared;
        }

        self.snapshot = Some(OpenSnapshot {
            options: self.source.options().to_vec(),
            filter_text: self.filter.text().to_string(),
        });
        self.staging.open_stage();
        self.view.reset();
        if !self.modal.show() {
            debug!("Modal not mounted yet, it is shown on first render");
        }
        OpenOutcome::Opened
    }

    /// Discard the staged selection and close
    pub fn on_cancel(&mut self) -> bool {
        if !self.staging.revert() {
            return false;
        }
        self.close_modal();
        true
    }

    /// The modal's own close affordance. Cancels like Esc in the view, and
    /// does nothing when the modal is not closable.
    pub fn on_dialog_close(&mut self) -> bool {
        if !self.staging.is_staging() || !self.modal.config().closable {
            return false;
        }
        if self.modal.is_mounted() && !self.modal.handle_dialog_close() {
            return false;
        }
        self.on_cancel()
    }

    /// Commit the staged selection and close
    pub fn on_save(&mut self) -> bool {
        if !self.staging.is_staging() {
            return false;
        }
        let labels = MergedLabels {
            current: &self.source,
            fallback: self
                .snapshot
                .as_ref()
                .map(|snapshot| snapshot.options.as_slice())
                .unwrap_or(&[]),
        };
        self.staging.commit(&labels);
        self.input_text = self.staging.display().to_string();
        self.close_modal();
        true
    }

    fn close_modal(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.source.replace(snapshot.options);
            self.filter.restore(&snapshot.filter_text, self.source.options());
        }
        self.view.reset();
        self.modal.hide();
    }

    /// Attach the modal to the area it may cover and fill its slots
    pub fn mount(&mut self, area: Rect) {
        self.modal.mount(area);
        if !self.modal.is_tagline_revealed() {
            self.modal.on_tagline_slot_changed();
        }
        if !self.modal.is_footer_revealed() {
            self.modal.on_footer_slot_changed();
        }
        if self.staging.is_staging() && !self.modal.is_shown() {
            self.modal.show();
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Committed selection in canonical form
    pub fn value(&self) -> String {
        self.staging.canonical_value()
    }

    pub fn display_value(&self) -> &str {
        self.staging.display()
    }

    pub fn selected(&self) -> &[String] {
        self.staging.committed()
    }

    pub fn staged(&self) -> Option<&[String]> {
        self.staging.staged()
    }

    pub fn options(&self) -> &[SelectOption] {
        self.source.options()
    }

    pub fn displayed_options(&self) -> &[SelectOption] {
        self.filter.displayed()
    }

    pub fn filter_text(&self) -> &str {
        self.filter.text()
    }

    /// Text of the closed input
    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    pub fn set_input_text(&mut self, text: impl Into<String>) {
        self.input_text = text.into();
    }

    pub fn is_open(&self) -> bool {
        self.staging.is_staging()
    }

    pub fn kind(&self) -> OptionSourceKind {
        self.source.kind()
    }

    pub fn is_lookup_like(&self) -> bool {
        self.source.is_lookup_like()
    }

    pub fn last_error(&self) -> Option<&SourceError> {
        self.last_error.as_ref()
    }

    pub fn modal(&self) -> &ModalOverlay {
        &self.modal
    }

    pub fn modal_mut(&mut self) -> &mut ModalOverlay {
        &mut self.modal
    }

    pub fn add_change_listener<F>(&mut self, listener: F)
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.staging.add_change_listener(listener);
    }

    fn handle_open_key(&mut self, key: KeyEvent) {
        let staged = self.staging.staged().unwrap_or_default().to_vec();
        let action = {
            let available = available_options(self.filter.displayed(), &staged);
            self.view
                .handle_key(key, self.filter.text(), &available, &staged)
        };

        match action {
            ViewAction::None => {}
            ViewAction::Search(text) => {
                self.on_search_input(&text);
            }
            ViewAction::Select(values) => {
                self.on_selection_changed(values);
            }
            ViewAction::Save => {
                self.on_save();
            }
            ViewAction::Cancel => {
                self.on_dialog_close();
            }
        }
    }

    fn handle_closed_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => {
                let text = self.input_text.clone();
                self.on_open_requested(&text);
            }
            KeyCode::Backspace | KeyCode::Delete => self.input_text.clear(),
            _ => {}
        }
    }

    fn render_input(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let border = if self.last_error.is_some() {
            Style::default().fg(theme.error)
        } else {
            theme.border_style(self.state.has_focus)
        };
        let text = if self.input_text.is_empty() {
            Paragraph::new("Select an option").style(theme.muted())
        } else {
            Paragraph::new(self.input_text.clone()).style(theme.text())
        };
        frame.render_widget(
            text.block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border)
                    .title(self.label.clone()),
            ),
            area,
        );
    }

    fn render_modal(&mut self, frame: &mut Frame, theme: &Theme) {
        self.mount(frame.size());
        let Some(layout) = self.modal.render(frame, theme) else {
            return;
        };
        let staged = self.staging.staged().unwrap_or_default();

        if let Some(tagline) = layout.tagline {
            frame.render_widget(
                Paragraph::new(format!("{} selected", staged.len())).style(theme.muted()),
                tagline,
            );
        }

        let labels = MergedLabels {
            current: &self.source,
            fallback: self
                .snapshot
                .as_ref()
                .map(|snapshot| snapshot.options.as_slice())
                .unwrap_or(&[]),
        };
        let selected: Vec<(String, Option<String>)> = staged
            .iter()
            .map(|value| (value.clone(), labels.label_for(value).map(str::to_string)))
            .collect();
        let available = available_options(self.filter.displayed(), staged);
        self.view.render(
            frame,
            layout.content,
            theme,
            self.filter.text(),
            &available,
            &selected,
        );

        if let Some(footer) = layout.footer {
            frame.render_widget(
                Paragraph::new("Ctrl+S save · Esc cancel · Tab switch pane")
                    .style(theme.muted())
                    .alignment(Alignment::Center),
                footer,
            );
        }
    }
}

#[async_trait]
impl Component for DualListWidget {
    async fn handle_key_event(&mut self, event: KeyEvent) -> Result<()> {
        if self.is_open() {
            self.handle_open_key(event);
        } else {
            self.handle_closed_key(event);
        }
        Ok(())
    }

    async fn tick(&mut self) -> Result<()> {
        self.tick_at(Instant::now());
        self.sync_metadata().await;
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        self.state.size = area;
        self.render_input(frame, area, theme);
        self.render_modal(frame, theme);
    }

    fn size(&self) -> Rect {
        self.state.size
    }

    fn set_size(&mut self, size: Rect) {
        self.state.size = size;
    }

    fn has_focus(&self) -> bool {
        self.state.has_focus
    }

    fn set_focus(&mut self, focus: bool) {
        self.state.has_focus = focus;
    }
}
