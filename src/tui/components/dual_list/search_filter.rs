//! Search over the working option set
//!
//! Derives the displayed options from a base list and the search text. The
//! base list is never modified. Queries of one or two characters are not
//! specific enough to filter on and leave the displayed set as it was.

use super::debounce::{DebouncedQuery, Debouncer, DEFAULT_DEBOUNCE};
use crate::sources::SelectOption;
use std::time::{Duration, Instant};
use tracing::debug;

/// Search behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPolicy {
    /// Shortest non-empty query that triggers filtering
    pub min_query_length: usize,
    /// Quiet interval before a remote query fires
    pub debounce: Duration,
    /// Query lookup sources remotely instead of filtering locally
    pub remote_search: bool,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            min_query_length: 3,
            debounce: DEFAULT_DEBOUNCE,
            remote_search: false,
        }
    }
}

/// What a search input did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    Filtered { matched: usize },
    /// Query too short, displayed set left unchanged
    TooShort,
    /// Remote query scheduled behind the debounce timer
    Scheduled,
}

/// Options whose label contains `query`, ignoring case, in source order
pub fn filter_options(options: &[SelectOption], query: &str) -> Vec<SelectOption> {
    if query.is_empty() {
        return options.to_vec();
    }
    let needle = query.to_lowercase();
    options
        .iter()
        .filter(|option| option.label.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[derive(Debug)]
pub struct SearchFilter {
    policy: SearchPolicy,
    text: String,
    applied: String,
    displayed: Vec<SelectOption>,
    debouncer: Debouncer,
}

impl SearchFilter {
    pub fn new(policy: SearchPolicy) -> Self {
        let debouncer = Debouncer::new(policy.debounce);
        Self {
            policy,
            text: String::new(),
            applied: String::new(),
            displayed: Vec::new(),
            debouncer,
        }
    }

    pub fn policy(&self) -> &SearchPolicy {
        &self.policy
    }

    /// Current search text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Query the displayed set was last filtered with
    pub fn applied(&self) -> &str {
        &self.applied
    }

    pub fn displayed(&self) -> &[SelectOption] {
        &self.displayed
    }

    pub fn is_specific(&self, query: &str) -> bool {
        let len = query.chars().count();
        len == 0 || len >= self.policy.min_query_length
    }

    /// Filter `base` locally
    pub fn apply(&mut self, query: &str, base: &[SelectOption]) -> FilterOutcome {
        self.text = query.to_string();
        if !self.is_specific(query) {
            return FilterOutcome::TooShort;
        }

        self.applied = query.to_string();
        self.displayed = filter_options(base, query);
        debug!("Filter '{}' matched {} of {}", query, self.displayed.len(), base.len());
        FilterOutcome::Filtered {
            matched: self.displayed.len(),
        }
    }

    /// Schedule a remote query, superseding any pending one
    pub fn schedule_remote(&mut self, query: &str, now: Instant) -> FilterOutcome {
        self.text = query.to_string();
        if !self.is_specific(query) {
            return FilterOutcome::TooShort;
        }
        self.debouncer.schedule(query, now);
        FilterOutcome::Scheduled
    }

    pub fn poll_remote(&mut self, now: Instant) -> Option<DebouncedQuery> {
        self.debouncer.poll(now)
    }

    pub fn remote_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.debouncer.is_current(generation)
    }

    /// Show the result of a remote query as-is
    pub fn accept_remote(&mut self, options: &[SelectOption]) {
        self.applied.clear();
        self.displayed = options.to_vec();
    }

    /// Recompute the displayed set after the base list changed
    pub fn refresh(&mut self, base: &[SelectOption]) {
        self.displayed = filter_options(base, &self.applied);
    }

    /// Reset to `text` over `base`, dropping any pending remote query
    pub fn restore(&mut self, text: &str, base: &[SelectOption]) {
        self.debouncer.cancel();
        self.text = text.to_string();
        self.applied = if self.is_specific(text) {
            text.to_string()
        } else {
            String::new()
        };
        self.refresh(base);
    }
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self::new(SearchPolicy::default())
    }
}
