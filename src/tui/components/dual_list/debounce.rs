//! Debounced remote queries
//!
//! Collapses rapid input into a single query issued once the input has been
//! quiet for a fixed interval. The clock is supplied by the caller so the
//! owning widget drives it from its tick.

use std::time::{Duration, Instant};

/// Reference quiet interval before a remote query fires
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// A query released by the debouncer, tagged with its issuance order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebouncedQuery {
    pub generation: u64,
    pub query: String,
}

#[derive(Debug)]
pub struct Debouncer {
    interval: Duration,
    pending: Option<(String, Instant)>,
    generation: u64,
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
            generation: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start a fresh timer for `query`, superseding any pending one
    pub fn schedule(&mut self, query: impl Into<String>, now: Instant) {
        self.pending = Some((query.into(), now + self.interval));
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Release the pending query if its quiet interval elapsed
    pub fn poll(&mut self, now: Instant) -> Option<DebouncedQuery> {
        if !self.deadline().is_some_and(|deadline| now >= deadline) {
            return None;
        }
        let (query, _) = self.pending.take()?;
        self.generation += 1;
        Some(DebouncedQuery {
            generation: self.generation,
            query,
        })
    }

    /// Drop the pending timer and invalidate queries already issued
    pub fn cancel(&mut self) {
        self.pending = None;
        self.generation += 1;
    }

    /// Whether a result for `generation` may still be applied
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_rapid_keystrokes_coalesce_into_one_query() {
        let mut debouncer = Debouncer::default();
        let t0 = Instant::now();

        for (offset, query) in [(0, "ban"), (100, "bana"), (200, "banan"), (300, "banana")] {
            debouncer.schedule(query, t0 + ms(offset));
            assert!(debouncer.poll(t0 + ms(offset)).is_none());
        }

        assert!(debouncer.poll(t0 + ms(1299)).is_none());

        let fired = debouncer.poll(t0 + ms(1300)).unwrap();
        assert_eq!(fired.query, "banana");
        assert!(debouncer.is_current(fired.generation));

        // Exactly one query for the burst
        assert!(debouncer.poll(t0 + ms(5000)).is_none());
    }

    #[test]
    fn test_later_query_supersedes_issued_one() {
        let mut debouncer = Debouncer::new(ms(50));
        let t0 = Instant::now();

        debouncer.schedule("first", t0);
        let first = debouncer.poll(t0 + ms(50)).unwrap();

        debouncer.schedule("second", t0 + ms(60));
        let second = debouncer.poll(t0 + ms(110)).unwrap();

        assert!(second.generation > first.generation);
        assert!(!debouncer.is_current(first.generation));
        assert!(debouncer.is_current(second.generation));
    }

    #[test]
    fn test_cancel_drops_pending_and_in_flight() {
        let mut debouncer = Debouncer::new(ms(10));
        let t0 = Instant::now();

        debouncer.schedule("acme", t0);
        let issued = debouncer.poll(t0 + ms(10)).unwrap();
        debouncer.schedule("acme corp", t0 + ms(20));

        debouncer.cancel();

        assert!(!debouncer.is_pending());
        assert!(debouncer.poll(t0 + ms(100)).is_none());
        assert!(!debouncer.is_current(issued.generation));
    }
}
