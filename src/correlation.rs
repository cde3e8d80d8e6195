use std::sync::atomic::{AtomicU64, Ordering};

/// Tag pairing a logged request with its logged response or error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CorrelationId(u64);

impl CorrelationId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic counter handing out correlation IDs.
///
/// Shared by reference (usually behind an `Arc`) between every caller that
/// issues requests. The counter is a single atomic, so concurrent `next`
/// calls never observe the same value.
#[derive(Debug, Default)]
pub struct CorrelationIdGenerator {
    current: AtomicU64,
}

impl CorrelationIdGenerator {
    pub fn new(start: u64) -> Self {
        Self {
            current: AtomicU64::new(start),
        }
    }

    /// Advance by one and return the new value.
    pub fn next(&self) -> CorrelationId {
        self.next_by(1)
    }

    /// Advance by `step` (at least 1) and return the new value.
    pub fn next_by(&self, step: u64) -> CorrelationId {
        let step = step.max(1);
        let previous = self.current.fetch_add(step, Ordering::SeqCst);
        CorrelationId(previous.wrapping_add(step))
    }

    pub fn value(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    /// Must not race with `next` callers that rely on ordering across the reset.
    pub fn reset(&self, to: u64) {
        self.current.store(to, Ordering::SeqCst);
    }
}
