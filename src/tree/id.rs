//! Node identifier generation.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Generates node identifiers from the wall clock in milliseconds.
///
/// Identifiers are strictly increasing within one generator: when two requests land in the
/// same millisecond (or the clock steps back) the previous value plus one is used instead.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicU64,
}

impl IdGenerator {
    /// Create a new generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce the next identifier.
    pub fn next_id(&self) -> String {
        self.next_value().to_string()
    }

    fn next_value(&self) -> u64 {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last + 1);
            match self.last.compare_exchange_weak(
                last,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }
}
