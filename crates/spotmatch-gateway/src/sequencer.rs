//! The global sequence authority.
//!
//! A single monotonic counter across all instruments. Every admitted
//! mutating intent (place or cancel) draws exactly one value; rejected
//! intents draw none. Sequence numbers start at 1 so that 0 can mean
//! "nothing admitted yet".

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonically increasing sequence numbers, shared by all executors.
#[derive(Debug, Default)]
pub struct Sequencer {
    next: AtomicU64,
}

impl Sequencer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the next sequence number.
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The most recently drawn sequence number (0 if none yet).
    #[must_use]
    pub fn current(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn starts_at_one() {
        let seq = Sequencer::new();
        assert_eq!(seq.current(), 0);
        assert_eq!(seq.next(), 1);
        assert_eq!(seq.next(), 2);
        assert_eq!(seq.current(), 2);
    }

    #[test]
    fn concurrent_draws_are_unique() {
        let seq = Arc::new(Sequencer::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let seq = Arc::clone(&seq);
            handles.push(std::thread::spawn(move || {
                (0..1000).map(|_| seq.next()).collect::<Vec<u64>>()
            }));
        }
        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 4000, "no duplicates under contention");
        assert_eq!(seq.current(), 4000);
    }
}
