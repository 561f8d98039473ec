//! Fixed-capacity history of recent rate samples for monitoring displays.
//!
//! The history is shared between exactly one writer (the thread producing rates, e.g.
//! from [`SplitterCounters`](crate::splitter::SplitterCounters) deltas) and any number of
//! read-only consumers. No lock is taken on either side:
//!
//! - Each sample is stored as the bit pattern of an `f64` in an `AtomicU64`, so a single
//!   sample is never torn.
//! - The writer publishes a monotonically increasing write count with `Release` ordering
//!   after storing the sample; readers load it with `Acquire`.
//! - A reader scanning while the writer wraps around may see a mix of older and newer
//!   samples. That bounded tearing is accepted: the data is for display only.
//!
//! # Memory Layout
//! ```text
//! samples: [AtomicU64; capacity]   (f64 bits, circular)
//! written: AtomicU64               (total samples ever pushed)
//! newest sample index = (written - 1) % capacity
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct Shared {
    samples: Box<[AtomicU64]>,
    written: AtomicU64,
}

impl Shared {
    fn capacity(&self) -> u64 {
        self.samples.len() as u64
    }

    fn len(&self) -> usize {
        let written = self.written.load(Ordering::Acquire);
        written.min(self.capacity()) as usize
    }

    fn sample(&self, position: u64) -> f64 {
        let slot = (position % self.capacity()) as usize;
        f64::from_bits(self.samples[slot].load(Ordering::Relaxed))
    }
}

/// Constructor for a writer/reader pair sharing one circular buffer.
pub struct RateHistory;

impl RateHistory {
    /// Create a history holding the `capacity` most recent samples (at least one).
    #[allow(clippy::new_ret_no_self)]
    pub fn new(capacity: usize) -> (RateWriter, RateReader) {
        let samples = (0..capacity.max(1))
            .map(|_| AtomicU64::new(0f64.to_bits()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        let shared = Arc::new(Shared {
            samples,
            written: AtomicU64::new(0),
        });

        (
            RateWriter {
                shared: Arc::clone(&shared),
            },
            RateReader { shared },
        )
    }
}

/// The single appending side of a rate history. Not `Clone`.
#[derive(Debug)]
pub struct RateWriter {
    shared: Arc<Shared>,
}

impl RateWriter {
    /// Append a sample, overwriting the oldest one once the history is full.
    pub fn push(&mut self, rate: f64) {
        let written = self.shared.written.load(Ordering::Relaxed);
        let slot = (written % self.shared.capacity()) as usize;
        self.shared.samples[slot].store(rate.to_bits(), Ordering::Relaxed);
        self.shared.written.store(written + 1, Ordering::Release);
    }

    /// A new reader over the same history.
    pub fn reader(&self) -> RateReader {
        RateReader {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// A lock-free, read-only view of a rate history.
#[derive(Debug, Clone)]
pub struct RateReader {
    shared: Arc<Shared>,
}

impl RateReader {
    /// Maximum number of samples retained.
    pub fn capacity(&self) -> usize {
        self.shared.samples.len()
    }

    /// Number of samples currently retained.
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    /// True if nothing was pushed yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total samples pushed since creation, including overwritten ones.
    pub fn total_written(&self) -> u64 {
        self.shared.written.load(Ordering::Acquire)
    }

    /// The most recent sample.
    pub fn last(&self) -> Option<f64> {
        let written = self.shared.written.load(Ordering::Acquire);
        (written > 0).then(|| self.shared.sample(written - 1))
    }

    /// Retained samples, oldest first.
    pub fn snapshot(&self) -> Vec<f64> {
        let written = self.shared.written.load(Ordering::Acquire);
        let start = written.saturating_sub(self.shared.capacity());
        (start..written).map(|pos| self.shared.sample(pos)).collect()
    }

    /// Largest retained sample.
    pub fn max(&self) -> Option<f64> {
        self.snapshot().into_iter().reduce(f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_empty_history() {
        let (_writer, reader) = RateHistory::new(4);
        assert!(reader.is_empty());
        assert_eq!(reader.last(), None);
        assert_eq!(reader.max(), None);
        assert!(reader.snapshot().is_empty());
    }

    #[test]
    fn test_keeps_most_recent_samples_in_order() {
        let (mut writer, reader) = RateHistory::new(3);
        for rate in [1.0, 2.0, 3.0, 4.0, 5.0] {
            writer.push(rate);
        }

        assert_eq!(reader.len(), 3);
        assert_eq!(reader.total_written(), 5);
        assert_eq!(reader.snapshot(), vec![3.0, 4.0, 5.0]);
        assert_eq!(reader.last(), Some(5.0));
        assert_eq!(reader.max(), Some(5.0));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let (mut writer, reader) = RateHistory::new(0);
        assert_eq!(reader.capacity(), 1);
        writer.push(2.5);
        writer.push(7.5);
        assert_eq!(reader.snapshot(), vec![7.5]);
    }

    #[test]
    fn test_concurrent_reader_sees_only_pushed_values() {
        let (mut writer, reader) = RateHistory::new(16);
        let scanner = {
            let reader = writer.reader();
            thread::spawn(move || {
                for _ in 0..1_000 {
                    for sample in reader.snapshot() {
                        assert!(sample.fract() == 0.0 && (0.0..10_000.0).contains(&sample));
                    }
                }
            })
        };

        for i in 0..10_000 {
            writer.push(f64::from(i));
        }
        assert!(scanner.join().is_ok());
        assert_eq!(reader.last(), Some(9_999.0));
    }
}
