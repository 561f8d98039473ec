//! Borrowed views over caller-owned readout words.

/// A non-owning view over a contiguous run of data words.
///
/// Spans live for one decode cycle only: the `'buf` lifetime ties them to the
/// [`EventCycle`](super::EventCycle) they were recorded in, so the caller is free to
/// reuse or release the backing buffer as soon as `end_event` returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataSpan<'buf> {
    words: &'buf [u32],
}

impl<'buf> DataSpan<'buf> {
    /// Wrap a slice of words.
    pub fn new(words: &'buf [u32]) -> Self {
        Self { words }
    }

    /// The viewed words.
    pub fn words(&self) -> &'buf [u32] {
        self.words
    }

    /// Number of words in the span.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// True if the span holds no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The leading word, if any.
    pub fn first(&self) -> Option<u32> {
        self.words.first().copied()
    }

    /// Split off the first `count` words and advance past them. Leaves the span
    /// untouched and returns `None` if fewer than `count` words remain.
    pub(crate) fn take_front(&mut self, count: usize) -> Option<&'buf [u32]> {
        if count > self.words.len() {
            return None;
        }
        let (head, tail) = self.words.split_at(count);
        self.words = tail;
        Some(head)
    }

    /// Drop all remaining words.
    pub(crate) fn clear(&mut self) {
        self.words = &[];
    }
}

impl<'buf> From<&'buf [u32]> for DataSpan<'buf> {
    fn from(words: &'buf [u32]) -> Self {
        Self::new(words)
    }
}

/// The three regions recorded for one module during a decode cycle.
///
/// Prefix and suffix are fixed data repeated around every sub-event; the dynamic
/// region holds zero or more concatenated sub-events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModuleSpans<'buf> {
    /// Words preceding the dynamic region.
    pub prefix: DataSpan<'buf>,
    /// The possibly multi-sub-event region.
    pub dynamic: DataSpan<'buf>,
    /// Words following the dynamic region.
    pub suffix: DataSpan<'buf>,
}

impl ModuleSpans<'_> {
    /// True if no region holds any words.
    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty() && self.dynamic.is_empty() && self.suffix.is_empty()
    }
}
