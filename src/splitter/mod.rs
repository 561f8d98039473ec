//! Multi-event splitter.
//!
//! A readout buffer for one event may contain several concatenated sub-events per
//! module, for example when a digitizer is read out in multi-event mode. The splitter
//! uses one header [`BitFilter`] per module to find sub-event boundaries in the
//! module's dynamic region and re-emits every sub-event as its own logical event via
//! [`SplitterCallbacks`].
//!
//! # Decode cycle
//!
//! ```
//! use daq_splitter::splitter::{MultiEventSplitter, SplitterCallbacks};
//!
//! #[derive(Default)]
//! struct CountEvents(usize);
//!
//! impl SplitterCallbacks for CountEvents {
//!     fn begin_event(&mut self, _event_index: usize) {
//!         self.0 += 1;
//!     }
//! }
//!
//! // one event slot with one module; headers have bit 3 set, bits 2..0 hold the size
//! let mut splitter = MultiEventSplitter::new(&[vec!["1SSS"]]).unwrap();
//! let buffer = [0x9, 0x1, 0x8, 0xA, 0x0, 0x1];
//!
//! let mut cycle = splitter.begin_event(0).unwrap();
//! cycle.module_data(0, &buffer).unwrap();
//! let mut callbacks = CountEvents::default();
//! assert_eq!(cycle.end_event(&mut callbacks), 3);
//! assert_eq!(callbacks.0, 3);
//! ```
//!
//! # Boundary policy
//!
//! - The loop stops as soon as no module's remaining data starts with a matching header.
//!   Whatever is left is dropped silently and accounted in
//!   [`ModuleCounters::unconsumed_words`].
//! - A sub-event whose size exceeds the remaining words is truncated data: the module's
//!   remaining words are dropped and nothing is emitted for it in that iteration.
//! - A module whose header filter has no fixed bits cannot mark boundaries. In a
//!   splitting slot its whole dynamic region is emitted once, in the first sub-event.
//! - Every matched header consumes at least the header word itself, so the loop always
//!   terminates.

pub mod counters;
pub mod span;

pub use counters::{EventCounters, ModuleCounters, SplitterCounters};
pub use span::{DataSpan, ModuleSpans};

use crate::error::{FilterError, SplitterError};
use crate::filter::{BitFilter, FilterCache};
use tracing::{debug, info, trace};

/// Extraction marker naming the sub-event size field in header filters.
///
/// This is the only marker the splitter reads. Bits tagged with any other character are
/// don't-cares, so a header filter without `S` bits describes one-word sub-events.
pub const SIZE_MARKER: char = 'S';

/// Receiver of reconstructed events.
///
/// Every `begin_event`/`end_event` bracket is one independent logical event. Word slices
/// are only valid for the duration of the call. All methods default to doing nothing.
pub trait SplitterCallbacks {
    /// A new logical event starts.
    fn begin_event(&mut self, event_index: usize) {
        let _ = event_index;
    }

    /// Prefix words of a module.
    fn module_prefix(&mut self, event_index: usize, module_index: usize, words: &[u32]) {
        let _ = (event_index, module_index, words);
    }

    /// One sub-event of a module.
    fn module_dynamic(&mut self, event_index: usize, module_index: usize, words: &[u32]) {
        let _ = (event_index, module_index, words);
    }

    /// Suffix words of a module.
    fn module_suffix(&mut self, event_index: usize, module_index: usize, words: &[u32]) {
        let _ = (event_index, module_index, words);
    }

    /// The current logical event is complete.
    fn end_event(&mut self, event_index: usize) {
        let _ = event_index;
    }
}

/// Compiled header filter of one module.
#[derive(Debug, Clone)]
struct ModuleFilter {
    header: BitFilter,
    size: FilterCache,
}

impl ModuleFilter {
    fn compile(pattern: &str) -> Result<Self, FilterError> {
        let header = BitFilter::new(pattern)?;
        let size = header.make_cache_entry(SIZE_MARKER);
        Ok(Self { header, size })
    }

    /// False for always-match filters, which cannot locate boundaries.
    fn marks_boundaries(&self) -> bool {
        !self.header.always_matches()
    }

    /// True if the remaining dynamic data starts a sub-event for this module.
    #[inline]
    fn accepts(&self, dynamic: &DataSpan<'_>) -> bool {
        match dynamic.first() {
            Some(header) => !self.marks_boundaries() || self.header.matches(header),
            None => false,
        }
    }

    /// Words in the sub-event starting at the front of `dynamic`, header included.
    #[inline]
    fn sub_event_len(&self, dynamic: &DataSpan<'_>) -> usize {
        match dynamic.first() {
            Some(header) if self.marks_boundaries() => {
                (self.size.extract(header) as usize).saturating_add(1)
            }
            _ => dynamic.len(),
        }
    }
}

/// Compiled filters of one event slot.
#[derive(Debug, Clone)]
struct EventSlot {
    modules: Vec<ModuleFilter>,
    splitting_enabled: bool,
}

impl EventSlot {
    /// Emit the recorded spans unchanged inside a single bracket.
    fn passthrough<C: SplitterCallbacks + ?Sized>(
        event_index: usize,
        spans: &[ModuleSpans<'_>],
        counters: &mut EventCounters,
        callbacks: &mut C,
    ) -> usize {
        callbacks.begin_event(event_index);

        for (module_index, (span, stats)) in spans.iter().zip(&mut counters.modules).enumerate() {
            if !span.prefix.is_empty() {
                callbacks.module_prefix(event_index, module_index, span.prefix.words());
            }
            if !span.dynamic.is_empty() {
                callbacks.module_dynamic(event_index, module_index, span.dynamic.words());
                stats.sub_events += 1;
            }
            if !span.suffix.is_empty() {
                callbacks.module_suffix(event_index, module_index, span.suffix.words());
            }
        }

        callbacks.end_event(event_index);
        1
    }

    /// Walk the dynamic regions header by header, emitting one bracket per iteration.
    fn split<C: SplitterCallbacks + ?Sized>(
        &self,
        event_index: usize,
        spans: &mut [ModuleSpans<'_>],
        matched: &mut [bool],
        counters: &mut EventCounters,
        callbacks: &mut C,
    ) -> usize {
        let matched = &mut matched[..spans.len()];
        let mut brackets = 0;

        loop {
            let mut any_match = false;
            for ((flag, module), span) in matched.iter_mut().zip(&self.modules).zip(spans.iter()) {
                *flag = module.accepts(&span.dynamic);
                any_match |= *flag;
            }

            if !any_match {
                break;
            }

            callbacks.begin_event(event_index);
            brackets += 1;

            for (module_index, (((module, span), stats), _)) in self
                .modules
                .iter()
                .zip(spans.iter_mut())
                .zip(&mut counters.modules)
                .zip(matched.iter())
                .enumerate()
                .filter(|(_, (_, flag))| **flag)
            {
                stats.header_matches += 1;
                let sub_event_len = module.sub_event_len(&span.dynamic);

                let Some(sub_event) = span.dynamic.take_front(sub_event_len) else {
                    trace!(
                        event_index,
                        module_index,
                        sub_event_len,
                        remaining = span.dynamic.len(),
                        "sub-event exceeds module data, dropping remainder"
                    );
                    stats.truncated += 1;
                    stats.unconsumed_words += span.dynamic.len() as u64;
                    span.dynamic.clear();
                    continue;
                };

                if !span.prefix.is_empty() {
                    callbacks.module_prefix(event_index, module_index, span.prefix.words());
                }
                callbacks.module_dynamic(event_index, module_index, sub_event);
                stats.sub_events += 1;
                if !span.suffix.is_empty() {
                    callbacks.module_suffix(event_index, module_index, span.suffix.words());
                }
            }

            callbacks.end_event(event_index);
        }

        for (module_index, (span, stats)) in spans.iter().zip(&mut counters.modules).enumerate() {
            if !span.dynamic.is_empty() {
                trace!(
                    event_index,
                    module_index,
                    remaining = span.dynamic.len(),
                    "no header match, dropping remaining module data"
                );
                stats.unconsumed_words += span.dynamic.len() as u64;
            }
        }

        brackets
    }
}

/// Long-lived splitter state: compiled filters, scratch space and counters.
///
/// Built once per session and driven by a single producer. Each decode cycle starts with
/// [`begin_event`](Self::begin_event), which hands out an [`EventCycle`] borrowing the
/// splitter mutably, so concurrent cycles on one instance are ruled out by the type
/// system. Independent instances need no coordination.
#[derive(Debug, Clone)]
pub struct MultiEventSplitter {
    slots: Vec<EventSlot>,
    /// Per-module header match flags, sized to the largest slot and reused every iteration.
    matched: Vec<bool>,
    /// Span storage handed to each cycle and returned when the cycle ends.
    span_pool: Vec<ModuleSpans<'static>>,
    counters: SplitterCounters,
}

impl MultiEventSplitter {
    /// Compile one header filter per module, one inner list per event slot.
    ///
    /// Header filters use the `'S'` marker for the sub-event size in words, not counting
    /// the header itself. Splitting is enabled for a slot if at least one module filter
    /// has fixed bits. Fails if any pattern is longer than 32 bits.
    pub fn new<S: AsRef<str>>(filter_strings: &[Vec<S>]) -> Result<Self, FilterError> {
        let mut slots = Vec::with_capacity(filter_strings.len());

        for (event_index, patterns) in filter_strings.iter().enumerate() {
            let modules = patterns
                .iter()
                .map(|pattern| ModuleFilter::compile(pattern.as_ref()))
                .collect::<Result<Vec<_>, _>>()?;

            let splitting_enabled = modules.iter().any(ModuleFilter::marks_boundaries);

            debug!(
                event_index,
                modules = modules.len(),
                splitting_enabled,
                filters = ?modules.iter().map(|m| m.header.pattern()).collect::<Vec<_>>(),
                "compiled event header filters"
            );

            slots.push(EventSlot {
                modules,
                splitting_enabled,
            });
        }

        let max_modules = slots.iter().map(|slot| slot.modules.len()).max().unwrap_or(0);
        let counters = SplitterCounters::with_layout(slots.iter().map(|slot| slot.modules.len()));

        info!(
            events = slots.len(),
            max_modules,
            splitting_events = slots.iter().filter(|slot| slot.splitting_enabled).count(),
            "multi-event splitter ready"
        );

        Ok(Self {
            slots,
            matched: vec![false; max_modules],
            span_pool: Vec::with_capacity(max_modules),
            counters,
        })
    }

    /// Number of configured event slots.
    pub fn event_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of modules in an event slot.
    pub fn module_count(&self, event_index: usize) -> Option<usize> {
        self.slots.get(event_index).map(|slot| slot.modules.len())
    }

    /// Largest module count across all slots.
    pub fn max_module_count(&self) -> usize {
        self.matched.len()
    }

    /// Whether sub-event splitting is active for an event slot.
    pub fn is_splitting_enabled(&self, event_index: usize) -> Option<bool> {
        self.slots.get(event_index).map(|slot| slot.splitting_enabled)
    }

    /// The compiled header filter of a module.
    pub fn module_filter(&self, event_index: usize, module_index: usize) -> Option<&BitFilter> {
        self.slots
            .get(event_index)?
            .modules
            .get(module_index)
            .map(|module| &module.header)
    }

    /// Statistics accumulated since construction or the last reset.
    pub fn counters(&self) -> &SplitterCounters {
        &self.counters
    }

    /// Zero all statistics.
    pub fn reset_counters(&mut self) {
        self.counters.reset();
    }

    /// Start a decode cycle for `event_index` with all module spans empty.
    ///
    /// Dropping the returned cycle without calling [`EventCycle::end_event`] discards it;
    /// the next `begin_event` starts from empty spans again. The span storage is reused
    /// across cycles, so steady-state decoding does not allocate.
    pub fn begin_event<'buf>(
        &mut self,
        event_index: usize,
    ) -> Result<EventCycle<'_, 'buf>, SplitterError> {
        let module_count = self
            .module_count(event_index)
            .ok_or(SplitterError::EventIndexOutOfRange)?;

        let mut spans = recycle_spans(std::mem::take(&mut self.span_pool));
        spans.resize(module_count, ModuleSpans::default());

        Ok(EventCycle {
            splitter: self,
            event_index,
            spans,
        })
    }

    fn finish_cycle<C: SplitterCallbacks + ?Sized>(
        &mut self,
        event_index: usize,
        spans: &mut [ModuleSpans<'_>],
        callbacks: &mut C,
    ) -> usize {
        let Self {
            slots,
            matched,
            counters,
            ..
        } = self;

        // both lookups were validated by begin_event
        let (Some(slot), Some(stats)) = (slots.get(event_index), counters.events.get_mut(event_index))
        else {
            return 0;
        };

        stats.input_events += 1;

        let brackets = if slot.splitting_enabled {
            slot.split(event_index, spans, matched, stats, callbacks)
        } else {
            EventSlot::passthrough(event_index, spans, stats, callbacks)
        };

        stats.output_events += brackets as u64;
        brackets
    }
}

/// One decode cycle of a single event slot.
///
/// Records borrowed prefix/dynamic/suffix spans per module and emits the reconstructed
/// events on [`end_event`](Self::end_event). The spans never outlive the cycle.
#[derive(Debug)]
pub struct EventCycle<'s, 'buf> {
    splitter: &'s mut MultiEventSplitter,
    event_index: usize,
    spans: Vec<ModuleSpans<'buf>>,
}

impl<'buf> EventCycle<'_, 'buf> {
    /// The event slot this cycle belongs to.
    pub fn event_index(&self) -> usize {
        self.event_index
    }

    /// The spans recorded so far for a module.
    pub fn spans(&self, module_index: usize) -> Option<&ModuleSpans<'buf>> {
        self.spans.get(module_index)
    }

    /// Record the prefix words of a module, replacing any earlier prefix.
    pub fn module_prefix(
        &mut self,
        module_index: usize,
        words: &'buf [u32],
    ) -> Result<(), SplitterError> {
        self.module_spans_mut(module_index)?.prefix = DataSpan::new(words);
        Ok(())
    }

    /// Record the dynamic (possibly multi-sub-event) words of a module, replacing any
    /// earlier data.
    pub fn module_data(
        &mut self,
        module_index: usize,
        words: &'buf [u32],
    ) -> Result<(), SplitterError> {
        self.module_spans_mut(module_index)?.dynamic = DataSpan::new(words);
        Ok(())
    }

    /// Record the suffix words of a module, replacing any earlier suffix.
    pub fn module_suffix(
        &mut self,
        module_index: usize,
        words: &'buf [u32],
    ) -> Result<(), SplitterError> {
        self.module_spans_mut(module_index)?.suffix = DataSpan::new(words);
        Ok(())
    }

    /// Forget all spans recorded in this cycle.
    pub fn reset(&mut self) {
        self.spans.fill(ModuleSpans::default());
    }

    /// Emit the reconstructed events and end the cycle.
    ///
    /// Returns the number of `begin_event`/`end_event` brackets emitted.
    pub fn end_event<C: SplitterCallbacks + ?Sized>(mut self, callbacks: &mut C) -> usize {
        self.splitter
            .finish_cycle(self.event_index, &mut self.spans, callbacks)
    }

    fn module_spans_mut(
        &mut self,
        module_index: usize,
    ) -> Result<&mut ModuleSpans<'buf>, SplitterError> {
        self.spans
            .get_mut(module_index)
            .ok_or(SplitterError::ModuleIndexOutOfRange)
    }
}

impl Drop for EventCycle<'_, '_> {
    fn drop(&mut self) {
        self.splitter.span_pool = recycle_spans(std::mem::take(&mut self.spans));
    }
}

/// Empty `spans` and reuse its allocation under another buffer lifetime.
fn recycle_spans<'from, 'to>(mut spans: Vec<ModuleSpans<'from>>) -> Vec<ModuleSpans<'to>> {
    spans.clear();
    // in-place collect: same element layout, so the buffer is kept
    spans.into_iter().map(|_| ModuleSpans::default()).collect()
}
