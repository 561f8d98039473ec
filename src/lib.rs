//! # DAQ Multi-Event Splitter
//!
//! This crate turns raw 32-bit readout buffers into a stream of logical events. A module
//! read out in multi-event mode delivers several concatenated sub-events in one buffer;
//! the splitter finds the sub-event boundaries using per-module header filters and emits
//! each sub-event as an independent event through callbacks consumed by the recording
//! and analysis pipeline.
//!
//! ## Crate Structure
//!
//! - **`filter`**: The bit-pattern filter language. Compiles mask strings such as
//!   `"0100 XXXX XXXX SSSS"` into match mask/value pairs and precomputed field
//!   extractors (`BitFilter`, `FilterCache`, `MultiWordFilter`).
//! - **`splitter`**: The `MultiEventSplitter` and its begin/feed/end decode cycle
//!   (`EventCycle`), borrowed data spans, callbacks and running counters.
//! - **`error`**: `SplitterError` for the decode path, `FilterError` for pattern
//!   compilation, and the setup-level `DaqError`.
//! - **`config`**: Figment-based loading of event/module header filter configuration.
//! - **`logging`**: `tracing-subscriber` initialization.
//! - **`rate_history`**: A lock-free, single-writer history of recent rates for
//!   monitoring displays.
//!
//! The decode path is synchronous and performs no I/O. All data is borrowed from the
//! caller for exactly one decode cycle.

pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod rate_history;
pub mod splitter;

pub use error::{DaqError, DaqResult, FilterError, SplitterError};
pub use filter::{BitFilter, FilterCache, MultiWordFilter};
pub use splitter::{
    DataSpan, EventCycle, ModuleSpans, MultiEventSplitter, SplitterCallbacks, SplitterCounters,
    SIZE_MARKER,
};
