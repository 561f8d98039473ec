//! Error types for filter compilation, splitting and setup.
//!
//! Errors fall into two groups with very different handling rules:
//!
//! - **Setup errors** ([`FilterError`], [`DaqError`]) are raised while compiling filter
//!   patterns or loading configuration. They are fail-fast: a session must not start until
//!   the configuration is corrected.
//! - **Per-call errors** ([`SplitterError`]) are returned by value from the decode path.
//!   They are a closed, `Copy` set with static messages, so returning one never allocates.
//!   Callers treat them as integration bugs and abort the current buffer; nothing retries.
//!
//! Truncated or malformed sub-event payloads are deliberately *not* errors. The splitter
//! drops the unconsumed remainder and records it in its counters instead.

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type DaqResult<T> = std::result::Result<T, DaqError>;

// =============================================================================
// Splitter Errors
// =============================================================================

/// Stable `(name, message)` pairs, indexed by [`SplitterError::code`].
const SPLITTER_ERROR_TABLE: [(&str, &str); 2] = [
    ("EventIndexOutOfRange", "event index out of range"),
    ("ModuleIndexOutOfRange", "module index out of range"),
];

/// Indexing errors returned by the multi-event splitter.
///
/// Success is expressed as `Ok(..)`; this enum only carries the failure cases.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[error("{}", self.message())]
pub enum SplitterError {
    /// The event index does not name a configured event slot.
    EventIndexOutOfRange,
    /// The module index does not name a module of the selected event slot.
    ModuleIndexOutOfRange,
}

impl SplitterError {
    /// All variants, in code order.
    pub const ALL: [SplitterError; 2] = [
        SplitterError::EventIndexOutOfRange,
        SplitterError::ModuleIndexOutOfRange,
    ];

    /// Numeric code, starting at 1 (0 is reserved for success).
    pub const fn code(self) -> u8 {
        match self {
            SplitterError::EventIndexOutOfRange => 1,
            SplitterError::ModuleIndexOutOfRange => 2,
        }
    }

    /// Stable identifier, suitable for logs and counters.
    pub const fn name(self) -> &'static str {
        SPLITTER_ERROR_TABLE[self.code() as usize - 1].0
    }

    /// Human-readable message.
    pub const fn message(self) -> &'static str {
        SPLITTER_ERROR_TABLE[self.code() as usize - 1].1
    }
}

// =============================================================================
// Filter Errors
// =============================================================================

/// Errors raised while compiling filter patterns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// The pattern has more bit characters than fit into a data word.
    #[error("filter pattern '{pattern}' has {bits} bits, maximum is {max}")]
    PatternTooLong {
        /// The offending pattern as given.
        pattern: String,
        /// Number of bit characters after removing spaces.
        bits: usize,
        /// Maximum supported width.
        max: usize,
    },

    /// A multi-word filter was given more sub-filters than it supports.
    #[error("multi-word filter takes at most {max} filters, got {count}")]
    TooManyFilters {
        /// Number of filters supplied.
        count: usize,
        /// Maximum supported number of filters.
        max: usize,
    },
}

// =============================================================================
// Application Errors
// =============================================================================

/// Top-level error for setup paths (configuration, logging, splitter construction).
#[derive(Error, Debug)]
pub enum DaqError {
    /// The configuration could not be read or deserialized.
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// The configuration parsed but holds semantically invalid values.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// A filter pattern failed to compile.
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    /// A splitter call was made with invalid indices.
    #[error("Splitter error: {0}")]
    Splitter(#[from] SplitterError),

    /// The tracing subscriber could not be installed.
    #[error("Tracing initialization failed: {0}")]
    Tracing(String),
}
