//! Filters whose extraction field is spread over several data words.
//!
//! Some modules split a wide value (e.g. a 48-bit timestamp) across two words with
//! distinct headers. A [`MultiWordFilter`] collects the first word matching each of its
//! sub-filters and combines the per-word fields into one integer.

use super::{BitFilter, FilterCache};
use crate::error::FilterError;

/// Maximum number of sub-filters; two 32-bit fields always fit the 64-bit result.
pub const MULTI_WORD_MAX_FILTERS: usize = 2;

/// An ordered list of word filters that together describe one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiWordFilter {
    filters: Vec<BitFilter>,
    words: Vec<Option<u32>>,
}

/// Per-sub-filter extraction caches for one marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiWordCache {
    caches: Vec<FilterCache>,
}

impl MultiWordCache {
    /// Total number of bits the combined value can hold.
    pub fn total_bits(&self) -> u32 {
        self.caches.iter().map(FilterCache::extract_bits).sum()
    }
}

impl MultiWordFilter {
    /// Create a filter from its sub-filters, least significant part first.
    pub fn new(filters: Vec<BitFilter>) -> Result<Self, FilterError> {
        if filters.len() > MULTI_WORD_MAX_FILTERS {
            return Err(FilterError::TooManyFilters {
                count: filters.len(),
                max: MULTI_WORD_MAX_FILTERS,
            });
        }

        let words = vec![None; filters.len()];
        Ok(Self { filters, words })
    }

    /// The sub-filters in result order.
    pub fn filters(&self) -> &[BitFilter] {
        &self.filters
    }

    /// Offer a data word. The word is stored for the first sub-filter that has not seen a
    /// match yet and accepts it. Returns [`is_complete`](Self::is_complete).
    pub fn handle_word(&mut self, word: u32, word_index: Option<u32>) -> bool {
        if let Some(slot) = self
            .filters
            .iter()
            .zip(self.words.iter_mut())
            .find(|(filter, slot)| slot.is_none() && filter.matches_at(word, word_index))
            .map(|(_, slot)| slot)
        {
            *slot = Some(word);
        }

        self.is_complete()
    }

    /// True once every sub-filter has matched a word.
    pub fn is_complete(&self) -> bool {
        !self.words.is_empty() && self.words.iter().all(Option::is_some)
    }

    /// Forget all collected words.
    pub fn reset(&mut self) {
        self.words.fill(None);
    }

    /// Precompute extraction of the field named by `marker` from every sub-filter.
    pub fn make_cache_entry(&self, marker: char) -> MultiWordCache {
        MultiWordCache {
            caches: self
                .filters
                .iter()
                .map(|filter| filter.make_cache_entry(marker))
                .collect(),
        }
    }

    /// Combine the extracted fields of all collected words. The first sub-filter supplies
    /// the least significant bits. Returns `None` until the filter is complete.
    pub fn extract(&self, cache: &MultiWordCache) -> Option<u64> {
        if !self.is_complete() {
            return None;
        }

        let mut result = 0u64;
        let mut shift = 0u32;

        for (word, part) in self.words.iter().zip(&cache.caches) {
            let word = (*word)?;
            result |= u64::from(part.extract(word)) << shift;
            shift += part.extract_bits();
        }

        Some(result)
    }
}
