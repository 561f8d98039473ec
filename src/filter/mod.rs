//! Bit-pattern filters over 32-bit data words.
//!
//! A filter is compiled from a short mask string read left to right from the most
//! significant bit down to bit 0:
//!
//! - `'0'` / `'1'` fix the bit for matching.
//! - Any other character is a don't-care for matching and tags the bit as part of the
//!   extraction field named by that character. Markers are case-insensitive, using
//!   Unicode simple upper-casing (`'ä'` and `'Ä'` name the same field).
//! - Whitespace is cosmetic and removed before compilation.
//!
//! ```
//! use daq_splitter::filter::BitFilter;
//!
//! let filter = BitFilter::new("01XX").unwrap();
//! assert_eq!(filter.match_mask(), 0b1100);
//! assert_eq!(filter.match_value(), 0b0100);
//! assert!(filter.matches(0b0110));
//!
//! let cache = filter.make_cache_entry('x');
//! assert_eq!(cache.extract(0b0110), 0b10);
//! ```
//!
//! Matching and extraction are branch-light O(1) operations meant for the decode hot
//! path; all pattern parsing happens once at setup.

pub mod multi_word;

pub use multi_word::{MultiWordCache, MultiWordFilter, MULTI_WORD_MAX_FILTERS};

use crate::error::FilterError;
use std::fmt;

/// Maximum number of bit characters in a filter pattern.
pub const FILTER_MAX_BITS: usize = 32;

/// Placeholder for bit positions above the pattern width. Never a valid marker
/// because whitespace is stripped from patterns.
const UNUSED_BIT: char = ' ';

/// A compiled match mask/value pair with an optional word-index constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitFilter {
    /// Pattern characters indexed by bit position (index 0 is the least significant bit).
    bits: [char; FILTER_MAX_BITS],
    width: u8,
    match_mask: u32,
    match_value: u32,
    word_index: Option<u32>,
}

impl BitFilter {
    /// Compile a pattern that matches at any word position.
    pub fn new(pattern: &str) -> Result<Self, FilterError> {
        Self::with_word_index(pattern, None)
    }

    /// Compile a pattern that only matches at `word_index` (or anywhere if `None`).
    ///
    /// An empty pattern is accepted and matches every word.
    pub fn with_word_index(pattern: &str, word_index: Option<u32>) -> Result<Self, FilterError> {
        let width = pattern.chars().filter(|c| !c.is_whitespace()).count();

        if width > FILTER_MAX_BITS {
            return Err(FilterError::PatternTooLong {
                pattern: pattern.to_string(),
                bits: width,
                max: FILTER_MAX_BITS,
            });
        }

        let mut bits = [UNUSED_BIT; FILTER_MAX_BITS];
        let mut match_mask = 0u32;
        let mut match_value = 0u32;

        for (pos, c) in pattern.chars().filter(|c| !c.is_whitespace()).enumerate() {
            let bit = width - 1 - pos;
            let c = fold_marker(c);
            bits[bit] = c;

            match c {
                '0' => match_mask |= 1 << bit,
                '1' => {
                    match_mask |= 1 << bit;
                    match_value |= 1 << bit;
                }
                _ => {}
            }
        }

        Ok(Self {
            bits,
            // width <= 32 was checked above
            width: width as u8,
            match_mask,
            match_value,
            word_index,
        })
    }

    /// Bits that must hold a fixed value for a word to match.
    pub fn match_mask(&self) -> u32 {
        self.match_mask
    }

    /// Required values of the bits in [`match_mask`](Self::match_mask).
    pub fn match_value(&self) -> u32 {
        self.match_value
    }

    /// Word position this filter is restricted to, if any.
    pub fn word_index(&self) -> Option<u32> {
        self.word_index
    }

    /// Number of bit characters in the compiled pattern.
    pub fn width(&self) -> usize {
        usize::from(self.width)
    }

    /// True if the filter has no fixed bits and therefore matches every word.
    pub fn always_matches(&self) -> bool {
        self.match_mask == 0
    }

    /// Test `value` ignoring word position constraints on the caller side.
    #[inline]
    pub fn matches(&self, value: u32) -> bool {
        self.matches_at(value, None)
    }

    /// Test `value` found at `word_index`.
    ///
    /// A filter without a word-index constraint matches at any position. A constrained
    /// filter only matches when `word_index` equals its constraint.
    #[inline]
    pub fn matches_at(&self, value: u32, word_index: Option<u32>) -> bool {
        let position_ok = match self.word_index {
            None => true,
            Some(required) => word_index == Some(required),
        };
        position_ok && (value & self.match_mask) == self.match_value
    }

    /// Mask of the bits tagged with `marker` (case-insensitive).
    pub fn extract_mask(&self, marker: char) -> u32 {
        let marker = fold_marker(marker);
        self.bits[..self.width()]
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == marker)
            .fold(0u32, |mask, (bit, _)| mask | (1 << bit))
    }

    /// Precompute extraction of the field named by `marker`.
    pub fn make_cache_entry(&self, marker: char) -> FilterCache {
        FilterCache::from_mask(self.extract_mask(marker))
    }

    /// Canonical pattern string (markers upper-cased, no whitespace).
    pub fn pattern(&self) -> String {
        self.bits[..self.width()].iter().rev().collect()
    }
}

impl fmt::Display for BitFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern())?;
        if let Some(index) = self.word_index {
            write!(f, "@{index}")?;
        }
        Ok(())
    }
}

/// Precomputed extraction of one named field from words matched by a [`BitFilter`].
///
/// Immutable once built. A contiguous field is extracted with one mask and one shift;
/// a field spread over several runs of bits is gathered into a dense, right-aligned value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterCache {
    extract_mask: u32,
    extract_shift: u32,
    extract_bits: u32,
    needs_gather: bool,
}

impl FilterCache {
    /// Build the cache for an arbitrary extraction mask.
    pub fn from_mask(extract_mask: u32) -> Self {
        if extract_mask == 0 {
            return Self::default();
        }

        let extract_shift = extract_mask.trailing_zeros();
        let run = extract_mask >> extract_shift;

        Self {
            extract_mask,
            extract_shift,
            extract_bits: extract_mask.count_ones(),
            // a contiguous run of ones plus one is a power of two
            needs_gather: run & run.wrapping_add(1) != 0,
        }
    }

    /// Bits tagged by the marker.
    pub fn extract_mask(&self) -> u32 {
        self.extract_mask
    }

    /// Position of the lowest tagged bit (0 for an empty mask).
    pub fn extract_shift(&self) -> u32 {
        self.extract_shift
    }

    /// Number of tagged bits.
    pub fn extract_bits(&self) -> u32 {
        self.extract_bits
    }

    /// True if the tagged bits do not form one contiguous run.
    pub fn needs_gather(&self) -> bool {
        self.needs_gather
    }

    /// Extract the field from `value` as a right-aligned integer. An empty mask yields 0.
    #[inline]
    pub fn extract(&self, value: u32) -> u32 {
        if self.needs_gather {
            gather_bits(value, self.extract_mask)
        } else {
            (value & self.extract_mask) >> self.extract_shift
        }
    }
}

/// Pack the bits of `value` selected by `mask` into the low bits of the result,
/// preserving their order.
///
/// Uses the BMI2 `pext` instruction when the crate is compiled for a target that has it,
/// and [`software_gather`] otherwise. Both produce identical results.
#[cfg(all(target_arch = "x86_64", target_feature = "bmi2"))]
#[allow(unsafe_code)]
#[inline]
pub fn gather_bits(value: u32, mask: u32) -> u32 {
    // SAFETY: this function is only compiled when the target guarantees BMI2.
    unsafe { std::arch::x86_64::_pext_u32(value, mask) }
}

/// Pack the bits of `value` selected by `mask` into the low bits of the result,
/// preserving their order.
///
/// Uses the BMI2 `pext` instruction when the crate is compiled for a target that has it,
/// and [`software_gather`] otherwise. Both produce identical results.
#[cfg(not(all(target_arch = "x86_64", target_feature = "bmi2")))]
#[inline]
pub fn gather_bits(value: u32, mask: u32) -> u32 {
    software_gather(value, mask)
}

/// Portable bit gather: walks the set bits of `mask` from low to high and compacts
/// the corresponding bits of `value`.
pub fn software_gather(value: u32, mask: u32) -> u32 {
    let mut result = 0u32;
    let mut remaining = mask;
    let mut out_bit = 0u32;

    while remaining != 0 {
        let lowest = remaining & remaining.wrapping_neg();
        if value & lowest != 0 {
            result |= 1 << out_bit;
        }
        out_bit += 1;
        remaining &= remaining - 1;
    }

    result
}

/// Upper-case a marker. Characters whose upper case is not a single character
/// (e.g. `'ß'`) are kept as written.
fn fold_marker(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(folded), None) => folded,
        _ => c,
    }
}
