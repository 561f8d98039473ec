//! Fuzz target for filter pattern compilation and field extraction.
//!
//! Tests:
//! - Arbitrary pattern strings never panic
//! - Fixed bits and extraction fields never overlap
//! - Gathered extraction agrees with the portable implementation

#![no_main]

use arbitrary::Arbitrary;
use daq_splitter::filter::{software_gather, BitFilter, FILTER_MAX_BITS};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FilterInput {
    pattern: String,
    marker: char,
    values: Vec<u32>,
}

fuzz_target!(|input: FilterInput| {
    let filter = match BitFilter::new(&input.pattern) {
        Ok(f) => f,
        Err(_) => {
            let width = input.pattern.chars().filter(|c| !c.is_whitespace()).count();
            assert!(width > FILTER_MAX_BITS);
            return;
        }
    };

    assert_eq!(filter.match_value() & !filter.match_mask(), 0);

    let cache = filter.make_cache_entry(input.marker);
    if input.marker != '0' && input.marker != '1' {
        assert_eq!(cache.extract_mask() & filter.match_mask(), 0);
    }

    let recompiled = BitFilter::new(&filter.pattern()).ok();
    assert_eq!(recompiled.map(|f| f.match_mask()), Some(filter.match_mask()));

    for &value in input.values.iter().take(64) {
        let expected = software_gather(value, cache.extract_mask());
        assert_eq!(cache.extract(value), expected);
        assert!(u64::from(expected) < 1u64 << cache.extract_bits());
    }
});
