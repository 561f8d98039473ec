//! Filter behaviour on realistic module data words.

use daq_splitter::filter::{software_gather, FILTER_MAX_BITS};
use daq_splitter::{BitFilter, FilterError, MultiWordFilter};

const MDPP_HEADER: &str = "0100 XXXX AAAA AAAA XXXX SSSS SSSS SSSS";
const MDPP_DATA: &str = "0001 XXXP O00A AAAA DDDD DDDD DDDD DDDD";
const MDPP_EOE_LOW: &str = "11DD DDDD DDDD DDDD DDDD DDDD DDDD DDDD";
const MDPP_TS_HIGH: &str = "0010 XXXX XXXX XXXX DDDD DDDD DDDD DDDD";

#[test]
fn test_mdpp_header_fields() {
    let header = BitFilter::new(MDPP_HEADER).unwrap();
    assert_eq!(header.width(), FILTER_MAX_BITS);
    assert_eq!(header.match_mask(), 0xF000_0000);
    assert_eq!(header.match_value(), 0x4000_0000);

    let word = 0x40A5_0123;
    assert!(header.matches(word));
    assert_eq!(header.make_cache_entry('S').extract(word), 0x123);
    assert_eq!(header.make_cache_entry('a').extract(word), 0xA5);
    assert!(!header.matches(0x1000_0123));
}

#[test]
fn test_mdpp_data_word_fields() {
    let data = BitFilter::new(MDPP_DATA).unwrap();
    let word: u32 = 0x1015_BEEF;

    assert!(data.matches(word));
    assert_eq!(data.make_cache_entry('D').extract(word), 0xBEEF);
    assert_eq!(data.make_cache_entry('A').extract(word), 0x15);

    let flags = data.make_cache_entry('P');
    assert!(!flags.needs_gather());
    assert_eq!(flags.extract_shift(), 24);

    // fixed zero bits between O and A are not part of any field
    assert!(!data.matches(word | 0x0040_0000));
}

#[test]
fn test_marker_absent_from_pattern_extracts_zero() {
    let header = BitFilter::new(MDPP_HEADER).unwrap();
    let cache = header.make_cache_entry('Q');
    assert_eq!(cache.extract_mask(), 0);
    assert_eq!(cache.extract(u32::MAX), 0);
}

#[test]
fn test_gather_agrees_with_software_gather_on_interleaved_masks() {
    let filter = BitFilter::new("ZXZX ZXZX ZXZX ZXZX ZXZX ZXZX ZXZX ZXZX").unwrap();
    let z = filter.make_cache_entry('z');
    let x = filter.make_cache_entry('x');
    assert!(z.needs_gather() && x.needs_gather());

    for value in [0u32, u32::MAX, 0xAAAA_AAAA, 0x5555_5555, 0xDEAD_BEEF] {
        assert_eq!(z.extract(value), software_gather(value, z.extract_mask()));
        assert_eq!(x.extract(value), software_gather(value, x.extract_mask()));
    }
    assert_eq!(z.extract(0xAAAA_AAAA), 0xFFFF);
    assert_eq!(x.extract(0xAAAA_AAAA), 0);
}

#[test]
fn test_two_word_timestamp() {
    let low = BitFilter::new(MDPP_EOE_LOW).unwrap();
    let high = BitFilter::new(MDPP_TS_HIGH).unwrap();
    let mut timestamp = MultiWordFilter::new(vec![low, high]).unwrap();
    let cache = timestamp.make_cache_entry('D');
    assert_eq!(cache.total_bits(), 46);

    // high word arrives first, unrelated words are ignored
    assert!(!timestamp.handle_word(0x1000_0001, Some(0)));
    assert!(!timestamp.handle_word(0x2000_1234, Some(1)));
    assert_eq!(timestamp.extract(&cache), None);
    assert!(timestamp.handle_word(0xC000_0042, Some(2)));

    assert_eq!(timestamp.extract(&cache), Some((0x1234u64 << 30) | 0x42));

    timestamp.reset();
    assert!(!timestamp.is_complete());
    assert_eq!(timestamp.extract(&cache), None);
}

#[test]
fn test_word_index_constrained_header() {
    let filter = BitFilter::with_word_index("1111 XXXX", Some(0)).unwrap();
    assert!(filter.matches_at(0xF3, Some(0)));
    assert!(!filter.matches_at(0xF3, Some(1)));
    assert!(!filter.matches_at(0xF3, None));
    assert_eq!(filter.to_string(), "1111XXXX@0");
}

#[test]
fn test_pattern_limits() {
    let too_long = "0".repeat(FILTER_MAX_BITS + 1);
    assert!(matches!(
        BitFilter::new(&too_long),
        Err(FilterError::PatternTooLong { bits: 33, max: 32, .. })
    ));

    let filters = vec![BitFilter::new("1").unwrap(); 3];
    assert_eq!(
        MultiWordFilter::new(filters),
        Err(FilterError::TooManyFilters { count: 3, max: 2 })
    );
}
