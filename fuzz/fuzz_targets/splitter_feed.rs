//! Fuzz target for the splitter decode cycle.
//!
//! Tests:
//! - Arbitrary filters and module data never panic or loop forever
//! - Delivered sub-events are an in-order prefix of each module's data
//! - Delivered plus dropped words equal the words fed in

#![no_main]

use arbitrary::Arbitrary;
use daq_splitter::{MultiEventSplitter, SplitterCallbacks};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FeedInput {
    /// One header filter per module (at most 4 modules)
    filters: Vec<String>,
    /// Dynamic data per module
    data: Vec<Vec<u32>>,
}

#[derive(Default)]
struct Collect {
    delivered: Vec<Vec<u32>>,
    open: bool,
}

impl SplitterCallbacks for Collect {
    fn begin_event(&mut self, _event_index: usize) {
        assert!(!self.open);
        self.open = true;
    }

    fn module_dynamic(&mut self, _event_index: usize, module_index: usize, words: &[u32]) {
        assert!(self.open);
        self.delivered[module_index].extend_from_slice(words);
    }

    fn end_event(&mut self, _event_index: usize) {
        assert!(self.open);
        self.open = false;
    }
}

fuzz_target!(|input: FeedInput| {
    let filters: Vec<&str> = input.filters.iter().take(4).map(String::as_str).collect();
    let mut splitter = match MultiEventSplitter::new(&[filters.clone()]) {
        Ok(s) => s,
        Err(_) => return,
    };

    let module_count = filters.len();
    let data: Vec<&[u32]> = (0..module_count)
        .map(|mi| input.data.get(mi).map_or(&[][..], |words| &words[..words.len().min(4096)]))
        .collect();

    let mut collect = Collect {
        delivered: vec![Vec::new(); module_count],
        open: false,
    };

    let mut cycle = match splitter.begin_event(0) {
        Ok(c) => c,
        Err(_) => return,
    };
    for (mi, &words) in data.iter().enumerate() {
        assert!(cycle.module_data(mi, words).is_ok());
    }
    assert!(cycle.module_data(module_count, &[]).is_err());
    let brackets = cycle.end_event(&mut collect);
    assert!(!collect.open);

    let counters = &splitter.counters().events[0];
    assert_eq!(counters.output_events, brackets as u64);

    for (mi, words) in data.iter().enumerate() {
        let delivered = &collect.delivered[mi];
        assert!(words.starts_with(delivered));
        assert_eq!(
            delivered.len() as u64 + counters.modules[mi].unconsumed_words,
            words.len() as u64
        );
    }
});
