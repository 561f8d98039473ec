//! Running statistics kept by the splitter across decode cycles.

/// Per-module statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleCounters {
    /// Loop iterations in which the module's remaining data started with a header.
    pub header_matches: u64,
    /// `module_dynamic` callbacks issued for the module.
    pub sub_events: u64,
    /// Sub-events dropped because their size exceeded the remaining words.
    pub truncated: u64,
    /// Dynamic words never delivered: truncation remainders plus data left over when
    /// no header matched.
    pub unconsumed_words: u64,
}

/// Per-event-slot statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventCounters {
    /// Completed decode cycles.
    pub input_events: u64,
    /// `begin_event`/`end_event` brackets emitted.
    pub output_events: u64,
    /// One entry per module of the slot.
    pub modules: Vec<ModuleCounters>,
}

/// Statistics for all event slots of a splitter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitterCounters {
    /// One entry per event slot.
    pub events: Vec<EventCounters>,
}

impl SplitterCounters {
    pub(crate) fn with_layout(module_counts: impl IntoIterator<Item = usize>) -> Self {
        Self {
            events: module_counts
                .into_iter()
                .map(|modules| EventCounters {
                    modules: vec![ModuleCounters::default(); modules],
                    ..Default::default()
                })
                .collect(),
        }
    }

    /// Zero every counter, keeping the slot/module layout.
    pub fn reset(&mut self) {
        for event in &mut self.events {
            event.input_events = 0;
            event.output_events = 0;
            event.modules.fill(ModuleCounters::default());
        }
    }

    /// Total sub-events emitted across all slots and modules.
    pub fn total_sub_events(&self) -> u64 {
        self.events
            .iter()
            .flat_map(|event| &event.modules)
            .map(|module| module.sub_events)
            .sum()
    }
}
