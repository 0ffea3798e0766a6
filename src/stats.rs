use serde::Serialize;

/// Counters collected over one conversion run
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct RunStats {
    pub blocks_scanned: u64,
    pub entries_parsed: u64,
    pub macros_defined: u64,
    pub malformed_blocks: u64,
    pub duplicates_dropped: u64,
    pub undated_entries: u64,
    pub rendered_entries: u64,
    pub numbered_entries: u64,
    pub top_journals: u64,
    pub top_conferences: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_entries(&mut self) {
        self.blocks_scanned += 1;
        self.entries_parsed += 1;
    }

    pub fn inc_macros(&mut self) {
        self.blocks_scanned += 1;
        self.macros_defined += 1;
    }

    pub fn inc_malformed(&mut self) {
        self.blocks_scanned += 1;
        self.malformed_blocks += 1;
    }

    /// Entries that survive deduplication.
    pub fn kept(&self) -> u64 {
        self.entries_parsed - self.duplicates_dropped
    }
}
