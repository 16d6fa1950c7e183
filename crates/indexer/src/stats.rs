use serde::{Deserialize, Serialize};

/// Statistics about a bulk load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    /// Documents found by the scanner
    pub files: usize,

    /// Records inserted into the index
    pub loaded: usize,

    /// Documents that could not be read or parsed
    pub failed: usize,

    /// Subtrees the scanner had to skip
    pub scan_warnings: usize,

    /// Time taken in milliseconds
    pub time_ms: u64,
}

impl LoadStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_loaded(&mut self) {
        self.loaded += 1;
    }

    pub fn add_failure(&mut self) {
        self.failed += 1;
    }
}
