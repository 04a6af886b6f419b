use serde::{Deserialize, Serialize};

/// Statistics about a conversion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Number of test directories visited
    pub directories: usize,

    /// Number of test files read
    pub tests: usize,

    /// Number of converted files written
    pub variants: usize,

    /// Strict-mode variants among `variants`
    pub strict_variants: usize,

    /// Tests annotated with an unconditional `skip`
    pub skipped: usize,

    /// Tests whose metadata could not be parsed
    pub yaml_errors: usize,

    /// Test files left out because they are not valid UTF-8
    pub unreadable: usize,

    /// Non-test files copied verbatim
    pub copied: usize,

    /// `shell.js`/`browser.js` pairs written, including the root
    pub aggregates: usize,

    /// Time taken in milliseconds
    pub time_ms: u64,
}

impl ConversionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_test(&mut self, variants: usize, strict_variants: usize) {
        self.tests += 1;
        self.variants += variants;
        self.strict_variants += strict_variants;
    }

    pub fn add_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn add_yaml_error(&mut self) {
        self.yaml_errors += 1;
    }

    pub fn add_unreadable(&mut self) {
        self.unreadable += 1;
    }

    pub fn add_copy(&mut self) {
        self.copied += 1;
    }

    pub fn add_directory(&mut self) {
        self.directories += 1;
    }

    pub fn add_aggregate(&mut self) {
        self.aggregates += 1;
    }
}
