//! # Reftest Converter
//!
//! Rewrites test262 conformance tests into jstests reftest files.
//!
//! ## Pipeline
//!
//! ```text
//! test262/test
//!     │
//!     ├──> Tree Walker (top-down, name order)
//!     │      ├─> non-test files: copied verbatim
//!     │      └─> *.js tests
//!     │            ├─> Record Interpreter (flags, skips, includes)
//!     │            ├─> Annotation Builder (// |reftest| ...)
//!     │            └─> Variant Synthesizer (sloppy / strict copies)
//!     │
//!     └──> Include Aggregator (per directory)
//!            └─> shell.js + browser.js, minus includes inherited from ancestors
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use reftest_converter::{Converter, ConverterConfig, CorpusLayout, RawRecord, TreeWalker};
//!
//! fn main() -> anyhow::Result<()> {
//!     let parser = |_source: &str, _name: &str| -> anyhow::Result<RawRecord> { Ok(RawRecord::new()) };
//!     let converter = Converter::new(parser, ConverterConfig::default())?;
//!     let stats = TreeWalker::new(&converter, CorpusLayout::from_root("test262"), "out").run()?;
//!
//!     println!("Converted {} tests into {} files", stats.tests, stats.variants);
//!     Ok(())
//! }
//! ```

mod annotation;
mod config;
mod converter;
mod error;
mod includes;
mod record;
mod stats;
mod variant;
mod walker;

pub use annotation::{ReftestAnnotation, REFTEST_PREFIX};
pub use config::{
    ConverterConfig, RELEASE_OR_BETA_FEATURES, RESERVED_DIRS, ROOT_INCLUDES, ROOT_LOCAL_INCLUDES,
    UNSUPPORTED_FEATURES,
};
pub use converter::{ConvertedTest, Converter};
pub use error::{ConvertError, Result};
pub use includes::{
    parent_dir, IncludeAggregator, IncludeIndex, LocalIncludeIndex, BROWSER_FILE_NAME,
    SHELL_FILE_NAME,
};
pub use record::{
    interpret, Interpretation, Negative, RawRecord, RecordParser, SkipIf, TestRecord,
    ASYNC_DONE_MARKER,
};
pub use stats::ConversionStats;
pub use variant::{
    add_suffix_to_file_name, create_source, plan_variants, synthesize, StrictNaming,
    TestVariant, VariantFlags, VariantMode, VariantPlan, REPORT_COMPARE_EPILOGUE,
    STRICT_PROLOGUE,
};
pub use walker::{CorpusLayout, TreeWalker};
