use crate::annotation::REFTEST_PREFIX;
use crate::error::{ConvertError, Result};
use crate::record::TestRecord;

/// Directive prepended to strict-mode variants.
pub const STRICT_PROLOGUE: &str = "'use strict';";

/// Call appended to positive synchronous tests so the harness records a result.
pub const REPORT_COMPARE_EPILOGUE: &str = "reportCompare(0, 0);";

/// Inputs of the variant decision table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariantFlags {
    /// Raw, module or support file
    pub no_strict_variant: bool,
    pub only_strict: bool,
    pub no_strict: bool,
    /// Caller asked for strict copies of sloppy-mode tests
    pub strict_requested: bool,
}

impl VariantFlags {
    pub fn new(record: &TestRecord, strict_requested: bool) -> Self {
        Self {
            no_strict_variant: record.no_strict_variant(),
            only_strict: record.only_strict,
            no_strict: record.no_strict,
            strict_requested,
        }
    }
}

/// How the strict variant is named
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrictNaming {
    /// Strict suffix inserted before the extension
    Suffixed,
    /// Original name; only reachable when `onlyStrict` and `noStrict` are both set
    Unsuffixed,
}

/// Which variants to write for one test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantPlan {
    pub non_strict: bool,
    pub strict: Option<StrictNaming>,
}

impl VariantPlan {
    pub fn count(&self) -> usize {
        usize::from(self.non_strict) + usize::from(self.strict.is_some())
    }
}

/// Decide the variants for a test.
///
/// Returns `None` for raw, module and support files that also declare `onlyStrict`
/// or `noStrict`.
pub fn plan_variants(flags: VariantFlags) -> Option<VariantPlan> {
    let VariantFlags {
        no_strict_variant,
        only_strict,
        no_strict,
        strict_requested,
    } = flags;

    if no_strict_variant && (only_strict || no_strict) {
        return None;
    }

    let non_strict = no_strict_variant || no_strict || !only_strict;
    let strict = (!no_strict_variant && (only_strict || (!no_strict && strict_requested))).then(
        || {
            if no_strict {
                StrictNaming::Unsuffixed
            } else {
                StrictNaming::Suffixed
            }
        },
    );

    Some(VariantPlan { non_strict, strict })
}

/// Strictness of an emitted file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantMode {
    NonStrict,
    Strict,
}

/// One converted output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestVariant {
    /// Path relative to the output root, `/`-separated
    pub file_name: String,
    pub mode: VariantMode,
    pub source: String,
}

/// Epilogue for the record, or `""` for negative, async and support files.
pub fn epilogue_for(record: &TestRecord) -> &'static str {
    if !record.is_negative() && !record.is_async && !record.is_support_file {
        REPORT_COMPARE_EPILOGUE
    } else {
        ""
    }
}

/// Build the variants of one test.
pub fn synthesize(
    source: &str,
    test_name: &str,
    annotation: &str,
    record: &TestRecord,
    strict_requested: bool,
    strict_suffix: &str,
) -> Result<Vec<TestVariant>> {
    let plan = plan_variants(VariantFlags::new(record, strict_requested)).ok_or_else(|| {
        ConvertError::integrity(test_name, "unexpected onlyStrict or noStrict attribute")
    })?;
    let epilogue = epilogue_for(record);

    let mut variants = Vec::with_capacity(plan.count());
    if plan.non_strict {
        variants.push(TestVariant {
            file_name: test_name.to_string(),
            mode: VariantMode::NonStrict,
            source: create_source(source, annotation, "", epilogue),
        });
    }
    if let Some(naming) = plan.strict {
        let file_name = match naming {
            StrictNaming::Suffixed => add_suffix_to_file_name(test_name, strict_suffix),
            StrictNaming::Unsuffixed => test_name.to_string(),
        };
        variants.push(TestVariant {
            file_name,
            mode: VariantMode::Strict,
            source: create_source(source, annotation, STRICT_PROLOGUE, epilogue),
        });
    }
    Ok(variants)
}

/// Assemble the final text of a variant.
///
/// The `|reftest|` line is always the first line so the harness finds it.
pub fn create_source(source: &str, annotation: &str, prologue: &str, epilogue: &str) -> String {
    let mut out = String::with_capacity(
        REFTEST_PREFIX.len() + annotation.len() + prologue.len() + source.len() + epilogue.len() + 4,
    );
    if !annotation.is_empty() {
        out.push_str(REFTEST_PREFIX);
        out.push_str(annotation);
        out.push('\n');
    }
    if !prologue.is_empty() {
        out.push_str(prologue);
        out.push('\n');
    }
    out.push_str(source);
    if !epilogue.is_empty() {
        out.push('\n');
        out.push_str(epilogue);
        out.push('\n');
    }
    out
}

/// Insert `suffix` between the file stem and its extension.
pub fn add_suffix_to_file_name(file_name: &str, suffix: &str) -> String {
    let base_start = file_name.rfind('/').map_or(0, |idx| idx + 1);
    let base = &file_name[base_start..];
    let leading_dots = base.len() - base.trim_start_matches('.').len();
    match base[leading_dots..].rfind('.') {
        Some(dot) => {
            let split = base_start + leading_dots + dot;
            format!("{}{}{}", &file_name[..split], suffix, &file_name[split..])
        }
        None => format!("{file_name}{suffix}"),
    }
}
