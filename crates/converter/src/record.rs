use crate::config::ConverterConfig;
use crate::error::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;

/// Metadata keys as produced by a test record parser.
///
/// Flags (`onlyStrict`, `raw`, ...) appear as top-level keys; their values are ignored.
pub type RawRecord = serde_json::Map<String, Value>;

/// Token a test calls to signal asynchronous completion.
pub const ASYNC_DONE_MARKER: &str = "$DONE";

/// Skip reason attached to tests whose metadata could not be parsed.
pub const YAML_ERROR_REASON: &str = "has YAML errors";

/// Skip reason attached to support files.
pub const SUPPORT_FILE_REASON: &str = "not a test file";

/// Condition used for features that are not yet released.
pub const RELEASE_OR_BETA_CONDITION: &str = "release_or_beta";

/// Parses the metadata header of a single test.
///
/// Implementations live outside this crate; the converter only invokes them.
pub trait RecordParser {
    fn parse_record(&self, source: &str, test_name: &str) -> anyhow::Result<RawRecord>;
}

impl<F> RecordParser for F
where
    F: Fn(&str, &str) -> anyhow::Result<RawRecord>,
{
    fn parse_record(&self, source: &str, test_name: &str) -> anyhow::Result<RawRecord> {
        self(source, test_name)
    }
}

/// Expected failure of a negative test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Negative {
    /// Error constructor name, e.g. `SyntaxError`
    #[serde(rename = "type")]
    pub error_type: String,

    /// When the error is raised (`parse`, `early`, `resolution`, `runtime`)
    pub phase: String,
}

/// Normalized attributes of one test
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestRecord {
    pub only_strict: bool,
    pub no_strict: bool,
    pub raw: bool,
    pub is_async: bool,
    pub module: bool,
    pub negative: Option<Negative>,
    pub is_support_file: bool,
    pub includes: BTreeSet<String>,
    pub features: BTreeSet<String>,
}

impl TestRecord {
    pub fn is_negative(&self) -> bool {
        self.negative.is_some()
    }

    /// Raw, module and support files are never run in strict mode.
    pub fn no_strict_variant(&self) -> bool {
        self.raw || self.module || self.is_support_file
    }
}

/// A conditional skip: `skip-if(condition)` with a human-readable reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipIf {
    pub condition: String,
    pub comment: String,
}

/// Interpreter output: the record plus the skip decisions derived from it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interpretation {
    pub record: TestRecord,
    pub skip: Vec<String>,
    pub skip_if: Vec<SkipIf>,
}

/// Turn parser output into a [`TestRecord`] and skip reasons.
///
/// Includes declared by the test are added to `includes`, the accumulator of the
/// directory the test lives in.
pub fn interpret(
    source: &str,
    test_name: &str,
    parsed: anyhow::Result<RawRecord>,
    config: &ConverterConfig,
    includes: &mut BTreeSet<String>,
) -> Result<Interpretation> {
    let mut skip = Vec::new();
    let mut skip_if = Vec::new();

    let raw_record = match parsed {
        Ok(record) => record,
        Err(err) => {
            log::warn!("Error '{err}' in file: {test_name}");
            skip.push(YAML_ERROR_REASON.to_string());
            RawRecord::new()
        }
    };

    let is_async = raw_record.contains_key("async");
    if source.contains(ASYNC_DONE_MARKER) && !is_async {
        return Err(ConvertError::integrity(
            test_name,
            "missing async attribute",
        ));
    }

    let negative = match raw_record.get("negative") {
        None => None,
        Some(value) => Some(parse_negative(test_name, value)?),
    };

    let is_support_file = file_stem_ends_with(test_name, &config.support_file_marker);
    if is_support_file {
        skip.push(SUPPORT_FILE_REASON.to_string());
    }

    let features = string_set(test_name, &raw_record, "features")?;
    let declared_includes = string_set(test_name, &raw_record, "includes")?;

    let record = TestRecord {
        only_strict: raw_record.contains_key("onlyStrict"),
        no_strict: raw_record.contains_key("noStrict"),
        raw: raw_record.contains_key("raw"),
        is_async,
        module: raw_record.contains_key("module"),
        negative,
        is_support_file,
        includes: declared_includes.unwrap_or_default(),
        features: features.unwrap_or_default(),
    };

    let unsupported = joined_intersection(&record.features, &config.unsupported_features);
    let release_or_beta = joined_intersection(&record.features, &config.release_or_beta_features);
    if let Some(names) = unsupported {
        skip.push(format!("{names} is not supported"));
    } else if let Some(names) = release_or_beta {
        skip_if.push(SkipIf {
            condition: RELEASE_OR_BETA_CONDITION.to_string(),
            comment: format!("{names} is not released yet"),
        });
    }

    if raw_record.contains_key("includes") {
        if record.raw {
            return Err(ConvertError::integrity(test_name, "raw test with includes"));
        }
        includes.extend(record.includes.iter().cloned());
    }

    Ok(Interpretation {
        record,
        skip,
        skip_if,
    })
}

fn parse_negative(test_name: &str, value: &Value) -> Result<Negative> {
    if !value.is_object() {
        return Err(ConvertError::integrity(
            test_name,
            format!("negative must be a mapping, got {value}"),
        ));
    }
    serde_json::from_value(value.clone()).map_err(|err| {
        ConvertError::integrity(test_name, format!("malformed negative attribute: {err}"))
    })
}

fn string_set(
    test_name: &str,
    record: &RawRecord,
    key: &str,
) -> Result<Option<BTreeSet<String>>> {
    let Some(value) = record.get(key) else {
        return Ok(None);
    };
    let malformed =
        || ConvertError::integrity(test_name, format!("{key} must be a list of strings"));
    let items = value.as_array().ok_or_else(malformed)?;
    items
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(malformed))
        .collect::<Result<BTreeSet<_>>>()
        .map(Some)
}

fn joined_intersection(features: &BTreeSet<String>, gate: &BTreeSet<String>) -> Option<String> {
    let hits: Vec<&str> = features.intersection(gate).map(String::as_str).collect();
    if hits.is_empty() {
        None
    } else {
        Some(hits.join(","))
    }
}

fn file_stem_ends_with(test_name: &str, suffix: &str) -> bool {
    Path::new(test_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem.ends_with(suffix))
}
