use anyhow::{anyhow, bail, Context, Result};
use reftest_converter::{RawRecord, RecordParser};
use serde_json::Value;

const FRONTMATTER_START: &str = "/*---";
const FRONTMATTER_END: &str = "---*/";

/// Reads the YAML front matter (`/*--- ... ---*/`) of a test262 test.
///
/// Entries of `flags` are lifted to top-level keys, so `flags: [raw]` yields
/// `{"raw": true}`. Tests without front matter produce an empty record.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrontmatterParser;

impl RecordParser for FrontmatterParser {
    fn parse_record(&self, source: &str, test_name: &str) -> Result<RawRecord> {
        let Some(yaml) = extract_frontmatter(source)? else {
            log::debug!("{test_name}: no front matter");
            return Ok(RawRecord::new());
        };

        let value: Value = serde_yaml::from_str(yaml).context("invalid YAML front matter")?;
        let mut record = match value {
            Value::Object(map) => map,
            Value::Null => RawRecord::new(),
            other => bail!("front matter is not a mapping: {other}"),
        };

        if let Some(flags) = record.remove("flags") {
            let flags = flags
                .as_array()
                .ok_or_else(|| anyhow!("flags must be a list"))?
                .clone();
            for flag in flags {
                let name = flag
                    .as_str()
                    .ok_or_else(|| anyhow!("flag is not a string: {flag}"))?;
                record.insert(name.to_string(), Value::Bool(true));
            }
        }

        Ok(record)
    }
}

fn extract_frontmatter(source: &str) -> Result<Option<&str>> {
    let Some(start) = source.find(FRONTMATTER_START) else {
        return Ok(None);
    };
    let body = &source[start + FRONTMATTER_START.len()..];
    let end = body
        .find(FRONTMATTER_END)
        .ok_or_else(|| anyhow!("unterminated front matter"))?;
    Ok(Some(&body[..end]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const SAMPLE: &str = r#"// Copyright (C) 2017 the V8 project authors. All rights reserved.
// This code is governed by the BSD license found in the LICENSE file.
/*---
esid: sec-try-statement
description: Optional catch binding
features: [optional-catch-binding]
flags: [onlyStrict, async]
negative:
  phase: parse
  type: SyntaxError
includes: [compareArray.js]
info: |
  Catch : catch Block
---*/

try {} catch {}
"#;

    #[test]
    fn lifts_flags_and_keeps_structured_values() {
        let record = FrontmatterParser.parse_record(SAMPLE, "t.js").unwrap();
        assert_eq!(record.get("onlyStrict"), Some(&json!(true)));
        assert_eq!(record.get("async"), Some(&json!(true)));
        assert!(!record.contains_key("flags"));
        assert_eq!(
            record.get("negative"),
            Some(&json!({"phase": "parse", "type": "SyntaxError"}))
        );
        assert_eq!(record.get("includes"), Some(&json!(["compareArray.js"])));
        assert_eq!(record.get("features"), Some(&json!(["optional-catch-binding"])));
    }

    #[test]
    fn missing_front_matter_is_an_empty_record() {
        let record = FrontmatterParser
            .parse_record("export default 1;\n", "x_FIXTURE.js")
            .unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn broken_yaml_is_an_error() {
        let source = "/*---\ndescription: [unclosed\n---*/\n";
        assert!(FrontmatterParser.parse_record(source, "t.js").is_err());

        let source = "/*---\ndescription: never closed\n";
        assert!(FrontmatterParser.parse_record(source, "t.js").is_err());

        let source = "/*---\nflags: raw\n---*/\n";
        assert!(FrontmatterParser.parse_record(source, "t.js").is_err());
    }
}
