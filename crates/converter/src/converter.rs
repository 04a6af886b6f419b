use crate::annotation::ReftestAnnotation;
use crate::config::ConverterConfig;
use crate::error::{ConvertError, Result};
use crate::record::{interpret, RecordParser};
use crate::variant::{synthesize, TestVariant};
use std::collections::BTreeSet;

/// Output of converting one test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedTest {
    pub variants: Vec<TestVariant>,
    /// The metadata header could not be parsed
    pub record_error: bool,
    /// The annotation carries an unconditional skip
    pub skipped: bool,
}

/// Converts single test262 tests into jstests variants
pub struct Converter<P> {
    parser: P,
    config: ConverterConfig,
}

impl<P: RecordParser> Converter<P> {
    pub fn new(parser: P, config: ConverterConfig) -> Result<Self> {
        config.validate().map_err(ConvertError::invalid_config)?;
        Ok(Self { parser, config })
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Convert one test; declared includes are added to `includes`.
    ///
    /// `test_name` is the path of the test relative to the corpus test root.
    pub fn convert_test(
        &self,
        source: &str,
        test_name: &str,
        includes: &mut BTreeSet<String>,
    ) -> Result<ConvertedTest> {
        let parsed = self.parser.parse_record(source, test_name);
        let record_error = parsed.is_err();
        let interpretation = interpret(source, test_name, parsed, &self.config, includes)?;
        let annotation = ReftestAnnotation::from_interpretation(&interpretation).render();

        let variants = synthesize(
            source,
            test_name,
            &annotation,
            &interpretation.record,
            self.config.strict_tests,
            &self.config.strict_suffix,
        )?;
        Ok(ConvertedTest {
            variants,
            record_error,
            skipped: !interpretation.skip.is_empty(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawRecord;
    use crate::variant::VariantMode;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn fixed(value: Value) -> impl Fn(&str, &str) -> anyhow::Result<RawRecord> {
        move |_: &str, _: &str| match &value {
            Value::Object(map) => Ok(map.clone()),
            other => Err(anyhow::anyhow!("not a mapping: {other}")),
        }
    }

    fn convert(value: Value, strict: bool, name: &str) -> Result<Vec<TestVariant>> {
        let config = ConverterConfig {
            strict_tests: strict,
            ..Default::default()
        };
        let converter = Converter::new(fixed(value), config).unwrap();
        converter
            .convert_test("assert(true);\n", name, &mut BTreeSet::new())
            .map(|converted| converted.variants)
    }

    #[test]
    fn raw_test_yields_single_plain_variant() {
        let variants = convert(json!({"raw": true}), true, "a/raw.js").unwrap();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].file_name, "a/raw.js");
        assert_eq!(variants[0].source, "assert(true);\n\nreportCompare(0, 0);\n");
    }

    #[test]
    fn only_strict_yields_suffixed_strict_variant() {
        let variants = convert(json!({"onlyStrict": true}), false, "a/s.js").unwrap();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].mode, VariantMode::Strict);
        assert_eq!(variants[0].file_name, "a/s-strict.js");
        assert!(variants[0].source.starts_with("'use strict';\n"));
    }

    #[test]
    fn strict_generation_doubles_plain_tests() {
        let variants = convert(json!({"features": ["BigInt"]}), true, "a/t.js").unwrap();
        assert_eq!(variants.len(), 2);
        for variant in &variants {
            assert!(variant
                .source
                .starts_with("// |reftest| skip -- BigInt is not supported\n"));
        }
        assert_eq!(variants[1].file_name, "a/t-strict.js");
    }

    #[test]
    fn negative_module_test() {
        let variants = convert(
            json!({"module": true, "negative": {"type": "SyntaxError", "phase": "parse"}}),
            true,
            "m/neg.js",
        )
        .unwrap();
        assert_eq!(variants.len(), 1);
        assert_eq!(
            variants[0].source,
            "// |reftest| error:SyntaxError module\nassert(true);\n"
        );
    }

    #[test]
    fn yaml_errors_still_convert() {
        let converter = Converter::new(fixed(Value::Null), ConverterConfig::default()).unwrap();
        let converted = converter
            .convert_test("x;", "a/broken.js", &mut BTreeSet::new())
            .unwrap();
        assert!(converted.record_error);
        assert!(converted.skipped);
        assert_eq!(converted.variants.len(), 1);
        assert!(converted.variants[0]
            .source
            .starts_with("// |reftest| skip -- has YAML errors\n"));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ConverterConfig {
            strict_suffix: String::new(),
            ..Default::default()
        };
        assert!(Converter::new(fixed(json!({})), config).is_err());
    }
}
