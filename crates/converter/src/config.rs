use crate::error::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Features the target engine does not implement; tests using them are skipped.
pub const UNSUPPORTED_FEATURES: &[&str] = &[
    "tail-call-optimization",
    "BigInt",
    "class-fields",
    "optional-catch-binding",
    "regexp-dotall",
    "regexp-lookbehind",
    "regexp-named-groups",
    "regexp-unicode-property-escapes",
];

/// Features only enabled on nightly builds; tests using them get `skip-if(release_or_beta)`.
pub const RELEASE_OR_BETA_FEATURES: &[&str] = &[];

/// Harness files every test can rely on, emitted into the root `shell.js`.
pub const ROOT_INCLUDES: &[&str] = &["sta.js", "assert.js", "propertyHelper.js", "compareArray.js"];

/// Host shims emitted into the root `shell.js` after the harness files.
pub const ROOT_LOCAL_INCLUDES: &[&str] = &["test262-host.js"];

/// Output directories used by the alternate intake modes.
pub const RESERVED_DIRS: &[&str] = &["prs", "local"];

/// Configuration for converting a test262 checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Generate an additional strict-mode copy of every sloppy-mode test
    pub strict_tests: bool,

    /// Extension of files that are converted (everything else is copied)
    pub test_extension: String,

    /// File stem suffix marking support files (imported by other tests)
    pub support_file_marker: String,

    /// Suffix inserted before the extension of strict-mode variants
    pub strict_suffix: String,

    /// Features that cause an unconditional skip
    pub unsupported_features: BTreeSet<String>,

    /// Features that cause `skip-if(release_or_beta)`
    pub release_or_beta_features: BTreeSet<String>,

    /// Harness includes seeded into the root directory
    pub root_includes: Vec<String>,

    /// Local includes seeded into the root directory
    pub root_local_includes: Vec<String>,

    /// Extra harness includes placed at specific directories to reduce duplication
    pub directory_includes: BTreeMap<String, Vec<String>>,

    /// Output directories never created by the tree walk
    pub reserved_dirs: Vec<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            strict_tests: false,
            test_extension: "js".to_string(),
            support_file_marker: "FIXTURE".to_string(),
            strict_suffix: "-strict".to_string(),
            unsupported_features: to_set(UNSUPPORTED_FEATURES),
            release_or_beta_features: to_set(RELEASE_OR_BETA_FEATURES),
            root_includes: to_vec(ROOT_INCLUDES),
            root_local_includes: to_vec(ROOT_LOCAL_INCLUDES),
            directory_includes: default_directory_includes(),
            reserved_dirs: to_vec(RESERVED_DIRS),
        }
    }
}

impl ConverterConfig {
    /// Parse a TOML document; missing keys fall back to defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate().map_err(ConvertError::invalid_config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|source| ConvertError::io(path, source))?;
        Self::from_toml_str(&text)
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.test_extension.is_empty() || self.test_extension.starts_with('.') {
            return Err(format!(
                "test_extension must be a bare extension, got {:?}",
                self.test_extension
            ));
        }

        if self.strict_suffix.is_empty() {
            return Err("strict_suffix must not be empty".to_string());
        }

        if self.support_file_marker.is_empty() {
            return Err("support_file_marker must not be empty".to_string());
        }

        for dir in self.directory_includes.keys() {
            if dir.is_empty() || dir.starts_with('/') || dir.ends_with('/') {
                return Err(format!(
                    "directory_includes keys must be relative paths without surrounding '/', got {dir:?}"
                ));
            }
        }

        for dir in &self.reserved_dirs {
            if dir.is_empty() || dir == "." || dir == ".." || dir.contains(['/', '\\']) {
                return Err(format!(
                    "reserved_dirs entries must be single directory names, got {dir:?}"
                ));
            }
        }

        Ok(())
    }
}

fn to_set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn to_vec(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn default_directory_includes() -> BTreeMap<String, Vec<String>> {
    let entries: &[(&str, &[&str])] = &[
        ("intl402", &["testBuiltInObject.js"]),
        ("built-ins/DataView", &["byteConversionValues.js"]),
        ("built-ins/Promise", &["promiseHelper.js"]),
        (
            "built-ins/TypedArray",
            &["byteConversionValues.js", "detachArrayBuffer.js", "nans.js"],
        ),
        ("built-ins/TypedArrays", &["detachArrayBuffer.js"]),
    ];
    entries
        .iter()
        .map(|(dir, includes)| ((*dir).to_string(), to_vec(includes)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config_valid() {
        let config = ConverterConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.strict_tests);
        assert!(config.unsupported_features.contains("BigInt"));
        assert!(config.release_or_beta_features.is_empty());
    }

    #[test]
    fn test_toml_overrides_only_named_keys() {
        let config = ConverterConfig::from_toml_str(
            r#"
strict_tests = true
release_or_beta_features = ["Atomics.waitAsync"]

[directory_includes]
"built-ins/Atomics" = ["testAtomics.js"]
"#,
        )
        .unwrap();

        assert!(config.strict_tests);
        assert_eq!(config.strict_suffix, "-strict");
        assert!(config.release_or_beta_features.contains("Atomics.waitAsync"));
        assert_eq!(
            config.directory_includes.get("built-ins/Atomics"),
            Some(&vec!["testAtomics.js".to_string()])
        );
        assert!(!config.directory_includes.contains_key("intl402"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = ConverterConfig::default();

        config.test_extension = ".js".to_string();
        assert!(config.validate().is_err());

        config.test_extension = "js".to_string();
        config.strict_suffix = String::new();
        assert!(config.validate().is_err());

        config.strict_suffix = "-strict".to_string();
        config
            .directory_includes
            .insert("built-ins/".to_string(), vec![]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reserved_dirs_must_be_plain_names() {
        for bad in ["", "local/x", ".."] {
            let config = ConverterConfig {
                reserved_dirs: vec!["prs".to_string(), bad.to_string()],
                ..Default::default()
            };
            assert!(config.validate().is_err(), "accepted {bad:?}");
        }

        let err = ConverterConfig::from_toml_str("reserved_dirs = [\"prs\", \"local/x\"]")
            .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidConfig(_)));
    }

    #[test]
    fn test_missing_config_file_names_the_path() {
        let err = ConverterConfig::load("/nonexistent/import.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/import.toml"));
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        let err = ConverterConfig::from_toml_str("strict_tests = \"yes\"").unwrap_err();
        assert!(matches!(err, ConvertError::ConfigParse(_)));

        let err = ConverterConfig::from_toml_str("strict_suffix = \"\"").unwrap_err();
        assert!(matches!(err, ConvertError::InvalidConfig(_)));
    }
}
