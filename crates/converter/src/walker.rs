use crate::converter::Converter;
use crate::error::{ConvertError, Result};
use crate::includes::{join_rel, IncludeAggregator, IncludeIndex, LocalIncludeIndex};
use crate::record::RecordParser;
use crate::stats::ConversionStats;
use crate::variant::VariantMode;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

/// Location of the tests and shared harness files in a test262 checkout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusLayout {
    pub test_dir: PathBuf,
    pub harness_dir: PathBuf,
}

impl CorpusLayout {
    /// Standard layout: `<root>/test` and `<root>/harness`
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            test_dir: root.join("test"),
            harness_dir: root.join("harness"),
        }
    }
}

/// Walks a test262 test tree and writes the converted jstests tree
pub struct TreeWalker<'a, P> {
    converter: &'a Converter<P>,
    layout: CorpusLayout,
    out_dir: PathBuf,
    local_include_dir: PathBuf,
}

impl<'a, P: RecordParser> TreeWalker<'a, P> {
    pub fn new(
        converter: &'a Converter<P>,
        layout: CorpusLayout,
        out_dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            converter,
            layout,
            out_dir: out_dir.as_ref().to_path_buf(),
            local_include_dir: PathBuf::from("."),
        }
    }

    /// Directory holding the local includes (e.g. `test262-host.js`)
    pub fn with_local_include_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.local_include_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Convert the whole tree.
    ///
    /// Directories are visited top-down in name order, so every ancestor's include set
    /// is final before a descendant's `shell.js` is written.
    pub fn run(&self) -> Result<ConversionStats> {
        let start = Instant::now();
        let test_dir = &self.layout.test_dir;
        if !test_dir.is_dir() {
            return Err(ConvertError::InvalidPath(format!(
                "Test directory does not exist: {}",
                test_dir.display()
            )));
        }

        let config = self.converter.config();
        let aggregator = IncludeAggregator::new(&self.layout.harness_dir, &self.local_include_dir);
        let mut stats = ConversionStats::new();

        let mut includes = IncludeIndex::new();
        includes.record("", config.root_includes.iter().cloned());
        let mut locals = LocalIncludeIndex::new();
        locals.insert("", config.root_local_includes.clone());

        fs::create_dir_all(&self.out_dir)
            .map_err(|source| ConvertError::io(&self.out_dir, source))?;
        aggregator.write(&self.out_dir, "", &includes, &locals)?;
        stats.add_aggregate();

        for entry in WalkDir::new(test_dir)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
        {
            let entry = entry?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let rel = relative_name(test_dir, entry.path())?;
            if self.convert_directory(entry.path(), &rel, &mut includes, &mut stats)? {
                aggregator.write(&self.out_dir, &rel, &includes, &locals)?;
                stats.add_aggregate();
            }
        }

        stats.time_ms = start.elapsed().as_millis() as u64;
        log::info!(
            "Converted {} tests into {} files ({} strict) across {} directories, copied {} files",
            stats.tests,
            stats.variants,
            stats.strict_variants,
            stats.directories,
            stats.copied
        );
        if stats.yaml_errors > 0 {
            log::warn!("{} tests have YAML errors and are skipped", stats.yaml_errors);
        }
        if stats.unreadable > 0 {
            log::warn!("{} tests are not valid UTF-8 and were left out", stats.unreadable);
        }
        Ok(stats)
    }

    /// Convert the files directly inside `dir`; returns whether its output directory
    /// exists and should receive a `shell.js`/`browser.js` pair.
    fn convert_directory(
        &self,
        dir: &Path,
        rel: &str,
        includes: &mut IncludeIndex,
        stats: &mut ConversionStats,
    ) -> Result<bool> {
        let config = self.converter.config();
        stats.add_directory();

        let out = join_rel(&self.out_dir, rel);
        if !out.exists() {
            if config.reserved_dirs.iter().any(|reserved| reserved == rel) {
                log::warn!(
                    "{rel}: reserved output directory does not exist, leaving its files out"
                );
                return Ok(false);
            }
            fs::create_dir_all(&out).map_err(|source| ConvertError::io(&out, source))?;
        }

        let mut include_set: BTreeSet<String> = config
            .directory_includes
            .get(rel)
            .map(|seed| seed.iter().cloned().collect())
            .unwrap_or_default();

        for path in sorted_files(dir)? {
            let test_name = relative_name(&self.layout.test_dir, &path)?;

            if !has_extension(&path, &config.test_extension) {
                let target = join_rel(&self.out_dir, &test_name);
                fs::copy(&path, &target).map_err(|source| ConvertError::io(&target, source))?;
                stats.add_copy();
                continue;
            }

            let bytes = fs::read(&path).map_err(|source| ConvertError::io(&path, source))?;
            let source = match String::from_utf8(bytes) {
                Ok(source) => source,
                Err(err) => {
                    log::warn!("{test_name}: not valid UTF-8 ({}), skipping", err.utf8_error());
                    stats.add_unreadable();
                    continue;
                }
            };
            let converted = self
                .converter
                .convert_test(&source, &test_name, &mut include_set)?;

            let mut strict = 0;
            for variant in &converted.variants {
                let target = join_rel(&self.out_dir, &variant.file_name);
                fs::write(&target, &variant.source)
                    .map_err(|source| ConvertError::io(&target, source))?;
                if variant.mode == VariantMode::Strict {
                    strict += 1;
                }
            }
            log::debug!("{test_name}: {} variant(s)", converted.variants.len());

            stats.add_test(converted.variants.len(), strict);
            if converted.skipped {
                stats.add_skipped();
            }
            if converted.record_error {
                stats.add_yaml_error();
            }
        }

        includes.record(rel, include_set);
        Ok(true)
    }
}

fn sorted_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let io_err = |source| ConvertError::io(dir, source);
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if entry.file_type().map_err(io_err)?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ext)
}

/// `/`-separated path of `path` relative to `root`.
fn relative_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        ConvertError::InvalidPath(format!(
            "{} is outside {}",
            path.display(),
            root.display()
        ))
    })?;
    let mut segments = Vec::new();
    for component in relative.components() {
        let segment = component.as_os_str().to_str().ok_or_else(|| {
            ConvertError::InvalidPath(format!("non UTF-8 path: {}", path.display()))
        })?;
        segments.push(segment);
    }
    Ok(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn relative_names_use_forward_slashes() {
        let root = Path::new("/corpus/test");
        assert_eq!(
            relative_name(root, &root.join("built-ins").join("Array").join("a.js")).unwrap(),
            "built-ins/Array/a.js"
        );
        assert!(relative_name(root, Path::new("/elsewhere/a.js")).is_err());
    }

    #[test]
    fn extension_match_is_exact() {
        assert!(has_extension(Path::new("a/b.js"), "js"));
        assert!(!has_extension(Path::new("a/b.JS"), "js"));
        assert!(!has_extension(Path::new("a/b.json"), "js"));
        assert!(!has_extension(Path::new("a/js"), "js"));
    }

    #[test]
    fn sorted_files_ignores_directories() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("b.js"), "").unwrap();
        fs::write(temp.path().join("a.js"), "").unwrap();

        let files = sorted_files(temp.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.js".to_string(), "b.js".to_string()]);
    }
}
