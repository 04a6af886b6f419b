use crate::error::{ConvertError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Generated file holding the concatenated includes of a directory.
pub const SHELL_FILE_NAME: &str = "shell.js";

/// Generated file kept for the browser runner; always empty.
pub const BROWSER_FILE_NAME: &str = "browser.js";

/// Directory (relative, `/`-separated, `""` for the root) to the includes required by
/// tests directly inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludeIndex {
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl IncludeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the direct includes of `dir`, merging with anything already recorded.
    pub fn record(&mut self, dir: &str, includes: impl IntoIterator<Item = String>) {
        self.entries
            .entry(dir.to_string())
            .or_default()
            .extend(includes);
    }

    /// Union of the direct includes of every recorded ancestor of `dir`.
    pub fn inherited(&self, dir: &str) -> BTreeSet<String> {
        let mut inherited = BTreeSet::new();
        let mut current = dir;
        while !current.is_empty() {
            let parent = parent_dir(current);
            if let Some(includes) = self.entries.get(parent) {
                inherited.extend(includes.iter().cloned());
            }
            current = parent;
        }
        inherited
    }

    /// Direct includes of `dir` not already provided by an ancestor.
    pub fn own(&self, dir: &str) -> Vec<&str> {
        let Some(direct) = self.entries.get(dir) else {
            return Vec::new();
        };
        let inherited = self.inherited(dir);
        direct
            .iter()
            .filter(|name| !inherited.contains(*name))
            .map(String::as_str)
            .collect()
    }
}

/// Directory to host-side include files, which live next to the converter rather
/// than in the upstream harness.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalIncludeIndex {
    entries: BTreeMap<String, Vec<String>>,
}

impl LocalIncludeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dir: &str, includes: Vec<String>) {
        self.entries.insert(dir.to_string(), includes);
    }

    pub fn get(&self, dir: &str) -> &[String] {
        self.entries.get(dir).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Writes the `shell.js`/`browser.js` pair of a directory
#[derive(Debug, Clone)]
pub struct IncludeAggregator {
    harness_dir: PathBuf,
    local_include_dir: PathBuf,
}

impl IncludeAggregator {
    pub fn new(harness_dir: impl AsRef<Path>, local_include_dir: impl AsRef<Path>) -> Self {
        Self {
            harness_dir: harness_dir.as_ref().to_path_buf(),
            local_include_dir: local_include_dir.as_ref().to_path_buf(),
        }
    }

    /// Concatenated include sources for `dir`.
    pub fn aggregate(
        &self,
        dir: &str,
        index: &IncludeIndex,
        locals: &LocalIncludeIndex,
    ) -> Result<Vec<u8>> {
        let harness = index
            .own(dir)
            .into_iter()
            .map(|name| (name, self.harness_dir.join(name)));
        let local = locals
            .get(dir)
            .iter()
            .map(|name| (name.as_str(), self.local_include_dir.join(name)));

        let mut blocks = Vec::new();
        for (name, path) in harness.chain(local) {
            blocks.push(read_include_block(name, &path)?);
        }
        Ok(blocks.join(&b'\n'))
    }

    /// Write `shell.js` and `browser.js` into `out_dir/dir`; returns the `shell.js` size.
    pub fn write(
        &self,
        out_dir: &Path,
        dir: &str,
        index: &IncludeIndex,
        locals: &LocalIncludeIndex,
    ) -> Result<usize> {
        let contents = self.aggregate(dir, index, locals)?;
        let target = join_rel(out_dir, dir);
        let shell = target.join(SHELL_FILE_NAME);
        fs::write(&shell, &contents).map_err(|source| ConvertError::io(&shell, source))?;
        let browser = target.join(BROWSER_FILE_NAME);
        fs::write(&browser, b"").map_err(|source| ConvertError::io(&browser, source))?;
        log::debug!("Wrote {} ({} bytes)", shell.display(), contents.len());
        Ok(contents.len())
    }
}

fn read_include_block(name: &str, path: &Path) -> Result<Vec<u8>> {
    let contents = fs::read(path).map_err(|source| ConvertError::MissingInclude {
        name: name.to_string(),
        path: path.display().to_string(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let mut block = format!("// file: {file_name}\n").into_bytes();
    block.extend_from_slice(&contents);
    Ok(block)
}

/// Parent of a relative `/`-separated directory; the root is `""`.
pub fn parent_dir(dir: &str) -> &str {
    dir.rsplit_once('/').map_or("", |(parent, _)| parent)
}

/// Join a relative `/`-separated path onto `root`.
pub fn join_rel(root: &Path, rel: &str) -> PathBuf {
    rel.split('/')
        .filter(|segment| !segment.is_empty())
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}
