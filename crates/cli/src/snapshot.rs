use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Reserved output subdirectories moved aside while the output tree is rebuilt
pub struct StashedDirs {
    stash: TempDir,
    names: Vec<String>,
}

impl StashedDirs {
    /// Move `out_dir/<name>` for every existing reserved name into a sibling stash.
    pub fn take(out_dir: &Path, reserved: &[String]) -> Result<Self> {
        let parent = out_dir
            .parent()
            .with_context(|| format!("output dir has no parent: {}", out_dir.display()))?;
        fs::create_dir_all(parent)
            .with_context(|| format!("create output parent: {}", parent.display()))?;
        let stash = tempfile::Builder::new()
            .prefix(".test262-stash")
            .tempdir_in(parent)
            .context("create stash dir")?;

        let mut stashed = Self {
            stash,
            names: Vec::new(),
        };
        for name in reserved {
            let from = out_dir.join(name);
            if !from.is_dir() {
                continue;
            }
            if let Err(err) = fs::rename(&from, stashed.stash.path().join(name)) {
                let err = anyhow::Error::new(err).context(format!("stash {}", from.display()));
                // Put back what was already moved before the stash goes away.
                if let Err(restore_err) = stashed.restore(out_dir) {
                    log::error!("{restore_err:#}");
                }
                return Err(err);
            }
            log::info!("Preserving {}", from.display());
            stashed.names.push(name.clone());
        }

        Ok(stashed)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Move the stashed directories back under `out_dir`.
    ///
    /// On failure the stash directory is left on disk and named in the error.
    pub fn restore(self, out_dir: &Path) -> Result<()> {
        let Self { stash, names } = self;
        for name in &names {
            if let Err(err) = restore_one(stash.path(), out_dir, name) {
                let kept = stash.keep();
                return Err(err.context(format!(
                    "stashed directories kept in {}",
                    kept.display()
                )));
            }
        }
        Ok(())
    }
}

fn restore_one(stash: &Path, out_dir: &Path, name: &str) -> Result<()> {
    let to = out_dir.join(name);
    if to.exists() {
        fs::remove_dir_all(&to).with_context(|| format!("clear {} before restore", to.display()))?;
    }
    fs::create_dir_all(out_dir)
        .with_context(|| format!("create output dir: {}", out_dir.display()))?;
    fs::rename(stash.join(name), &to).with_context(|| format!("restore {}", to.display()))
}

/// Remove and recreate `out_dir`.
pub fn recreate_dir(out_dir: &Path) -> Result<()> {
    if out_dir.is_dir() {
        fs::remove_dir_all(out_dir)
            .with_context(|| format!("remove output dir: {}", out_dir.display()))?;
    }
    fs::create_dir_all(out_dir)
        .with_context(|| format!("create output dir: {}", out_dir.display()))
}

/// Copy the corpus license next to the converted tests, if the corpus has one.
pub fn copy_license(corpus_root: &Path, out_dir: &Path) -> Result<Option<PathBuf>> {
    let license = corpus_root.join("LICENSE");
    if !license.is_file() {
        log::warn!("No LICENSE in {}", corpus_root.display());
        return Ok(None);
    }
    let target = out_dir.join("LICENSE");
    fs::copy(&license, &target)
        .with_context(|| format!("copy license: {}", license.display()))?;
    Ok(Some(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn reserved_dirs_survive_a_rebuild() {
        let temp = tempdir().unwrap();
        let out = temp.path().join("test262");
        fs::create_dir_all(out.join("prs").join("1234")).unwrap();
        fs::write(out.join("prs").join("1234").join("t.js"), "pr;").unwrap();
        fs::write(out.join("stale.js"), "old;").unwrap();

        let reserved = vec!["prs".to_string(), "local".to_string()];
        let stashed = StashedDirs::take(&out, &reserved).unwrap();
        assert_eq!(stashed.names().to_vec(), vec!["prs".to_string()]);

        recreate_dir(&out).unwrap();
        assert!(!out.join("stale.js").exists());

        stashed.restore(&out).unwrap();
        assert_eq!(
            fs::read_to_string(out.join("prs").join("1234").join("t.js")).unwrap(),
            "pr;"
        );
        assert!(!out.join("local").exists());
    }

    fn stash_dirs(parent: &Path) -> Vec<PathBuf> {
        fs::read_dir(parent)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| {
                path.file_name()
                    .unwrap()
                    .to_string_lossy()
                    .starts_with(".test262-stash")
            })
            .collect()
    }

    #[test]
    fn failed_take_puts_stashed_dirs_back() {
        let temp = tempdir().unwrap();
        let out = temp.path().join("test262");
        fs::create_dir_all(out.join("prs").join("1234")).unwrap();
        fs::write(out.join("prs").join("1234").join("t.js"), "pr;").unwrap();
        fs::create_dir_all(out.join("local").join("x")).unwrap();

        // `local/x` cannot be renamed into the stash: `local` is missing there.
        let reserved = vec!["prs".to_string(), "local/x".to_string()];
        let err = StashedDirs::take(&out, &reserved).err().unwrap();
        assert!(format!("{err:#}").contains("local"));

        assert_eq!(
            fs::read_to_string(out.join("prs").join("1234").join("t.js")).unwrap(),
            "pr;"
        );
        assert!(out.join("local").join("x").is_dir());
        assert!(stash_dirs(temp.path()).is_empty());
    }

    #[test]
    fn failed_restore_keeps_the_stash() {
        let temp = tempdir().unwrap();
        let out = temp.path().join("test262");
        fs::create_dir_all(out.join("prs").join("1234")).unwrap();
        fs::write(out.join("prs").join("1234").join("t.js"), "pr;").unwrap();

        let stashed = StashedDirs::take(&out, &["prs".to_string()]).unwrap();
        fs::remove_dir_all(&out).unwrap();
        fs::write(&out, "not a directory").unwrap();

        let err = stashed.restore(&out).unwrap_err();
        let kept = stash_dirs(temp.path());
        assert_eq!(kept.len(), 1);
        assert!(format!("{err:#}").contains(&kept[0].display().to_string()));
        assert_eq!(
            fs::read_to_string(kept[0].join("prs").join("1234").join("t.js")).unwrap(),
            "pr;"
        );
    }

    #[test]
    fn license_is_optional() {
        let temp = tempdir().unwrap();
        let corpus = temp.path().join("corpus");
        let out = temp.path().join("out");
        fs::create_dir_all(&corpus).unwrap();
        fs::create_dir_all(&out).unwrap();

        assert_eq!(copy_license(&corpus, &out).unwrap(), None);

        fs::write(corpus.join("LICENSE"), "BSD").unwrap();
        let copied = copy_license(&corpus, &out).unwrap().unwrap();
        assert_eq!(fs::read_to_string(copied).unwrap(), "BSD");
    }
}
