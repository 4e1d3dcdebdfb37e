//! Source tree discovery
//!
//! [`SourceWalker`] is a lazy, depth-first iterator over files under a root
//! whose name ends with the configured suffix. Entries come back in the order
//! the filesystem lists them; nothing is sorted. Unreadable directories are
//! logged and skipped. Symlinks are never followed, so link cycles cannot
//! trap the walk.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// What the walker should pick up.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// File-name suffix, e.g. `.java`
    pub extension: String,
    /// Glob patterns matched against paths relative to the root
    pub exclude: Vec<String>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            extension: ".java".to_string(),
            exclude: vec![],
        }
    }
}

impl From<&crate::config::PipelineConfig> for DiscoveryOptions {
    fn from(config: &crate::config::PipelineConfig) -> Self {
        Self {
            extension: config.source_extension.clone(),
            exclude: config.exclude.clone(),
        }
    }
}

/// Lazy iterator over matching source files.
pub struct SourceWalker {
    root: PathBuf,
    extension: String,
    exclude: Vec<glob::Pattern>,
    entries: walkdir::IntoIter,
    warnings: Vec<String>,
}

impl SourceWalker {
    /// Open a walk rooted at `root`.
    ///
    /// Fails when the root is missing, not a directory, or cannot be listed;
    /// anything below the root that turns out unreadable is skipped instead.
    pub fn new(root: &Path, options: &DiscoveryOptions) -> Result<Self> {
        let discovery_error = |message: String| Error::Discovery {
            path: root.to_path_buf(),
            message,
        };

        let metadata = std::fs::metadata(root).map_err(|e| discovery_error(e.to_string()))?;
        if !metadata.is_dir() {
            return Err(discovery_error("not a directory".to_string()));
        }
        std::fs::read_dir(root).map_err(|e| discovery_error(e.to_string()))?;

        let exclude = options
            .exclude
            .iter()
            .map(|p| {
                glob::Pattern::new(p)
                    .map_err(|e| Error::Config(format!("invalid exclude pattern {:?}: {}", p, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            root: root.to_path_buf(),
            extension: options.extension.clone(),
            exclude,
            entries: WalkDir::new(root).follow_links(false).into_iter(),
            warnings: Vec::new(),
        })
    }

    /// Entries skipped so far because they could not be read.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn is_excluded(&self, path: &Path) -> bool {
        if self.exclude.is_empty() {
            return false;
        }
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        self.exclude.iter().any(|p| p.matches_path(relative))
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| name.to_string_lossy().ends_with(&self.extension))
            .unwrap_or(false)
    }
}

impl Iterator for SourceWalker {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "<unknown>".to_string());
                    tracing::warn!(path = %path, error = %e, "Skipping unreadable entry");
                    self.warnings.push(format!("{}: {}", path, e));
                    continue;
                }
            };

            if entry.depth() > 0 && self.is_excluded(entry.path()) {
                if entry.file_type().is_dir() {
                    self.entries.skip_current_dir();
                }
                continue;
            }

            if entry.file_type().is_dir() {
                continue;
            }

            if self.has_extension(entry.path()) {
                return Some(entry.into_path());
            }
        }
    }
}

/// Collect every matching file under `root`.
pub fn find_source_files(root: &Path, options: &DiscoveryOptions) -> Result<Vec<PathBuf>> {
    Ok(SourceWalker::new(root, options)?.collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "class X {}").unwrap();
    }

    fn relative(root: &Path, files: &[PathBuf]) -> Vec<String> {
        let mut out: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        out.sort();
        out
    }

    #[test]
    fn finds_nested_files_with_extension() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a/Foo.java");
        touch(dir.path(), "a/b/c/Bar.java");
        touch(dir.path(), "a/readme.md");
        touch(dir.path(), "Top.java");

        let files = find_source_files(dir.path(), &DiscoveryOptions::default()).unwrap();
        assert_eq!(
            relative(dir.path(), &files),
            vec!["Top.java", "a/Foo.java", "a/b/c/Bar.java"]
        );
    }

    #[test]
    fn empty_tree_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let files = find_source_files(dir.path(), &DiscoveryOptions::default()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = SourceWalker::new(&missing, &DiscoveryOptions::default())
            .err()
            .expect("missing root should fail");
        assert!(matches!(err, Error::Discovery { .. }));
    }

    #[test]
    fn file_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "Only.java");
        let result = SourceWalker::new(&dir.path().join("Only.java"), &DiscoveryOptions::default());
        assert!(matches!(result, Err(Error::Discovery { .. })));
    }

    #[test]
    fn exclude_patterns_prune_subtrees() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "main/Foo.java");
        touch(dir.path(), "test/FooTest.java");
        touch(dir.path(), "main/Generated.java");

        let options = DiscoveryOptions {
            exclude: vec!["test".to_string(), "**/Generated.java".to_string()],
            ..Default::default()
        };
        let files = find_source_files(dir.path(), &options).unwrap();
        assert_eq!(relative(dir.path(), &files), vec!["main/Foo.java"]);
    }

    #[test]
    fn walk_order_is_stable_across_runs() {
        let dir = TempDir::new().unwrap();
        for name in ["x/A.java", "x/B.java", "y/C.java", "D.java"] {
            touch(dir.path(), name);
        }
        let first = find_source_files(dir.path(), &DiscoveryOptions::default()).unwrap();
        let second = find_source_files(dir.path(), &DiscoveryOptions::default()).unwrap();
        assert_eq!(first, second);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn unreadable_subtree_is_skipped_with_warning() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a/Foo.java");
        touch(dir.path(), "z/Bar.java");

        // Nest a directory past PATH_MAX. Creating it needs relative paths;
        // opening it by full path fails with ENAMETOOLONG, even for root.
        let segment = "d".repeat(200);
        let half = vec![segment.as_str(); 12].join("/");
        let status = std::process::Command::new("sh")
            .current_dir(dir.path())
            .arg("-c")
            .arg(format!(
                "mkdir -p deep/{half} && cd deep/{half} && mkdir -p {half} && touch {half}/Deep.java"
            ))
            .status()
            .unwrap();
        assert!(status.success());

        let mut walker = SourceWalker::new(dir.path(), &DiscoveryOptions::default()).unwrap();
        let files: Vec<PathBuf> = walker.by_ref().collect();

        assert_eq!(relative(dir.path(), &files), vec!["a/Foo.java", "z/Bar.java"]);
        assert_eq!(walker.warnings().len(), 1);
        assert!(walker.warnings()[0].contains("deep"));
    }

    #[test]
    fn clean_walk_has_no_warnings() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a/Foo.java");

        let mut walker = SourceWalker::new(dir.path(), &DiscoveryOptions::default()).unwrap();
        assert_eq!(walker.by_ref().count(), 1);
        assert!(walker.warnings().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_cycles_do_not_loop() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a/Foo.java");
        std::os::unix::fs::symlink(dir.path(), dir.path().join("a/loop")).unwrap();

        let files = find_source_files(dir.path(), &DiscoveryOptions::default()).unwrap();
        assert_eq!(relative(dir.path(), &files), vec!["a/Foo.java"]);
    }
}
