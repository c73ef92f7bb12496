//! Deterministic file enumeration under the indexing root.
//!
//! Applies include/exclude globs against root-relative paths and returns
//! files sorted by relative path so every indexing pass visits files in
//! the same order.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::IndexingConfig;
use crate::error::{EngineError, Result};

/// A file found under the indexing root.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Absolute path, used for I/O.
    pub absolute_path: PathBuf,
    /// Root-relative path, used as the manifest key.
    pub relative_path: String,
    /// Size in bytes.
    pub size: i64,
    /// Modification time, unix seconds.
    pub mtime: i64,
}

/// Enumerate indexable files under `root`, honoring the configured globs.
pub fn enumerate_files(config: &IndexingConfig, root: &Path) -> Result<Vec<DiscoveredFile>> {
    if !root.exists() {
        return Err(EngineError::Configuration(format!(
            "indexing root does not exist: {}",
            root.display()
        )));
    }

    let include_set = build_globset(&config.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut files = Vec::new();

    let walker = WalkDir::new(root).follow_links(config.follow_symlinks);
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("skipping unreadable directory entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) {
            continue;
        }
        if !include_set.is_match(&rel_str) {
            continue;
        }

        match file_metadata(path, &rel_str) {
            Ok(file) => files.push(file),
            Err(e) => {
                tracing::warn!("skipping {}: {}", rel_str, e);
            }
        }
    }

    // Sort for deterministic ordering
    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    Ok(files)
}

fn file_metadata(path: &Path, relative_path: &str) -> std::io::Result<DiscoveredFile> {
    let metadata = std::fs::metadata(path)?;
    let modified = metadata
        .modified()
        .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
    let mtime = modified
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;

    Ok(DiscoveredFile {
        absolute_path: path.to_path_buf(),
        relative_path: relative_path.to_string(),
        size: metadata.len() as i64,
        mtime,
    })
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(
            Glob::new(pattern)
                .map_err(|e| EngineError::Configuration(format!("invalid glob: {}", e)))?,
        );
    }
    builder
        .build()
        .map_err(|e| EngineError::Configuration(format!("invalid glob set: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> IndexingConfig {
        IndexingConfig {
            root: PathBuf::new(),
            include_globs: vec!["**/*.md".to_string(), "**/*.txt".to_string()],
            exclude_globs: vec![],
            follow_symlinks: false,
            file_timeout_secs: 120,
            max_file_bytes: 10 * 1024 * 1024,
        }
    }

    #[test]
    fn enumerates_matching_files_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("b.md"), "b").unwrap();
        std::fs::write(tmp.path().join("a.txt"), "a").unwrap();
        std::fs::write(tmp.path().join("skip.rs"), "fn main() {}").unwrap();

        let files = enumerate_files(&test_config(), tmp.path()).unwrap();
        let rels: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(rels, vec!["a.txt", "b.md"]);
    }

    #[test]
    fn applies_exclude_globs() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("drafts")).unwrap();
        std::fs::write(tmp.path().join("keep.md"), "k").unwrap();
        std::fs::write(tmp.path().join("drafts/wip.md"), "w").unwrap();

        let mut cfg = test_config();
        cfg.exclude_globs = vec!["drafts/**".to_string()];
        let files = enumerate_files(&cfg, tmp.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "keep.md");
    }

    #[test]
    fn missing_root_is_an_error() {
        let err = enumerate_files(&test_config(), Path::new("/nonexistent/docdex")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
