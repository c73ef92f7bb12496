//! Change detection against the stored manifest.
//!
//! Decides which files need (re)processing. A file whose stored
//! modification time and size both match the current ones is trusted as
//! "unchanged" without re-hashing — an explicit performance policy, not
//! a correctness guarantee under clock tampering (a same-size edit with
//! a forged mtime slips through). Whenever either differs, the content
//! hash is the final arbiter, so a touch without a content change does
//! not trigger reindexing.

use std::collections::HashMap;

use sha2::{Digest, Sha256};
use std::path::Path;

use crate::error::Result;
use crate::models::{ChangeState, FileRecord};
use crate::walker::DiscoveredFile;

/// Compute the SHA-256 digest of a file's bytes, lowercase hex.
pub fn compute_hash(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Decide whether a file needs reprocessing.
///
/// No stored record means the file is new and always "changed". Equal
/// mtime and size short-circuit to unchanged without hashing (fast
/// path); otherwise the content hash decides.
pub fn has_changed(file: &DiscoveredFile, stored: Option<&FileRecord>) -> Result<bool> {
    let record = match stored {
        None => return Ok(true),
        Some(r) => r,
    };

    if record.mtime == file.mtime && record.size == file.size {
        return Ok(false);
    }

    let hash = compute_hash(&file.absolute_path)?;
    Ok(hash != record.content_hash)
}

/// Classify every discovered file against the manifest.
///
/// Each file is checked independently: a failure on one path (permission
/// denied, vanished file) classifies that file as `Changed` — forcing a
/// safe reattempt — and is logged, never aborting the batch.
pub fn batch_check(
    files: &[DiscoveredFile],
    manifest: &HashMap<String, FileRecord>,
) -> HashMap<String, ChangeState> {
    let mut states = HashMap::with_capacity(files.len());

    for file in files {
        let stored = manifest.get(&file.relative_path);
        let state = match stored {
            None => ChangeState::New,
            Some(record) => match has_changed(file, Some(record)) {
                Ok(true) => ChangeState::Changed,
                Ok(false) => ChangeState::Unchanged,
                Err(e) => {
                    tracing::warn!(
                        "change check failed for {}, scheduling reindex: {}",
                        file.relative_path,
                        e
                    );
                    ChangeState::Changed
                }
            },
        };
        states.insert(file.relative_path.clone(), state);
    }

    states
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn discovered(tmp: &tempfile::TempDir, name: &str, content: &str) -> DiscoveredFile {
        let abs = tmp.path().join(name);
        std::fs::write(&abs, content).unwrap();
        let meta = std::fs::metadata(&abs).unwrap();
        let mtime = meta
            .modified()
            .unwrap()
            .duration_since(std::time::SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;
        DiscoveredFile {
            absolute_path: abs,
            relative_path: name.to_string(),
            size: meta.len() as i64,
            mtime,
        }
    }

    fn record_for(file: &DiscoveredFile) -> FileRecord {
        FileRecord {
            path: file.relative_path.clone(),
            content_hash: compute_hash(&file.absolute_path).unwrap(),
            size: file.size,
            mtime: file.mtime,
            last_indexed: 0,
        }
    }

    #[test]
    fn hash_is_stable_lowercase_hex() {
        let tmp = tempfile::tempdir().unwrap();
        let file = discovered(&tmp, "a.txt", "hello");
        let h1 = compute_hash(&file.absolute_path).unwrap();
        let h2 = compute_hash(&file.absolute_path).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn no_record_means_changed() {
        let tmp = tempfile::tempdir().unwrap();
        let file = discovered(&tmp, "a.txt", "hello");
        assert!(has_changed(&file, None).unwrap());
    }

    #[test]
    fn equal_mtime_and_size_short_circuit() {
        let tmp = tempfile::tempdir().unwrap();
        let file = discovered(&tmp, "a.txt", "hello");
        let record = record_for(&file);
        assert!(!has_changed(&file, Some(&record)).unwrap());
    }

    #[test]
    fn size_change_with_restored_mtime_is_detected() {
        let tmp = tempfile::tempdir().unwrap();
        let file = discovered(&tmp, "a.txt", "hello");
        let mut record = record_for(&file);

        // Same mtime, different size: the hash path runs and the stale
        // stored hash marks the file changed.
        record.size += 1;
        record.content_hash = "0".repeat(64);
        assert!(has_changed(&file, Some(&record)).unwrap());
    }

    #[test]
    fn differing_mtime_falls_back_to_hash() {
        let tmp = tempfile::tempdir().unwrap();
        let file = discovered(&tmp, "a.txt", "hello");
        let mut record = record_for(&file);

        // mtime differs but content is identical: hash says unchanged
        record.mtime -= 100;
        assert!(!has_changed(&file, Some(&record)).unwrap());

        // mtime differs and content differs: changed
        record.content_hash = "0".repeat(64);
        assert!(has_changed(&file, Some(&record)).unwrap());
    }

    #[test]
    fn batch_classifies_new_changed_unchanged() {
        let tmp = tempfile::tempdir().unwrap();
        let unchanged = discovered(&tmp, "same.txt", "same");
        let changed = discovered(&tmp, "edit.txt", "v2");
        let fresh = discovered(&tmp, "new.txt", "new");

        let mut manifest = HashMap::new();
        manifest.insert(unchanged.relative_path.clone(), record_for(&unchanged));
        let mut stale = record_for(&changed);
        stale.mtime -= 100;
        stale.content_hash = "0".repeat(64);
        manifest.insert(changed.relative_path.clone(), stale);

        let states = batch_check(&[unchanged, changed, fresh], &manifest);
        assert_eq!(states["same.txt"], ChangeState::Unchanged);
        assert_eq!(states["edit.txt"], ChangeState::Changed);
        assert_eq!(states["new.txt"], ChangeState::New);
    }

    #[test]
    fn unreadable_file_is_changed_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let mut file = discovered(&tmp, "gone.txt", "bye");
        let mut record = record_for(&file);
        record.mtime -= 100; // force the hash path
        std::fs::remove_file(&file.absolute_path).unwrap();
        file.absolute_path = PathBuf::from(tmp.path().join("gone.txt"));

        let mut manifest = HashMap::new();
        manifest.insert(file.relative_path.clone(), record);

        let states = batch_check(&[file], &manifest);
        assert_eq!(states["gone.txt"], ChangeState::Changed);
    }
}
