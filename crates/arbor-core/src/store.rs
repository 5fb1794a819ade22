//! Versioned file store and change detection

use crate::model::{FileRecord, UNTRACKED_VERSION};
use std::collections::HashMap;

/// Last known content and version of every tracked file, keyed by normalized path.
///
/// A record's version only ever grows while it exists. Removing a record
/// forgets its history: adding the path again starts over at version 1.
#[derive(Debug, Default)]
pub struct FileStore {
    files: HashMap<String, FileRecord>,
}

impl FileStore {
    pub fn new() -> Self {
        FileStore {
            files: HashMap::new(),
        }
    }

    pub fn get(&self, normalized_path: &str) -> Option<&FileRecord> {
        self.files.get(normalized_path)
    }

    /// True when nothing is stored for the path or its raw content differs.
    pub fn needs_update(&self, normalized_path: &str, observed_raw_content: &str) -> bool {
        self.files
            .get(normalized_path)
            .is_none_or(|record| record.raw_content != observed_raw_content)
    }

    /// Store new content and return the bumped version.
    pub fn commit(&mut self, normalized_path: &str, raw_content: String, content: String) -> i64 {
        let version = self
            .files
            .get(normalized_path)
            .map_or(1, |record| record.version + 1);
        self.files.insert(
            normalized_path.to_string(),
            FileRecord {
                version,
                content,
                raw_content,
            },
        );
        version
    }

    /// Put a record in place as-is, replacing whatever was there.
    pub fn insert(&mut self, normalized_path: &str, record: FileRecord) -> Option<FileRecord> {
        self.files.insert(normalized_path.to_string(), record)
    }

    pub fn remove(&mut self, normalized_path: &str) -> Option<FileRecord> {
        self.files.remove(normalized_path)
    }

    /// Stored version, or `-1` when the path is not tracked.
    pub fn version(&self, normalized_path: &str) -> i64 {
        self.files
            .get(normalized_path)
            .map_or(UNTRACKED_VERSION, |record| record.version)
    }

    pub fn contains(&self, normalized_path: &str) -> bool {
        self.files.contains_key(normalized_path)
    }

    /// Normalized paths of every record, in no particular order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untracked_paths_report_sentinel() {
        let store = FileStore::new();
        assert_eq!(store.version("never/added.ts"), -1);
        assert!(store.needs_update("never/added.ts", ""));
    }

    #[test]
    fn commit_bumps_versions() {
        let mut store = FileStore::new();
        assert_eq!(store.commit("/p.ts", "a".into(), "a".into()), 1);
        assert_eq!(store.commit("/p.ts", "b".into(), "b".into()), 2);
        assert_eq!(store.version("/p.ts"), 2);
    }

    #[test]
    fn change_detection_uses_raw_content() {
        let mut store = FileStore::new();
        store.commit("/p.js", "raw".into(), "merged".into());
        assert!(!store.needs_update("/p.js", "raw"));
        assert!(store.needs_update("/p.js", "merged"));
    }

    #[test]
    fn remove_resets_version_history() {
        let mut store = FileStore::new();
        store.commit("/p.ts", "a".into(), "a".into());
        store.commit("/p.ts", "b".into(), "b".into());
        let removed = store.remove("/p.ts").unwrap();
        assert_eq!(removed.version, 2);
        assert_eq!(store.version("/p.ts"), -1);
        assert_eq!(store.commit("/p.ts", "c".into(), "c".into()), 1);
    }

    #[test]
    fn restored_record_continues_its_sequence() {
        let mut store = FileStore::new();
        store.commit("/p.ts", "a".into(), "a".into());
        store.commit("/p.ts", "b".into(), "b".into());
        let previous = store.remove("/p.ts").unwrap();
        store.insert("/p.ts", previous);
        assert_eq!(store.commit("/p.ts", "c".into(), "c".into()), 3);
    }
}
