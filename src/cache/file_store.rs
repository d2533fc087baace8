//! File-backed cache store for the projected dataset
//!
//! Provides a `FileCacheStore` that keeps the dataset as a pretty-printed JSON
//! array in a single file, replacing it atomically via temp-file-then-rename.

use directories::ProjectDirs;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use super::{CacheError, CacheStore};
use crate::data::Dataset;

/// Logical name of the dataset blob
pub const BLOB_NAME: &str = "filtered_characters";

/// Directory used when no XDG cache directory can be determined
const FALLBACK_CACHE_DIR: &str = "rick_and_morty_data";

/// Distinguishes temp files of concurrent writers within one process
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Stores the dataset blob as a JSON file on the local filesystem
///
/// The blob lives at `<cache_dir>/filtered_characters.json`. Writes go to a
/// uniquely named temp file in the same directory and are then renamed over
/// the blob, so readers see either the old or the new dataset, never a mix.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    /// Directory where the blob is stored
    cache_dir: PathBuf,
}

impl FileCacheStore {
    /// Creates a store in the XDG-compliant cache directory
    ///
    /// Uses `~/.cache/rickandmorty-mirror/` on Linux. Falls back to
    /// `./rick_and_morty_data` when no home directory can be determined.
    pub fn new() -> Self {
        let cache_dir = ProjectDirs::from("", "", "rickandmorty-mirror")
            .map(|dirs| dirs.cache_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(FALLBACK_CACHE_DIR));
        Self { cache_dir }
    }

    /// Creates a store rooted at a custom directory
    pub fn with_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Directory holding the blob
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Full path of the blob file
    pub fn blob_path(&self) -> PathBuf {
        self.cache_dir.join(format!("{}.json", BLOB_NAME))
    }

    fn temp_path(&self) -> PathBuf {
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.cache_dir
            .join(format!(".{}.{}.{}.tmp", BLOB_NAME, std::process::id(), n))
    }

    fn unavailable(&self, source: std::io::Error) -> CacheError {
        CacheError::Unavailable {
            path: self.blob_path(),
            source,
        }
    }

    fn write_temp(&self, temp: &Path, json: &[u8]) -> std::io::Result<()> {
        let mut file = fs::File::create(temp)?;
        file.write_all(json)?;
        file.sync_all()
    }
}

impl Default for FileCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore for FileCacheStore {
    fn exists(&self) -> bool {
        self.blob_path().is_file()
    }

    fn read(&self) -> Result<Dataset, CacheError> {
        let path = self.blob_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CacheError::Missing { path });
            }
            // Non-UTF-8 content is a malformed blob, not a medium failure
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                return Err(CacheError::Corrupt {
                    path,
                    source: serde_json::Error::io(e),
                });
            }
            Err(e) => return Err(CacheError::Unavailable { path, source: e }),
        };

        serde_json::from_str(&content).map_err(|source| CacheError::Corrupt { path, source })
    }

    fn write(&self, dataset: &Dataset) -> Result<(), CacheError> {
        fs::create_dir_all(&self.cache_dir).map_err(|e| self.unavailable(e))?;

        let json = serde_json::to_vec_pretty(dataset)
            .map_err(|e| self.unavailable(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

        let temp = self.temp_path();
        if let Err(e) = self.write_temp(&temp, &json) {
            let _ = fs::remove_file(&temp);
            return Err(self.unavailable(e));
        }

        if let Err(e) = fs::rename(&temp, self.blob_path()) {
            let _ = fs::remove_file(&temp);
            return Err(self.unavailable(e));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ProjectedRecord;
    use tempfile::TempDir;

    fn create_test_store() -> (FileCacheStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileCacheStore::with_dir(temp_dir.path());
        (store, temp_dir)
    }

    fn record(name: &str, location: &str, avatar: &str) -> ProjectedRecord {
        ProjectedRecord {
            character_name: name.to_string(),
            location_name: location.to_string(),
            avatar_url: avatar.to_string(),
        }
    }

    #[test]
    fn test_exists_false_for_empty_directory() {
        let (store, _temp_dir) = create_test_store();
        assert!(!store.exists());
    }

    #[test]
    fn test_write_creates_blob_in_cache_directory() {
        let (store, temp_dir) = create_test_store();
        let dataset = vec![record("Rick Sanchez", "Citadel of Ricks", "https://img/1.jpeg")];

        store.write(&dataset).expect("Write should succeed");

        let expected_path = temp_dir.path().join("filtered_characters.json");
        assert!(expected_path.exists(), "Blob file should exist");
        assert!(store.exists());

        let content = fs::read_to_string(&expected_path).expect("Should read file");
        assert!(content.contains("\"Character Name\""));
        assert!(content.contains("\"Location Name\""));
        assert!(content.contains("\"Avatar URL\""));
        assert!(content.contains("Citadel of Ricks"));
    }

    #[test]
    fn test_read_missing_blob_is_missing_error() {
        let (store, _temp_dir) = create_test_store();

        let result = store.read();

        assert!(matches!(result, Err(CacheError::Missing { .. })));
    }

    #[test]
    fn test_write_then_read_returns_same_dataset() {
        let (store, _temp_dir) = create_test_store();
        let dataset = vec![
            record("Rick Sanchez", "Citadel of Ricks", "https://img/1.jpeg"),
            record("Morty Smith", "Earth (Replacement Dimension)", "https://img/2.jpeg"),
        ];

        store.write(&dataset).expect("Write should succeed");
        let read_back = store.read().expect("Read should succeed");

        assert_eq!(read_back, dataset);
    }

    #[test]
    fn test_empty_dataset_is_a_valid_blob() {
        let (store, _temp_dir) = create_test_store();

        store.write(&Vec::new()).expect("Write should succeed");

        assert!(store.exists());
        assert!(store.read().expect("Read should succeed").is_empty());
    }

    #[test]
    fn test_malformed_blob_is_corrupt() {
        let (store, temp_dir) = create_test_store();
        fs::write(temp_dir.path().join("filtered_characters.json"), "{ not json")
            .expect("Should write file");

        assert!(store.exists());
        assert!(matches!(store.read(), Err(CacheError::Corrupt { .. })));
    }

    #[test]
    fn test_wrong_shape_blob_is_corrupt() {
        let (store, temp_dir) = create_test_store();
        fs::write(
            temp_dir.path().join("filtered_characters.json"),
            r#"[{"Character Name": "Rick"}]"#,
        )
        .expect("Should write file");

        assert!(matches!(store.read(), Err(CacheError::Corrupt { .. })));
    }

    #[test]
    fn test_blob_with_empty_fields_is_corrupt() {
        let (store, temp_dir) = create_test_store();
        fs::write(
            temp_dir.path().join("filtered_characters.json"),
            r#"[{"Character Name": "", "Location Name": "", "Avatar URL": "", "extra": 1}]"#,
        )
        .expect("Should write file");

        assert!(matches!(store.read(), Err(CacheError::Corrupt { .. })));
    }

    #[test]
    fn test_blob_with_one_empty_field_is_corrupt() {
        let (store, temp_dir) = create_test_store();
        fs::write(
            temp_dir.path().join("filtered_characters.json"),
            r#"[
                {"Character Name": "Rick", "Location Name": "Earth", "Avatar URL": "u1"},
                {"Character Name": "Morty", "Location Name": "", "Avatar URL": "u2"}
            ]"#,
        )
        .expect("Should write file");

        assert!(matches!(store.read(), Err(CacheError::Corrupt { .. })));
    }

    #[test]
    fn test_write_creates_directory_if_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested_path = temp_dir.path().join("nested").join("cache").join("dir");
        let store = FileCacheStore::with_dir(nested_path.clone());

        store
            .write(&vec![record("Summer Smith", "Earth", "https://img/3.jpeg")])
            .expect("Write should succeed");

        assert!(nested_path.join("filtered_characters.json").exists());
    }

    #[test]
    fn test_write_to_unwritable_location_is_unavailable() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "a file, not a directory").expect("Should write file");
        let store = FileCacheStore::with_dir(blocker.join("cache"));

        let result = store.write(&Vec::new());

        assert!(matches!(result, Err(CacheError::Unavailable { .. })));
        assert!(!store.exists());
    }

    #[test]
    fn test_overwrite_replaces_whole_blob_and_leaves_no_temp_files() {
        let (store, temp_dir) = create_test_store();
        let first = vec![
            record("Rick Sanchez", "Earth", "u1"),
            record("Morty Smith", "Earth", "u2"),
        ];
        let second = vec![record("Birdperson", "Bird World", "u3")];

        store.write(&first).expect("First write should succeed");
        store.write(&second).expect("Second write should succeed");

        assert_eq!(store.read().expect("Read should succeed"), second);

        let entries: Vec<_> = fs::read_dir(temp_dir.path())
            .expect("Should list directory")
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec!["filtered_characters.json".to_string()]);
    }

    #[test]
    fn test_concurrent_writers_and_readers_never_see_partial_blob() {
        const RECORDS: usize = 5_000;
        let (store, temp_dir) = create_test_store();
        let dataset: Dataset = (0..RECORDS)
            .map(|i| {
                record(
                    &format!("Character {}", i),
                    "Earth (Replacement Dimension)",
                    &format!("https://rickandmortyapi.com/api/character/avatar/{}.jpeg", i),
                )
            })
            .collect();
        store.write(&dataset).expect("Seed write should succeed");

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..20 {
                        store.write(&dataset).expect("Concurrent write should succeed");
                    }
                });
            }
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        let read_back = store.read().expect("Read should never see a partial blob");
                        assert_eq!(read_back.len(), RECORDS);
                    }
                });
            }
        });

        assert_eq!(store.read().expect("Final read should succeed"), dataset);
        let leftovers: Vec<_> = fs::read_dir(temp_dir.path())
            .expect("Should list directory")
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "Temp files left behind: {:?}", leftovers);
    }

    #[test]
    fn test_new_uses_project_cache_path() {
        let store = FileCacheStore::new();
        let path_str = store.cache_dir().to_string_lossy();
        assert!(
            path_str.contains("rickandmorty-mirror") || path_str.contains(FALLBACK_CACHE_DIR),
            "Cache path should be project specific: {}",
            path_str
        );
    }
}
