//! The storage port: one persisted key holding the ordered tile list.
//!
//! Both the editor and the search trigger go through [`TileStore`]; neither
//! ever touches the file layout directly.

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::tiles::Tile;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read tile store at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write tile store at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("tile store at {path} is not valid JSON: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode tile list: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Read/write access to the persisted tile list. Writes are wholesale; the
/// last writer wins.
pub trait TileStore {
    fn get(&self) -> Result<Vec<Tile>, StoreError>;
    fn set(&self, tiles: &[Tile]) -> Result<(), StoreError>;
}

/// File-backed store: a single JSON array of tiles.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TileStore for JsonFileStore {
    fn get(&self) -> Result<Vec<Tile>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            // A store that was never written reads as the empty list.
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source: err,
                })
            }
        };

        serde_json::from_str(&raw).map_err(|err| StoreError::Decode {
            path: self.path.clone(),
            source: err,
        })
    }

    fn set(&self, tiles: &[Tile]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| StoreError::Write {
                path: self.path.clone(),
                source: err,
            })?;
        }

        let encoded = serde_json::to_string_pretty(tiles).map_err(StoreError::Encode)?;
        fs::write(&self.path, encoded).map_err(|err| StoreError::Write {
            path: self.path.clone(),
            source: err,
        })
    }
}

/// In-memory store used by unit tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    tiles: std::sync::Mutex<Vec<Tile>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn with_tiles(tiles: Vec<Tile>) -> Self {
        Self {
            tiles: std::sync::Mutex::new(tiles),
        }
    }
}

#[cfg(test)]
impl TileStore for MemoryStore {
    fn get(&self) -> Result<Vec<Tile>, StoreError> {
        Ok(self.tiles.lock().unwrap().clone())
    }

    fn set(&self, tiles: &[Tile]) -> Result<(), StoreError> {
        *self.tiles.lock().unwrap() = tiles.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldId;
    use tempfile::TempDir;

    fn sample_tiles() -> Vec<Tile> {
        vec![
            Tile::from_field(FieldId::InterfaceLanguage, "en", Some("English")).unwrap(),
            Tile::from_field(FieldId::ResultCount, "20", None).unwrap(),
        ]
    }

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("tiles.json"));
        assert!(store.get().unwrap().is_empty());
    }

    #[test]
    fn test_set_then_get_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("tiles.json"));
        let tiles = sample_tiles();
        store.set(&tiles).unwrap();
        assert_eq!(store.get().unwrap(), tiles);
    }

    #[test]
    fn test_set_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/deep/tiles.json"));
        store.set(&sample_tiles()).unwrap();
        assert_eq!(store.get().unwrap().len(), 2);
    }

    #[test]
    fn test_set_overwrites_wholesale() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("tiles.json"));
        store.set(&sample_tiles()).unwrap();
        store.set(&[]).unwrap();
        assert!(store.get().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_a_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiles.json");
        std::fs::write(&path, "not json").unwrap();
        let store = JsonFileStore::new(path);
        assert!(matches!(store.get(), Err(StoreError::Decode { .. })));
    }
}
