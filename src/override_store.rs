//! Manual corrections for scraped Twitch links, keyed by player name.
//!
//! The whole mapping is read from its backend on every access and written
//! back wholesale on every save. Nothing is cached in-process and nothing is
//! locked across a load/save pair, so two admins saving at the same time can
//! lose one of the updates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideEntry {
    pub twitch_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl OverrideEntry {
    pub fn new(twitch_link: impl Into<String>) -> Self {
        Self {
            twitch_link: twitch_link.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, display_name: Option<String>) -> Self {
        self.display_name = display_name;
        self
    }
}

/// Sorted by player name, so the file on disk has a stable key order.
pub type OverrideMap = BTreeMap<String, OverrideEntry>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverrideRecord {
    pub player_name: String,
    pub twitch_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl OverrideRecord {
    fn from_entry(player_name: &str, entry: &OverrideEntry) -> Self {
        Self {
            player_name: player_name.to_string(),
            twitch_link: entry.twitch_link.to_owned(),
            display_name: entry.display_name.to_owned(),
        }
    }
}

#[derive(Debug, Error)]
pub enum OverrideStoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed overrides in {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not serialize overrides: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("override backend lock poisoned")]
    Poisoned,
}

/// Where the override mapping actually lives.
pub trait OverrideBackend: Send + Sync + Debug {
    /// A missing document is an empty mapping, not an error.
    fn read(&self) -> Result<OverrideMap, OverrideStoreError>;
    fn write(&self, overrides: &OverrideMap) -> Result<(), OverrideStoreError>;
}

#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(path: &Path, source: std::io::Error) -> OverrideStoreError {
        OverrideStoreError::Io {
            path: path.to_owned(),
            source,
        }
    }

    /// Four-space indented JSON, the format people have been hand-editing.
    fn to_pretty_json(overrides: &OverrideMap) -> Result<Vec<u8>, OverrideStoreError> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        overrides
            .serialize(&mut ser)
            .map_err(OverrideStoreError::Serialize)?;
        out.push(b'\n');
        Ok(out)
    }
}

impl OverrideBackend for JsonFileBackend {
    fn read(&self) -> Result<OverrideMap, OverrideStoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(OverrideMap::new()),
            Err(e) => return Err(Self::io_error(&self.path, e)),
        };
        serde_json::from_str(&text).map_err(|source| OverrideStoreError::Malformed {
            path: self.path.to_owned(),
            source,
        })
    }

    fn write(&self, overrides: &OverrideMap) -> Result<(), OverrideStoreError> {
        // Write next to the target and rename, so a failed write never truncates the old file
        let bytes = Self::to_pretty_json(overrides)?;
        let temp = self.temp_path();
        if let Err(e) = fs::write(&temp, bytes) {
            let _ = fs::remove_file(&temp);
            return Err(Self::io_error(&temp, e));
        }
        fs::rename(&temp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp);
            Self::io_error(&self.path, e)
        })
    }
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    overrides: Mutex<OverrideMap>,
}

impl MemoryBackend {
    pub fn new(overrides: OverrideMap) -> Self {
        Self {
            overrides: Mutex::new(overrides),
        }
    }
}

impl OverrideBackend for MemoryBackend {
    fn read(&self) -> Result<OverrideMap, OverrideStoreError> {
        let overrides = self
            .overrides
            .lock()
            .map_err(|_| OverrideStoreError::Poisoned)?;
        Ok(overrides.clone())
    }

    fn write(&self, overrides: &OverrideMap) -> Result<(), OverrideStoreError> {
        let mut current = self
            .overrides
            .lock()
            .map_err(|_| OverrideStoreError::Poisoned)?;
        *current = overrides.clone();
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct OverrideStore {
    backend: Arc<dyn OverrideBackend>,
}

impl OverrideStore {
    pub fn new(backend: impl OverrideBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn json_file(path: impl Into<PathBuf>) -> Self {
        Self::new(JsonFileBackend::new(path))
    }

    pub fn in_memory(overrides: OverrideMap) -> Self {
        Self::new(MemoryBackend::new(overrides))
    }

    /// Never fails: a missing, unreadable or malformed document is logged
    /// and treated as "no overrides".
    pub fn load(&self) -> OverrideMap {
        match self.backend.read() {
            Ok(overrides) => overrides,
            Err(e @ OverrideStoreError::Malformed { .. }) => {
                tracing::warn!(error = %e, "ignoring malformed twitch overrides");
                OverrideMap::new()
            }
            Err(e) => {
                tracing::error!(error = %e, "could not load twitch overrides");
                OverrideMap::new()
            }
        }
    }

    pub fn try_save(&self, overrides: &OverrideMap) -> Result<(), OverrideStoreError> {
        self.backend.write(overrides)?;
        tracing::debug!(count = overrides.len(), "saved twitch overrides");
        Ok(())
    }

    /// Best effort; on failure the previous document stays in place.
    pub fn save(&self, overrides: &OverrideMap) {
        if let Err(e) = self.try_save(overrides) {
            tracing::error!(error = %e, "could not save twitch overrides");
        }
    }

    pub fn get(&self, player_name: &str) -> Option<OverrideEntry> {
        self.load().remove(player_name)
    }

    /// Loads, replaces the entry for `player_name` and writes everything back.
    ///
    /// A malformed document is replaced, but a document that cannot be read
    /// at all is left alone and the error is returned.
    pub fn upsert(
        &self,
        player_name: &str,
        entry: OverrideEntry,
    ) -> Result<OverrideRecord, OverrideStoreError> {
        let mut overrides = match self.backend.read() {
            Ok(overrides) => overrides,
            Err(e @ OverrideStoreError::Malformed { .. }) => {
                tracing::warn!(error = %e, "replacing malformed twitch overrides");
                OverrideMap::new()
            }
            Err(e) => return Err(e),
        };
        let record = OverrideRecord::from_entry(player_name, &entry);
        overrides.insert(player_name.to_string(), entry);
        self.try_save(&overrides)?;
        tracing::info!(
            player_name = %record.player_name,
            twitch_link = %record.twitch_link,
            "twitch override stored"
        );
        Ok(record)
    }

    pub fn records(&self) -> Vec<OverrideRecord> {
        self.load()
            .iter()
            .map(|(name, entry)| OverrideRecord::from_entry(name, entry))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> OverrideMap {
        let mut map = OverrideMap::new();
        map.insert(
            "LG_Naughty".to_string(),
            OverrideEntry::new("https://www.twitch.tv/Naughty"),
        );
        map.insert(
            "TSM_ImperialHal".to_string(),
            OverrideEntry::new("https://twitch.tv/tsm_imperialhal")
                .with_display_name(Some("ImperialHal".to_string())),
        );
        map
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = OverrideStore::json_file(dir.path().join("nope.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("overrides.json");
        fs::write(&path, "{ this is not json").unwrap();
        let store = OverrideStore::json_file(&path);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_wrong_shape_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("overrides.json");
        fs::write(&path, r#"["LG_Naughty"]"#).unwrap();
        assert!(OverrideStore::json_file(&path).load().is_empty());
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = OverrideStore::json_file(dir.path().join("overrides.json"));
        let map = sample();
        store.save(&map);
        assert_eq!(store.load(), map);

        store.save(&OverrideMap::new());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_file_format_is_indented_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("overrides.json");
        let store = OverrideStore::json_file(&path);
        let mut map = OverrideMap::new();
        map.insert("A".to_string(), OverrideEntry::new("https://twitch.tv/a"));
        store.save(&map);
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "{\n    \"A\": {\n        \"twitch_link\": \"https://twitch.tv/a\"\n    }\n}\n"
        );
        assert!(!dir.path().join("overrides.json.tmp").exists());
    }

    #[test]
    fn test_reads_hand_written_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("overrides.json");
        fs::write(
            &path,
            r#"{"Rogue": {"twitch_link": "https://twitch.tv/rogue", "note": "ignored"}}"#,
        )
        .unwrap();
        let store = OverrideStore::json_file(&path);
        assert_eq!(
            store.get("Rogue"),
            Some(OverrideEntry::new("https://twitch.tv/rogue"))
        );
        assert_eq!(store.get("rogue"), None);
    }

    #[test]
    fn test_failed_save_keeps_old_file() {
        let dir = TempDir::new().unwrap();
        let missing_dir = dir.path().join("missing").join("overrides.json");
        let store = OverrideStore::json_file(&missing_dir);
        assert!(store.try_save(&sample()).is_err());
        // Best-effort variant only logs
        store.save(&sample());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_upsert_keeps_unreadable_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("overrides.json");
        // Latin-1 encoded, so not valid UTF-8
        let mut latin1 = b"{\"Zo\xeb\": {\"twitch_link\": \"https://twitch.tv/zoe\"}, ".to_vec();
        latin1.extend_from_slice(br#""Rogue": {"twitch_link": "https://twitch.tv/rogue"}}"#);
        fs::write(&path, &latin1).unwrap();

        let store = OverrideStore::json_file(&path);
        let result = store.upsert("Hal", OverrideEntry::new("https://twitch.tv/hal"));
        assert!(matches!(result, Err(OverrideStoreError::Io { .. })));
        assert_eq!(fs::read(&path).unwrap(), latin1);
    }

    #[test]
    fn test_upsert_fails_when_path_is_a_directory() {
        let dir = TempDir::new().unwrap();
        let store = OverrideStore::json_file(dir.path());
        assert!(store
            .upsert("Hal", OverrideEntry::new("https://twitch.tv/hal"))
            .is_err());
        assert!(dir.path().is_dir());
    }

    #[test]
    fn test_upsert_replaces_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("overrides.json");
        fs::write(&path, "{ this is not json").unwrap();
        let store = OverrideStore::json_file(&path);
        store
            .upsert("Hal", OverrideEntry::new("https://twitch.tv/hal"))
            .unwrap();
        assert_eq!(store.load().len(), 1);
    }

    #[test]
    fn test_failed_temp_write_names_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("overrides.json");
        match OverrideStore::json_file(&path).try_save(&sample()) {
            Err(OverrideStoreError::Io { path: failed, .. }) => {
                assert_eq!(failed, dir.path().join("missing").join("overrides.json.tmp"))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_upsert_replaces_entry() {
        let store = OverrideStore::in_memory(sample());
        let record = store
            .upsert("LG_Naughty", OverrideEntry::new("https://twitch.tv/other"))
            .unwrap();
        assert_eq!(record.player_name, "LG_Naughty");
        assert_eq!(record.twitch_link, "https://twitch.tv/other");
        assert_eq!(store.load().len(), 2);
        assert_eq!(
            store.get("LG_Naughty").unwrap().twitch_link,
            "https://twitch.tv/other"
        );
    }

    #[test]
    fn test_records_are_sorted() {
        let store = OverrideStore::in_memory(sample());
        let names: Vec<String> = store.records().into_iter().map(|r| r.player_name).collect();
        assert_eq!(names, vec!["LG_Naughty", "TSM_ImperialHal"]);
    }
}
