// 💾 Persistence - Save-data store boundary
//
// The tracker is saved as one JSON document under a stable string key.
// Absent or malformed documents are not errors: they mean "no prior
// tracker", and a fresh one starting today is created instead.
// Failures of the store itself are propagated, never masked.

use crate::calendar::{CalendarDate, DateProvider};
use crate::resource::{Quality, Resource, StockEntry};
use crate::tracker::{InventoryTracker, TrackedEvent};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("save store error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to encode save data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv export failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

// ============================================================================
// SAVE DATA STORE
// ============================================================================

/// Keyed save-data store provided by the host.
pub trait SaveDataStore {
    /// Raw value under `key`, or `None` when nothing was written yet.
    fn read_raw(&self, key: &str) -> Result<Option<String>>;

    fn write_raw(&mut self, key: &str, value: &str) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.read_raw(key)?.is_some())
    }
}

/// Read and decode a JSON value. Decoding errors are returned.
pub fn read_json<T, S>(store: &S, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
    S: SaveDataStore + ?Sized,
{
    match store.read_raw(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn write_json<T, S>(store: &mut S, key: &str, value: &T) -> Result<()>
where
    T: Serialize,
    S: SaveDataStore + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.write_raw(key, &raw)
}

/// In-process store, used by tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemorySaveStore {
    values: HashMap<String, String>,
}

impl MemorySaveStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveDataStore for MemorySaveStore {
    fn read_raw(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn write_raw(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// SQLite-backed store (one row per key).
pub struct SqliteSaveStore {
    conn: Connection,
}

impl SqliteSaveStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        setup_save_table(&conn)?;
        Ok(SqliteSaveStore { conn })
    }

    /// When `key` was last written (RFC 3339).
    pub fn updated_at(&self, key: &str) -> Result<Option<String>> {
        let updated = self
            .conn
            .query_row(
                "SELECT updated_at FROM save_data WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(updated)
    }
}

fn setup_save_table(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS save_data (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

impl SaveDataStore for SqliteSaveStore {
    fn read_raw(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM save_data WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write_raw(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO save_data (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM save_data WHERE key = ?1", params![key])?;
        Ok(())
    }
}

// ============================================================================
// TRACKER STATE
// ============================================================================

/// Persisted form of one tracked event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedItem {
    /// Qualified item id
    pub item: String,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default)]
    pub name: String,
    pub count: i64,
    pub date: CalendarDate,
}

/// Persisted form of the whole tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerState {
    pub start: CalendarDate,
    #[serde(default)]
    pub items: Vec<SavedItem>,
}

impl TrackerState {
    pub fn from_tracker(tracker: &InventoryTracker) -> Self {
        TrackerState {
            start: tracker.start(),
            items: tracker
                .events()
                .iter()
                .map(|event| SavedItem {
                    item: event.resource.qualified_id.clone(),
                    quality: event.resource.quality,
                    name: event.resource.name.clone(),
                    count: event.count,
                    date: event.date,
                })
                .collect(),
        }
    }

    pub fn into_tracker(self, calendar: Rc<dyn DateProvider>) -> InventoryTracker {
        let events = self
            .items
            .into_iter()
            .map(|saved| {
                let name = if saved.name.is_empty() {
                    saved.item.clone()
                } else {
                    saved.name
                };
                let resource = Resource::new(saved.item, name).with_quality(saved.quality);
                TrackedEvent::new(resource, saved.count, saved.date)
            })
            .collect();
        InventoryTracker::from_events(calendar, self.start, events)
    }
}

/// Restore the tracker saved under `key`, or start a fresh one today.
pub fn load_tracker<S>(
    store: &S,
    key: &str,
    calendar: Rc<dyn DateProvider>,
) -> Result<InventoryTracker>
where
    S: SaveDataStore + ?Sized,
{
    let Some(raw) = store.read_raw(key)? else {
        let today = calendar.now();
        info!(key, start = %today, "tracker.created");
        return Ok(InventoryTracker::new(calendar, today));
    };

    match serde_json::from_str::<TrackerState>(&raw) {
        Ok(state) => {
            info!(key, start = %state.start, events = state.items.len(), "tracker.restored");
            Ok(state.into_tracker(calendar))
        }
        Err(err) => {
            let today = calendar.now();
            warn!(key, error = %err, start = %today, "tracker.restore_failed");
            Ok(InventoryTracker::new(calendar, today))
        }
    }
}

pub fn save_tracker<S>(store: &mut S, key: &str, tracker: &InventoryTracker) -> Result<()>
where
    S: SaveDataStore + ?Sized,
{
    let state = TrackerState::from_tracker(tracker);
    write_json(store, key, &state)?;
    debug!(key, events = state.items.len(), "tracker.saved");
    Ok(())
}

// ============================================================================
// CSV EXPORT
// ============================================================================

/// One exported rollup row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    #[serde(rename = "Item")]
    pub item: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Quality")]
    pub quality: Quality,
    #[serde(rename = "Count")]
    pub count: i64,
}

impl From<&StockEntry> for ExportRow {
    fn from(entry: &StockEntry) -> Self {
        ExportRow {
            item: entry.resource.qualified_id.clone(),
            name: entry.resource.name.clone(),
            quality: entry.resource.quality,
            count: entry.count,
        }
    }
}

/// Write `entries` as CSV with a header row.
pub fn write_csv<W: Write>(entries: &[StockEntry], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for entry in entries {
        wtr.serialize(ExportRow::from(entry))?;
    }
    wtr.flush()?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{ManualCalendar, Season};

    fn date(day: u8, season: Season, year: u32) -> CalendarDate {
        CalendarDate::new(day, season, year).unwrap()
    }

    fn calendar(today: CalendarDate) -> Rc<dyn DateProvider> {
        Rc::new(ManualCalendar::new(today))
    }

    #[test]
    fn test_missing_state_creates_fresh_tracker() {
        let store = MemorySaveStore::new();
        let today = date(12, Season::Fall, 2);

        let tracker = load_tracker(&store, "stats", calendar(today)).unwrap();

        assert!(tracker.is_empty());
        assert_eq!(tracker.start(), today);
    }

    #[test]
    fn test_malformed_state_creates_fresh_tracker() {
        let mut store = MemorySaveStore::new();
        store.write_raw("stats", "{not json").unwrap();
        let today = date(2, Season::Winter, 1);

        let tracker = load_tracker(&store, "stats", calendar(today)).unwrap();

        assert!(tracker.is_empty());
        assert_eq!(tracker.start(), today);
    }

    #[test]
    fn test_save_and_restore() {
        let mut store = MemorySaveStore::new();
        let start = date(1, Season::Spring, 1);
        let today = date(6, Season::Spring, 1);
        let mut tracker = InventoryTracker::new(calendar(today), start);
        let gold_melon = Resource::new("(O)254", "Melon").with_quality(Quality::Gold);

        tracker.add(gold_melon.clone(), 3);
        tracker.add_on(Resource::new("(O)24", "Parsnip"), -1, date(2, Season::Spring, 1));
        save_tracker(&mut store, "stats", &tracker).unwrap();

        let restored = load_tracker(&store, "stats", calendar(date(20, Season::Summer, 1))).unwrap();

        assert_eq!(restored.start(), start);
        assert_eq!(restored.events(), tracker.events());
        assert_eq!(restored.events()[0].resource.quality, Quality::Gold);
        assert_eq!(restored.events()[0].resource.name, "Melon");
    }

    #[test]
    fn test_state_without_names_falls_back_to_id() {
        let mut store = MemorySaveStore::new();
        store
            .write_raw(
                "stats",
                r#"{"start":{"year":1,"season":"Spring","day":1},
                    "items":[{"item":"(O)24","count":2,"date":{"year":1,"season":"Spring","day":3}}]}"#,
            )
            .unwrap();

        let tracker = load_tracker(&store, "stats", calendar(date(3, Season::Spring, 1))).unwrap();

        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.events()[0].resource.name, "(O)24");
        assert_eq!(tracker.events()[0].resource.quality, Quality::Normal);
    }

    #[test]
    fn test_out_of_range_start_creates_fresh_tracker() {
        let mut store = MemorySaveStore::new();
        store
            .write_raw("stats", r#"{"start":{"year":1,"season":"Spring","day":99},"items":[]}"#)
            .unwrap();
        let today = date(5, Season::Spring, 1);

        let tracker = load_tracker(&store, "stats", calendar(today)).unwrap();

        assert_eq!(tracker.start(), today);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_out_of_range_event_date_creates_fresh_tracker() {
        let mut store = MemorySaveStore::new();
        store
            .write_raw(
                "stats",
                r#"{"start":{"year":1,"season":"Spring","day":1},
                    "items":[{"item":"(O)24","count":2,"date":{"year":1,"season":"Spring","day":0}}]}"#,
            )
            .unwrap();
        let today = date(9, Season::Spring, 1);

        let tracker = load_tracker(&store, "stats", calendar(today)).unwrap();

        assert!(tracker.is_empty());
        assert_eq!(tracker.start(), today);
        assert!(tracker.produced_this_week().is_empty());
    }

    #[test]
    fn test_read_json_rejects_invalid_date() {
        let mut store = MemorySaveStore::new();
        store.write_raw("date", r#"{"year":1,"season":"Summer","day":0}"#).unwrap();

        let result: Result<Option<CalendarDate>> = read_json(&store, "date");

        assert!(matches!(result, Err(PersistenceError::Json(_))));
    }

    #[test]
    fn test_sqlite_store_round_trip() {
        let mut store = SqliteSaveStore::open_in_memory().unwrap();

        assert!(!store.contains("k").unwrap());
        store.write_raw("k", "one").unwrap();
        store.write_raw("k", "two").unwrap();

        assert_eq!(store.read_raw("k").unwrap(), Some("two".to_string()));
        assert!(store.updated_at("k").unwrap().is_some());

        store.remove("k").unwrap();
        assert_eq!(store.read_raw("k").unwrap(), None);
    }

    #[test]
    fn test_sqlite_store_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.db");
        let today = date(9, Season::Summer, 3);

        {
            let mut store = SqliteSaveStore::open(&path).unwrap();
            let mut tracker = InventoryTracker::new(calendar(today), today);
            tracker.add(Resource::new("(O)388", "Wood"), 50);
            save_tracker(&mut store, "stats", &tracker).unwrap();
        }

        let store = SqliteSaveStore::open(&path).unwrap();
        let tracker = load_tracker(&store, "stats", calendar(today)).unwrap();
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.produced_today()[0].count, 50);
    }

    #[test]
    fn test_csv_export() {
        let entries = vec![
            StockEntry::new(Resource::new("(O)254", "Melon").with_quality(Quality::Gold), 3),
            StockEntry::new(Resource::new("(O)388", "Wood, Hard"), 40),
        ];
        let mut buffer = Vec::new();

        write_csv(&entries, &mut buffer).unwrap();

        let mut rdr = csv::Reader::from_reader(buffer.as_slice());
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), vec!["Item", "Name", "Quality", "Count"]);
        let rows: Vec<ExportRow> = rdr.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].quality, Quality::Gold);
        assert_eq!(rows[1].name, "Wood, Hard");
        assert_eq!(rows[1].count, 40);
    }

    #[test]
    fn test_json_helpers() {
        let mut store = MemorySaveStore::new();
        let d = date(4, Season::Fall, 1);

        write_json(&mut store, "date", &d).unwrap();
        let back: Option<CalendarDate> = read_json(&store, "date").unwrap();
        assert_eq!(back, Some(d));

        let missing: Option<CalendarDate> = read_json(&store, "nothing").unwrap();
        assert!(missing.is_none());
    }
}
