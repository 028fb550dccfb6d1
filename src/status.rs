//! Service heartbeats and stats records
//!
//! Each record is a row keyed by id, tagged with a category, carrying a JSON
//! object of fields and the time it was last written. A service typically
//! keeps one heartbeat row (`status_id`) and one stats row (`stats_id`) and
//! rewrites them as it runs. Timestamps are stored as fixed-width RFC 3339
//! UTC text so that string comparison orders them correctly.

use crate::error::{Error, Result};
use crate::types::TimeRange;
use crate::utils::time::{window_or_default, DELETE_WINDOW_DAYS, LOAD_WINDOW_DAYS};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

pub const DEFAULT_TABLE: &str = "status_monitor";
pub const CAT_SERVICE_STATUS: &str = "service_status";

static ID_SEQ: AtomicU32 = AtomicU32::new(0);

/// New 24-hex-digit record id: seconds, process id, per-process sequence.
pub fn new_id() -> String {
    let secs = Utc::now().timestamp() as u32;
    let seq = ID_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{:08x}{:08x}{:08x}", secs, std::process::id(), seq)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRecord {
    pub id: String,
    pub category: String,
    pub data: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    pub update_time: DateTime<Utc>,
}

/// Conditions for [`StatusMonitor::delete`]; unset fields are ignored.
#[derive(Debug, Clone, Default)]
pub struct DeleteFilter {
    pub id: Option<String>,
    pub category: Option<String>,
    /// Only used together with `end`; defaults to a year before now
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

pub struct StatusMonitor {
    conn: Connection,
    table: String,
    start_timestamp: DateTime<Utc>,
    status_id: String,
    stats_id: String,
}

fn ts(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn valid_table_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl StatusMonitor {
    /// Open (or create) the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if path.as_os_str().is_empty() {
            return Err(Error::MissingStorePath);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let monitor = Self {
            conn,
            table: DEFAULT_TABLE.to_string(),
            start_timestamp: Utc::now(),
            status_id: new_id(),
            stats_id: new_id(),
        };
        monitor.create_table()?;
        Ok(monitor)
    }

    /// Switch to another table, creating it if needed
    pub fn with_table(mut self, table: &str) -> Result<Self> {
        if !valid_table_name(table) {
            return Err(Error::InvalidTableName(table.to_string()));
        }
        self.table = table.to_string();
        self.create_table()?;
        Ok(self)
    }

    fn create_table(&self) -> Result<()> {
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {t} (
                id TEXT PRIMARY KEY,
                category TEXT NOT NULL,
                data TEXT NOT NULL,
                start_time TEXT,
                update_time TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS {t}_category_time ON {t} (category, update_time);",
            t = self.table
        ))?;
        Ok(())
    }

    pub fn status_id(&self) -> &str {
        &self.status_id
    }

    pub fn stats_id(&self) -> &str {
        &self.stats_id
    }

    pub fn start_timestamp(&self) -> DateTime<Utc> {
        self.start_timestamp
    }

    pub fn exists(&self, id: &str) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                &format!("SELECT 1 FROM {} WHERE id = ?1", self.table),
                params![id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn get(&self, id: &str) -> Result<Option<StatusRecord>> {
        let record = self
            .conn
            .query_row(
                &format!(
                    "SELECT id, category, data, start_time, update_time FROM {} WHERE id = ?1",
                    self.table
                ),
                params![id],
                Self::read_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Merge `data` into record `id` (default: this monitor's stats id).
    /// Returns `false` without writing when `category` or `data` is empty.
    pub fn save(&self, category: &str, data: &Map<String, Value>, id: Option<&str>) -> Result<bool> {
        if category.is_empty() || data.is_empty() {
            return Ok(false);
        }
        let id = id.unwrap_or(&self.stats_id);
        self.upsert(id, category, data, None)?;
        log::info!("Saved status/stats for {}, id({}): {}", category, id, Value::Object(data.clone()));
        Ok(true)
    }

    /// Record a heartbeat for `service`. The first heartbeat of a record also
    /// stores when the service started.
    pub fn save_status(
        &self,
        service: &str,
        status: &str,
        id: Option<&str>,
        start_timestamp: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        if service.is_empty() || status.is_empty() {
            return Ok(false);
        }
        let id = id.unwrap_or(&self.status_id);
        let mut data = Map::new();
        data.insert("service".to_string(), Value::from(service));
        data.insert("status".to_string(), Value::from(status));

        let start = start_timestamp.unwrap_or(self.start_timestamp);
        self.upsert(id, CAT_SERVICE_STATUS, &data, Some(start))?;
        log::info!("Saved status for {}, id({}): {}", service, id, status);
        Ok(true)
    }

    fn upsert(
        &self,
        id: &str,
        category: &str,
        data: &Map<String, Value>,
        start_time: Option<DateTime<Utc>>,
    ) -> Result<()> {
        // Write lock held from the read through the write
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let existing: Option<String> = tx
            .query_row(
                &format!("SELECT data FROM {} WHERE id = ?1", self.table),
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        let mut merged = match existing {
            Some(raw) => match serde_json::from_str::<Value>(&raw)? {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            None => Map::new(),
        };
        merged.extend(data.iter().map(|(k, v)| (k.clone(), v.clone())));

        tx.execute(
            &format!(
                "INSERT INTO {t} (id, category, data, start_time, update_time)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                    category = excluded.category,
                    data = excluded.data,
                    start_time = COALESCE({t}.start_time, excluded.start_time),
                    update_time = excluded.update_time",
                t = self.table
            ),
            params![
                id,
                category,
                serde_json::to_string(&merged)?,
                start_time.map(ts),
                ts(Utc::now()),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Delete records matching every condition in `filter` and return how
    /// many went. A filter with no conditions deletes nothing.
    pub fn delete(&self, filter: &DeleteFilter) -> Result<usize> {
        let mut conditions = Vec::new();
        let mut values = Vec::new();

        if let Some(end) = filter.end {
            let window = window_or_default(filter.start, Some(end), DELETE_WINDOW_DAYS);
            conditions.push("update_time >= ? AND update_time < ?");
            values.push(ts(window.start));
            values.push(ts(window.end));
        }
        if let Some(id) = filter.id.as_deref().filter(|s| !s.is_empty()) {
            conditions.push("id = ?");
            values.push(id.to_string());
        }
        if let Some(category) = filter.category.as_deref().filter(|s| !s.is_empty()) {
            conditions.push("category = ?");
            values.push(category.to_string());
        }

        if conditions.is_empty() {
            log::info!("No condition specified for deletion.");
            return Ok(0);
        }

        let sql = format!("DELETE FROM {} WHERE {}", self.table, conditions.join(" AND "));
        let deleted = self.conn.execute(&sql, params_from_iter(values.iter()))?;
        log::info!("Deleted {} status/stats with condition: {:?}", deleted, filter);
        Ok(deleted)
    }

    /// Delete the heartbeat record `id` (default: this monitor's status id)
    pub fn delete_status(&self, id: Option<&str>) -> Result<usize> {
        self.delete(&DeleteFilter {
            id: Some(id.unwrap_or(&self.status_id).to_string()),
            ..Default::default()
        })
    }

    /// Records of `category` updated within `[start, end)`; the window
    /// defaults to the last seven days.
    pub fn load(
        &self,
        category: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<StatusRecord>> {
        if category.is_empty() {
            return Ok(Vec::new());
        }
        let window = window_or_default(start, end, LOAD_WINDOW_DAYS);
        self.load_window(category, &window)
    }

    fn load_window(&self, category: &str, window: &TimeRange) -> Result<Vec<StatusRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, category, data, start_time, update_time FROM {}
             WHERE category = ?1 AND update_time >= ?2 AND update_time < ?3
             ORDER BY update_time, id",
            self.table
        ))?;
        let records = stmt
            .query_map(
                params![category, ts(window.start), ts(window.end)],
                Self::read_record,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Distinct categories, sorted
    pub fn load_categories(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT DISTINCT category FROM {} ORDER BY category", self.table))?;
        let categories = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(categories)
    }

    fn read_record(row: &Row<'_>) -> rusqlite::Result<StatusRecord> {
        let raw_data: String = row.get(2)?;
        let data = match serde_json::from_str::<Value>(&raw_data) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(e) => return Err(rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e))),
        };
        let start_time = row
            .get::<_, Option<String>>(3)?
            .map(|raw| parse_ts(3, &raw))
            .transpose()?;
        let update_time = parse_ts(4, &row.get::<_, String>(4)?)?;

        Ok(StatusRecord {
            id: row.get(0)?,
            category: row.get(1)?,
            data,
            start_time,
            update_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn ids_are_unique_and_hex() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 24);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn empty_path_is_rejected() {
        assert!(matches!(StatusMonitor::open(Path::new("")), Err(Error::MissingStorePath)));
    }

    #[test]
    fn table_names_are_validated() {
        let monitor = StatusMonitor::open_in_memory().unwrap();
        assert!(matches!(
            monitor.with_table("x; DROP TABLE y"),
            Err(Error::InvalidTableName(_))
        ));
        let monitor = StatusMonitor::open_in_memory().unwrap().with_table("jobs_2024").unwrap();
        assert!(monitor.save("test", &obj(json!({"a": 1})), None).unwrap());
    }

    #[test]
    fn save_skips_empty_input() {
        let monitor = StatusMonitor::open_in_memory().unwrap();
        assert!(!monitor.save("", &obj(json!({"a": 1})), None).unwrap());
        assert!(!monitor.save("test", &Map::new(), None).unwrap());
        assert!(monitor.load_categories().unwrap().is_empty());
    }

    #[test]
    fn save_merges_fields_into_the_stats_record() {
        let monitor = StatusMonitor::open_in_memory().unwrap();
        monitor.save("test", &obj(json!({"a": 1, "b": 2})), None).unwrap();
        monitor.save("test", &obj(json!({"b": 3, "c": 4})), None).unwrap();

        let record = monitor.get(monitor.stats_id()).unwrap().unwrap();
        assert_eq!(Value::Object(record.data), json!({"a": 1, "b": 3, "c": 4}));
        assert_eq!(record.category, "test");
        assert_eq!(record.start_time, None);
    }

    #[test]
    fn heartbeat_keeps_its_first_start_time() {
        let monitor = StatusMonitor::open_in_memory().unwrap();
        let started = Utc.with_ymd_and_hms(2024, 7, 1, 8, 0, 0).unwrap();
        monitor.save_status("crawler", "running", None, Some(started)).unwrap();
        monitor
            .save_status("crawler", "stopped", None, Some(started + Duration::hours(5)))
            .unwrap();

        let record = monitor.get(monitor.status_id()).unwrap().unwrap();
        assert_eq!(record.category, CAT_SERVICE_STATUS);
        assert_eq!(record.start_time, Some(started));
        assert_eq!(record.data["status"], json!("stopped"));
        assert!(!monitor.save_status("", "running", None, None).unwrap());
    }

    #[test]
    fn load_filters_by_category_and_window() {
        let monitor = StatusMonitor::open_in_memory().unwrap();
        monitor.save("yfinance", &obj(json!({"rows": 10})), Some("r1")).unwrap();
        monitor.save("yfinance", &obj(json!({"rows": 20})), Some("r2")).unwrap();
        monitor.save("other", &obj(json!({"rows": 30})), Some("r3")).unwrap();

        let records = monitor.load("yfinance", None, None).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2"]);

        let long_ago = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let old = monitor
            .load("yfinance", Some(long_ago), Some(long_ago + Duration::days(1)))
            .unwrap();
        assert!(old.is_empty());
        assert!(monitor.load("", None, None).unwrap().is_empty());
        assert_eq!(monitor.load_categories().unwrap(), vec!["other", "yfinance"]);
    }

    #[test]
    fn delete_requires_a_condition() {
        let monitor = StatusMonitor::open_in_memory().unwrap();
        monitor.save("test", &obj(json!({"a": 1})), None).unwrap();
        assert_eq!(monitor.delete(&DeleteFilter::default()).unwrap(), 0);
        assert!(monitor.exists(monitor.stats_id()).unwrap());
    }

    #[test]
    fn delete_by_category_id_and_window() {
        let monitor = StatusMonitor::open_in_memory().unwrap();
        monitor.save("a", &obj(json!({"x": 1})), Some("1")).unwrap();
        monitor.save("a", &obj(json!({"x": 1})), Some("2")).unwrap();
        monitor.save("b", &obj(json!({"x": 1})), Some("3")).unwrap();
        monitor.save_status("svc", "running", None, None).unwrap();

        let by_id = DeleteFilter {
            id: Some("1".to_string()),
            ..Default::default()
        };
        assert_eq!(monitor.delete(&by_id).unwrap(), 1);

        // Window ending in the past matches nothing
        let stale = DeleteFilter {
            category: Some("a".to_string()),
            end: Some(Utc::now() - Duration::days(30)),
            ..Default::default()
        };
        assert_eq!(monitor.delete(&stale).unwrap(), 0);

        let recent = DeleteFilter {
            category: Some("a".to_string()),
            end: Some(Utc::now() + Duration::minutes(1)),
            ..Default::default()
        };
        assert_eq!(monitor.delete(&recent).unwrap(), 1);

        assert_eq!(monitor.delete_status(None).unwrap(), 1);
        assert_eq!(monitor.load_categories().unwrap(), vec!["b"]);
    }

    #[test]
    fn file_backed_store_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("status.db");
        {
            let monitor = StatusMonitor::open(&path).unwrap();
            monitor.save("persist", &obj(json!({"ok": true})), Some("p")).unwrap();
        }
        let monitor = StatusMonitor::open(&path).unwrap();
        assert!(monitor.exists("p").unwrap());
    }
}
