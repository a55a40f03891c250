use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension};
use std::path::Path;

use super::traits::{StoreError, StoreRead, StoreResult, StoreWrite};
use crate::types::{Order, Technician};

const DB_SCHEMA_VERSION: i64 = 1;

/// Document store over SQLite: each record is a JSON document plus a few
/// extracted columns for uniqueness, ordering and the open-installations
/// query. Connections are opened per call; SQLite provides the locking.
#[derive(Clone)]
pub struct SqliteStore {
    path: String,
}

/// Fixed-width RFC 3339 so the TEXT column sorts chronologically.
fn created_at_key(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn doc_column<T: serde::de::DeserializeOwned>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let doc: String = row.get(idx)?;
    serde_json::from_str(&doc)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn map_order_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Order> {
    doc_column(row, 0)
}

fn map_technician_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Technician> {
    doc_column(row, 0)
}

fn db_find_order(conn: &Connection, job_no: &str) -> rusqlite::Result<Option<Order>> {
    conn.query_row(
        "SELECT doc FROM orders WHERE job_no = ?1",
        params![job_no],
        map_order_row,
    )
    .optional()
}

fn db_list_orders(conn: &Connection) -> rusqlite::Result<Vec<Order>> {
    let mut stmt = conn.prepare("SELECT doc FROM orders ORDER BY created_at DESC")?;
    let mapped = stmt
        .query_map([], map_order_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(mapped)
}

fn db_list_open_installations(conn: &Connection) -> rusqlite::Result<Vec<Order>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT doc
        FROM orders
        WHERE completed = 0
          AND service LIKE '%INSTALL%'
        ORDER BY CASE priority WHEN 'HIGH' THEN 0 WHEN 'MEDIUM' THEN 1 ELSE 2 END,
                 created_at DESC
        "#,
    )?;
    let mapped = stmt
        .query_map([], map_order_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(mapped)
}

fn db_insert_order(conn: &Connection, order: &Order, doc: &str) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO orders (job_no, priority, service, completed, created_at, doc)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            order.job_no,
            order.priority.as_str(),
            order.service,
            order.completed as i64,
            created_at_key(order.created_at),
            doc
        ],
    )?;
    Ok(())
}

fn db_update_order(conn: &Connection, order: &Order, doc: &str) -> rusqlite::Result<usize> {
    conn.execute(
        r#"
        UPDATE orders
        SET priority = ?2, service = ?3, completed = ?4, created_at = ?5, doc = ?6
        WHERE job_no = ?1
        "#,
        params![
            order.job_no,
            order.priority.as_str(),
            order.service,
            order.completed as i64,
            created_at_key(order.created_at),
            doc
        ],
    )
}

fn db_delete_order(conn: &Connection, job_no: &str) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM orders WHERE job_no = ?1", params![job_no])
}

fn db_find_technician(conn: &Connection, username: &str) -> rusqlite::Result<Option<Technician>> {
    conn.query_row(
        "SELECT doc FROM technicians WHERE username = ?1",
        params![username],
        map_technician_row,
    )
    .optional()
}

fn db_count_admins(conn: &Connection, admin_level: i64) -> rusqlite::Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM technicians WHERE level = ?1",
        params![admin_level],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

fn db_insert_technician(
    conn: &Connection,
    technician: &Technician,
    doc: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO technicians (username, level, created_at, doc)
        VALUES (?1, ?2, ?3, ?4)
        "#,
        params![
            technician.username,
            technician.level,
            created_at_key(technician.created_at),
            doc
        ],
    )?;
    Ok(())
}

fn map_write_err(err: rusqlite::Error, what: &'static str) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::Conflict(what)
        }
        other => StoreError::Backend(other.into()),
    }
}

fn encode_doc<T: serde::Serialize>(value: &T) -> StoreResult<String> {
    serde_json::to_string(value).map_err(|err| StoreError::Backend(err.into()))
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_string_lossy().to_string(),
        }
    }

    pub fn reset_all(&self) -> anyhow::Result<()> {
        if !Path::new(&self.path).exists() {
            return Ok(());
        }
        std::fs::remove_file(&self.path)?;
        Ok(())
    }

    pub fn init(&self) -> anyhow::Result<()> {
        self.with_conn(|_conn| Ok(()))?;
        Ok(())
    }

    fn with_conn<F, T>(&self, f: F) -> rusqlite::Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = Connection::open(&self.path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(std::time::Duration::from_millis(500))?;

        Self::migrate(&conn)?;
        f(&conn)
    }

    fn migrate(conn: &Connection) -> rusqlite::Result<()> {
        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version == DB_SCHEMA_VERSION {
            return Ok(());
        }

        log::info!(
            "SQLite schema migration: {} -> {}",
            version,
            DB_SCHEMA_VERSION
        );

        if version == 0 {
            conn.execute_batch(
                r#"
            CREATE TABLE orders (
                job_no TEXT PRIMARY KEY,
                priority TEXT NOT NULL,
                service TEXT NOT NULL,
                completed INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                doc TEXT NOT NULL
            );
            CREATE INDEX orders_created_idx ON orders(created_at DESC);
            CREATE INDEX orders_open_install_idx ON orders(completed, service);
            CREATE TABLE technicians (
                username TEXT PRIMARY KEY,
                level INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                doc TEXT NOT NULL
            );
            CREATE INDEX technicians_level_idx ON technicians(level);
        "#,
            )?;
            conn.pragma_update(None, "user_version", DB_SCHEMA_VERSION)?;
            return Ok(());
        }

        Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::ErrorCode::SchemaChanged as i32),
            Some("database schema version mismatch; please run with --reset option".to_string()),
        ))
    }
}

impl StoreRead for SqliteStore {
    fn find_order(&self, job_no: &str) -> StoreResult<Option<Order>> {
        let row = self
            .with_conn(|conn| db_find_order(conn, job_no))
            .map_err(anyhow::Error::from)?;
        Ok(row)
    }

    fn list_orders(&self) -> StoreResult<Vec<Order>> {
        let rows = self.with_conn(db_list_orders).map_err(anyhow::Error::from)?;
        Ok(rows)
    }

    fn list_open_installations(&self) -> StoreResult<Vec<Order>> {
        let rows = self
            .with_conn(db_list_open_installations)
            .map_err(anyhow::Error::from)?;
        Ok(rows)
    }

    fn find_technician(&self, username: &str) -> StoreResult<Option<Technician>> {
        let row = self
            .with_conn(|conn| db_find_technician(conn, username))
            .map_err(anyhow::Error::from)?;
        Ok(row)
    }

    fn count_admins(&self) -> StoreResult<u64> {
        let count = self
            .with_conn(|conn| db_count_admins(conn, crate::types::ADMIN_LEVEL))
            .map_err(anyhow::Error::from)?;
        Ok(count)
    }
}

impl StoreWrite for SqliteStore {
    fn insert_order(&self, order: &Order) -> StoreResult<()> {
        let doc = encode_doc(order)?;
        self.with_conn(|conn| db_insert_order(conn, order, &doc))
            .map_err(|err| map_write_err(err, "job number"))?;
        Ok(())
    }

    fn update_order(&self, order: &Order) -> StoreResult<()> {
        let doc = encode_doc(order)?;
        self.with_conn(|conn| db_update_order(conn, order, &doc))
            .map_err(anyhow::Error::from)?;
        Ok(())
    }

    fn delete_order(&self, job_no: &str) -> StoreResult<bool> {
        let rows = self
            .with_conn(|conn| db_delete_order(conn, job_no))
            .map_err(anyhow::Error::from)?;
        Ok(rows > 0)
    }

    fn insert_technician(&self, technician: &Technician) -> StoreResult<()> {
        let doc = encode_doc(technician)?;
        self.with_conn(|conn| db_insert_technician(conn, technician, &doc))
            .map_err(|err| map_write_err(err, "username"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderDraft, Priority, Technician};
    use chrono::Duration;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> SqliteStore {
        let store = SqliteStore::new(dir.path().join("fieldops.sqlite"));
        store.init().unwrap();
        store
    }

    fn sample_order(job_no: &str, service: &str, priority: &str, age_mins: i64) -> Order {
        let draft = OrderDraft {
            priority: Some(priority.into()),
            name: Some("jane doe".into()),
            model: Some("tv-55".into()),
            phone: Some("05551112233".into()),
            service: Some(service.into()),
            reference: None,
            address: Some("main st 1".into()),
            note: None,
        };
        let created_at = Utc::now() - Duration::minutes(age_mins);
        draft.into_order(job_no.into(), created_at).unwrap()
    }

    fn sample_technician(username: &str, level: i64) -> Technician {
        Technician {
            name: "JANE DOE".into(),
            username: username.into(),
            password: "SECRET".into(),
            level,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn reset_all_ok_when_missing() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::new(dir.path().join("missing.sqlite"));
        store.reset_all().unwrap();
    }

    #[test]
    fn init_fails_on_mismatched_schema_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.sqlite");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("PRAGMA user_version = 999;").unwrap();
        drop(conn);

        let store = SqliteStore::new(&path);
        let err = store.init().expect_err("schema mismatch must fail");
        assert!(format!("{err}").contains("--reset"));
    }

    #[test]
    fn insert_and_find_round_trips_the_document() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let order = sample_order("WO-1000", "tv install", "high", 0);

        store.insert_order(&order).unwrap();
        let loaded = store.find_order("WO-1000").unwrap().unwrap();
        assert_eq!(loaded, order);
        assert!(store.find_order("WO-9999").unwrap().is_none());
    }

    #[test]
    fn duplicate_job_no_is_a_conflict() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let order = sample_order("WO-1000", "repair", "low", 0);

        store.insert_order(&order).unwrap();
        let err = store.insert_order(&order).unwrap_err();
        assert!(matches!(err, StoreError::Conflict("job number")));
    }

    #[test]
    fn list_orders_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store
            .insert_order(&sample_order("WO-0001", "repair", "low", 30))
            .unwrap();
        store
            .insert_order(&sample_order("WO-0002", "repair", "low", 10))
            .unwrap();
        store
            .insert_order(&sample_order("WO-0003", "repair", "low", 20))
            .unwrap();

        let job_nos: Vec<_> = store
            .list_orders()
            .unwrap()
            .into_iter()
            .map(|o| o.job_no)
            .collect();
        assert_eq!(job_nos, ["WO-0002", "WO-0003", "WO-0001"]);
    }

    #[test]
    fn open_installations_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store
            .insert_order(&sample_order("WO-0001", "tv install", "low", 10))
            .unwrap();
        store
            .insert_order(&sample_order("WO-0002", "repair", "high", 5))
            .unwrap();
        store
            .insert_order(&sample_order("WO-0003", "tv install", "high", 20))
            .unwrap();
        let mut done = sample_order("WO-0004", "tv install", "high", 1);
        done.completed = true;
        store.insert_order(&done).unwrap();

        let job_nos: Vec<_> = store
            .list_open_installations()
            .unwrap()
            .into_iter()
            .map(|o| o.job_no)
            .collect();
        assert_eq!(job_nos, ["WO-0003", "WO-0001"]);
    }

    #[test]
    fn update_replaces_document_and_extracted_columns() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let mut order = sample_order("WO-1000", "repair", "low", 0);
        store.insert_order(&order).unwrap();

        order.priority = Priority::High;
        order.service = "TV INSTALL".into();
        order.completed = true;
        store.update_order(&order).unwrap();

        let loaded = store.find_order("WO-1000").unwrap().unwrap();
        assert_eq!(loaded.priority, Priority::High);
        assert!(loaded.completed);
        // completed installations stay out of the open list
        assert!(store.list_open_installations().unwrap().is_empty());
    }

    #[test]
    fn delete_reports_whether_anything_was_removed() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store
            .insert_order(&sample_order("WO-1000", "repair", "low", 0))
            .unwrap();

        assert!(store.delete_order("WO-1000").unwrap());
        assert!(!store.delete_order("WO-1000").unwrap());
        assert!(store.find_order("WO-1000").unwrap().is_none());
    }

    #[test]
    fn technician_username_is_unique() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store
            .insert_technician(&sample_technician("JANE", 3))
            .unwrap();
        let err = store
            .insert_technician(&sample_technician("JANE", 4))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict("username")));

        let loaded = store.find_technician("JANE").unwrap().unwrap();
        assert_eq!(loaded.level, 3);
        assert!(store.find_technician("NOBODY").unwrap().is_none());
    }

    #[test]
    fn count_admins_counts_only_level_one() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        assert_eq!(store.count_admins().unwrap(), 0);

        store
            .insert_technician(&sample_technician("BOSS", 1))
            .unwrap();
        store
            .insert_technician(&sample_technician("CREW", 3))
            .unwrap();
        assert_eq!(store.count_admins().unwrap(), 1);
    }
}
