use anyhow::Result;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::rusqlite::{params, OpenFlags};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;
use std::sync::Arc;

use crate::storage::area::StorageArea;

/// SQLite-based durable storage, one logical area per origin.
pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path`.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path)
            .with_flags(
                OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_URI,
            )
            .with_init(|c| {
                c.busy_timeout(std::time::Duration::from_millis(500))?;
                c.pragma_update(None, "journal_mode", "WAL")?;
                c.execute_batch(
                    "CREATE TABLE IF NOT EXISTS local_storage (
                        origin TEXT NOT NULL,
                        key TEXT NOT NULL,
                        value TEXT NOT NULL,
                        updated_at INTEGER NOT NULL DEFAULT (strftime('%s','now')),
                        PRIMARY KEY(origin, key)
                    );",
                )?;
                Ok(())
            });

        let pool = Pool::builder()
            .max_size(4)
            .connection_timeout(std::time::Duration::from_secs(5))
            .build(manager)?;

        Ok(Self { pool })
    }

    /// Storage area for `origin` (e.g. `https://shop.example`).
    pub fn area(&self, origin: &url::Origin) -> Arc<dyn StorageArea> {
        Arc::new(SqliteArea {
            pool: self.pool.clone(),
            origin: origin.ascii_serialization(),
        })
    }
}

struct SqliteArea {
    pool: Pool<SqliteConnectionManager>,
    origin: String,
}

impl SqliteArea {
    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }
}

impl StorageArea for SqliteArea {
    fn get_item(&self, key: &str) -> Option<String> {
        let conn = self.conn().ok()?;
        conn.query_row(
            "SELECT value FROM local_storage WHERE origin=?1 AND key=?2",
            params![self.origin, key],
            |row| row.get::<_, String>(0),
        )
        .ok()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO local_storage(origin,key,value) VALUES (?1,?2,?3)
             ON CONFLICT(origin,key) DO UPDATE
             SET value=excluded.value, updated_at=strftime('%s','now')",
            params![self.origin, key, value],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM local_storage WHERE origin=?1 AND key=?2",
            params![self.origin, key],
        )?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM local_storage WHERE origin=?1", params![self.origin])?;
        Ok(())
    }

    fn len(&self) -> usize {
        let conn = match self.conn() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row::<u32, _, _>(
            "SELECT COUNT(*) FROM local_storage WHERE origin=?1",
            params![self.origin],
            |row| row.get(0),
        )
        .unwrap_or(0) as usize
    }

    fn keys(&self) -> Vec<String> {
        let conn = match self.conn() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare("SELECT key FROM local_storage WHERE origin=?1 ORDER BY key") {
            Ok(s) => s,
            Err(_) => return vec![],
        };

        let rows = match stmt.query_map(params![self.origin], |row| row.get::<_, String>(0)) {
            Ok(r) => r,
            Err(_) => return vec![],
        };

        rows.filter_map(Result::ok).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn o(s: &str) -> url::Origin {
        url::Url::parse(s).expect("valid URL").origin()
    }

    #[test]
    fn area_contract() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("local.db")).unwrap();
        let area = store.area(&o("https://shop.test"));

        assert_eq!(area.len(), 0);
        area.set_item("token", "abc").unwrap();
        area.set_item("carts", "[]").unwrap();
        assert_eq!(area.len(), 2);
        assert_eq!(area.keys(), vec!["carts".to_string(), "token".to_string()]);

        area.set_item("token", "def").unwrap();
        assert_eq!(area.get_item("token").as_deref(), Some("def"));

        area.remove_item("token").unwrap();
        assert!(area.get_item("token").is_none());

        area.clear().unwrap();
        assert_eq!(area.len(), 0);
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.db");
        {
            let store = SqliteStore::new(&path).unwrap();
            store.area(&o("https://shop.test")).set_item("token", "persisted").unwrap();
        }

        let store = SqliteStore::new(&path).unwrap();
        let area = store.area(&o("https://shop.test"));
        assert_eq!(area.get_item("token").as_deref(), Some("persisted"));
    }

    #[test]
    fn origins_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("local.db")).unwrap();

        store.area(&o("https://a.test")).set_item("token", "a").unwrap();
        let other = store.area(&o("https://b.test"));

        assert!(other.get_item("token").is_none());
        other.clear().unwrap();
        assert_eq!(store.area(&o("https://a.test")).get_item("token").as_deref(), Some("a"));
    }
}
