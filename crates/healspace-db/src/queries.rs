use crate::Database;
use crate::kv::KeyValueStore;
use anyhow::Result;

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
                (key, value),
            )?;
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM kv_store WHERE key = ?1", [key])?;
            Ok(())
        })
    }
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_overwrites_existing_value() {
        let db = Database::open_in_memory().unwrap();
        db.set("stories", "[]").unwrap();
        db.set("stories", "[1]").unwrap();
        assert_eq!(db.get("stories").unwrap().as_deref(), Some("[1]"));
        let rows: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn missing_key_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get("nope").unwrap(), None);
    }

    #[test]
    fn json_helpers_work_over_sqlite() {
        let db = Database::open_in_memory().unwrap();
        db.write_json("moods", &vec!["calm", "tired"]).unwrap();
        let moods: Vec<String> = db.read_json("moods", Vec::new).unwrap();
        assert_eq!(moods, vec!["calm", "tired"]);

        db.remove("moods").unwrap();
        let moods: Vec<String> = db.read_json("moods", Vec::new).unwrap();
        assert!(moods.is_empty());
    }

    /// Scratch directory removed on drop, so failed assertions clean up too.
    struct ScratchDir(std::path::PathBuf);

    impl ScratchDir {
        fn new(prefix: &str) -> Self {
            let dir = std::env::temp_dir().join(format!(
                "{}_{}_{}",
                prefix,
                std::process::id(),
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_nanos()
            ));
            std::fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }
    }

    impl Drop for ScratchDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn file_database_persists_across_reopen() {
        let dir = ScratchDir::new("healspace_db");
        let path = dir.0.join("kv.db");

        {
            let db = Database::open(&path).unwrap();
            db.set("viewer", "\"me\"").unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.get("viewer").unwrap().as_deref(), Some("\"me\""));
    }
}
