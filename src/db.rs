use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::{FinsiftError, Result};
use crate::models::EntryKind;
use crate::records::{Frequency, NewRecord, Record, RecordStore};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    format TEXT,
    record_count INTEGER,
    checksum TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY,
    kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
    name TEXT NOT NULL,
    amount REAL NOT NULL,
    frequency TEXT NOT NULL DEFAULT 'one-time',
    category TEXT NOT NULL DEFAULT 'Other',
    date TEXT,
    status TEXT NOT NULL DEFAULT 'Active',
    source TEXT,
    import_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (import_id) REFERENCES imports(id) ON DELETE SET NULL
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn insert_record(conn: &Connection, record: &NewRecord, import_id: Option<i64>) -> Result<i64> {
    conn.execute(
        "INSERT INTO records (kind, name, amount, frequency, category, date, status, source, import_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            record.kind.key(),
            record.name,
            record.amount,
            record.frequency.key(),
            record.category,
            record.date,
            record.status,
            record.source,
            import_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `db_path`.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = get_connection(db_path)?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    pub fn has_import(&self, checksum: &str) -> Result<bool> {
        let mut stmt = self.conn.prepare("SELECT 1 FROM imports WHERE checksum = ?1")?;
        Ok(stmt.exists([checksum])?)
    }

    pub fn import_count(&self) -> Result<i64> {
        Ok(self.conn.query_row("SELECT count(*) FROM imports", [], |r| r.get(0))?)
    }

    /// Record counts by kind: (income, expense).
    pub fn kind_counts(&self) -> Result<(i64, i64)> {
        Ok(self.conn.query_row(
            "SELECT
                COALESCE(SUM(CASE WHEN kind = 'income' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN kind = 'expense' THEN 1 ELSE 0 END), 0)
             FROM records",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?)
    }
}

impl RecordStore for SqliteStore {
    fn add(&mut self, record: &NewRecord) -> Result<i64> {
        insert_record(&self.conn, record, None)
    }

    fn update(&mut self, id: i64, record: &NewRecord) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE records SET kind = ?1, name = ?2, amount = ?3, frequency = ?4,
                category = ?5, date = ?6, status = ?7, source = ?8
             WHERE id = ?9",
            params![
                record.kind.key(),
                record.name,
                record.amount,
                record.frequency.key(),
                record.category,
                record.date,
                record.status,
                record.source,
                id,
            ],
        )?;
        if changed == 0 {
            return Err(FinsiftError::UnknownRecord(id));
        }
        Ok(())
    }

    fn delete(&mut self, id: i64) -> Result<()> {
        let changed = self.conn.execute("DELETE FROM records WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(FinsiftError::UnknownRecord(id));
        }
        Ok(())
    }

    fn scan(&self) -> Result<Vec<Record>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, name, amount, frequency, category, date, status, source, created_at
             FROM records ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            let kind: String = row.get(1)?;
            let frequency: String = row.get(4)?;
            Ok(Record {
                id: row.get(0)?,
                values: NewRecord {
                    kind: if kind == "income" {
                        EntryKind::Income
                    } else {
                        EntryKind::Expense
                    },
                    name: row.get(2)?,
                    amount: row.get(3)?,
                    frequency: Frequency::from_text(&frequency),
                    category: row.get(5)?,
                    date: row.get(6)?,
                    status: row.get(7)?,
                    source: row.get(8)?,
                },
                created_at: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitSummary {
    pub import_id: i64,
    pub inserted: usize,
}

/// Stores a batch of records as one import of `data`. Identical bytes that
/// were committed before are refused with `DuplicateFile`.
pub fn commit_import(
    store: &mut SqliteStore,
    file_name: &str,
    data: &[u8],
    format: &str,
    records: &[NewRecord],
) -> Result<CommitSummary> {
    let checksum = compute_checksum(data);
    if store.has_import(&checksum)? {
        return Err(FinsiftError::DuplicateFile(file_name.to_string()));
    }

    let tx = store.conn.transaction()?;
    tx.execute(
        "INSERT INTO imports (filename, format, record_count, checksum) VALUES (?1, ?2, ?3, ?4)",
        params![file_name, format, records.len() as i64, checksum],
    )?;
    let import_id = tx.last_insert_rowid();
    let mut inserted = 0usize;
    for record in records {
        insert_record(&tx, record, Some(import_id))?;
        inserted += 1;
    }
    tx.commit()?;
    info!(file = file_name, import_id, inserted, "committed import");
    Ok(CommitSummary {
        import_id,
        inserted,
    })
}

/// Filename of a previous import with the same checksum, if any.
pub fn find_import(store: &SqliteStore, data: &[u8]) -> Result<Option<String>> {
    let checksum = compute_checksum(data);
    Ok(store
        .conn
        .query_row(
            "SELECT filename FROM imports WHERE checksum = ?1",
            [checksum],
            |r| r.get(0),
        )
        .optional()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("nested").join("test.db")).unwrap();
        (dir, store)
    }

    fn sample(name: &str, amount: f64) -> NewRecord {
        NewRecord {
            kind: EntryKind::Expense,
            name: name.to_string(),
            amount,
            frequency: Frequency::Monthly,
            category: "Housing".to_string(),
            date: Some("2025-01-01".to_string()),
            status: "Active".to_string(),
            source: None,
        }
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, store) = test_store();
        let tables: Vec<String> = store
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["records", "imports"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, store) = test_store();
        init_db(&store.conn).unwrap();
    }

    #[test]
    fn test_add_update_delete_scan() {
        let (_dir, mut store) = test_store();
        let id = store.add(&sample("Rent", 1500.0)).unwrap();
        store.add(&sample("Gym", 45.0)).unwrap();

        let mut changed = sample("Rent", 1600.0);
        changed.kind = EntryKind::Income;
        store.update(id, &changed).unwrap();

        let all = store.scan().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].values.amount, 1600.0);
        assert_eq!(all[0].values.kind, EntryKind::Income);
        assert_eq!(all[0].values.frequency, Frequency::Monthly);
        assert!(!all[0].created_at.is_empty());
        assert_eq!(store.kind_counts().unwrap(), (1, 1));

        store.delete(id).unwrap();
        assert_eq!(store.scan().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_record_is_reported() {
        let (_dir, mut store) = test_store();
        assert!(matches!(store.delete(42), Err(FinsiftError::UnknownRecord(42))));
        assert!(matches!(
            store.update(7, &sample("X", 1.0)),
            Err(FinsiftError::UnknownRecord(7))
        ));
    }

    #[test]
    fn test_commit_refuses_duplicate_bytes() {
        let (_dir, mut store) = test_store();
        let data = b"Type,Name,Amount\nExpense,Rent,1500\n";
        let records = vec![sample("Rent", 1500.0)];

        let summary = commit_import(&mut store, "rent.csv", data, "simple", &records).unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(store.import_count().unwrap(), 1);
        assert_eq!(find_import(&store, data).unwrap().as_deref(), Some("rent.csv"));

        let again = commit_import(&mut store, "copy.csv", data, "simple", &records);
        assert!(matches!(again, Err(FinsiftError::DuplicateFile(ref f)) if f == "copy.csv"));
        assert_eq!(store.scan().unwrap().len(), 1);
    }

    #[test]
    fn test_compute_checksum() {
        assert_eq!(
            compute_checksum(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
