pub mod record;

pub use record::{Filter, StoredRecord, Table};

use crate::core::error::Result;
use chrono::NaiveDate;
use rusqlite::{Connection, OpenFlags, Params, params_from_iter};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// SQLite backed store for transactions, closing prices and dividends.
///
/// Every call is an independent round trip; callers must serialise access
/// if a store is shared between threads.
pub struct RecordStore {
    conn: Connection,
    path: PathBuf,
}

impl RecordStore {
    /// Opens the database at `path`, creating the file and any missing tables.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("Opening record store at: {}", path.display());
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )?;
        let store = RecordStore { conn, path };
        store.create_tables()?;
        Ok(store)
    }

    /// Opens a fresh in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        debug!("Creating in-memory record store");
        let store = RecordStore {
            conn: Connection::open_in_memory()?,
            path: PathBuf::from(":memory:"),
        };
        store.create_tables()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn create_tables(&self) -> Result<()> {
        for table in Table::ALL {
            self.create_table(table)?;
        }
        Ok(())
    }

    pub fn create_table(&self, table: Table) -> Result<()> {
        let name = table.name();
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {name} ({});
             CREATE INDEX IF NOT EXISTS idx_{name}_code_date ON {name} (code, date);",
            table.column_defs()
        ))?;
        debug!(table = name, "Created table");
        Ok(())
    }

    pub fn drop_table(&self, table: Table) -> Result<()> {
        self.conn
            .execute_batch(&format!("DROP TABLE IF EXISTS {}", table.name()))?;
        debug!(table = table.name(), "Dropped table");
        Ok(())
    }

    /// Deletes every row of `table`, keeping its schema.
    pub fn clear_table(&self, table: Table) -> Result<usize> {
        let removed = self.execute(&format!("DELETE FROM {}", table.name()), [])?;
        debug!(table = table.name(), removed, "Cleared table");
        Ok(removed)
    }

    /// Appends `records` to their table.
    pub fn insert<T: StoredRecord>(&self, records: &[T]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let inserted = Self::insert_with(&tx, records)?;
        tx.commit()?;
        debug!(table = T::TABLE.name(), inserted, "Inserted records");
        Ok(inserted)
    }

    /// Overwrites all rows for the codes present in `records` with `records`.
    pub fn replace<T: StoredRecord>(&self, records: &[T]) -> Result<usize> {
        let codes: BTreeSet<&str> = records.iter().map(|r| r.code()).collect();
        let tx = self.conn.unchecked_transaction()?;
        for code in codes {
            tx.execute(
                &format!("DELETE FROM {} WHERE code = ?1", T::TABLE.name()),
                [code],
            )?;
        }
        let inserted = Self::insert_with(&tx, records)?;
        tx.commit()?;
        debug!(table = T::TABLE.name(), inserted, "Replaced records");
        Ok(inserted)
    }

    fn insert_with<T: StoredRecord>(conn: &Connection, records: &[T]) -> Result<usize> {
        let placeholders = (1..=T::COLUMNS.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            T::TABLE.name(),
            T::COLUMNS.join(", ")
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let mut inserted = 0;
        for record in records {
            inserted += stmt.execute(params_from_iter(record.to_values()))?;
        }
        Ok(inserted)
    }

    /// Returns the records matching `filter`, oldest first.
    pub fn query<T: StoredRecord>(&self, filter: &Filter) -> Result<Vec<T>> {
        let (where_clause, values) = filter.to_sql();
        let sql = format!(
            "SELECT {} FROM {}{where_clause} ORDER BY date, code, rowid",
            T::COLUMNS.join(", "),
            T::TABLE.name()
        );
        debug!(sql = %sql, "Querying records");
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), T::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<T>>>()?)
    }

    /// Deletes a single row whose every column equals `record`.
    /// Returns the number of rows removed (0 or 1).
    pub fn delete_one<T: StoredRecord>(&self, record: &T) -> Result<usize> {
        let table = T::TABLE.name();
        let predicate = T::COLUMNS
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{column} = ?{}", i + 1))
            .collect::<Vec<_>>()
            .join(" AND ");
        let sql = format!(
            "DELETE FROM {table} WHERE rowid = (SELECT rowid FROM {table} WHERE {predicate} LIMIT 1)"
        );
        self.execute(&sql, params_from_iter(record.to_values()))
    }

    /// Runs an arbitrary parameterised statement.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        let affected = self.conn.execute(sql, params)?;
        debug!(sql = %sql, affected, "Executed statement");
        Ok(affected)
    }

    /// Most recent date with a stored closing price for `code`.
    pub fn latest_price_date(&self, code: &str) -> Result<Option<NaiveDate>> {
        let latest = self.conn.query_row(
            "SELECT MAX(date) FROM prices WHERE code = ?1",
            [code],
            |row| row.get::<_, Option<NaiveDate>>(0),
        )?;
        Ok(latest)
    }
}
