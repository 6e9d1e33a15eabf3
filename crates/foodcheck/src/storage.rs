//! Storage gateway over the `FOOD` relation.
//!
//! The harness only needs four statements: count a triple, select by name,
//! insert with a defaulted id and delete by name. [`FoodStore`] is the seam;
//! [`SqliteFoodStore`] is the rusqlite implementation.

use crate::record::{exotic_code, Category, FoodRecord};
use crate::result::{HarnessError, HarnessResult};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Rows present after a reset
pub const BASELINE_FOODS: [(&str, Category, bool); 4] = [
    ("Orange", Category::Fruit, true),
    ("Cabbage", Category::Vegetable, false),
    ("Tomato", Category::Vegetable, true),
    ("Apple", Category::Fruit, false),
];

/// A `FOOD` row as read back from storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFood {
    /// Primary key
    pub id: i64,
    /// `FOOD_NAME`
    pub name: String,
    /// `FOOD_TYPE`
    pub category: Category,
    /// `FOOD_EXOTIC` as a flag
    pub exotic: bool,
}

impl StoredFood {
    /// Drop the id
    #[must_use]
    pub fn to_record(&self) -> FoodRecord {
        FoodRecord::new(self.name.clone(), self.category, self.exotic)
    }
}

/// Queries the harness issues against storage.
///
/// Errors are returned as-is and never retried: a retry could hide the very
/// integrity problem the harness exists to report.
pub trait FoodStore {
    /// Rows matching all three fields
    fn count_matching(&self, record: &FoodRecord) -> HarnessResult<u64>;

    /// Rows with this name
    fn count_by_name(&self, name: &str) -> HarnessResult<u64>;

    /// All rows with this name, in id order
    fn select_by_name(&self, name: &str) -> HarnessResult<Vec<StoredFood>>;

    /// All rows, in id order
    fn select_all(&self) -> HarnessResult<Vec<StoredFood>>;

    /// Insert with a storage-assigned id
    fn insert(&self, record: &FoodRecord) -> HarnessResult<i64>;

    /// Delete every row with this name; returns affected rows
    fn delete_by_name(&self, name: &str) -> HarnessResult<usize>;
}

impl<S: FoodStore + ?Sized> FoodStore for Box<S> {
    fn count_matching(&self, record: &FoodRecord) -> HarnessResult<u64> {
        (**self).count_matching(record)
    }

    fn count_by_name(&self, name: &str) -> HarnessResult<u64> {
        (**self).count_by_name(name)
    }

    fn select_by_name(&self, name: &str) -> HarnessResult<Vec<StoredFood>> {
        (**self).select_by_name(name)
    }

    fn select_all(&self) -> HarnessResult<Vec<StoredFood>> {
        (**self).select_all()
    }

    fn insert(&self, record: &FoodRecord) -> HarnessResult<i64> {
        (**self).insert(record)
    }

    fn delete_by_name(&self, name: &str) -> HarnessResult<usize> {
        (**self).delete_by_name(name)
    }
}

/// SQLite-backed `FOOD` store.
///
/// Cloning shares the connection, so an in-memory database can be observed
/// by both the harness and a simulated application.
#[derive(Clone)]
pub struct SqliteFoodStore {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteFoodStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteFoodStore").finish_non_exhaustive()
    }
}

impl SqliteFoodStore {
    /// Open or create a database at path
    pub fn open(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        info!("Opened food store at {:?}", path.as_ref());
        Ok(store)
    }

    /// Open in-memory database (for testing)
    pub fn open_in_memory() -> HarnessResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create the `FOOD` relation if missing
    pub fn init_schema(&self) -> HarnessResult<()> {
        let conn = self.conn.lock();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS FOOD (
                FOOD_ID INTEGER PRIMARY KEY AUTOINCREMENT,
                FOOD_NAME TEXT NOT NULL,
                FOOD_TYPE TEXT NOT NULL CHECK (FOOD_TYPE IN ('VEGETABLE', 'FRUIT')),
                FOOD_EXOTIC INTEGER NOT NULL CHECK (FOOD_EXOTIC IN (0, 1))
            );
            CREATE INDEX IF NOT EXISTS idx_food_name ON FOOD(FOOD_NAME);
            "#,
        )?;
        Ok(())
    }

    /// Insert the baseline rows
    pub fn seed_baseline(&self) -> HarnessResult<()> {
        for (name, category, exotic) in BASELINE_FOODS {
            self.insert(&FoodRecord::new(name, category, exotic))?;
        }
        Ok(())
    }

    /// Delete everything and re-insert the baseline rows
    pub fn reset_to_baseline(&self) -> HarnessResult<()> {
        let removed = self.conn.lock().execute("DELETE FROM FOOD", [])?;
        debug!(removed, "cleared FOOD");
        self.seed_baseline()
    }

    fn read_rows(&self, sql: &str, name: Option<&str>) -> HarnessResult<Vec<StoredFood>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let map = |row: &rusqlite::Row<'_>| -> rusqlite::Result<(i64, String, String, i64)> {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
            ))
        };
        let raw = match name {
            Some(name) => stmt
                .query_map(params![name], map)?
                .collect::<Result<Vec<_>, _>>()?,
            None => stmt.query_map([], map)?.collect::<Result<Vec<_>, _>>()?,
        };
        raw.into_iter()
            .map(|(id, name, code, exotic)| {
                let exotic = match exotic {
                    0 => false,
                    1 => true,
                    other => {
                        return Err(HarnessError::mismatch(
                            format!("FOOD_EXOTIC of row {id}"),
                            "0 or 1",
                            other,
                        ))
                    }
                };
                Ok(StoredFood {
                    id,
                    name,
                    category: Category::from_code(&code)?,
                    exotic,
                })
            })
            .collect()
    }
}

impl FoodStore for SqliteFoodStore {
    fn count_matching(&self, record: &FoodRecord) -> HarnessResult<u64> {
        let count: i64 = self.conn.lock().query_row(
            "SELECT COUNT(FOOD_ID) FROM FOOD WHERE FOOD_NAME = ?1 AND FOOD_TYPE = ?2 AND FOOD_EXOTIC = ?3",
            params![record.name, record.category.code(), exotic_code(record.exotic)],
            |row| row.get(0),
        )?;
        debug!(record = %record, count, "count_matching");
        Ok(count as u64)
    }

    fn count_by_name(&self, name: &str) -> HarnessResult<u64> {
        let count: i64 = self.conn.lock().query_row(
            "SELECT COUNT(*) FROM FOOD WHERE FOOD_NAME = ?1",
            params![name],
            |row| row.get(0),
        )?;
        debug!(name, count, "count_by_name");
        Ok(count as u64)
    }

    fn select_by_name(&self, name: &str) -> HarnessResult<Vec<StoredFood>> {
        self.read_rows(
            "SELECT FOOD_ID, FOOD_NAME, FOOD_TYPE, FOOD_EXOTIC FROM FOOD WHERE FOOD_NAME = ?1 ORDER BY FOOD_ID",
            Some(name),
        )
    }

    fn select_all(&self) -> HarnessResult<Vec<StoredFood>> {
        self.read_rows(
            "SELECT FOOD_ID, FOOD_NAME, FOOD_TYPE, FOOD_EXOTIC FROM FOOD ORDER BY FOOD_ID",
            None,
        )
    }

    fn insert(&self, record: &FoodRecord) -> HarnessResult<i64> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO FOOD (FOOD_NAME, FOOD_TYPE, FOOD_EXOTIC) VALUES (?1, ?2, ?3)",
            params![record.name, record.category.code(), exotic_code(record.exotic)],
        )?;
        let id = conn.last_insert_rowid();
        debug!(record = %record, id, "inserted");
        Ok(id)
    }

    fn delete_by_name(&self, name: &str) -> HarnessResult<usize> {
        let deleted = self
            .conn
            .lock()
            .execute("DELETE FROM FOOD WHERE FOOD_NAME = ?1", params![name])?;
        debug!(name, deleted, "delete_by_name");
        Ok(deleted)
    }
}
