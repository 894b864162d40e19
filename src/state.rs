use crate::models::{LibraryItem, ReadRecord};
use eyre::Result;
use rusqlite::{Connection, params};

// Re-use the get_app_data_prefix from config.rs
use crate::config::get_app_data_prefix;

/// Sqlite-backed persistence: last read position per book, reading
/// history, and named bookmarks.
pub struct State {
    conn: Connection,
}

impl State {
    pub fn new() -> Result<Self> {
        let prefix = get_app_data_prefix()?;
        let filepath = prefix.join("states.db");

        // Ensure the parent directory exists
        if let Some(parent) = filepath.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&filepath)?;

        // Always ensure the schema exists. Tables are created only if
        // missing, so this is safe to run on an existing database.
        Self::init_db(&conn)?;

        Ok(Self { conn })
    }

    /// In-memory database, for hosts that do not want persistence.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_db(&conn)?;
        Ok(Self { conn })
    }

    fn init_db(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS read_records (
                book_id TEXT PRIMARY KEY,
                chapter INTEGER,
                page INTEGER
            );

            CREATE TABLE IF NOT EXISTS library (
                last_read DATETIME DEFAULT (datetime('now')),
                book_id TEXT PRIMARY KEY,
                title TEXT,
                progress REAL,
                FOREIGN KEY (book_id) REFERENCES read_records(book_id)
                ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS bookmarks (
                id TEXT PRIMARY KEY,
                book_id TEXT,
                name TEXT,
                chapter INTEGER,
                page INTEGER,
                FOREIGN KEY (book_id) REFERENCES read_records(book_id)
                ON DELETE CASCADE
            );
            ",
        )?;
        Ok(())
    }

    /// Last stored position, or the start of the book when none exists.
    pub fn load_record(&self, book_id: &str) -> Result<ReadRecord> {
        let mut stmt = self
            .conn
            .prepare("SELECT chapter, page FROM read_records WHERE book_id=?")?;
        let result = stmt.query_row(params![book_id], |row| {
            Ok(ReadRecord {
                chapter: row.get::<_, i64>(0)? as usize,
                page: row.get::<_, i64>(1)? as usize,
            })
        });

        match result {
            Ok(record) => Ok(record),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(ReadRecord::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_record(&self, book_id: &str, record: &ReadRecord) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO read_records (book_id, chapter, page) VALUES (?, ?, ?)",
            params![book_id, record.chapter as i64, record.page as i64],
        )?;
        Ok(())
    }

    pub fn get_from_history(&self) -> Result<Vec<LibraryItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT last_read, book_id, title, progress FROM library ORDER BY last_read DESC",
        )?;

        let items_iter = stmt.query_map([], |row| {
            Ok(LibraryItem {
                last_read: row.get(0)?,
                book_id: row.get(1)?,
                title: row.get(2)?,
                progress: row.get(3)?,
            })
        })?;

        let mut items = Vec::new();
        for item_result in items_iter {
            items.push(item_result?);
        }

        Ok(items)
    }

    pub fn delete_from_library(&self, book_id: &str) -> Result<()> {
        self.conn.execute("PRAGMA foreign_keys = ON", [])?;
        self.conn
            .execute("DELETE FROM read_records WHERE book_id=?", params![book_id])?;
        Ok(())
    }

    pub fn get_last_read(&self) -> Result<Option<String>> {
        let library = self.get_from_history()?;
        Ok(library.into_iter().next().map(|item| item.book_id))
    }

    pub fn update_library(
        &self,
        book_id: &str,
        title: Option<&str>,
        progress: Option<f32>,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO library (book_id, title, progress) VALUES (?, ?, ?)",
            params![book_id, title, progress],
        )?;
        Ok(())
    }

    pub fn insert_bookmark(&self, book_id: &str, name: &str, record: &ReadRecord) -> Result<()> {
        use sha1::{Digest, Sha1};
        let mut hasher = Sha1::new();
        hasher.update(format!("{}{}", book_id, name).as_bytes());
        let hash = hasher.finalize();
        let id = &hex::encode(hash)[..10];

        self.conn.execute(
            "INSERT INTO bookmarks (id, book_id, name, chapter, page) VALUES (?, ?, ?, ?, ?)",
            params![
                id,
                book_id,
                name,
                record.chapter as i64,
                record.page as i64,
            ],
        )?;
        Ok(())
    }

    pub fn delete_bookmark(&self, book_id: &str, name: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM bookmarks WHERE book_id=? AND name=?",
            params![book_id, name],
        )?;
        Ok(())
    }

    pub fn get_bookmarks(&self, book_id: &str) -> Result<Vec<(String, ReadRecord)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, chapter, page FROM bookmarks WHERE book_id=?")?;
        let bookmarks_iter = stmt.query_map(params![book_id], |row| {
            Ok((
                row.get(0)?,
                ReadRecord {
                    chapter: row.get::<_, i64>(1)? as usize,
                    page: row.get::<_, i64>(2)? as usize,
                },
            ))
        })?;

        let mut bookmarks = Vec::new();
        for bookmark_result in bookmarks_iter {
            bookmarks.push(bookmark_result?);
        }

        Ok(bookmarks)
    }
}
