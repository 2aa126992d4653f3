use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::entities::Phrase;
use crate::error::PhrasebookError;
use crate::utils::normalize_phrase;

/// Uniqueness of the normalized text is a schema constraint, so at most one
/// row per phrase survives even when two first-time searches race from
/// different processes sharing the database file.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS phrases (
    id INTEGER PRIMARY KEY,
    phrase_text TEXT NOT NULL UNIQUE,
    search_count INTEGER NOT NULL DEFAULT 1,
    last_searched INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_phrases_last_searched ON phrases(last_searched);
CREATE INDEX IF NOT EXISTS idx_phrases_search_count ON phrases(search_count);
"#;

/// The persisted table of searched phrases. All text passed in is normalized
/// before it touches the database, for writes and reads alike.
pub struct PhraseStore {
    conn: Arc<Mutex<Connection>>,
}

impl PhraseStore {
    pub fn open(db_path: &Path) -> Result<Self, PhrasebookError> {
        let conn = Connection::open(db_path).map_err(PhrasebookError::StoreQueryError)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, PhrasebookError> {
        let conn = Connection::open_in_memory().map_err(PhrasebookError::StoreQueryError)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, PhrasebookError> {
        // Another process (the CLI next to the server, say) may hold the write
        // lock; wait it out instead of surfacing SQLITE_BUSY.
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(PhrasebookError::StoreQueryError)?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(PhrasebookError::StoreQueryError)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, PhrasebookError> {
        self.conn.lock().map_err(|_| PhrasebookError::StoreUnavailable)
    }

    /// Look up the phrase with the given (post-normalization) text, creating
    /// it with a search count of 1 if it does not exist yet. Returns the
    /// record and whether it was newly created. A create that loses a race to
    /// a concurrent create hits the UNIQUE constraint and retries as a lookup.
    pub fn find_or_create(&self, raw_text: &str) -> Result<(Phrase, bool), PhrasebookError> {
        let text = normalize_phrase(raw_text);
        let conn = self.lock()?;
        if let Some(phrase) = Self::select_by_text(&conn, &text)? {
            return Ok((phrase, false));
        }
        // Stored at microsecond precision, so hand back the truncated time.
        let micros = Utc::now().timestamp_micros();
        let last_searched = DateTime::from_timestamp_micros(micros).unwrap_or_default();
        let insert = conn.execute(
            "INSERT INTO phrases (phrase_text, search_count, last_searched) VALUES (?1, 1, ?2)",
            params![text, micros],
        );
        match insert {
            Ok(_) => {
                let phrase = Phrase {
                    id: conn.last_insert_rowid(),
                    text,
                    search_count: 1,
                    last_searched,
                };
                Ok((phrase, true))
            }
            Err(err) if is_unique_violation(&err) => {
                let phrase = Self::select_by_text(&conn, &text)?.ok_or(
                    PhrasebookError::StoreQueryError(rusqlite::Error::QueryReturnedNoRows),
                )?;
                Ok((phrase, false))
            }
            Err(err) => Err(PhrasebookError::StoreQueryError(err)),
        }
    }

    /// Bump the search count by exactly 1 and stamp the search time. The
    /// arithmetic happens inside the UPDATE statement, so concurrent
    /// increments of the same phrase never lose an update.
    pub fn increment(&self, phrase_id: i64) -> Result<Phrase, PhrasebookError> {
        let conn = self.lock()?;
        let updated = conn
            .execute(
                "UPDATE phrases SET search_count = search_count + 1, last_searched = ?1 WHERE id = ?2",
                params![Utc::now().timestamp_micros(), phrase_id],
            )
            .map_err(PhrasebookError::StoreQueryError)?;
        if updated == 0 {
            return Err(PhrasebookError::PhraseNotFound(phrase_id));
        }
        Self::select_by_id(&conn, phrase_id)?.ok_or(PhrasebookError::PhraseNotFound(phrase_id))
    }

    pub fn find_by_text(&self, raw_text: &str) -> Result<Option<Phrase>, PhrasebookError> {
        let text = normalize_phrase(raw_text);
        let conn = self.lock()?;
        Self::select_by_text(&conn, &text)
    }

    /// The most recently searched phrases, most recent first.
    pub fn list_recent(&self, limit: usize) -> Result<Vec<Phrase>, PhrasebookError> {
        let conn = self.lock()?;
        Self::select_list(
            &conn,
            "SELECT id, phrase_text, search_count, last_searched FROM phrases \
             ORDER BY last_searched DESC, id DESC LIMIT ?1",
            limit,
        )
    }

    /// The most searched-for phrases, highest count first. Equal counts list
    /// the older phrase first.
    pub fn list_popular(&self, limit: usize) -> Result<Vec<Phrase>, PhrasebookError> {
        let conn = self.lock()?;
        Self::select_list(
            &conn,
            "SELECT id, phrase_text, search_count, last_searched FROM phrases \
             ORDER BY search_count DESC, id ASC LIMIT ?1",
            limit,
        )
    }

    pub fn phrase_count(&self) -> Result<usize, PhrasebookError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM phrases", [], |row| row.get(0))
            .map_err(PhrasebookError::StoreQueryError)?;
        Ok(count as usize)
    }

    fn select_by_text(conn: &Connection, text: &str) -> Result<Option<Phrase>, PhrasebookError> {
        conn.query_row(
            "SELECT id, phrase_text, search_count, last_searched FROM phrases WHERE phrase_text = ?1",
            params![text],
            phrase_from_row,
        )
        .optional()
        .map_err(PhrasebookError::StoreQueryError)
    }

    fn select_by_id(conn: &Connection, phrase_id: i64) -> Result<Option<Phrase>, PhrasebookError> {
        conn.query_row(
            "SELECT id, phrase_text, search_count, last_searched FROM phrases WHERE id = ?1",
            params![phrase_id],
            phrase_from_row,
        )
        .optional()
        .map_err(PhrasebookError::StoreQueryError)
    }

    fn select_list(
        conn: &Connection,
        sql: &str,
        limit: usize,
    ) -> Result<Vec<Phrase>, PhrasebookError> {
        let mut stmt = conn.prepare(sql).map_err(PhrasebookError::StoreQueryError)?;
        let rows = stmt
            .query_map(params![limit as i64], phrase_from_row)
            .map_err(PhrasebookError::StoreQueryError)?;
        rows.collect::<Result<Vec<Phrase>, rusqlite::Error>>()
            .map_err(PhrasebookError::StoreQueryError)
    }
}

fn phrase_from_row(row: &rusqlite::Row) -> rusqlite::Result<Phrase> {
    let micros: i64 = row.get(3)?;
    Ok(Phrase {
        id: row.get(0)?,
        text: row.get(1)?,
        search_count: row.get(2)?,
        last_searched: DateTime::from_timestamp_micros(micros).unwrap_or_default(),
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
