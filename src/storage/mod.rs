//! SQLite persistence for Aura
//!
//! One database file holds the chat sessions, their messages and the
//! knowledge index. A connection is opened per operation, so a store that
//! disappears between calls surfaces as an error on the next call rather
//! than a stale handle.

use crate::config::StorageConfig;
use crate::error::{AuraError, Result};
use crate::prompts;
use crate::providers::{Message, ToolCall};
use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod knowledge;
pub mod types;
pub use types::{
    ChunkHit, ChunkRecord, DocumentStats, DocumentWrite, ImageStats, NewChunk, NewImage,
    StoredSession,
};

/// How long a connection waits on another writer before giving up
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    session_id TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    role TEXT NOT NULL,
    content TEXT,
    tool_calls TEXT,
    metadata TEXT
);
CREATE INDEX IF NOT EXISTS idx_messages_user_session_ts
    ON messages (user_id, session_id, timestamp);

CREATE TABLE IF NOT EXISTS sessions (
    session_id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    last_message_at INTEGER NOT NULL,
    title TEXT NOT NULL,
    metadata TEXT
);
CREATE INDEX IF NOT EXISTS idx_sessions_user_recent
    ON sessions (user_id, last_message_at DESC);

CREATE TABLE IF NOT EXISTS knowledge_chunks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id TEXT NOT NULL,
    chunk_index INTEGER NOT NULL,
    source TEXT NOT NULL,
    text_content TEXT NOT NULL,
    text_embedding BLOB NOT NULL,
    UNIQUE (document_id, chunk_index)
);

CREATE TABLE IF NOT EXISTS knowledge_images (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    image_path TEXT NOT NULL UNIQUE,
    image_embedding BLOB NOT NULL
);

CREATE TABLE IF NOT EXISTS chunk_image_links (
    chunk_id INTEGER NOT NULL REFERENCES knowledge_chunks(id) ON DELETE CASCADE,
    image_id INTEGER NOT NULL REFERENCES knowledge_images(id) ON DELETE CASCADE,
    PRIMARY KEY (chunk_id, image_id)
);
";

/// Tables created by [`SqliteStorage::init`]
pub const TABLES: [&str; 5] = [
    "messages",
    "sessions",
    "knowledge_chunks",
    "knowledge_images",
    "chunk_image_links",
];

/// Storage backend for sessions, messages and the knowledge index
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    db_path: PathBuf,
}

fn storage_err(e: anyhow::Error) -> anyhow::Error {
    AuraError::Storage(format!("{:#}", e)).into()
}

impl SqliteStorage {
    /// Open the database named by the storage configuration
    pub fn open(config: &StorageConfig) -> Result<Self> {
        Self::new_with_path(config.resolve_db_path()?)
    }

    /// Create a storage instance that uses the specified database path,
    /// creating the parent directory and the schema when missing
    ///
    /// # Examples
    ///
    /// ```
    /// use aura::storage::SqliteStorage;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let storage = SqliteStorage::new_with_path(dir.path().join("aura.db")).unwrap();
    /// assert!(storage.path().ends_with("aura.db"));
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create parent directory for database")
                    .map_err(storage_err)?;
            }
        }

        let storage = Self { db_path };
        storage.init()?;
        Ok(storage)
    }

    /// Attach to an existing database file without creating anything
    ///
    /// Used by diagnostics, which must report a missing schema rather than
    /// create it.
    pub fn attach<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();
        if !db_path.is_file() {
            return Err(AuraError::Storage(format!(
                "Database not found at {}",
                db_path.display()
            ))
            .into());
        }
        Ok(Self { db_path })
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub(crate) fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(storage_err)?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .context("Failed to set busy timeout")
            .map_err(storage_err)?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .context("Failed to enable foreign keys")
            .map_err(storage_err)?;
        Ok(conn)
    }

    /// Start a write transaction that takes the database write lock up front
    ///
    /// A deferred transaction that reads before writing can fail with
    /// `SQLITE_BUSY` on the upgrade; an immediate one waits in the busy
    /// handler instead.
    pub(crate) fn write_transaction(conn: &mut Connection) -> Result<Transaction<'_>> {
        conn.transaction_with_behavior(TransactionBehavior::Immediate)
            .context("Failed to start transaction")
            .map_err(storage_err)
    }

    /// Create all tables and indexes; safe to run repeatedly
    pub fn init(&self) -> Result<()> {
        let conn = self.connect()?;
        // WAL lets readers proceed while another session's turn is written
        let mode: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .context("Failed to set journal mode")
            .map_err(storage_err)?;
        tracing::debug!(journal_mode = %mode, db = %self.db_path.display(), "Initialised database");
        conn.execute_batch(SCHEMA)
            .context("Failed to create tables")
            .map_err(storage_err)?;
        Ok(())
    }

    /// Names of the tables present in the database, sorted
    pub fn table_names(&self) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
                 ORDER BY name",
            )
            .context("Failed to prepare statement")
            .map_err(storage_err)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .context("Failed to list tables")
            .map_err(storage_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to read table names")
            .map_err(storage_err)?;
        Ok(names)
    }

    /// Tables from [`TABLES`] missing from the database
    pub fn missing_tables(&self) -> Result<Vec<&'static str>> {
        let present = self.table_names()?;
        Ok(TABLES
            .iter()
            .copied()
            .filter(|t| !present.iter().any(|p| p == t))
            .collect())
    }

    /// Append messages to a session in one transaction
    ///
    /// The first message is stamped `max(now_ms, last_persisted + 1)` and
    /// each following message one millisecond later, so timestamps stay
    /// strictly increasing even when the clock moves backwards. The session
    /// row is upserted and its `last_message_at` only ever moves forward.
    ///
    /// Returns the assigned timestamps in message order.
    pub fn append_messages(
        &self,
        user_id: &str,
        session_id: &str,
        messages: &[Message],
        now_ms: i64,
    ) -> Result<Vec<i64>> {
        if messages.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.connect()?;
        let tx = Self::write_transaction(&mut conn)?;

        let last: Option<i64> = tx
            .query_row(
                "SELECT MAX(timestamp) FROM messages WHERE user_id = ?1 AND session_id = ?2",
                params![user_id, session_id],
                |row| row.get(0),
            )
            .context("Failed to read last timestamp")
            .map_err(storage_err)?;

        let mut ts = match last {
            Some(last) => now_ms.max(last + 1),
            None => now_ms,
        };

        let mut stamps = Vec::with_capacity(messages.len());
        for message in messages {
            let tool_calls = match &message.tool_calls {
                Some(calls) if !calls.is_empty() => Some(
                    serde_json::to_string(calls)
                        .context("Failed to serialize tool calls")
                        .map_err(storage_err)?,
                ),
                _ => None,
            };
            let metadata = encode_metadata(message)?;

            tx.execute(
                "INSERT INTO messages
                    (user_id, session_id, timestamp, role, content, tool_calls, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    user_id,
                    session_id,
                    ts,
                    message.role,
                    message.content,
                    tool_calls,
                    metadata
                ],
            )
            .context("Failed to insert message")
            .map_err(storage_err)?;

            stamps.push(ts);
            ts += 1;
        }

        let last_stamp = ts - 1;
        tx.execute(
            "INSERT INTO sessions (session_id, user_id, created_at, last_message_at, title)
             VALUES (?1, ?2, ?3, ?3, ?4)
             ON CONFLICT(session_id) DO UPDATE SET
                last_message_at = MAX(sessions.last_message_at, excluded.last_message_at)",
            params![session_id, user_id, last_stamp, prompts::default_title()],
        )
        .context("Failed to upsert session")
        .map_err(storage_err)?;

        tx.commit()
            .context("Failed to commit transaction")
            .map_err(storage_err)?;

        Ok(stamps)
    }

    /// Load the most recent `limit` messages of a session, oldest first
    pub fn load_messages(&self, user_id: &str, session_id: &str, limit: usize) -> Result<Vec<Message>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT role, content, tool_calls, metadata, timestamp
                 FROM messages
                 WHERE user_id = ?1 AND session_id = ?2
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?3",
            )
            .context("Failed to prepare statement")
            .map_err(storage_err)?;

        let rows = stmt
            .query_map(params![user_id, session_id, limit as i64], |row| {
                Ok(RawMessage {
                    role: row.get(0)?,
                    content: row.get(1)?,
                    tool_calls: row.get(2)?,
                    metadata: row.get(3)?,
                    timestamp: row.get(4)?,
                })
            })
            .context("Failed to query messages")
            .map_err(storage_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to read messages")
            .map_err(storage_err)?;

        let mut messages: Vec<Message> = rows.into_iter().map(RawMessage::into_message).collect();
        messages.reverse();
        Ok(messages)
    }

    /// Number of messages stored for a session
    pub fn message_count(&self, user_id: &str, session_id: &str) -> Result<usize> {
        let conn = self.connect()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM messages WHERE user_id = ?1 AND session_id = ?2",
                params![user_id, session_id],
                |row| row.get(0),
            )
            .context("Failed to count messages")
            .map_err(storage_err)?;
        Ok(count as usize)
    }

    /// Insert a session record; an existing id is left untouched
    pub fn create_session(
        &self,
        user_id: &str,
        session_id: &str,
        title: &str,
        created_at: i64,
    ) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO sessions (session_id, user_id, created_at, last_message_at, title)
             VALUES (?1, ?2, ?3, ?3, ?4)
             ON CONFLICT(session_id) DO NOTHING",
            params![session_id, user_id, created_at, title],
        )
        .context("Failed to insert session")
        .map_err(storage_err)?;
        Ok(())
    }

    /// Look up one session owned by `user_id`
    pub fn get_session(&self, user_id: &str, session_id: &str) -> Result<Option<StoredSession>> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT s.session_id, s.user_id, s.title, s.created_at, s.last_message_at,
                    (SELECT COUNT(*) FROM messages m
                     WHERE m.user_id = s.user_id AND m.session_id = s.session_id)
             FROM sessions s
             WHERE s.user_id = ?1 AND s.session_id = ?2",
            params![user_id, session_id],
            session_from_row,
        )
        .optional()
        .context("Failed to query session")
        .map_err(storage_err)
    }

    /// Sessions of a user, most recent activity first
    pub fn list_sessions(&self, user_id: &str, limit: usize) -> Result<Vec<StoredSession>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT s.session_id, s.user_id, s.title, s.created_at, s.last_message_at,
                        (SELECT COUNT(*) FROM messages m
                         WHERE m.user_id = s.user_id AND m.session_id = s.session_id)
                 FROM sessions s
                 WHERE s.user_id = ?1
                 ORDER BY s.last_message_at DESC
                 LIMIT ?2",
            )
            .context("Failed to prepare statement")
            .map_err(storage_err)?;

        let sessions = stmt
            .query_map(params![user_id, limit as i64], session_from_row)
            .context("Failed to query sessions")
            .map_err(storage_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to read sessions")
            .map_err(storage_err)?;
        Ok(sessions)
    }

    /// Delete a session and all of its messages
    ///
    /// Returns the number of messages removed. Deleting an unknown session
    /// is not an error.
    pub fn delete_session(&self, user_id: &str, session_id: &str) -> Result<usize> {
        let mut conn = self.connect()?;
        let tx = Self::write_transaction(&mut conn)?;

        let removed = tx
            .execute(
                "DELETE FROM messages WHERE user_id = ?1 AND session_id = ?2",
                params![user_id, session_id],
            )
            .context("Failed to delete messages")
            .map_err(storage_err)?;
        tx.execute(
            "DELETE FROM sessions WHERE user_id = ?1 AND session_id = ?2",
            params![user_id, session_id],
        )
        .context("Failed to delete session")
        .map_err(storage_err)?;

        tx.commit()
            .context("Failed to commit transaction")
            .map_err(storage_err)?;
        Ok(removed)
    }
}

fn session_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredSession> {
    Ok(StoredSession {
        session_id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        created_at: row.get(3)?,
        last_message_at: row.get(4)?,
        message_count: row.get::<_, i64>(5)? as usize,
    })
}

/// Metadata column: the message metadata object plus `tool_call_id`
fn encode_metadata(message: &Message) -> Result<Option<String>> {
    let mut map = match &message.metadata {
        Some(serde_json::Value::Object(map)) => map.clone(),
        Some(other) => {
            let mut map = serde_json::Map::new();
            map.insert("value".to_string(), other.clone());
            map
        }
        None => serde_json::Map::new(),
    };
    if let Some(id) = &message.tool_call_id {
        map.insert(
            "tool_call_id".to_string(),
            serde_json::Value::String(id.clone()),
        );
    }
    if map.is_empty() {
        return Ok(None);
    }
    serde_json::to_string(&serde_json::Value::Object(map))
        .map(Some)
        .context("Failed to serialize message metadata")
        .map_err(storage_err)
}

struct RawMessage {
    role: String,
    content: Option<String>,
    tool_calls: Option<String>,
    metadata: Option<String>,
    timestamp: i64,
}

impl RawMessage {
    fn into_message(self) -> Message {
        let tool_calls = self.tool_calls.and_then(|json| {
            match serde_json::from_str::<Vec<ToolCall>>(&json) {
                Ok(calls) => Some(calls),
                Err(e) => {
                    tracing::warn!(
                        "Discarding corrupt tool_calls payload at timestamp {}: {}",
                        self.timestamp,
                        e
                    );
                    None
                }
            }
        });

        let mut tool_call_id = None;
        let metadata = self.metadata.and_then(|json| {
            match serde_json::from_str::<serde_json::Value>(&json) {
                Ok(serde_json::Value::Object(mut map)) => {
                    tool_call_id = map
                        .remove("tool_call_id")
                        .and_then(|v| v.as_str().map(str::to_string));
                    (!map.is_empty()).then_some(serde_json::Value::Object(map))
                }
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!("Discarding corrupt message metadata: {}", e);
                    None
                }
            }
        });

        Message {
            role: self.role,
            content: self.content,
            tool_calls,
            tool_call_id,
            timestamp: Some(self.timestamp),
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_test_storage() -> (SqliteStorage, tempfile::TempDir) {
        let dir = tempdir().expect("failed to create tempdir");
        let storage =
            SqliteStorage::new_with_path(dir.path().join("aura.db")).expect("failed to create storage");
        (storage, dir)
    }

    #[test]
    fn test_init_creates_all_tables() {
        let (storage, _dir) = create_test_storage();
        let tables = storage.table_names().unwrap();
        for table in TABLES {
            assert!(tables.iter().any(|t| t == table), "missing {}", table);
        }
        assert!(storage.missing_tables().unwrap().is_empty());
    }

    #[test]
    fn test_init_is_idempotent() {
        let (storage, _dir) = create_test_storage();
        storage.init().unwrap();
        storage.init().unwrap();
        assert_eq!(storage.missing_tables().unwrap().len(), 0);
    }

    #[test]
    fn test_attach_creates_nothing() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("missing.db");
        assert!(SqliteStorage::attach(&db_path).is_err());
        assert!(!db_path.exists());

        std::fs::write(&db_path, b"").unwrap();
        let storage = SqliteStorage::attach(&db_path).unwrap();
        assert_eq!(storage.missing_tables().unwrap(), TABLES.to_vec());
    }

    #[test]
    fn test_new_with_path_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("aura.db");
        let storage = SqliteStorage::new_with_path(&db_path).unwrap();
        assert_eq!(storage.path(), db_path.as_path());
        assert!(db_path.exists());
    }

    #[test]
    fn test_append_assigns_consecutive_timestamps() {
        let (storage, _dir) = create_test_storage();
        let stamps = storage
            .append_messages(
                "u1",
                "s1",
                &[Message::user("a"), Message::assistant("b")],
                1_000,
            )
            .unwrap();
        assert_eq!(stamps, vec![1_000, 1_001]);
    }

    #[test]
    fn test_append_survives_clock_going_backwards() {
        let (storage, _dir) = create_test_storage();
        storage
            .append_messages("u1", "s1", &[Message::user("a")], 5_000)
            .unwrap();
        let stamps = storage
            .append_messages("u1", "s1", &[Message::user("b")], 10)
            .unwrap();
        assert_eq!(stamps, vec![5_001]);

        let session = storage.get_session("u1", "s1").unwrap().unwrap();
        assert_eq!(session.last_message_at, 5_001);
        assert!(session.title.starts_with("Chat - "));
    }

    #[test]
    fn test_parallel_writers_on_different_sessions() {
        let (storage, _dir) = create_test_storage();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let storage = storage.clone();
                std::thread::spawn(move || {
                    let session = format!("s{}", i);
                    for n in 0..50 {
                        storage
                            .append_messages(
                                "u1",
                                &session,
                                &[Message::user(format!("q{}", n)), Message::assistant("a")],
                                1_000,
                            )
                            .expect("append should wait for the write lock");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for i in 0..8 {
            assert_eq!(storage.message_count("u1", &format!("s{}", i)).unwrap(), 100);
        }
        assert_eq!(storage.list_sessions("u1", 20).unwrap().len(), 8);
    }

    #[test]
    fn test_load_messages_returns_latest_in_order() {
        let (storage, _dir) = create_test_storage();
        let batch: Vec<Message> = (0..5).map(|i| Message::user(format!("m{}", i))).collect();
        storage.append_messages("u1", "s1", &batch, 100).unwrap();

        let loaded = storage.load_messages("u1", "s1", 3).unwrap();
        let texts: Vec<&str> = loaded.iter().map(|m| m.text()).collect();
        assert_eq!(texts, vec!["m2", "m3", "m4"]);
        assert_eq!(loaded[0].timestamp, Some(102));
    }

    #[test]
    fn test_messages_are_scoped_by_user() {
        let (storage, _dir) = create_test_storage();
        storage
            .append_messages("u1", "s1", &[Message::user("mine")], 100)
            .unwrap();
        assert!(storage.load_messages("u2", "s1", 10).unwrap().is_empty());
        assert!(storage.list_sessions("u2", 10).unwrap().is_empty());
    }

    #[test]
    fn test_tool_call_id_and_metadata_round_trip() {
        let (storage, _dir) = create_test_storage();
        let messages = vec![
            Message::tool_result("call_1", "Status: ONLINE"),
            Message::assistant("unavailable").with_metadata(serde_json::json!({"error": true})),
        ];
        storage.append_messages("u1", "s1", &messages, 1).unwrap();

        let loaded = storage.load_messages("u1", "s1", 10).unwrap();
        assert_eq!(loaded[0].tool_call_id.as_deref(), Some("call_1"));
        assert!(loaded[0].metadata.is_none());
        assert!(loaded[1].is_error());
        assert!(loaded[1].tool_call_id.is_none());
    }

    #[test]
    fn test_corrupt_tool_calls_are_dropped() {
        let (storage, _dir) = create_test_storage();
        storage
            .append_messages("u1", "s1", &[Message::assistant("checking")], 1)
            .unwrap();
        let conn = storage.connect().unwrap();
        conn.execute("UPDATE messages SET tool_calls = '{not json'", [])
            .unwrap();

        let loaded = storage.load_messages("u1", "s1", 10).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].tool_calls.is_none());
        assert_eq!(loaded[0].text(), "checking");
    }

    #[test]
    fn test_list_sessions_orders_by_recency_and_counts_messages() {
        let (storage, _dir) = create_test_storage();
        storage.create_session("u1", "old", "Old", 10).unwrap();
        storage.create_session("u1", "new", "New", 20).unwrap();
        storage
            .append_messages("u1", "old", &[Message::user("bump")], 30)
            .unwrap();

        let sessions = storage.list_sessions("u1", 10).unwrap();
        assert_eq!(sessions[0].session_id, "old");
        assert_eq!(sessions[0].message_count, 1);
        assert_eq!(sessions[0].title, "Old");
        assert_eq!(sessions[1].session_id, "new");
        assert_eq!(sessions[1].message_count, 0);

        assert_eq!(storage.list_sessions("u1", 1).unwrap().len(), 1);
    }

    #[test]
    fn test_create_session_keeps_existing_record() {
        let (storage, _dir) = create_test_storage();
        storage.create_session("u1", "s1", "First", 10).unwrap();
        storage.create_session("u1", "s1", "Second", 20).unwrap();
        let session = storage.get_session("u1", "s1").unwrap().unwrap();
        assert_eq!(session.title, "First");
        assert_eq!(session.created_at, 10);
    }

    #[test]
    fn test_delete_session_cascades_to_messages() {
        let (storage, _dir) = create_test_storage();
        storage
            .append_messages("u1", "s1", &[Message::user("a"), Message::user("b")], 1)
            .unwrap();
        storage
            .append_messages("u1", "s2", &[Message::user("keep")], 1)
            .unwrap();

        assert_eq!(storage.delete_session("u1", "s1").unwrap(), 2);
        assert_eq!(storage.message_count("u1", "s1").unwrap(), 0);
        assert!(storage.get_session("u1", "s1").unwrap().is_none());
        assert_eq!(storage.message_count("u1", "s2").unwrap(), 1);

        // Idempotent
        assert_eq!(storage.delete_session("u1", "s1").unwrap(), 0);
    }

    #[test]
    fn test_unreachable_database_reports_storage_error() {
        let (storage, dir) = create_test_storage();
        drop(dir);
        let err = storage.load_messages("u1", "s1", 10).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AuraError>(),
            Some(AuraError::Storage(_))
        ));
    }
}
