//! SQLite message store.
//!
//! Every room gets its own database, so no table carries a room key beyond the
//! denormalized `project_id` column kept for auditing. The pool is limited to
//! a single connection: the room actor is the only user of the store and
//! already serializes access.

use std::{path::PathBuf, str::FromStr, sync::Arc};

use async_trait::async_trait;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::{
    config::StoreRoot,
    domain::{
        ChatMessage, MessageId, MessageStore, MessageStoreProvider, NewChatMessage, ProjectId,
        ReadReceipt, StoreError, UserId,
    },
    infrastructure::dto::row::{MessageRow, ReadReceiptRow},
};

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        sender_name TEXT NOT NULL,
        content TEXT NOT NULL,
        reply_to_id INTEGER,
        reply_to_content TEXT,
        reply_to_sender TEXT,
        created_at INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_messages_created_at ON messages(created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS read_receipts (
        message_id INTEGER NOT NULL,
        user_id TEXT NOT NULL,
        user_name TEXT NOT NULL,
        read_at INTEGER NOT NULL,
        PRIMARY KEY (message_id, user_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS unread_counts (
        user_id TEXT PRIMARY KEY,
        count INTEGER NOT NULL DEFAULT 0
    )
    "#,
];

const UPSERT_READ_RECEIPT: &str = "INSERT INTO read_receipts (message_id, user_id, user_name, read_at) \
     VALUES (?, ?, ?, ?) \
     ON CONFLICT(message_id, user_id) DO UPDATE SET \
     user_name = excluded.user_name, read_at = excluded.read_at";

const MESSAGE_COLUMNS: &str = "id, project_id, user_id, sender_name, content, \
     reply_to_id, reply_to_content, reply_to_sender, created_at";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
            _ => StoreError::Query(err.to_string()),
        }
    }
}

/// SQLite-backed [`MessageStore`]
pub struct SqliteMessageStore {
    pool: SqlitePool,
}

impl SqliteMessageStore {
    /// Open (creating if missing) the database file at `path`.
    pub async fn open_file(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path.into())
            .create_if_missing(true);
        Self::connect_with(options).await
    }

    /// Open a private in-memory database.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::connect_with(options).await
    }

    async fn connect_with(options: SqliteConnectOptions) -> Result<Self, StoreError> {
        // Keep the one connection alive forever; an in-memory database
        // disappears with its last connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl MessageStore for SqliteMessageStore {
    async fn init_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        }
        Ok(())
    }

    async fn insert_message(&self, message: &NewChatMessage) -> Result<MessageId, StoreError> {
        let result = sqlx::query(
            "INSERT INTO messages (project_id, user_id, sender_name, content, \
             reply_to_id, reply_to_content, reply_to_sender, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(message.project_id.as_str())
        .bind(message.user_id.as_str())
        .bind(&message.sender_name)
        .bind(&message.content)
        .bind(message.reply_to_id.map(MessageId::value))
        .bind(&message.reply_to_content)
        .bind(&message.reply_to_sender)
        .bind(message.created_at.value())
        .execute(&self.pool)
        .await?;

        MessageId::new(result.last_insert_rowid()).map_err(|e| StoreError::Query(e.to_string()))
    }

    async fn find_message(&self, id: MessageId) -> Result<Option<ChatMessage>, StoreError> {
        let row: Option<MessageRow> = sqlx::query_as(&format!(
            "SELECT {} FROM messages WHERE id = ?",
            MESSAGE_COLUMNS
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ChatMessage::try_from).transpose()
    }

    async fn update_message_content(
        &self,
        id: MessageId,
        content: &str,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE messages SET content = ? WHERE id = ?")
            .bind(content)
            .bind(id.value())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_recent_messages(&self, limit: u32) -> Result<Vec<ChatMessage>, StoreError> {
        let rows: Vec<MessageRow> = sqlx::query_as(&format!(
            "SELECT {} FROM messages ORDER BY created_at DESC, id DESC LIMIT ?",
            MESSAGE_COLUMNS
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        // newest-first from the query, oldest-first for display
        rows.into_iter().rev().map(ChatMessage::try_from).collect()
    }

    async fn list_reads_for(&self, message_id: MessageId) -> Result<Vec<ReadReceipt>, StoreError> {
        let rows: Vec<ReadReceiptRow> = sqlx::query_as(
            "SELECT message_id, user_id, user_name, read_at FROM read_receipts \
             WHERE message_id = ? ORDER BY read_at, user_id",
        )
        .bind(message_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ReadReceipt::try_from).collect()
    }

    async fn upsert_read_receipt(&self, receipt: &ReadReceipt) -> Result<(), StoreError> {
        sqlx::query(UPSERT_READ_RECEIPT)
            .bind(receipt.message_id.value())
            .bind(receipt.user_id.as_str())
            .bind(&receipt.user_name)
            .bind(receipt.read_at.value())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn upsert_read_receipts(&self, receipts: &[ReadReceipt]) -> Result<(), StoreError> {
        // dropping the transaction on error rolls it back
        let mut tx = self.pool.begin().await?;
        for receipt in receipts {
            sqlx::query(UPSERT_READ_RECEIPT)
                .bind(receipt.message_id.value())
                .bind(receipt.user_id.as_str())
                .bind(&receipt.user_name)
                .bind(receipt.read_at.value())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_unread_count(&self, user_id: &UserId) -> Result<i64, StoreError> {
        let count: Option<(i64,)> =
            sqlx::query_as("SELECT count FROM unread_counts WHERE user_id = ?")
                .bind(user_id.as_str())
                .fetch_optional(&self.pool)
                .await?;

        Ok(count.map(|(count,)| count).unwrap_or(0))
    }

    async fn increment_unread_except(&self, sender: &UserId) -> Result<(), StoreError> {
        sqlx::query("UPDATE unread_counts SET count = count + 1 WHERE user_id != ?")
            .bind(sender.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn reset_unread(&self, user_id: &UserId) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO unread_counts (user_id, count) VALUES (?, 0) \
             ON CONFLICT(user_id) DO UPDATE SET count = 0",
        )
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Encode a project id as a file name fragment.
///
/// Only lowercase ASCII letters, digits, `-` and `_` pass through; every
/// other byte becomes `~xx`. Distinct ids map to distinct names even on
/// case-insensitive file systems.
fn file_stem(project_id: &ProjectId) -> String {
    let mut stem = String::with_capacity(project_id.as_str().len());
    for byte in project_id.as_str().bytes() {
        if byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'-' || byte == b'_' {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("~{:02x}", byte));
        }
    }
    stem
}

/// Opens one SQLite store per project under a [`StoreRoot`]
pub struct SqliteStoreProvider {
    root: StoreRoot,
}

impl SqliteStoreProvider {
    pub fn new(root: StoreRoot) -> Self {
        Self { root }
    }

    /// Database file used for `project_id` when stores live on disk
    pub fn database_path(dir: &std::path::Path, project_id: &ProjectId) -> PathBuf {
        dir.join(format!("room-{}.sqlite3", file_stem(project_id)))
    }
}

#[async_trait]
impl MessageStoreProvider for SqliteStoreProvider {
    async fn open(&self, project_id: &ProjectId) -> Result<Arc<dyn MessageStore>, StoreError> {
        let store = match &self.root {
            StoreRoot::Directory(dir) => {
                tokio::fs::create_dir_all(dir)
                    .await
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?;
                let path = Self::database_path(dir, project_id);
                tracing::debug!("Opening room database {}", path.display());
                SqliteMessageStore::open_file(path).await?
            }
            StoreRoot::InMemory => SqliteMessageStore::open_in_memory().await?,
        };

        Ok(Arc::new(store))
    }
}
