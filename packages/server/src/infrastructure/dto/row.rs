//! Rows as read from a room's SQLite database.

use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct MessageRow {
    pub id: i64,
    pub project_id: String,
    pub user_id: String,
    pub sender_name: String,
    pub content: String,
    pub reply_to_id: Option<i64>,
    pub reply_to_content: Option<String>,
    pub reply_to_sender: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct ReadReceiptRow {
    pub message_id: i64,
    pub user_id: String,
    pub user_name: String,
    pub read_at: i64,
}
