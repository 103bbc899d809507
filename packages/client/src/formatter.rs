//! Message formatting utilities for client display.

use chatroom_server::{
    domain::{MessageId, UserId},
    infrastructure::dto::{http::HistoryEntryDto, websocket::MessageDto},
};
use chatroom_shared::time::timestamp_to_rfc3339;

const RULE: &str = "------------------------------------------------------------";

/// Message formatter for client display
pub struct MessageFormatter;

fn join_ids(ids: &[MessageId]) -> String {
    ids.iter()
        .map(|id| format!("#{}", id))
        .collect::<Vec<_>>()
        .join(", ")
}

impl MessageFormatter {
    /// Format a persisted chat message
    ///
    /// # Arguments
    ///
    /// * `message` - The broadcast message
    /// * `me` - The current user, whose own messages are marked
    pub fn format_chat_message(message: &MessageDto, me: &UserId) -> String {
        let mut output = format!("\n\n{}\n", RULE);
        if let (Some(reply_to), Some(sender)) = (message.reply_to_id, &message.reply_to_sender) {
            let quoted = message.reply_to_content.as_deref().unwrap_or("");
            output.push_str(&format!("> #{} @{}: {}\n", reply_to, sender, quoted));
        }
        let me_suffix = if &message.user_id == me { " (me)" } else { "" };
        output.push_str(&format!(
            "#{} @{}{}: {}\nsent at {}\n{}\n",
            message.id,
            message.sender_name,
            me_suffix,
            message.content,
            timestamp_to_rfc3339(message.created_at),
            RULE
        ));
        output
    }

    pub fn format_message_updated(message_id: MessageId, content: &str) -> String {
        format!("\n* #{} edited: {}\n", message_id, content)
    }

    /// Format a typing indicator. Stopping to type prints nothing.
    pub fn format_typing(sender_name: &str, is_typing: bool) -> Option<String> {
        is_typing.then(|| format!("\n… {} is typing\n", sender_name))
    }

    pub fn format_read_receipt(user_name: &str, message_ids: &[MessageId], read_at: i64) -> String {
        format!(
            "\n✓ {} read {} at {}\n",
            user_name,
            join_ids(message_ids),
            timestamp_to_rfc3339(read_at)
        )
    }

    /// Format the history window returned by the room
    pub fn format_history(history: &[HistoryEntryDto], me: &UserId) -> String {
        if history.is_empty() {
            return "\n(No messages yet)\n".to_string();
        }

        let mut output = String::new();
        for entry in history {
            output.push_str(&Self::format_chat_message(&entry.message, me));
            if !entry.read_by.is_empty() {
                let readers: Vec<&str> = entry
                    .read_by
                    .iter()
                    .map(|read| read.user_name.as_str())
                    .collect();
                output.push_str(&format!("seen by {}\n", readers.join(", ")));
            }
        }
        output
    }

    pub fn format_unread(count: i64) -> String {
        format!("\n{} unread message(s)\n", count)
    }

    /// Format a binary message notification
    pub fn format_binary_message(byte_count: usize) -> String {
        format!("\n← Received {} bytes of binary data\n", byte_count)
    }

    /// Format a raw text message (when parsing fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }
}
