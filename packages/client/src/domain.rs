//! Domain logic for client-side operations.
//!
//! This module contains pure functions that implement business logic
//! without side effects, making them easy to test.

use chatroom_server::domain::{MessageId, ProjectId, UserId};

use crate::error::ClientError;

/// Who the client is and which room it talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Server base URL, e.g. `ws://127.0.0.1:8080`
    pub url: String,
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub name: String,
}

impl ClientOptions {
    /// WebSocket endpoint of the project's chat room
    pub fn chat_url(&self) -> Result<String, ClientError> {
        let base = self.base()?;
        Ok(format!("{}/projects/{}/chat", base, self.project_id))
    }

    /// Plain HTTP base for the room's read endpoints
    pub fn http_base(&self) -> Result<String, ClientError> {
        let base = self.base()?;
        let http = if let Some(rest) = base.strip_prefix("wss://") {
            format!("https://{}", rest)
        } else if let Some(rest) = base.strip_prefix("ws://") {
            format!("http://{}", rest)
        } else {
            return Err(ClientError::InvalidUrl(self.url.clone()));
        };
        Ok(format!("{}/projects/{}/chat", http, self.project_id))
    }

    fn base(&self) -> Result<&str, ClientError> {
        let base = self.url.trim_end_matches('/');
        if base.starts_with("ws://") || base.starts_with("wss://") {
            Ok(base)
        } else {
            Err(ClientError::InvalidUrl(self.url.clone()))
        }
    }
}

/// A line typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    Say(String),
    Reply { to: MessageId, text: String },
    Edit { id: MessageId, text: String },
    Read(Vec<MessageId>),
    History,
    Unread,
    Help,
}

pub const HELP: &str = "\
Commands:
  <text>                 send a message
  /reply <id> <text>     reply to a message
  /edit <id> <text>      edit one of your messages
  /read <id> [<id> ...]  mark messages as read
  /history               show the latest messages
  /unread                show your unread count
  /help                  show this help
";

fn parse_id(raw: &str) -> Result<MessageId, String> {
    raw.parse::<MessageId>()
        .map_err(|_| format!("'{}' is not a message id", raw))
}

fn split_id_and_text(rest: &str, usage: &str) -> Result<(MessageId, String), String> {
    let rest = rest.trim();
    let (id, text) = rest.split_once(' ').ok_or_else(|| usage.to_string())?;
    let text = text.trim();
    if text.is_empty() {
        return Err(usage.to_string());
    }
    Ok((parse_id(id)?, text.to_string()))
}

/// Parse a prompt line. Lines not starting with `/` are plain messages.
pub fn parse_input(line: &str) -> Result<InputCommand, String> {
    let line = line.trim();
    let Some(command) = line.strip_prefix('/') else {
        return Ok(InputCommand::Say(line.to_string()));
    };

    let (name, rest) = command.split_once(' ').unwrap_or((command, ""));
    match name {
        "reply" => {
            let (to, text) = split_id_and_text(rest, "usage: /reply <id> <text>")?;
            Ok(InputCommand::Reply { to, text })
        }
        "edit" => {
            let (id, text) = split_id_and_text(rest, "usage: /edit <id> <text>")?;
            Ok(InputCommand::Edit { id, text })
        }
        "read" => {
            let ids = rest
                .split([' ', ','])
                .filter(|raw| !raw.is_empty())
                .map(parse_id)
                .collect::<Result<Vec<_>, _>>()?;
            if ids.is_empty() {
                return Err("usage: /read <id> [<id> ...]".to_string());
            }
            Ok(InputCommand::Read(ids))
        }
        "history" => Ok(InputCommand::History),
        "unread" => Ok(InputCommand::Unread),
        "help" => Ok(InputCommand::Help),
        other => Err(format!("unknown command '/{}' (try /help)", other)),
    }
}

/// Check if the client should exit immediately based on the error type.
///
/// # Returns
///
/// `true` if retrying cannot help (bad URL, or the server refused the
/// handshake), `false` otherwise
pub fn should_exit_immediately(error: &ClientError) -> bool {
    match error {
        ClientError::InvalidUrl(_) => true,
        ClientError::Rejected(status) => (400..500).contains(status),
        ClientError::ConnectionError(_) => false,
    }
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    if should_exit_immediately(error) {
        return false;
    }

    current_attempt < max_attempts
}
