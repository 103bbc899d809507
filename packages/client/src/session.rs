//! WebSocket client session management.

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use chatroom_server::{
    domain::{DEFAULT_HISTORY_LIMIT, MessageId, UserId},
    infrastructure::dto::{
        http::{HistoryEntryDto, UnreadCountDto},
        websocket::{ClientFrame, ServerFrame},
    },
};
use futures_util::{SinkExt, StreamExt};
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, client::IntoClientRequest, http::HeaderValue, protocol::Message},
};

use crate::{
    domain::{ClientOptions, HELP, InputCommand, parse_input},
    error::ClientError,
    formatter::MessageFormatter,
    ui::show,
};

/// Sender and content of the latest messages seen in this session, for
/// reply snapshots. Keeps the same window as the room's history.
#[derive(Debug, Default)]
struct SeenMessages {
    entries: HashMap<MessageId, (String, String)>,
    order: VecDeque<MessageId>,
}

impl SeenMessages {
    const CAPACITY: usize = DEFAULT_HISTORY_LIMIT as usize;

    fn remember(&mut self, id: MessageId, sender: String, content: String) {
        if self.entries.insert(id, (sender, content)).is_some() {
            return;
        }
        self.order.push_back(id);
        while self.order.len() > Self::CAPACITY {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    fn update_content(&mut self, id: MessageId, content: String) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.1 = content;
        }
    }

    fn get(&self, id: MessageId) -> Option<&(String, String)> {
        self.entries.get(&id)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

type SharedSeen = Arc<Mutex<SeenMessages>>;

fn to_connection_error(error: tungstenite::Error) -> ClientError {
    match error {
        tungstenite::Error::Http(response) => ClientError::Rejected(response.status().as_u16()),
        other => ClientError::ConnectionError(other.to_string()),
    }
}

fn header_value(value: &str) -> Result<HeaderValue, ClientError> {
    HeaderValue::from_str(value).map_err(|e| ClientError::ConnectionError(e.to_string()))
}

/// Read-only requests against the room's HTTP endpoints
struct RoomReader {
    http: reqwest::Client,
    base: String,
    user_id: UserId,
}

impl RoomReader {
    async fn history(&self) -> Result<Vec<HistoryEntryDto>, reqwest::Error> {
        self.http
            .get(format!("{}/messages", self.base))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    async fn unread(&self) -> Result<UnreadCountDto, reqwest::Error> {
        self.http
            .get(format!("{}/unread/{}", self.base, self.user_id))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

/// Turn a prompt command into the frame to send, if any
async fn build_frame(
    command: InputCommand,
    options: &ClientOptions,
    seen: &SharedSeen,
) -> Result<Option<ClientFrame>, String> {
    let frame = match command {
        InputCommand::Say(text) => Some(ClientFrame::Message {
            project_id: options.project_id.clone(),
            user_id: options.user_id.clone(),
            sender_name: options.name.clone(),
            content: text,
            reply_to_id: None,
            reply_to_content: None,
            reply_to_sender: None,
        }),
        InputCommand::Reply { to, text } => {
            let (sender, content) = seen
                .lock()
                .await
                .get(to)
                .cloned()
                .ok_or_else(|| format!("message #{} has not been seen in this session", to))?;
            Some(ClientFrame::Message {
                project_id: options.project_id.clone(),
                user_id: options.user_id.clone(),
                sender_name: options.name.clone(),
                content: text,
                reply_to_id: Some(to),
                reply_to_content: Some(content),
                reply_to_sender: Some(sender),
            })
        }
        InputCommand::Edit { id, text } => Some(ClientFrame::Edit {
            message_id: id,
            content: text,
        }),
        InputCommand::Read(message_ids) => Some(ClientFrame::MarkRead {
            user_id: options.user_id.clone(),
            user_name: options.name.clone(),
            message_ids,
        }),
        InputCommand::History | InputCommand::Unread | InputCommand::Help => None,
    };
    Ok(frame)
}

/// Run the WebSocket client session
pub async fn run_client_session(options: &ClientOptions) -> Result<(), ClientError> {
    let chat_url = options.chat_url()?;
    let reader = RoomReader {
        http: reqwest::Client::new(),
        base: options.http_base()?,
        user_id: options.user_id.clone(),
    };

    let mut request = chat_url
        .as_str()
        .into_client_request()
        .map_err(|_| ClientError::InvalidUrl(options.url.clone()))?;
    request
        .headers_mut()
        .insert("x-user-id", header_value(&options.user_id.to_string())?);
    request
        .headers_mut()
        .insert("x-user-name", header_value(&options.name)?);

    let (ws_stream, _response) = connect_async(request).await.map_err(to_connection_error)?;

    tracing::info!("Connected to {}", chat_url);
    println!(
        "\nYou are '{}' in project {}. Type messages and press Enter to send, /help for commands. Press Ctrl+C to exit.\n",
        options.name, options.project_id
    );

    let (mut write, mut read) = ws_stream.split();
    let seen: SharedSeen = Arc::new(Mutex::new(SeenMessages::default()));

    // Spawn a task to handle incoming frames
    let name_for_read = options.name.clone();
    let me = options.user_id.clone();
    let seen_for_read = seen.clone();
    let mut read_task = tokio::spawn(async move {
        let mut connection_error = false;

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    let output = match serde_json::from_str::<ServerFrame>(text.as_str()) {
                        Ok(ServerFrame::Message { message }) => {
                            seen_for_read.lock().await.remember(
                                message.id,
                                message.sender_name.clone(),
                                message.content.clone(),
                            );
                            Some(MessageFormatter::format_chat_message(&message, &me))
                        }
                        Ok(ServerFrame::MessageUpdated {
                            message_id,
                            content,
                        }) => {
                            seen_for_read
                                .lock()
                                .await
                                .update_content(message_id, content.clone());
                            Some(MessageFormatter::format_message_updated(message_id, &content))
                        }
                        Ok(ServerFrame::Typing {
                            sender_name,
                            is_typing,
                            ..
                        }) => MessageFormatter::format_typing(&sender_name, is_typing),
                        Ok(ServerFrame::ReadReceiptUpdate {
                            message_ids,
                            user_name,
                            read_at,
                            ..
                        }) => Some(MessageFormatter::format_read_receipt(
                            &user_name,
                            &message_ids,
                            read_at,
                        )),
                        Err(_) => Some(MessageFormatter::format_raw_message(text.as_str())),
                    };
                    if let Some(output) = output {
                        show(&output, &name_for_read);
                    }
                }
                Ok(Message::Binary(data)) => {
                    show(&MessageFormatter::format_binary_message(data.len()), &name_for_read);
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    connection_error = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    connection_error = true;
                    break;
                }
                _ => {}
            }
        }

        connection_error
    });

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let prompt = format!("{}> ", options.name);
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    // Spawn a task to turn prompt lines into frames and HTTP reads
    let options_for_write = options.clone();
    let mut write_task = tokio::spawn(async move {
        let options = options_for_write;
        let mut write_error = false;

        while let Some(line) = input_rx.recv().await {
            let command = match parse_input(&line) {
                Ok(command) => command,
                Err(e) => {
                    show(&format!("{}\n", e), &options.name);
                    continue;
                }
            };

            match &command {
                InputCommand::History => {
                    let output = match reader.history().await {
                        Ok(history) => MessageFormatter::format_history(&history, &options.user_id),
                        Err(e) => format!("Failed to load history: {}\n", e),
                    };
                    show(&output, &options.name);
                }
                InputCommand::Unread => {
                    let output = match reader.unread().await {
                        Ok(unread) => MessageFormatter::format_unread(unread.count),
                        Err(e) => format!("Failed to load unread count: {}\n", e),
                    };
                    show(&output, &options.name);
                }
                InputCommand::Help => show(HELP, &options.name),
                _ => {}
            }

            let frame = match build_frame(command, &options, &seen).await {
                Ok(Some(frame)) => frame,
                Ok(None) => continue,
                Err(e) => {
                    show(&format!("{}\n", e), &options.name);
                    continue;
                }
            };

            let json = match serde_json::to_string(&frame) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize frame: {}", e);
                    continue;
                }
            };

            if let Err(e) = write.send(Message::Text(json.into())).await {
                tracing::warn!("Failed to send frame: {}", e);
                write_error = true;
                break;
            }
        }

        write_error
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            if read_result.unwrap_or(false) {
                return Err(ClientError::ConnectionError("Connection lost".to_string()));
            }
        }
        write_result = &mut write_task => {
            read_task.abort();
            if write_result.unwrap_or(false) {
                return Err(ClientError::ConnectionError("Connection lost".to_string()));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatroom_server::domain::ProjectId;

    fn options() -> ClientOptions {
        ClientOptions {
            url: "ws://127.0.0.1:8080".to_string(),
            project_id: ProjectId::new(42).unwrap(),
            user_id: UserId::new(7).unwrap(),
            name: "alice".to_string(),
        }
    }

    #[tokio::test]
    async fn test_reply_uses_seen_message_snapshot() {
        // テスト項目: 返信フレームには受信済みメッセージの送信者と本文が入る
        // given (前提条件):
        let seen: SharedSeen = Arc::new(Mutex::new(SeenMessages::default()));
        let id = MessageId::new(3).unwrap();
        seen.lock()
            .await
            .remember(id, "bob".to_string(), "ship it?".to_string());

        // when (操作):
        let frame = build_frame(
            InputCommand::Reply {
                to: id,
                text: "yes".to_string(),
            },
            &options(),
            &seen,
        )
        .await
        .unwrap()
        .unwrap();

        // then (期待する結果):
        let json: serde_json::Value = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "message");
        assert_eq!(json["replyToId"], 3);
        assert_eq!(json["replyToSender"], "bob");
        assert_eq!(json["replyToContent"], "ship it?");
        assert_eq!(json["projectId"], 42);
    }

    #[tokio::test]
    async fn test_reply_to_unknown_message_is_refused() {
        // テスト項目: 未受信のメッセージへの返信はエラーになる
        let seen: SharedSeen = Arc::new(Mutex::new(SeenMessages::default()));

        let result = build_frame(
            InputCommand::Reply {
                to: MessageId::new(9).unwrap(),
                text: "?".to_string(),
            },
            &options(),
            &seen,
        )
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_local_commands_send_nothing() {
        // テスト項目: /history などのローカルコマンドはフレームを送らない
        let seen: SharedSeen = Arc::new(Mutex::new(SeenMessages::default()));

        for command in [InputCommand::History, InputCommand::Unread, InputCommand::Help] {
            assert_eq!(build_frame(command, &options(), &seen).await, Ok(None));
        }
    }

    #[test]
    fn test_seen_messages_keep_latest_window() {
        // テスト項目: 受信済みメッセージの記録は履歴と同じ 50 件までで、古いものから捨てられる
        // given (前提条件):
        let mut seen = SeenMessages::default();

        // when (操作):
        for id in 1..=60 {
            seen.remember(MessageId::new(id).unwrap(), "bob".to_string(), format!("m{}", id));
        }

        // then (期待する結果):
        assert_eq!(seen.len(), SeenMessages::CAPACITY);
        assert!(seen.get(MessageId::new(10).unwrap()).is_none());
        assert_eq!(
            seen.get(MessageId::new(11).unwrap()),
            Some(&("bob".to_string(), "m11".to_string()))
        );
        assert!(seen.get(MessageId::new(60).unwrap()).is_some());
    }

    #[test]
    fn test_seen_message_edit_updates_snapshot() {
        // テスト項目: 編集通知で記録済みの本文が更新され、未記録の ID は無視される
        let mut seen = SeenMessages::default();
        let id = MessageId::new(1).unwrap();
        seen.remember(id, "bob".to_string(), "helo".to_string());

        seen.update_content(id, "hello".to_string());
        seen.update_content(MessageId::new(2).unwrap(), "ghost".to_string());

        assert_eq!(seen.get(id).map(|(_, content)| content.as_str()), Some("hello"));
        assert_eq!(seen.len(), 1);
    }
}
