//! Room actor
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RoomHandle 経由で送ったコマンドが 1 つずつ順番に処理されること
//! - フレームの種類ごとのブロードキャスト先（送信者を含む／除外する）
//!
//! ### なぜこのテストが必要か
//! - ルームはコマンドを逐次処理することで、永続化とブロードキャストの順序、
//!   ID の単調増加を保証している
//! - 不正なフレームで接続やルームが止まってはならない
//!
//! ### どのような状況を想定しているか
//! - 正常系：join → フレーム送信 → leave
//! - 異常系：不正な JSON、スキーマ初期化の失敗

use std::{collections::HashMap, sync::Arc};

use chatroom_shared::time::Clock;
use tokio::sync::{mpsc, oneshot};

use crate::{
    config::RoomConfig,
    domain::{
        MessageStore, MessageWithReads, ProjectId, RoomState, Session, SessionChannel, SessionId,
        StoreError, UserId,
    },
    infrastructure::{dto::websocket::ClientFrame, session_registry::WebSocketSessionRegistry},
    usecase::{
        ConnectSessionUseCase, DisconnectSessionUseCase, EditMessageUseCase, FrameError,
        GetHistoryUseCase, GetUnreadCountUseCase, MarkReadInput, MarkReadUseCase,
        SendMessageInput, SendMessageUseCase, SendTypingInput, SendTypingUseCase,
    },
};

use super::error::RoomError;

enum RoomCommand {
    Join {
        session: Session,
        channel: SessionChannel,
        reply: oneshot::Sender<RoomState>,
    },
    Leave {
        session_id: SessionId,
        reply: oneshot::Sender<RoomState>,
    },
    Frame {
        session_id: SessionId,
        text: String,
    },
    History {
        limit: u32,
        reply: oneshot::Sender<Result<Vec<MessageWithReads>, StoreError>>,
    },
    UnreadCount {
        user_id: UserId,
        reply: oneshot::Sender<Result<i64, StoreError>>,
    },
    State {
        reply: oneshot::Sender<RoomState>,
    },
}

/// Owns one project's store and session registry. Runs on its own task and
/// handles commands strictly one at a time.
struct RoomActor {
    project_id: ProjectId,
    receiver: mpsc::Receiver<RoomCommand>,
    sessions: HashMap<SessionId, Session>,
    connect_session: ConnectSessionUseCase,
    disconnect_session: DisconnectSessionUseCase,
    send_message: SendMessageUseCase,
    edit_message: EditMessageUseCase,
    send_typing: SendTypingUseCase,
    mark_read: MarkReadUseCase,
    get_history: GetHistoryUseCase,
    get_unread_count: GetUnreadCountUseCase,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!("Room {} started", self.project_id);
        while let Some(command) = self.receiver.recv().await {
            self.handle(command).await;
        }
        tracing::info!("Room {} stopped", self.project_id);
    }

    async fn handle(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Join {
                session,
                channel,
                reply,
            } => {
                let session_id = session.id;
                match &session.identity {
                    Some(identity) => tracing::info!(
                        "Session {} joined room {} as user {} ({})",
                        session_id,
                        self.project_id,
                        identity.id,
                        identity.username
                    ),
                    None => tracing::info!(
                        "Anonymous session {} joined room {}",
                        session_id,
                        self.project_id
                    ),
                }
                self.sessions.insert(session_id, session);
                let state = self.connect_session.execute(session_id, channel).await;
                let _ = reply.send(state);
            }
            RoomCommand::Leave { session_id, reply } => {
                self.sessions.remove(&session_id);
                let state = self.disconnect_session.execute(&session_id).await;
                tracing::info!(
                    "Session {} left room {} ({:?})",
                    session_id,
                    self.project_id,
                    state
                );
                let _ = reply.send(state);
            }
            RoomCommand::Frame { session_id, text } => self.handle_frame(session_id, &text).await,
            RoomCommand::History { limit, reply } => {
                let _ = reply.send(self.get_history.execute(limit).await);
            }
            RoomCommand::UnreadCount { user_id, reply } => {
                let _ = reply.send(self.get_unread_count.execute(&user_id).await);
            }
            RoomCommand::State { reply } => {
                let _ = reply.send(RoomState::from_session_count(self.sessions.len()));
            }
        }
    }

    async fn handle_frame(&self, session_id: SessionId, text: &str) {
        let Some(session) = self.sessions.get(&session_id) else {
            tracing::debug!("Dropping frame from unknown session {}", session_id);
            return;
        };

        let result = match serde_json::from_str::<ClientFrame>(text) {
            Ok(frame) => self.dispatch(session, frame).await,
            Err(e) => Err(FrameError::Malformed(e.to_string())),
        };

        match result {
            Ok(()) => {}
            Err(FrameError::Store(e)) => {
                tracing::error!(
                    "Room {}: persistence failed for frame from {}: {}",
                    self.project_id,
                    session_id,
                    e
                );
            }
            Err(e) => {
                tracing::warn!(
                    "Room {}: dropped frame from {}: {}",
                    self.project_id,
                    session_id,
                    e
                );
            }
        }
    }

    async fn dispatch(&self, session: &Session, frame: ClientFrame) -> Result<(), FrameError> {
        match frame {
            ClientFrame::Message {
                project_id,
                user_id,
                sender_name,
                content,
                reply_to_id,
                reply_to_content,
                reply_to_sender,
            } => {
                let input = SendMessageInput {
                    project_id,
                    user_id,
                    sender_name,
                    content,
                    reply_to_id,
                    reply_to_content,
                    reply_to_sender,
                };
                let message = self.send_message.execute(session, input).await?;
                tracing::debug!("Room {}: stored message {}", self.project_id, message.id);
                Ok(())
            }
            ClientFrame::Edit {
                message_id,
                content,
            } => self.edit_message.execute(session, message_id, content).await,
            ClientFrame::Typing {
                user_id,
                sender_name,
                is_typing,
            } => {
                let input = SendTypingInput {
                    user_id,
                    sender_name,
                    is_typing,
                };
                self.send_typing.execute(session, input).await
            }
            ClientFrame::MarkRead {
                user_id,
                user_name,
                message_ids,
            } => {
                let input = MarkReadInput {
                    user_id,
                    user_name,
                    message_ids,
                };
                self.mark_read.execute(session, input).await.map(|_| ())
            }
        }
    }
}

/// Cheap, cloneable address of a running room
#[derive(Clone)]
pub struct RoomHandle {
    project_id: ProjectId,
    sender: mpsc::Sender<RoomCommand>,
    session_queue_capacity: usize,
}

impl RoomHandle {
    /// Initialize the store schema and start the room's task.
    ///
    /// A schema failure is returned as `RoomError::StoreUnavailable` and no
    /// task is started.
    pub async fn spawn(
        project_id: ProjectId,
        store: Arc<dyn MessageStore>,
        config: RoomConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, RoomError> {
        store.init_schema().await?;

        let registry = Arc::new(WebSocketSessionRegistry::new());
        let (sender, receiver) = mpsc::channel(config.room_queue_capacity);

        let actor = RoomActor {
            project_id: project_id.clone(),
            receiver,
            sessions: HashMap::new(),
            connect_session: ConnectSessionUseCase::new(registry.clone()),
            disconnect_session: DisconnectSessionUseCase::new(registry.clone()),
            send_message: SendMessageUseCase::new(
                project_id.clone(),
                store.clone(),
                registry.clone(),
                clock.clone(),
            ),
            edit_message: EditMessageUseCase::new(
                store.clone(),
                registry.clone(),
                config.edit_policy,
            ),
            send_typing: SendTypingUseCase::new(registry.clone()),
            mark_read: MarkReadUseCase::new(store.clone(), registry, clock),
            get_history: GetHistoryUseCase::new(store.clone()),
            get_unread_count: GetUnreadCountUseCase::new(store),
        };
        tokio::spawn(actor.run());

        Ok(Self {
            project_id,
            sender,
            session_queue_capacity: config.session_queue_capacity,
        })
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    /// Whether the room's task has stopped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Whether both handles address the same room task
    pub fn same_room(&self, other: &RoomHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    /// Register a session and return the receiving end of its outbound queue.
    pub async fn join(&self, session: Session) -> Result<mpsc::Receiver<String>, RoomError> {
        let (channel, outbound) = mpsc::channel(self.session_queue_capacity);
        let (reply, response) = oneshot::channel();
        self.send(RoomCommand::Join {
            session,
            channel,
            reply,
        })
        .await?;
        response.await.map_err(|_| RoomError::RoomClosed)?;
        Ok(outbound)
    }

    pub async fn leave(&self, session_id: SessionId) -> Result<RoomState, RoomError> {
        let (reply, response) = oneshot::channel();
        self.send(RoomCommand::Leave { session_id, reply }).await?;
        response.await.map_err(|_| RoomError::RoomClosed)
    }

    /// Queue a raw text frame. Frames from one session are handled in the
    /// order they are submitted.
    pub async fn submit_frame(&self, session_id: SessionId, text: String) -> Result<(), RoomError> {
        self.send(RoomCommand::Frame { session_id, text }).await
    }

    pub async fn history(&self, limit: u32) -> Result<Vec<MessageWithReads>, RoomError> {
        let (reply, response) = oneshot::channel();
        self.send(RoomCommand::History { limit, reply }).await?;
        Ok(response.await.map_err(|_| RoomError::RoomClosed)??)
    }

    pub async fn unread_count(&self, user_id: UserId) -> Result<i64, RoomError> {
        let (reply, response) = oneshot::channel();
        self.send(RoomCommand::UnreadCount { user_id, reply }).await?;
        Ok(response.await.map_err(|_| RoomError::RoomClosed)??)
    }

    pub async fn state(&self) -> Result<RoomState, RoomError> {
        let (reply, response) = oneshot::channel();
        self.send(RoomCommand::State { reply }).await?;
        response.await.map_err(|_| RoomError::RoomClosed)
    }

    async fn send(&self, command: RoomCommand) -> Result<(), RoomError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| RoomError::RoomClosed)
    }
}
