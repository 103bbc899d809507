//! UseCase: メッセージ編集処理

use std::sync::Arc;

use crate::{
    config::EditPolicy,
    domain::{MessageId, MessageStore, RoomEvent, Session, SessionRegistry},
};

use super::error::FrameError;

/// メッセージ編集のユースケース
pub struct EditMessageUseCase {
    store: Arc<dyn MessageStore>,
    registry: Arc<dyn SessionRegistry>,
    policy: EditPolicy,
}

impl EditMessageUseCase {
    pub fn new(
        store: Arc<dyn MessageStore>,
        registry: Arc<dyn SessionRegistry>,
        policy: EditPolicy,
    ) -> Self {
        Self {
            store,
            registry,
            policy,
        }
    }

    /// content を上書きし、`message_updated` を全員にブロードキャストする
    ///
    /// `EditPolicy::AuthorOnly` では、メッセージの作成者として認証された
    /// セッションからの編集だけを受け付ける。`EditPolicy::Permissive` では
    /// 存在しない ID への編集も黙って書き込み、ブロードキャストする。
    pub async fn execute(
        &self,
        session: &Session,
        message_id: MessageId,
        content: String,
    ) -> Result<(), FrameError> {
        if self.policy == EditPolicy::AuthorOnly {
            let message = self
                .store
                .find_message(message_id)
                .await?
                .ok_or(FrameError::MessageNotFound(message_id))?;
            if !session.is_user(&message.user_id) {
                return Err(FrameError::NotAuthor(message_id));
            }
        }

        self.store
            .update_message_content(message_id, &content)
            .await?;

        self.registry
            .broadcast(
                &RoomEvent::MessageEdited {
                    message_id,
                    content,
                },
                None,
            )
            .await;

        Ok(())
    }
}
