//! Helpers shared by use case tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{
        BroadcastReport, Identity, MessageStore, RoomEvent, Session, SessionChannel, SessionId,
        SessionRegistry, UserId,
    },
    infrastructure::store::SqliteMessageStore,
};

/// Registry that records broadcasts instead of delivering them
#[derive(Default)]
pub struct RecordingRegistry {
    pub broadcasts: Mutex<Vec<(RoomEvent, Option<SessionId>)>>,
    pub sessions: Mutex<Vec<SessionId>>,
}

#[async_trait]
impl SessionRegistry for RecordingRegistry {
    async fn register(&self, session_id: SessionId, _channel: SessionChannel) {
        self.sessions.lock().await.push(session_id);
    }

    async fn unregister(&self, session_id: &SessionId) -> bool {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|id| id != session_id);
        before != sessions.len()
    }

    async fn broadcast(&self, event: &RoomEvent, exclude: Option<&SessionId>) -> BroadcastReport {
        self.broadcasts
            .lock()
            .await
            .push((event.clone(), exclude.copied()));
        BroadcastReport::default()
    }

    async fn count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

pub async fn memory_store() -> Arc<SqliteMessageStore> {
    let store = SqliteMessageStore::open_in_memory().await.unwrap();
    store.init_schema().await.unwrap();
    Arc::new(store)
}

pub fn user(id: impl ToString) -> UserId {
    UserId::new(id).unwrap()
}

pub fn session_of(id: impl ToString, name: &str) -> Session {
    Session::new(Some(Identity {
        id: user(id),
        username: name.to_string(),
    }))
}
