//! Process-wide map from project id to running room.

use std::{collections::HashMap, sync::Arc};

use axum::Router;
use chatroom_shared::time::Clock;
use tokio::sync::{Mutex, OnceCell};

use crate::{
    config::{RoomConfig, SessionLimits},
    domain::{MessageStoreProvider, ProjectId},
};

use super::{actor::RoomHandle, error::RoomError, router::room_router};

/// A started room together with the router that serves its HTTP surface
#[derive(Clone)]
struct StartedRoom {
    handle: RoomHandle,
    router: Router,
}

/// Filled at most once; the directory lock is never held while filling it.
type RoomSlot = Arc<OnceCell<StartedRoom>>;

/// Addresses room instances by project id, starting them on first use.
///
/// The same project id always resolves to the same running room. A room
/// whose task has stopped is replaced on the next lookup. Starting a room
/// only blocks callers asking for that same project.
pub struct RoomDirectory {
    rooms: Mutex<HashMap<ProjectId, RoomSlot>>,
    provider: Arc<dyn MessageStoreProvider>,
    config: RoomConfig,
    limits: SessionLimits,
    clock: Arc<dyn Clock>,
}

impl RoomDirectory {
    pub fn new(
        provider: Arc<dyn MessageStoreProvider>,
        config: RoomConfig,
        limits: SessionLimits,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            provider,
            config,
            limits,
            clock,
        }
    }

    pub async fn resolve(&self, project_id: &ProjectId) -> Result<RoomHandle, RoomError> {
        Ok(self.started(project_id).await?.handle)
    }

    /// Router serving the room-relative paths of `project_id`'s room
    pub async fn router(&self, project_id: &ProjectId) -> Result<Router, RoomError> {
        Ok(self.started(project_id).await?.router)
    }

    async fn started(&self, project_id: &ProjectId) -> Result<StartedRoom, RoomError> {
        loop {
            let slot = self.slot(project_id).await;
            let room = match slot.get_or_try_init(|| self.start(project_id)).await {
                Ok(room) => room,
                Err(e) => {
                    self.discard(project_id, &slot).await;
                    return Err(e);
                }
            };
            if !room.handle.is_closed() {
                return Ok(room.clone());
            }
            tracing::warn!("Room {} had stopped; restarting it", project_id);
            self.discard(project_id, &slot).await;
        }
    }

    async fn slot(&self, project_id: &ProjectId) -> RoomSlot {
        self.rooms
            .lock()
            .await
            .entry(project_id.clone())
            .or_default()
            .clone()
    }

    /// Forget `slot` unless another caller has already replaced it.
    async fn discard(&self, project_id: &ProjectId, slot: &RoomSlot) {
        let mut rooms = self.rooms.lock().await;
        if rooms
            .get(project_id)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
        {
            rooms.remove(project_id);
        }
    }

    async fn start(&self, project_id: &ProjectId) -> Result<StartedRoom, RoomError> {
        let store = self.provider.open(project_id).await?;
        let handle =
            RoomHandle::spawn(project_id.clone(), store, self.config, self.clock.clone()).await?;
        let router = room_router(handle.clone(), self.limits);
        Ok(StartedRoom { handle, router })
    }

    /// Number of rooms started so far
    pub async fn len(&self) -> usize {
        self.rooms
            .lock()
            .await
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
