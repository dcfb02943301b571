use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;
use voyage_core::{RoomClaims, StoreResult};

/// Claim guard for a single process. Enough when one service instance owns
/// all writes; multi-instance deployments use the Redis guard instead.
#[derive(Default)]
pub struct LocalClaims {
    held: Mutex<HashMap<(Uuid, Uuid), Uuid>>,
}

impl LocalClaims {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomClaims for LocalClaims {
    async fn acquire(&self, sailing_id: Uuid, room_id: Uuid, token: Uuid) -> StoreResult<bool> {
        let mut held = self.held.lock().await;
        match held.get(&(sailing_id, room_id)) {
            Some(owner) => Ok(*owner == token),
            None => {
                held.insert((sailing_id, room_id), token);
                Ok(true)
            }
        }
    }

    async fn release(&self, sailing_id: Uuid, room_id: Uuid, token: Uuid) -> StoreResult<()> {
        let mut held = self.held.lock().await;
        if held.get(&(sailing_id, room_id)) == Some(&token) {
            held.remove(&(sailing_id, room_id));
        }
        Ok(())
    }
}
