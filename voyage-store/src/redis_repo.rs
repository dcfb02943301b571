use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;
use voyage_core::{RoomClaims, StoreError, StoreResult};

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
    claim_ttl_seconds: u64,
}

impl RedisClient {
    pub async fn new(connection_string: &str, claim_ttl_seconds: u64) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client, claim_ttl_seconds })
    }

    pub async fn acquire_room_claim(&self, sailing_id: &str, room_id: &str, token: &str) -> Result<bool, redis::RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = claim_key(sailing_id, room_id);

        // SET NX: Only set if key does not exist
        let result: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(token)
            .arg("NX")
            .arg("EX")
            .arg(self.claim_ttl_seconds)
            .query_async(&mut conn)
            .await?;

        Ok(result.is_some())
    }

    pub async fn release_room_claim(&self, sailing_id: &str, room_id: &str, token: &str) -> Result<bool, redis::RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = claim_key(sailing_id, room_id);
        // Only the holder may delete; an expired claim may already belong to someone else.
        let script = redis::Script::new(r#"
            if redis.call("GET", KEYS[1]) == ARGV[1] then
                return redis.call("DEL", KEYS[1])
            else
                return 0
            end
        "#);

        let removed: i64 = script.key(key).arg(token).invoke_async(&mut conn).await?;
        Ok(removed == 1)
    }
}

fn claim_key(sailing_id: &str, room_id: &str) -> String {
    format!("room_claim:{}:{}", sailing_id, room_id)
}

fn redis_error(e: redis::RedisError) -> StoreError {
    StoreError::Transport(format!("redis: {}", e))
}

#[async_trait]
impl RoomClaims for RedisClient {
    async fn acquire(&self, sailing_id: Uuid, room_id: Uuid, token: Uuid) -> StoreResult<bool> {
        let acquired = self
            .acquire_room_claim(&sailing_id.to_string(), &room_id.to_string(), &token.to_string())
            .await
            .map_err(redis_error)?;
        if acquired {
            info!("Room claim set: {} / {}", sailing_id, room_id);
        }
        Ok(acquired)
    }

    async fn release(&self, sailing_id: Uuid, room_id: Uuid, token: Uuid) -> StoreResult<()> {
        let removed = self
            .release_room_claim(&sailing_id.to_string(), &room_id.to_string(), &token.to_string())
            .await
            .map_err(redis_error)?;
        if !removed {
            warn!("Room claim {} / {} expired before release", sailing_id, room_id);
        }
        Ok(())
    }
}
