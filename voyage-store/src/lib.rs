pub mod app_config;
pub mod claims;
pub mod memory_repo;
pub mod redis_repo;
pub mod rest_repo;

pub use claims::LocalClaims;
pub use memory_repo::MemoryRecordStore;
pub use redis_repo::RedisClient;
pub use rest_repo::RestRecordStore;
