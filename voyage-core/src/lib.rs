pub mod filter;
pub mod records;
pub mod repository;

pub use filter::{Clause, Filter, FilterOp};
pub use repository::{RecordStore, RoomClaims, Table};

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Record store unreachable: {0}")]
    Transport(String),
    #[error("Record store returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Uniqueness constraint violated: {0}")]
    Conflict(String),
    #[error("Malformed record: {0}")]
    Decode(String),
    #[error("Record store misconfigured: {0}")]
    Config(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
