use thiserror::Error;

#[derive(Debug, Error)]
pub enum RedisStoreError {
    #[error("invalid redis url: {0}")]
    InvalidUrl(String),

    #[error("redis connection failed: {0}")]
    Connect(String),

    #[error("redis command failed: {0}")]
    Command(String),

    #[error("redis operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("redis store is closed")]
    Closed,
}

impl From<RedisStoreError> for inverse_store::StoreError {
    fn from(e: RedisStoreError) -> Self {
        match e {
            RedisStoreError::Command(_) => inverse_store::StoreError::Backend(e.to_string()),
            other => inverse_store::StoreError::Unavailable(other.to_string()),
        }
    }
}
