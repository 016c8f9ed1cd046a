//! Persistence boundary. Stores know nothing about ownership or roles;
//! the repository layers those rules on top.

use async_trait::async_trait;
use shared::{Profile, Task};
use uuid::Uuid;

mod memory;
mod redis_store;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redis command failed: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("stored record could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, task: &Task) -> Result<(), StoreError>;

    async fn fetch_task(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    /// Every task of `owner`, or every task at all when `owner` is `None`.
    /// No particular order.
    async fn fetch_tasks(&self, owner: Option<Uuid>) -> Result<Vec<Task>, StoreError>;

    /// Overwrites an existing task. Returns `false` when the task is gone.
    async fn replace_task(&self, task: &Task) -> Result<bool, StoreError>;

    /// Returns `false` when there was nothing to remove.
    async fn remove_task(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn fetch_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError>;

    async fn fetch_profiles(&self) -> Result<Vec<Profile>, StoreError>;

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StoreError>;
}

/// Everything the server needs from one backend.
pub trait Store: TaskStore + ProfileStore {}

impl<T: TaskStore + ProfileStore> Store for T {}
