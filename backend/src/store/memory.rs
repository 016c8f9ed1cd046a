use async_trait::async_trait;
use shared::{Profile, Task};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ProfileStore, StoreError, TaskStore};

/// Process-local store. Used when no Redis URL is configured and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tasks: RwLock<HashMap<Uuid, Task>>,
    profiles: RwLock<HashMap<Uuid, Profile>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, task: &Task) -> Result<(), StoreError> {
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(())
    }

    async fn fetch_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn fetch_tasks(&self, owner: Option<Uuid>) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        Ok(tasks
            .values()
            .filter(|t| owner.map_or(true, |owner| t.owner_id == owner))
            .cloned()
            .collect())
    }

    async fn replace_task(&self, task: &Task) -> Result<bool, StoreError> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&task.id) {
            Some(slot) => {
                *slot = task.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_task(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.tasks.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn fetch_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        Ok(self.profiles.read().await.get(&id).cloned())
    }

    async fn fetch_profiles(&self) -> Result<Vec<Profile>, StoreError> {
        Ok(self.profiles.read().await.values().cloned().collect())
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        self.profiles
            .write()
            .await
            .insert(profile.id, profile.clone());
        Ok(())
    }
}
