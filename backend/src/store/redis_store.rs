use async_trait::async_trait;
use redis::{aio::Connection, AsyncCommands, Client};
use serde::de::DeserializeOwned;
use shared::{Profile, Task};
use uuid::Uuid;

use super::{ProfileStore, StoreError, TaskStore};

/// Redis layout:
///
/// * `task:{id}` holds the task as JSON,
/// * `user:{owner}:tasks` is the set of task ids an owner has,
/// * `profile:{id}` holds a profile as JSON.
#[derive(Debug, Clone)]
pub struct RedisStore {
    client: Client,
}

fn task_key(id: Uuid) -> String {
    format!("task:{}", id)
}

fn owner_key(owner: Uuid) -> String {
    format!("user:{}:tasks", owner)
}

fn profile_key(id: Uuid) -> String {
    format!("profile:{}", id)
}

impl RedisStore {
    pub fn open(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url)?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<Connection, StoreError> {
        Ok(self.client.get_async_connection().await?)
    }

    async fn load_many<T: DeserializeOwned>(
        conn: &mut Connection,
        keys: &[String],
    ) -> Result<Vec<T>, StoreError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<Option<String>> = redis::cmd("MGET").arg(keys).query_async(conn).await?;
        rows.into_iter()
            .flatten()
            .map(|json| serde_json::from_str(&json).map_err(StoreError::from))
            .collect()
    }
}

#[async_trait]
impl TaskStore for RedisStore {
    async fn insert_task(&self, task: &Task) -> Result<(), StoreError> {
        let task_json = serde_json::to_string(task)?;
        let mut conn = self.connection().await?;
        redis::pipe()
            .atomic()
            .set(task_key(task.id), task_json)
            .ignore()
            .sadd(owner_key(task.owner_id), task.id.to_string())
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn fetch_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        let mut conn = self.connection().await?;
        let task_json: Option<String> = conn.get(task_key(id)).await?;
        match task_json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn fetch_tasks(&self, owner: Option<Uuid>) -> Result<Vec<Task>, StoreError> {
        let mut conn = self.connection().await?;
        let keys: Vec<String> = match owner {
            Some(owner) => {
                let ids: Vec<String> = conn.smembers(owner_key(owner)).await?;
                ids.iter().map(|id| format!("task:{}", id)).collect()
            }
            None => conn.keys("task:*").await?,
        };
        Self::load_many(&mut conn, &keys).await
    }

    async fn replace_task(&self, task: &Task) -> Result<bool, StoreError> {
        let task_json = serde_json::to_string(task)?;
        let mut conn = self.connection().await?;
        // XX: only overwrite a key that still exists.
        let reply: Option<String> = redis::cmd("SET")
            .arg(task_key(task.id))
            .arg(task_json)
            .arg("XX")
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn remove_task(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut conn = self.connection().await?;
        let key = task_key(id);
        let task_json: Option<String> = conn.get(&key).await?;
        let Some(json) = task_json else {
            return Ok(false);
        };
        let task: Task = serde_json::from_str(&json)?;

        let (deleted,): (usize,) = redis::pipe()
            .atomic()
            .del(&key)
            .srem(owner_key(task.owner_id), id.to_string())
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl ProfileStore for RedisStore {
    async fn fetch_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        let mut conn = self.connection().await?;
        let profile_json: Option<String> = conn.get(profile_key(id)).await?;
        match profile_json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn fetch_profiles(&self) -> Result<Vec<Profile>, StoreError> {
        let mut conn = self.connection().await?;
        let keys: Vec<String> = conn.keys("profile:*").await?;
        Self::load_many(&mut conn, &keys).await
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        let profile_json = serde_json::to_string(profile)?;
        let mut conn = self.connection().await?;
        let _: () = conn.set(profile_key(profile.id), profile_json).await?;
        Ok(())
    }
}
