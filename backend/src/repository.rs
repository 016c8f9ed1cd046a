use chrono::{DateTime, Utc};
use shared::{Caller, CreateTaskInput, Task, UpdateTaskInput, ValidationError};
use std::sync::Arc;
use uuid::Uuid;

use crate::store::{StoreError, TaskStore};

/// Source of creation timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no valid session")]
    Unauthenticated,
    #[error("this operation requires the admin role")]
    Forbidden,
    #[error("task {0} not found")]
    NotFound(Uuid),
    #[error("no profile for user {0}")]
    ProfileNotFound(Uuid),
    #[error("task store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

/// Ownership-scoped access to tasks.
///
/// Every operation takes the caller explicitly. `None` means there is no
/// valid session. A plain user only ever sees their own tasks: a task owned
/// by someone else is reported as `NotFound`, exactly like a missing one.
/// Admins bypass the ownership check.
pub struct TaskRepository<S: TaskStore + ?Sized> {
    store: Arc<S>,
    clock: Clock,
}

impl<S: TaskStore + ?Sized> Clone for TaskRepository<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
        }
    }
}

fn authenticated(caller: Option<&Caller>) -> Result<&Caller, RepositoryError> {
    caller.ok_or(RepositoryError::Unauthenticated)
}

fn admin(caller: Option<&Caller>) -> Result<&Caller, RepositoryError> {
    let caller = authenticated(caller)?;
    if !caller.is_admin() {
        tracing::debug!(user_id = %caller.user_id, "admin operation refused");
        return Err(RepositoryError::Forbidden);
    }
    Ok(caller)
}

fn newest_first(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    tasks
}

impl<S: TaskStore + ?Sized> TaskRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_clock(store, Arc::new(Utc::now))
    }

    pub fn with_clock(store: Arc<S>, clock: Clock) -> Self {
        Self { store, clock }
    }

    /// The caller's own tasks, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, caller: Option<&Caller>) -> Result<Vec<Task>, RepositoryError> {
        let caller = authenticated(caller)?;
        let tasks = self.store.fetch_tasks(Some(caller.user_id)).await?;
        Ok(newest_first(tasks))
    }

    /// Every user's tasks, newest first. Admin only.
    #[tracing::instrument(skip(self))]
    pub async fn list_all(&self, caller: Option<&Caller>) -> Result<Vec<Task>, RepositoryError> {
        admin(caller)?;
        let tasks = self.store.fetch_tasks(None).await?;
        Ok(newest_first(tasks))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: Uuid, caller: Option<&Caller>) -> Result<Task, RepositoryError> {
        let caller = authenticated(caller)?;
        self.owned(id, caller).await
    }

    #[tracing::instrument(skip(self, input))]
    pub async fn create(
        &self,
        caller: Option<&Caller>,
        input: CreateTaskInput,
    ) -> Result<Task, RepositoryError> {
        let caller = authenticated(caller)?;
        self.insert(caller.user_id, input).await
    }

    /// Creates a task on behalf of another user. Admin only.
    #[tracing::instrument(skip(self, input))]
    pub async fn assign(
        &self,
        caller: Option<&Caller>,
        owner_id: Uuid,
        input: CreateTaskInput,
    ) -> Result<Task, RepositoryError> {
        admin(caller)?;
        self.insert(owner_id, input).await
    }

    /// Applies a partial edit and returns the task as stored.
    ///
    /// Ownership is resolved before the input is validated, so an edit to a
    /// foreign or missing task is `NotFound` whatever its fields hold.
    #[tracing::instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: Uuid,
        caller: Option<&Caller>,
        input: UpdateTaskInput,
    ) -> Result<Task, RepositoryError> {
        let caller = authenticated(caller)?;
        let mut task = self.owned(id, caller).await?;
        let changes = input.validate()?;
        if changes.is_empty() {
            return Ok(task);
        }
        task.apply(changes);
        self.replace(&task).await?;
        tracing::info!(task_id = %id, "task updated");
        Ok(task)
    }

    /// Sets `completed`. Setting the value the task already has still
    /// succeeds.
    #[tracing::instrument(skip(self))]
    pub async fn toggle_completion(
        &self,
        id: Uuid,
        caller: Option<&Caller>,
        completed: bool,
    ) -> Result<(), RepositoryError> {
        let caller = authenticated(caller)?;
        let mut task = self.owned(id, caller).await?;
        task.completed = completed;
        self.replace(&task).await?;
        tracing::info!(task_id = %id, completed, "task completion set");
        Ok(())
    }

    /// Removes the task for good. A missing id is `NotFound`.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: Uuid, caller: Option<&Caller>) -> Result<(), RepositoryError> {
        let caller = authenticated(caller)?;
        self.owned(id, caller).await?;
        if !self.store.remove_task(id).await? {
            return Err(RepositoryError::NotFound(id));
        }
        tracing::info!(task_id = %id, "task deleted");
        Ok(())
    }

    async fn owned(&self, id: Uuid, caller: &Caller) -> Result<Task, RepositoryError> {
        match self.store.fetch_task(id).await? {
            Some(task) if caller.can_access(&task) => Ok(task),
            Some(_) => {
                tracing::debug!(task_id = %id, user_id = %caller.user_id, "task owned by another user");
                Err(RepositoryError::NotFound(id))
            }
            None => Err(RepositoryError::NotFound(id)),
        }
    }

    async fn insert(&self, owner_id: Uuid, input: CreateTaskInput) -> Result<Task, RepositoryError> {
        let draft = input.validate()?;
        let task = Task::new(owner_id, draft, (self.clock)());
        self.store.insert_task(&task).await.map_err(|e| {
            tracing::warn!(error = %e, "failed to store new task");
            e
        })?;
        tracing::info!(task_id = %task.id, owner_id = %owner_id, "task created");
        Ok(task)
    }

    /// A concurrent delete makes the write miss; that is reported as
    /// `NotFound` rather than recreating the task.
    async fn replace(&self, task: &Task) -> Result<(), RepositoryError> {
        if self.store.replace_task(task).await? {
            Ok(())
        } else {
            Err(RepositoryError::NotFound(task.id))
        }
    }
}
