use shared::{AdminDashboard, Caller, Profile, ProfileInput, Role};
use std::sync::Arc;
use uuid::Uuid;

use crate::repository::RepositoryError;
use crate::store::Store;

/// Profile lookups and the cross-user dashboard.
pub struct AdminService<S: Store + ?Sized> {
    store: Arc<S>,
}

impl<S: Store + ?Sized> Clone for AdminService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

fn require_admin(caller: Option<&Caller>) -> Result<&Caller, RepositoryError> {
    match caller {
        None => Err(RepositoryError::Unauthenticated),
        Some(caller) if !caller.is_admin() => Err(RepositoryError::Forbidden),
        Some(caller) => Ok(caller),
    }
}

fn by_name(a: &Profile, b: &Profile) -> std::cmp::Ordering {
    a.display_name()
        .to_lowercase()
        .cmp(&b.display_name().to_lowercase())
        .then_with(|| a.email.cmp(&b.email))
}

impl<S: Store + ?Sized> AdminService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Role comes from the profile row. A user without one is a plain user.
    #[tracing::instrument(skip(self))]
    pub async fn resolve_caller(&self, user_id: Uuid) -> Result<Caller, RepositoryError> {
        let role = self
            .store
            .fetch_profile(user_id)
            .await?
            .map(|profile| profile.role)
            .unwrap_or_default();
        Ok(Caller::new(user_id, role))
    }

    /// All profiles ordered by display name. Admin only.
    #[tracing::instrument(skip(self))]
    pub async fn users(&self, caller: Option<&Caller>) -> Result<Vec<Profile>, RepositoryError> {
        require_admin(caller)?;
        let mut profiles = self.store.fetch_profiles().await?;
        profiles.sort_by(by_name);
        Ok(profiles)
    }

    /// Recomputed from a fresh read on every call.
    #[tracing::instrument(skip(self))]
    pub async fn dashboard(
        &self,
        caller: Option<&Caller>,
    ) -> Result<AdminDashboard, RepositoryError> {
        let users = self.users(caller).await?;
        let tasks = self.store.fetch_tasks(None).await?;
        Ok(AdminDashboard::compute(&tasks, &users))
    }

    /// Lets a caller edit their own display name and avatar. Profiles are
    /// provisioned with the account; this never creates one.
    #[tracing::instrument(skip(self, input))]
    pub async fn update_profile(
        &self,
        caller: Option<&Caller>,
        input: ProfileInput,
    ) -> Result<Profile, RepositoryError> {
        let caller = caller.ok_or(RepositoryError::Unauthenticated)?;
        let Some(mut profile) = self.store.fetch_profile(caller.user_id).await? else {
            tracing::debug!(user_id = %caller.user_id, "profile edit without a profile row");
            return Err(RepositoryError::ProfileNotFound(caller.user_id));
        };
        profile.apply(input);
        self.store.upsert_profile(&profile).await?;
        tracing::info!(user_id = %caller.user_id, "profile updated");
        Ok(profile)
    }

    /// Makes sure `user_id` has an admin profile. Used at startup.
    #[tracing::instrument(skip(self))]
    pub async fn ensure_admin(&self, user_id: Uuid, email: &str) -> Result<(), RepositoryError> {
        let mut profile = self
            .store
            .fetch_profile(user_id)
            .await?
            .unwrap_or_else(|| Profile::new(user_id, email));
        if profile.role == Role::Admin {
            return Ok(());
        }
        profile.role = Role::Admin;
        self.store.upsert_profile(&profile).await?;
        tracing::info!(user_id = %user_id, "admin profile provisioned");
        Ok(())
    }
}
