use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use stockroom_profiles::{ProfileError, ProfileFields, UserProfile, create_superuser, create_user};

use crate::store::{ProfileStore, StoreError};

#[derive(Debug, Error)]
pub enum UserManagerError {
    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Creates user profiles and persists them through a [`ProfileStore`].
#[derive(Clone)]
pub struct UserManager {
    store: Arc<dyn ProfileStore>,
}

impl UserManager {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    pub async fn create_user(
        &self,
        email: &str,
        password: Option<&str>,
        fields: ProfileFields,
        occurred_at: DateTime<Utc>,
    ) -> Result<UserProfile, UserManagerError> {
        let profile = create_user(email, password, fields, occurred_at)?;
        Ok(self.store.insert_profile(profile).await?)
    }

    pub async fn create_superuser(
        &self,
        email: &str,
        password: &str,
        fields: ProfileFields,
        occurred_at: DateTime<Utc>,
    ) -> Result<UserProfile, UserManagerError> {
        let profile = create_superuser(email, password, fields, occurred_at)?;
        Ok(self.store.insert_profile(profile).await?)
    }

    /// Create the superuser unless a profile with that email already exists.
    pub async fn ensure_superuser(
        &self,
        email: &str,
        password: &str,
        occurred_at: DateTime<Utc>,
    ) -> Result<UserProfile, UserManagerError> {
        let normalized = stockroom_profiles::normalize_email(email);
        if let Some(existing) = self.store.find_profile_by_email(&normalized).await? {
            return Ok(existing);
        }
        let profile = self
            .create_superuser(email, password, ProfileFields::default(), occurred_at)
            .await?;
        info!(user_id = %profile.id, email = %profile.email, "bootstrap superuser created");
        Ok(profile)
    }
}
