use std::sync::Arc;

use log::{debug, info};
use mongodb::bson::{self, oid::ObjectId};

use crate::database::{StoreError, UserStore};
use crate::user::model::{DEFAULT_PROVIDER, User, VerifiedIdentity};
use crate::utils::error::CustomError;
use crate::utils::helpers::{email_local_part, now};

fn avatar(identity: &VerifiedIdentity) -> &str {
    identity.avatar_url.as_deref().map(str::trim).unwrap_or("")
}

pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        UserService { store }
    }

    /// Create-or-update the user behind a verified identity.
    ///
    /// Name and avatar only change when the incoming value is non-empty;
    /// `lastLogin` is refreshed on every call. Two first syncs racing for
    /// the same identity both succeed against one record.
    pub async fn sync_user(&self, identity: &VerifiedIdentity) -> Result<User, CustomError> {
        let timestamp = now();

        if let Some(user) = self.store.find_by_external_id(&identity.external_id).await? {
            return self.record_login(user, identity, timestamp).await;
        }

        let display_name = identity.display_name.trim();
        let name = if display_name.is_empty() {
            email_local_part(&identity.email).to_string()
        } else {
            display_name.to_string()
        };

        let user = User {
            id: ObjectId::new(),
            firebase_uid: identity.external_id.clone(),
            email: identity.email.clone(),
            name,
            image: avatar(identity).to_string(),
            provider: identity
                .provider
                .clone()
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            created_at: timestamp,
            last_login: timestamp,
        };

        match self.store.insert(&user).await {
            Ok(()) => {
                info!("New user created: {}", user.email);
                Ok(user)
            }
            Err(StoreError::Duplicate(detail)) => {
                // Lost the race to a concurrent sync; an email clash stays a conflict.
                match self.store.find_by_external_id(&identity.external_id).await? {
                    Some(existing) => {
                        debug!("Concurrent first sync for {}", identity.external_id);
                        self.record_login(existing, identity, timestamp).await
                    }
                    None => Err(StoreError::Duplicate(detail).into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn record_login(
        &self,
        mut user: User,
        identity: &VerifiedIdentity,
        timestamp: bson::DateTime,
    ) -> Result<User, CustomError> {
        let display_name = identity.display_name.trim();
        if !display_name.is_empty() {
            user.name = display_name.to_string();
        }
        let avatar = avatar(identity);
        if !avatar.is_empty() {
            user.image = avatar.to_string();
        }
        user.last_login = timestamp;

        self.store.replace(&user).await?;
        info!("User updated: {}", user.email);
        Ok(user)
    }

    pub async fn get_user_by_external_id(&self, external_id: &str) -> Result<User, CustomError> {
        self.store
            .find_by_external_id(external_id)
            .await?
            .ok_or_else(|| CustomError::NotFoundError("User not found in database".to_string()))
    }

    /// The stored user behind a verified identity; callers must have synced first.
    pub async fn resolve_user(&self, identity: &VerifiedIdentity) -> Result<User, CustomError> {
        self.store
            .find_by_external_id(&identity.external_id)
            .await?
            .ok_or_else(|| {
                CustomError::NotFoundError(
                    "User not found. Please sync your account first.".to_string(),
                )
            })
    }
}
