//! Storage seams for users and posts.
//!
//! Every mutation is a single-record operation; the backend serializes
//! concurrent writes to the same record.

use async_trait::async_trait;
use log::error;
use mongodb::bson::oid::ObjectId;
use serde::Serialize;
use thiserror::Error;

use crate::post::post_model::{Category, Post, PostChanges, PostFilter};
use crate::user::model::User;
use crate::utils::error::CustomError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Duplicate key: {0}")]
    Duplicate(String),

    #[error("Storage backend failure: {0}")]
    Backend(String),
}

impl From<StoreError> for CustomError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(detail) => {
                CustomError::ConflictError(format!("Record already exists: {}", detail))
            }
            StoreError::Backend(detail) => {
                error!("Storage failure: {}", detail);
                CustomError::StorageError(detail)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    #[serde(rename = "_id")]
    pub category: Category,
    pub count: u64,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>, StoreError>;

    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<User>, StoreError>;

    /// Fails with `StoreError::Duplicate` when the external id or email is taken.
    async fn insert(&self, user: &User) -> Result<(), StoreError>;

    async fn replace(&self, user: &User) -> Result<(), StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    /// Round trip to the backend.
    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert(&self, post: &Post) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Post>, StoreError>;

    async fn find(&self, filter: &PostFilter) -> Result<Vec<Post>, StoreError>;

    /// Every post by `author_id`, any status, newest first.
    async fn find_by_author(&self, author_id: &ObjectId) -> Result<Vec<Post>, StoreError>;

    /// Adds one view and returns the post after the increment.
    async fn increment_views(&self, id: &ObjectId) -> Result<Option<Post>, StoreError>;

    /// Applies `changes` and refreshes `updatedAt`; returns the updated post.
    async fn update(
        &self,
        id: &ObjectId,
        changes: &PostChanges,
    ) -> Result<Option<Post>, StoreError>;

    async fn delete(&self, id: &ObjectId) -> Result<bool, StoreError>;

    /// Adds (`liked == true`) or removes `user_id` from the like set.
    async fn set_like(
        &self,
        id: &ObjectId,
        user_id: &ObjectId,
        liked: bool,
    ) -> Result<Option<Post>, StoreError>;

    async fn count_published(&self) -> Result<u64, StoreError>;

    /// Sum of like-set sizes over published posts.
    async fn published_like_total(&self) -> Result<u64, StoreError>;

    /// Published posts per category, largest first, empty categories omitted.
    async fn category_counts(&self) -> Result<Vec<CategoryCount>, StoreError>;
}
