//! In-memory stores used by tests and `STORAGE_BACKEND=memory`.
//!
//! Note: data is lost on process restart.

use std::cmp::Reverse;
use std::collections::HashMap;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use regex::{Regex, RegexBuilder};
use tokio::sync::RwLock;

use crate::database::store::{CategoryCount, PostStore, StoreError, UserStore};
use crate::post::post_model::{Post, PostChanges, PostFilter, PostStatus, SortKey};
use crate::user::model::User;
use crate::utils::helpers::now;

#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<ObjectId, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|user| user.firebase_uid == external_id)
            .cloned())
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if let Some(taken) = users
            .values()
            .find(|u| u.firebase_uid == user.firebase_uid || u.email == user.email)
        {
            let key = if taken.firebase_uid == user.firebase_uid {
                "firebaseUid"
            } else {
                "email"
            };
            return Err(StoreError::Duplicate(format!("{} already registered", key)));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn replace(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if let Some(existing) = users.get_mut(&user.id) {
            *existing = user.clone();
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.users.read().await.len() as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryPostStore {
    posts: RwLock<HashMap<ObjectId, Post>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn modify<F>(&self, id: &ObjectId, change: F) -> Result<Option<Post>, StoreError>
    where
        F: FnOnce(&mut Post) + Send,
    {
        let mut posts = self.posts.write().await;
        Ok(posts.get_mut(id).map(|post| {
            change(post);
            post.clone()
        }))
    }
}

fn search_pattern(search: &str) -> Result<Regex, StoreError> {
    RegexBuilder::new(&regex::escape(search))
        .case_insensitive(true)
        .build()
        .map_err(|e| StoreError::Backend(format!("Invalid search pattern: {}", e)))
}

fn matches_filter(post: &Post, filter: &PostFilter, pattern: Option<&Regex>) -> bool {
    if post.status != filter.status {
        return false;
    }
    if let Some(category) = &filter.category {
        if post.category.as_str() != category {
            return false;
        }
    }
    match pattern {
        None => true,
        Some(pattern) => {
            pattern.is_match(&post.title)
                || pattern.is_match(&post.content)
                || pattern.is_match(&post.excerpt)
        }
    }
}

fn newest_first(posts: &mut [Post]) {
    posts.sort_by_key(|post| Reverse((post.created_at.timestamp_millis(), post.id.bytes())));
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn insert(&self, post: &Post) -> Result<(), StoreError> {
        self.posts.write().await.insert(post.id, post.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Post>, StoreError> {
        Ok(self.posts.read().await.get(id).cloned())
    }

    async fn find(&self, filter: &PostFilter) -> Result<Vec<Post>, StoreError> {
        let pattern = filter.search.as_deref().map(search_pattern).transpose()?;

        let mut found: Vec<Post> = self
            .posts
            .read()
            .await
            .values()
            .filter(|post| matches_filter(post, filter, pattern.as_ref()))
            .cloned()
            .collect();

        newest_first(&mut found);
        match filter.sort {
            SortKey::Latest => {}
            SortKey::MostLiked => found.sort_by_key(|post| Reverse(post.like_count())),
            SortKey::MostViewed => found.sort_by_key(|post| Reverse(post.view_count)),
        }
        Ok(found)
    }

    async fn find_by_author(&self, author_id: &ObjectId) -> Result<Vec<Post>, StoreError> {
        let mut found: Vec<Post> = self
            .posts
            .read()
            .await
            .values()
            .filter(|post| post.author_id == *author_id)
            .cloned()
            .collect();
        newest_first(&mut found);
        Ok(found)
    }

    async fn increment_views(&self, id: &ObjectId) -> Result<Option<Post>, StoreError> {
        self.modify(id, |post| post.view_count += 1).await
    }

    async fn update(
        &self,
        id: &ObjectId,
        changes: &PostChanges,
    ) -> Result<Option<Post>, StoreError> {
        let changes = changes.clone();
        self.modify(id, move |post| {
            changes.apply_to(post);
            post.updated_at = now();
        })
        .await
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, StoreError> {
        Ok(self.posts.write().await.remove(id).is_some())
    }

    async fn set_like(
        &self,
        id: &ObjectId,
        user_id: &ObjectId,
        liked: bool,
    ) -> Result<Option<Post>, StoreError> {
        let user_id = *user_id;
        self.modify(id, move |post| {
            if liked {
                if !post.likes.contains(&user_id) {
                    post.likes.push(user_id);
                }
            } else {
                post.likes.retain(|id| *id != user_id);
            }
        })
        .await
    }

    async fn count_published(&self) -> Result<u64, StoreError> {
        let posts = self.posts.read().await;
        Ok(posts
            .values()
            .filter(|post| post.status == PostStatus::Published)
            .count() as u64)
    }

    async fn published_like_total(&self) -> Result<u64, StoreError> {
        let posts = self.posts.read().await;
        Ok(posts
            .values()
            .filter(|post| post.status == PostStatus::Published)
            .map(|post| post.like_count() as u64)
            .sum())
    }

    async fn category_counts(&self) -> Result<Vec<CategoryCount>, StoreError> {
        let posts = self.posts.read().await;
        let mut groups = HashMap::new();
        for post in posts.values().filter(|p| p.status == PostStatus::Published) {
            *groups.entry(post.category).or_insert(0u64) += 1;
        }

        let mut counts: Vec<CategoryCount> = groups
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect();
        counts.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.category.as_str().cmp(b.category.as_str()))
        });
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::post_model::Category;

    fn post(title: &str, category: Category, created_ms: i64) -> Post {
        let stamp = mongodb::bson::DateTime::from_millis(created_ms);
        Post {
            id: ObjectId::new(),
            author_id: ObjectId::new(),
            title: title.into(),
            excerpt: "excerpt".into(),
            content: "content".into(),
            category,
            tags: vec![],
            featured_image: String::new(),
            read_time: 1,
            likes: vec![],
            view_count: 0,
            status: PostStatus::Published,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    #[actix_web::test]
    async fn search_is_literal_and_case_insensitive() {
        let store = InMemoryPostStore::new();
        store.insert(&post("Tiny Whoop (65mm)", Category::Builds, 1)).await.unwrap();
        store.insert(&post("Tiny whoop tips", Category::Tips, 2)).await.unwrap();

        let filter = PostFilter {
            search: Some("WHOOP (65".into()),
            ..PostFilter::default()
        };
        let found = store.find(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Tiny Whoop (65mm)");
    }

    #[actix_web::test]
    async fn most_liked_breaks_ties_by_recency() {
        let store = InMemoryPostStore::new();
        let mut older = post("older", Category::Racing, 1);
        older.likes = vec![ObjectId::new()];
        let mut newer = post("newer", Category::Racing, 2);
        newer.likes = vec![ObjectId::new()];
        let mut top = post("top", Category::Racing, 0);
        top.likes = vec![ObjectId::new(), ObjectId::new()];
        for p in [&older, &newer, &top] {
            store.insert(p).await.unwrap();
        }

        let filter = PostFilter {
            sort: SortKey::MostLiked,
            ..PostFilter::default()
        };
        let titles: Vec<String> = store
            .find(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["top", "newer", "older"]);
    }

    #[actix_web::test]
    async fn like_set_never_holds_duplicates() {
        let store = InMemoryPostStore::new();
        let p = post("p", Category::Tips, 1);
        store.insert(&p).await.unwrap();
        let user = ObjectId::new();

        store.set_like(&p.id, &user, true).await.unwrap();
        let after = store.set_like(&p.id, &user, true).await.unwrap().unwrap();
        assert_eq!(after.likes, vec![user]);

        let after = store.set_like(&p.id, &user, false).await.unwrap().unwrap();
        assert!(after.likes.is_empty());
    }

    #[actix_web::test]
    async fn duplicate_email_is_rejected() {
        let store = InMemoryUserStore::new();
        let stamp = now();
        let user = User {
            id: ObjectId::new(),
            firebase_uid: "ext-1".into(),
            email: "a@x.com".into(),
            name: "a".into(),
            image: String::new(),
            provider: "firebase".into(),
            created_at: stamp,
            last_login: stamp,
        };
        store.insert(&user).await.unwrap();

        let clash = User {
            id: ObjectId::new(),
            firebase_uid: "ext-2".into(),
            ..user
        };
        assert!(matches!(
            store.insert(&clash).await,
            Err(StoreError::Duplicate(_))
        ));
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
