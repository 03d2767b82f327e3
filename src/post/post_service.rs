use std::collections::HashMap;
use std::sync::Arc;

use log::info;
use mongodb::bson::oid::ObjectId;

use crate::database::{PostStore, UserStore};
use crate::post::post_model::{
    AuthorStats, CreatePostRequest, LikeOutcome, ListPostsQuery, MyPosts, Post, PostView,
    UpdatePostRequest,
};
use crate::user::model::User;
use crate::utils::error::CustomError;
use crate::utils::helpers::{now, parse_object_id};

fn post_not_found() -> CustomError {
    CustomError::NotFoundError("Blog post not found".to_string())
}

pub struct PostService {
    posts: Arc<dyn PostStore>,
    users: Arc<dyn UserStore>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostStore>, users: Arc<dyn UserStore>) -> Self {
        PostService { posts, users }
    }

    /// Resolves authors for a batch of posts in one lookup.
    async fn render(&self, posts: Vec<Post>) -> Result<Vec<PostView>, CustomError> {
        let mut author_ids: Vec<ObjectId> = posts.iter().map(|p| p.author_id).collect();
        author_ids.sort_unstable_by_key(|id| id.bytes());
        author_ids.dedup();

        let authors: HashMap<ObjectId, User> = self
            .users
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|user| (user.id, user))
            .collect();

        Ok(posts
            .into_iter()
            .map(|post| {
                let author = authors.get(&post.author_id);
                PostView::new(post, author)
            })
            .collect())
    }

    async fn render_one(&self, post: Post) -> Result<PostView, CustomError> {
        let author = self.users.find_by_id(&post.author_id).await?;
        Ok(PostView::new(post, author.as_ref()))
    }

    /// Loads a post and checks that `requester_id` wrote it.
    async fn owned_post(
        &self,
        post_id: &ObjectId,
        requester_id: &ObjectId,
        action: &str,
    ) -> Result<Post, CustomError> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(post_not_found)?;

        if post.author_id != *requester_id {
            return Err(CustomError::AuthorizationError(format!(
                "Not authorized to {} this post",
                action
            )));
        }
        Ok(post)
    }

    pub async fn list_posts(&self, query: ListPostsQuery) -> Result<Vec<PostView>, CustomError> {
        let filter = query.into_filter()?;
        let posts = self.posts.find(&filter).await?;
        self.render(posts).await
    }

    /// Fetches a post, counting the read. Every call adds exactly one view.
    pub async fn get_post(&self, id: &str) -> Result<PostView, CustomError> {
        let post_id = parse_object_id(id, "post")?;
        let post = self
            .posts
            .increment_views(&post_id)
            .await?
            .ok_or_else(post_not_found)?;
        self.render_one(post).await
    }

    pub async fn create_post(
        &self,
        author_id: ObjectId,
        request: CreatePostRequest,
    ) -> Result<PostView, CustomError> {
        let fields = request.validate()?;

        let author = self
            .users
            .find_by_id(&author_id)
            .await?
            .ok_or_else(|| CustomError::NotFoundError("Author not synced".to_string()))?;

        let timestamp = now();
        let post = Post {
            id: ObjectId::new(),
            author_id,
            title: fields.title,
            excerpt: fields.excerpt,
            content: fields.content,
            category: fields.category,
            tags: fields.tags,
            featured_image: fields.featured_image,
            read_time: fields.read_time,
            likes: Vec::new(),
            view_count: 0,
            status: fields.status,
            created_at: timestamp,
            updated_at: timestamp,
        };

        self.posts.insert(&post).await?;
        info!("Blog post {} created by {}", post.id, author.email);
        Ok(PostView::new(post, Some(&author)))
    }

    pub async fn update_post(
        &self,
        post_id: &str,
        requester_id: ObjectId,
        request: UpdatePostRequest,
    ) -> Result<PostView, CustomError> {
        let post_id = parse_object_id(post_id, "post")?;
        self.owned_post(&post_id, &requester_id, "update").await?;

        let changes = request.validate()?;
        let updated = self
            .posts
            .update(&post_id, &changes)
            .await?
            .ok_or_else(post_not_found)?;
        self.render_one(updated).await
    }

    pub async fn delete_post(
        &self,
        post_id: &str,
        requester_id: ObjectId,
    ) -> Result<(), CustomError> {
        let post_id = parse_object_id(post_id, "post")?;
        self.owned_post(&post_id, &requester_id, "delete").await?;

        if !self.posts.delete(&post_id).await? {
            return Err(post_not_found());
        }
        info!("Blog post {} deleted", post_id);
        Ok(())
    }

    /// Flips `user_id`'s membership in the like set.
    ///
    /// Two concurrent toggles by the same user may both observe the same
    /// starting state; the like set stays duplicate-free either way.
    pub async fn toggle_like(
        &self,
        post_id: &str,
        user_id: ObjectId,
    ) -> Result<LikeOutcome, CustomError> {
        let post_id = parse_object_id(post_id, "post")?;
        let post = self
            .posts
            .find_by_id(&post_id)
            .await?
            .ok_or_else(post_not_found)?;

        if self.users.find_by_id(&user_id).await?.is_none() {
            return Err(CustomError::NotFoundError("User not found".to_string()));
        }

        let like = !post.is_liked_by(&user_id);
        let updated = self
            .posts
            .set_like(&post_id, &user_id, like)
            .await?
            .ok_or_else(post_not_found)?;

        Ok(LikeOutcome {
            liked: updated.is_liked_by(&user_id),
            like_count: updated.like_count(),
        })
    }

    /// The author's posts in every status, newest first, with totals.
    pub async fn my_posts(&self, author_id: ObjectId) -> Result<MyPosts, CustomError> {
        let posts = self.posts.find_by_author(&author_id).await?;
        let stats = AuthorStats {
            total_posts: posts.len(),
            total_likes: posts.iter().map(Post::like_count).sum(),
            total_views: posts.iter().map(|p| p.view_count).sum(),
        };
        Ok(MyPosts {
            blogs: self.render(posts).await?,
            stats,
        })
    }
}
