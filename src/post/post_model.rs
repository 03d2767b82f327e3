use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};

use crate::user::model::User;
use crate::utils::error::{CustomError, FieldError};
use crate::utils::helpers::{estimate_read_time, to_chrono};

pub const EXCERPT_MAX_CHARS: usize = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Freestyle,
    Racing,
    Cinematic,
    Builds,
    Reviews,
    Tips,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Freestyle,
        Category::Racing,
        Category::Cinematic,
        Category::Builds,
        Category::Reviews,
        Category::Tips,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Freestyle => "Freestyle",
            Category::Racing => "Racing",
            Category::Cinematic => "Cinematic",
            Category::Builds => "Builds",
            Category::Reviews => "Reviews",
            Category::Tips => "Tips",
        }
    }
}

impl FromStr for Category {
    type Err = ();

    /// Exact, case-sensitive match.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or(())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Published,
    Draft,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Published => "published",
            PostStatus::Draft => "draft",
        }
    }
}

impl FromStr for PostStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "published" => Ok(PostStatus::Published),
            "draft" => Ok(PostStatus::Draft),
            _ => Err(()),
        }
    }
}

/// A blog post as stored in the `blogposts` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub author_id: ObjectId,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub category: Category,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured_image: String,
    pub read_time: u32,
    #[serde(default)]
    pub likes: Vec<ObjectId>,
    #[serde(default)]
    pub view_count: i64,
    #[serde(default)]
    pub status: PostStatus,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

impl Post {
    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub fn is_liked_by(&self, user_id: &ObjectId) -> bool {
        self.likes.contains(user_id)
    }
}

/// Field-level changes applied by an owner update. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostChanges {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub category: Option<Category>,
    pub tags: Option<Vec<String>>,
    pub featured_image: Option<String>,
    pub read_time: Option<u32>,
    pub status: Option<PostStatus>,
}

impl PostChanges {
    pub fn apply_to(&self, post: &mut Post) {
        if let Some(title) = &self.title {
            post.title = title.clone();
        }
        if let Some(excerpt) = &self.excerpt {
            post.excerpt = excerpt.clone();
        }
        if let Some(content) = &self.content {
            post.content = content.clone();
        }
        if let Some(category) = self.category {
            post.category = category;
        }
        if let Some(tags) = &self.tags {
            post.tags = tags.clone();
        }
        if let Some(image) = &self.featured_image {
            post.featured_image = image.clone();
        }
        if let Some(read_time) = self.read_time {
            post.read_time = read_time;
        }
        if let Some(status) = self.status {
            post.status = status;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Latest,
    MostLiked,
    MostViewed,
}

impl SortKey {
    /// Unknown keys fall back to `Latest`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("mostLiked") | Some("likes") => SortKey::MostLiked,
            Some("mostViewed") | Some("views") => SortKey::MostViewed,
            _ => SortKey::Latest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PostFilter {
    pub search: Option<String>,
    /// Compared verbatim against the stored category name.
    pub category: Option<String>,
    pub status: PostStatus,
    pub sort: SortKey,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort_by: Option<String>,
    pub status: Option<String>,
}

impl ListPostsQuery {
    pub fn into_filter(self) -> Result<PostFilter, CustomError> {
        let status = match self.status.as_deref().filter(|s| !s.is_empty()) {
            None => PostStatus::Published,
            Some(raw) => raw.parse().map_err(|_| {
                CustomError::ValidationError(vec![FieldError::new(
                    "status",
                    "Status must be published or draft",
                )])
            })?,
        };

        Ok(PostFilter {
            search: self.search.filter(|s| !s.is_empty()),
            category: self.category.filter(|c| !c.is_empty() && c != "All"),
            status,
            sort: SortKey::parse(self.sort_by.as_deref()),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: String,
    pub tags: Option<Vec<String>>,
    pub featured_image: Option<String>,
    pub read_time: Option<i64>,
    pub status: Option<String>,
}

/// Fields of a create request after validation and defaulting.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub featured_image: String,
    pub read_time: u32,
    pub status: PostStatus,
}

impl CreatePostRequest {
    /// Same checks as `validate`, keeping the request.
    pub fn check(&self) -> Result<(), CustomError> {
        self.clone().validate().map(|_| ())
    }

    /// Checks every field and reports all violations at once.
    pub fn validate(self) -> Result<NewPost, CustomError> {
        let mut errors = Vec::new();

        let title = self.title.trim().to_string();
        let excerpt = self.excerpt.trim().to_string();
        let content = self.content.trim().to_string();

        check_title(&title, &mut errors);
        check_excerpt(&excerpt, &mut errors);
        check_content(&content, &mut errors);
        let category = check_category(&self.category, &mut errors);
        let status = match self.status.as_deref().filter(|s| !s.is_empty()) {
            None => Some(PostStatus::Published),
            Some(raw) => check_status(raw, &mut errors),
        };
        // Zero or negative means "not supplied".
        let supplied_read_time = self
            .read_time
            .filter(|minutes| *minutes > 0)
            .and_then(|minutes| check_read_time(minutes, &mut errors));

        let (Some(category), Some(status), true) = (category, status, errors.is_empty()) else {
            return Err(CustomError::ValidationError(errors));
        };

        let read_time = supplied_read_time.unwrap_or_else(|| estimate_read_time(&content));

        Ok(NewPost {
            title,
            excerpt,
            content,
            category,
            tags: self.tags.unwrap_or_default(),
            featured_image: self.featured_image.unwrap_or_default(),
            read_time,
            status,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub featured_image: Option<String>,
    pub read_time: Option<i64>,
    pub status: Option<String>,
}

impl UpdatePostRequest {
    /// Validates only the fields that were supplied.
    pub fn validate(self) -> Result<PostChanges, CustomError> {
        let mut errors = Vec::new();
        let mut changes = PostChanges {
            tags: self.tags,
            featured_image: self.featured_image,
            ..PostChanges::default()
        };

        if let Some(title) = self.title {
            let title = title.trim().to_string();
            check_title(&title, &mut errors);
            changes.title = Some(title);
        }
        if let Some(excerpt) = self.excerpt {
            let excerpt = excerpt.trim().to_string();
            check_excerpt(&excerpt, &mut errors);
            changes.excerpt = Some(excerpt);
        }
        if let Some(content) = self.content {
            let content = content.trim().to_string();
            check_content(&content, &mut errors);
            changes.content = Some(content);
        }
        if let Some(category) = self.category {
            changes.category = check_category(&category, &mut errors);
        }
        if let Some(status) = self.status {
            changes.status = check_status(&status, &mut errors);
        }
        if let Some(minutes) = self.read_time {
            changes.read_time = check_read_time(minutes, &mut errors);
        }

        if errors.is_empty() {
            Ok(changes)
        } else {
            Err(CustomError::ValidationError(errors))
        }
    }
}

fn check_title(title: &str, errors: &mut Vec<FieldError>) {
    if title.is_empty() {
        errors.push(FieldError::new("title", "Title required"));
    }
}

fn check_excerpt(excerpt: &str, errors: &mut Vec<FieldError>) {
    if excerpt.is_empty() || excerpt.chars().count() > EXCERPT_MAX_CHARS {
        errors.push(FieldError::new("excerpt", "Excerpt required (max 150 chars)"));
    }
}

fn check_content(content: &str, errors: &mut Vec<FieldError>) {
    if content.is_empty() {
        errors.push(FieldError::new("content", "Content required"));
    }
}

fn check_category(raw: &str, errors: &mut Vec<FieldError>) -> Option<Category> {
    let category = raw.parse::<Category>().ok();
    if category.is_none() {
        errors.push(FieldError::new("category", "Valid category required"));
    }
    category
}

fn check_read_time(minutes: i64, errors: &mut Vec<FieldError>) -> Option<u32> {
    let read_time = u32::try_from(minutes).ok().filter(|m| *m > 0);
    if read_time.is_none() {
        errors.push(FieldError::new(
            "readTime",
            "Read time must be a positive number of minutes",
        ));
    }
    read_time
}

fn check_status(raw: &str, errors: &mut Vec<FieldError>) -> Option<PostStatus> {
    let status = raw.parse::<PostStatus>().ok();
    if status.is_none() {
        errors.push(FieldError::new("status", "Status must be published or draft"));
    }
    status
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: String,
}

impl From<&User> for AuthorSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_hex(),
            name: user.name.clone(),
            email: user.email.clone(),
            image: user.image.clone(),
        }
    }
}

/// A post as returned by the API: author resolved, ids as hex, counts added.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(rename = "_id")]
    pub id: String,
    /// `null` when the author record no longer resolves.
    #[serde(rename = "authorId")]
    pub author: Option<AuthorSummary>,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub featured_image: String,
    pub read_time: u32,
    pub likes: Vec<String>,
    pub view_count: i64,
    pub status: PostStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub like_count: usize,
    pub comment_count: u32,
}

impl PostView {
    pub fn new(post: Post, author: Option<&User>) -> Self {
        let like_count = post.like_count();
        Self {
            id: post.id.to_hex(),
            author: author.map(AuthorSummary::from),
            title: post.title,
            excerpt: post.excerpt,
            content: post.content,
            category: post.category,
            tags: post.tags,
            featured_image: post.featured_image,
            read_time: post.read_time,
            likes: post.likes.iter().map(|id| id.to_hex()).collect(),
            view_count: post.view_count,
            status: post.status,
            created_at: to_chrono(post.created_at),
            updated_at: to_chrono(post.updated_at),
            like_count,
            comment_count: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeOutcome {
    pub liked: bool,
    pub like_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorStats {
    pub total_posts: usize,
    pub total_likes: usize,
    pub total_views: i64,
}

#[derive(Debug, Serialize)]
pub struct MyPosts {
    pub blogs: Vec<PostView>,
    pub stats: AuthorStats,
}
