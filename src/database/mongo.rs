//! MongoDB implementations of the storage seams.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{self, Bson, Document, doc, oid::ObjectId};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::Collection;
use mongodb::options::ReturnDocument;

use crate::database::db::Database;
use crate::database::store::{CategoryCount, PostStore, StoreError, UserStore};
use crate::post::post_model::{Category, Post, PostChanges, PostFilter, PostStatus, SortKey};
use crate::user::model::User;
use crate::utils::helpers::now;

pub const USERS_COLLECTION: &str = "users";
pub const POSTS_COLLECTION: &str = "blogposts";

const DUPLICATE_KEY: i32 = 11000;

impl From<MongoError> for StoreError {
    fn from(err: MongoError) -> Self {
        match *err.kind {
            ErrorKind::Write(WriteFailure::WriteError(ref write_error))
                if write_error.code == DUPLICATE_KEY =>
            {
                StoreError::Duplicate(write_error.message.clone())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

impl From<bson::de::Error> for StoreError {
    fn from(err: bson::de::Error) -> Self {
        StoreError::Backend(format!("Malformed document: {}", err))
    }
}

pub struct MongoUserStore {
    database: Database,
    collection: Collection<User>,
}

impl MongoUserStore {
    pub fn new(database: &Database) -> Self {
        let collection = database.db.collection::<User>(USERS_COLLECTION);
        MongoUserStore {
            database: database.clone(),
            collection,
        }
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .collection
            .find_one(doc! { "firebaseUid": external_id })
            .await?)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>, StoreError> {
        Ok(self.collection.find_one(doc! { "_id": *id }).await?)
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<User>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self
            .collection
            .find(doc! { "_id": { "$in": ids.to_vec() } })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        self.collection.insert_one(user).await?;
        Ok(())
    }

    async fn replace(&self, user: &User) -> Result<(), StoreError> {
        self.collection
            .replace_one(doc! { "_id": user.id }, user)
            .await?;
        Ok(())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.database.ping().await
    }
}

pub struct MongoPostStore {
    collection: Collection<Post>,
}

impl MongoPostStore {
    pub fn new(database: &Database) -> Self {
        let collection = database.db.collection::<Post>(POSTS_COLLECTION);
        MongoPostStore { collection }
    }

    fn published() -> Document {
        doc! { "status": PostStatus::Published.as_str() }
    }

    async fn find_one_and_update(
        &self,
        id: &ObjectId,
        update: Document,
    ) -> Result<Option<Post>, StoreError> {
        Ok(self
            .collection
            .find_one_and_update(doc! { "_id": *id }, update)
            .return_document(ReturnDocument::After)
            .await?)
    }
}

/// Match stage for a listing filter.
fn filter_document(filter: &PostFilter) -> Document {
    let mut query = doc! { "status": filter.status.as_str() };

    if let Some(search) = &filter.search {
        let pattern = regex::escape(search);
        query.insert(
            "$or",
            vec![
                doc! { "title": { "$regex": pattern.as_str(), "$options": "i" } },
                doc! { "content": { "$regex": pattern.as_str(), "$options": "i" } },
                doc! { "excerpt": { "$regex": pattern.as_str(), "$options": "i" } },
            ],
        );
    }

    if let Some(category) = &filter.category {
        query.insert("category", category.as_str());
    }

    query
}

fn sort_document(sort: SortKey) -> Document {
    match sort {
        SortKey::Latest => doc! { "createdAt": -1, "_id": -1 },
        SortKey::MostLiked => doc! { "likeCount": -1, "createdAt": -1, "_id": -1 },
        SortKey::MostViewed => doc! { "viewCount": -1, "createdAt": -1, "_id": -1 },
    }
}

fn changes_document(changes: &PostChanges) -> Document {
    let mut set = doc! { "updatedAt": now() };

    if let Some(title) = &changes.title {
        set.insert("title", title.as_str());
    }
    if let Some(excerpt) = &changes.excerpt {
        set.insert("excerpt", excerpt.as_str());
    }
    if let Some(content) = &changes.content {
        set.insert("content", content.as_str());
    }
    if let Some(category) = changes.category {
        set.insert("category", category.as_str());
    }
    if let Some(tags) = &changes.tags {
        set.insert("tags", tags.clone());
    }
    if let Some(image) = &changes.featured_image {
        set.insert("featuredImage", image.as_str());
    }
    if let Some(read_time) = changes.read_time {
        set.insert("readTime", i64::from(read_time));
    }
    if let Some(status) = changes.status {
        set.insert("status", status.as_str());
    }

    doc! { "$set": set }
}

fn as_count(value: Option<&Bson>) -> u64 {
    match value {
        Some(Bson::Int32(n)) => u64::try_from(*n).unwrap_or(0),
        Some(Bson::Int64(n)) => u64::try_from(*n).unwrap_or(0),
        Some(Bson::Double(n)) if *n > 0.0 => *n as u64,
        _ => 0,
    }
}

#[async_trait]
impl PostStore for MongoPostStore {
    async fn insert(&self, post: &Post) -> Result<(), StoreError> {
        self.collection.insert_one(post).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Post>, StoreError> {
        Ok(self.collection.find_one(doc! { "_id": *id }).await?)
    }

    async fn find(&self, filter: &PostFilter) -> Result<Vec<Post>, StoreError> {
        let pipeline = vec![
            doc! { "$match": filter_document(filter) },
            doc! { "$addFields": { "likeCount": { "$size": "$likes" } } },
            doc! { "$sort": sort_document(filter.sort) },
            doc! { "$project": { "likeCount": 0 } },
        ];

        let documents: Vec<Document> = self
            .collection
            .aggregate(pipeline)
            .await?
            .try_collect()
            .await?;
        documents
            .into_iter()
            .map(|document| bson::from_document::<Post>(document).map_err(StoreError::from))
            .collect()
    }

    async fn find_by_author(&self, author_id: &ObjectId) -> Result<Vec<Post>, StoreError> {
        let cursor = self
            .collection
            .find(doc! { "authorId": *author_id })
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn increment_views(&self, id: &ObjectId) -> Result<Option<Post>, StoreError> {
        self.find_one_and_update(id, doc! { "$inc": { "viewCount": 1_i64 } })
            .await
    }

    async fn update(
        &self,
        id: &ObjectId,
        changes: &PostChanges,
    ) -> Result<Option<Post>, StoreError> {
        self.find_one_and_update(id, changes_document(changes)).await
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, StoreError> {
        let result = self.collection.delete_one(doc! { "_id": *id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn set_like(
        &self,
        id: &ObjectId,
        user_id: &ObjectId,
        liked: bool,
    ) -> Result<Option<Post>, StoreError> {
        let update = if liked {
            doc! { "$addToSet": { "likes": *user_id } }
        } else {
            doc! { "$pull": { "likes": *user_id } }
        };
        self.find_one_and_update(id, update).await
    }

    async fn count_published(&self) -> Result<u64, StoreError> {
        Ok(self.collection.count_documents(Self::published()).await?)
    }

    async fn published_like_total(&self) -> Result<u64, StoreError> {
        let pipeline = vec![
            doc! { "$match": Self::published() },
            doc! { "$group": { "_id": Bson::Null, "total": { "$sum": { "$size": "$likes" } } } },
        ];

        let groups: Vec<Document> = self.collection.aggregate(pipeline).await?.try_collect().await?;
        Ok(groups
            .first()
            .map(|group| as_count(group.get("total")))
            .unwrap_or(0))
    }

    async fn category_counts(&self) -> Result<Vec<CategoryCount>, StoreError> {
        let pipeline = vec![
            doc! { "$match": Self::published() },
            doc! { "$group": { "_id": "$category", "count": { "$sum": 1 } } },
            doc! { "$sort": { "count": -1, "_id": 1 } },
        ];

        let groups: Vec<Document> = self.collection.aggregate(pipeline).await?.try_collect().await?;
        let mut counts = Vec::with_capacity(groups.len());
        for group in groups {
            let Ok(name) = group.get_str("_id") else {
                continue;
            };
            let Ok(category) = name.parse::<Category>() else {
                continue;
            };
            counts.push(CategoryCount {
                category,
                count: as_count(group.get("count")),
            });
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_escapes_search_and_matches_category_exactly() {
        let filter = PostFilter {
            search: Some("5\" (quad)".into()),
            category: Some("Racing".into()),
            ..PostFilter::default()
        };

        let query = filter_document(&filter);
        assert_eq!(query.get_str("status").unwrap(), "published");
        assert_eq!(query.get_str("category").unwrap(), "Racing");

        let clauses = query.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 3);
        let title = clauses[0].as_document().unwrap().get_document("title").unwrap();
        assert_eq!(title.get_str("$regex").unwrap(), r#"5" \(quad\)"#);
        assert_eq!(title.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn filter_without_search_has_no_or_clause() {
        let query = filter_document(&PostFilter::default());
        assert!(query.get("$or").is_none());
        assert!(query.get("category").is_none());
    }

    #[test]
    fn sort_keys_map_to_fields() {
        assert!(sort_document(SortKey::Latest).contains_key("createdAt"));
        assert_eq!(
            sort_document(SortKey::MostLiked).keys().next().map(String::as_str),
            Some("likeCount")
        );
        assert_eq!(
            sort_document(SortKey::MostViewed).keys().next().map(String::as_str),
            Some("viewCount")
        );
    }

    #[test]
    fn changes_only_set_supplied_fields() {
        let changes = PostChanges {
            featured_image: Some(String::new()),
            read_time: Some(4),
            ..PostChanges::default()
        };
        let update = changes_document(&changes);
        let set = update.get_document("$set").unwrap();

        assert!(set.contains_key("updatedAt"));
        assert_eq!(set.get_str("featuredImage").unwrap(), "");
        assert_eq!(set.get_i64("readTime").unwrap(), 4);
        assert!(!set.contains_key("title"));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn aggregate_counts_accept_any_integer_width() {
        assert_eq!(as_count(Some(&Bson::Int32(4))), 4);
        assert_eq!(as_count(Some(&Bson::Int64(9))), 9);
        assert_eq!(as_count(None), 0);
    }
}
