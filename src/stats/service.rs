use std::sync::Arc;

use crate::database::{CategoryCount, PostStore, UserStore};
use crate::post::post_model::Category;
use crate::stats::model::CommunityStats;
use crate::utils::error::CustomError;

/// Read-only aggregates. Each figure is computed on demand from the stores,
/// so a snapshot may straddle a concurrent write.
pub struct StatsService {
    posts: Arc<dyn PostStore>,
    users: Arc<dyn UserStore>,
}

impl StatsService {
    pub fn new(posts: Arc<dyn PostStore>, users: Arc<dyn UserStore>) -> Self {
        StatsService { posts, users }
    }

    pub async fn get_stats(&self) -> Result<CommunityStats, CustomError> {
        Ok(CommunityStats {
            total_posts: self.posts.count_published().await?,
            total_users: self.users.count().await?,
            total_likes: self.posts.published_like_total().await?,
            categories: Category::ALL.len(),
        })
    }

    pub async fn get_category_counts(&self) -> Result<Vec<CategoryCount>, CustomError> {
        Ok(self.posts.category_counts().await?)
    }
}
