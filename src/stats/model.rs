use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityStats {
    pub total_posts: u64,
    pub total_users: u64,
    pub total_likes: u64,
    /// Number of defined categories, not the number in use.
    pub categories: usize,
}
