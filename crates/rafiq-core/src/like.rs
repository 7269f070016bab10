use serde::Serialize;

/// Aggregate like state of one post as seen by one caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeInfo {
    /// Number of distinct users who currently like the post.
    pub count: u64,
    pub liked_by_caller: bool,
}
