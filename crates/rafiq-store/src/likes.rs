//! Per-post likes. Liking is insert-if-absent; the loser of a race sees
//! [`EngagementError::Duplicate`], which callers report as "already liked".

use std::sync::Arc;

use rafiq_core::{Clock, EngagementError, LikeInfo, PostId, Result, UserId};

use crate::handle::StoreHandle;

#[derive(Clone)]
pub struct EngagementLedger {
    store: StoreHandle,
    clock: Arc<dyn Clock>,
}

impl EngagementLedger {
    pub fn new(store: StoreHandle, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn like(&self, post: PostId, user: UserId) -> Result<()> {
        let now = self.clock.now();
        let inserted = self
            .store
            .call(move |s| s.insert_like_if_absent(post, user, now))
            .await?;
        if !inserted {
            return Err(EngagementError::duplicate(format!(
                "user {user} already likes post {post}"
            )));
        }
        tracing::debug!(post, user, "post liked");
        Ok(())
    }

    /// Removing a like that does not exist is not an error.
    pub async fn unlike(&self, post: PostId, user: UserId) -> Result<()> {
        let removed = self.store.call(move |s| s.delete_like(post, user)).await?;
        if removed {
            tracing::debug!(post, user, "post unliked");
        }
        Ok(())
    }

    pub async fn like_info(&self, post: PostId, user: UserId) -> Result<LikeInfo> {
        self.store.call(move |s| s.like_info(post, user)).await
    }

    pub async fn liked_post_ids(&self, user: UserId) -> Result<Vec<PostId>> {
        self.store.call(move |s| s.liked_post_ids(user)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rafiq_core::ManualClock;

    fn ledger() -> EngagementLedger {
        EngagementLedger::new(
            StoreHandle::open_in_memory().unwrap(),
            Arc::new(ManualClock::new(1_000)),
        )
    }

    #[tokio::test]
    async fn test_second_like_is_duplicate_until_unliked() {
        let ledger = ledger();
        ledger.like(5, 1).await.unwrap();

        let err = ledger.like(5, 1).await.unwrap_err();
        assert!(matches!(err, EngagementError::Duplicate(_)));

        ledger.unlike(5, 1).await.unwrap();
        ledger.like(5, 1).await.unwrap();
        assert_eq!(ledger.like_info(5, 1).await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_unlike_without_like_succeeds() {
        let ledger = ledger();
        ledger.unlike(5, 1).await.unwrap();
        ledger.unlike(5, 1).await.unwrap();
    }

    #[tokio::test]
    async fn test_count_tracks_distinct_likers_through_interleavings() {
        let ledger = ledger();
        ledger.like(5, 1).await.unwrap();
        ledger.like(5, 2).await.unwrap();
        let _ = ledger.like(5, 1).await;
        ledger.unlike(5, 2).await.unwrap();
        ledger.like(5, 3).await.unwrap();
        ledger.unlike(5, 4).await.unwrap();
        ledger.like(5, 2).await.unwrap();

        let info = ledger.like_info(5, 3).await.unwrap();
        assert_eq!(info.count, 3);
        assert!(info.liked_by_caller);
        assert!(!ledger.like_info(5, 4).await.unwrap().liked_by_caller);
    }

    #[tokio::test]
    async fn test_liked_post_ids() {
        let ledger = ledger();
        ledger.like(5, 1).await.unwrap();
        ledger.like(6, 1).await.unwrap();
        ledger.like(6, 2).await.unwrap();

        let mut ids = ledger.liked_post_ids(1).await.unwrap();
        ids.sort_unstable();
        assert_eq!(ids, vec![5, 6]);
    }

    #[tokio::test]
    async fn test_racing_likes_have_one_winner() {
        let ledger = ledger();
        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.like(9, 1).await })
            })
            .collect();

        let mut ok = 0;
        let mut duplicate = 0;
        for t in tasks {
            match t.await.unwrap() {
                Ok(()) => ok += 1,
                Err(EngagementError::Duplicate(_)) => duplicate += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!((ok, duplicate), (1, 15));
        assert_eq!(ledger.like_info(9, 1).await.unwrap().count, 1);
    }
}
