//! Tasbih goal tracking and friend visibility.
//!
//! Counts move only through [`GoalTracker::increment_goal`], which hands the
//! addition to the store as one conditional update so parallel callers never
//! lose each other's increments. Streaks are stored but not recomputed.

use std::sync::Arc;

use rafiq_core::{
    Clock, EngagementError, FriendLink, FriendLinkId, FriendProgress, GoalId, GoalSnapshot,
    NewGoal, Result, UserId, parse_delta,
};

use crate::handle::StoreHandle;
use crate::store::GoalIncrement;

#[derive(Clone)]
pub struct GoalTracker {
    store: StoreHandle,
    clock: Arc<dyn Clock>,
}

impl GoalTracker {
    pub fn new(store: StoreHandle, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn create_goal(&self, owner: UserId, request: NewGoal) -> Result<GoalSnapshot> {
        let now = self.clock.now();
        let draft = request.into_draft(owner, now)?;
        let goal = self.store.call(move |s| s.insert_goal(&draft)).await?;
        tracing::debug!(goal_id = goal.id, owner, target = goal.target_count, "goal created");
        Ok(goal.snapshot(now))
    }

    /// Add `delta` (a raw request value) to a goal's count.
    pub async fn increment_goal(&self, id: GoalId, delta: &serde_json::Value) -> Result<GoalSnapshot> {
        let delta = parse_delta(delta)?;
        let now = self.clock.now();
        let goal = match self.store.call(move |s| s.increment_goal(id, delta, now)).await? {
            GoalIncrement::Applied(goal) => goal,
            GoalIncrement::OutOfRange => {
                return Err(EngagementError::validation(format!(
                    "increment of {delta} would overflow the count of goal {id}"
                )));
            }
            GoalIncrement::Missing => {
                return Err(EngagementError::not_found(format!("goal {id} not found")));
            }
        };
        tracing::debug!(goal_id = id, delta, count = goal.current_count, "goal incremented");
        Ok(goal.snapshot(now))
    }

    /// Every goal of `owner`, including those past their window.
    pub async fn list_goals(&self, owner: UserId) -> Result<Vec<GoalSnapshot>> {
        let now = self.clock.now();
        let goals = self.store.call(move |s| s.list_goals(owner)).await?;
        Ok(goals.into_iter().map(|g| g.snapshot(now)).collect())
    }

    pub async fn list_friends_progress(&self, owner: UserId) -> Result<Vec<FriendProgress>> {
        self.store.call(move |s| s.friends_progress(owner)).await
    }

    pub async fn set_goal_privacy(&self, link: FriendLinkId, is_public: bool) -> Result<()> {
        let found = self
            .store
            .call(move |s| s.set_friend_link_privacy(link, is_public))
            .await?;
        if !found {
            return Err(EngagementError::not_found(format!("friend link {link} not found")));
        }
        tracing::debug!(link, is_public, "friend link privacy updated");
        Ok(())
    }

    pub async fn link_friend(
        &self,
        owner: UserId,
        friend: UserId,
        is_public: bool,
    ) -> Result<FriendLink> {
        if owner == friend {
            return Err(EngagementError::validation("cannot link a user to themselves"));
        }
        let link = self
            .store
            .call(move |s| s.insert_friend_link_if_absent(owner, friend, is_public))
            .await?
            .ok_or_else(|| {
                EngagementError::duplicate(format!("user {owner} already links to {friend}"))
            })?;
        tracing::debug!(link = link.id, owner, friend, is_public, "friend linked");
        Ok(link)
    }
}
