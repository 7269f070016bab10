//! Story lifecycle: creation with a TTL, expiry-filtered reads, idempotent
//! views, owner-only deletion.
//!
//! Visibility is evaluated against the clock inside every read; nothing here
//! remembers a previous answer.

use std::sync::Arc;

use rafiq_core::{
    Clock, EngagementError, MediaStore, NewStory, Result, Story, StoryFeedItem, StoryId,
    StoryScope, UserId,
};

use crate::handle::StoreHandle;
use crate::store::{StoryRemoval, ViewRecord};

#[derive(Clone)]
pub struct StoryLifecycle {
    store: StoreHandle,
    clock: Arc<dyn Clock>,
    media: Arc<dyn MediaStore>,
}

impl StoryLifecycle {
    pub fn new(store: StoreHandle, clock: Arc<dyn Clock>, media: Arc<dyn MediaStore>) -> Self {
        Self {
            store,
            clock,
            media,
        }
    }

    pub async fn create_story(&self, owner: UserId, request: NewStory) -> Result<Story> {
        let draft = request.into_draft(owner, self.clock.now())?;
        let story = self.store.call(move |s| s.insert_story(&draft)).await?;
        tracing::debug!(story_id = story.id, owner, expires_at = ?story.expires_at, "story created");
        Ok(story)
    }

    pub async fn list_visible_stories(
        &self,
        viewer: UserId,
        scope: StoryScope,
    ) -> Result<Vec<StoryFeedItem>> {
        let now = self.clock.now();
        self.store
            .call(move |s| s.list_visible_stories(viewer, scope.owner(), now))
            .await
    }

    pub async fn get_story(&self, id: StoryId, viewer: UserId) -> Result<StoryFeedItem> {
        let now = self.clock.now();
        self.store
            .call(move |s| s.visible_story(id, viewer, now))
            .await?
            .ok_or_else(|| EngagementError::not_found(format!("story {id} not found or expired")))
    }

    pub async fn record_view(&self, id: StoryId, viewer: UserId) -> Result<()> {
        let now = self.clock.now();
        match self.store.call(move |s| s.record_view(id, viewer, now)).await? {
            ViewRecord::NotVisible => Err(EngagementError::not_found(format!(
                "story {id} not found or expired"
            ))),
            ViewRecord::Inserted => {
                tracing::debug!(story_id = id, viewer, "story view recorded");
                Ok(())
            }
            ViewRecord::AlreadyViewed => Ok(()),
        }
    }

    /// Remove a story, its views, and its media. Owners may delete their
    /// stories after expiry too.
    pub async fn delete_story(&self, id: StoryId, caller: UserId) -> Result<()> {
        match self.store.call(move |s| s.remove_story(id, caller)).await? {
            StoryRemoval::Missing => Err(EngagementError::not_found(format!("story {id} not found"))),
            StoryRemoval::NotOwner => Err(EngagementError::forbidden(format!(
                "user {caller} does not own story {id}"
            ))),
            StoryRemoval::Removed(story) => {
                self.media
                    .release(&story.media_ref)
                    .map_err(|e| EngagementError::Store(Box::new(e)))?;
                tracing::debug!(story_id = id, media_ref = %story.media_ref, "story deleted");
                Ok(())
            }
        }
    }
}
