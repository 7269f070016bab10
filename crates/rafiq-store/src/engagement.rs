use std::sync::Arc;

use rafiq_core::{Clock, MediaStore, Result};

use crate::error::StoreError;
use crate::goals::GoalTracker;
use crate::handle::StoreHandle;
use crate::likes::EngagementLedger;
use crate::schema;
use crate::store::StoreStats;
use crate::stories::StoryLifecycle;
use crate::users::UserDirectory;

/// Every component wired to one store handle and one clock.
#[derive(Clone)]
pub struct Engagement {
    pub stories: StoryLifecycle,
    pub likes: EngagementLedger,
    pub goals: GoalTracker,
    pub users: UserDirectory,
    store: StoreHandle,
    clock: Arc<dyn Clock>,
}

impl Engagement {
    pub fn new(store: StoreHandle, clock: Arc<dyn Clock>, media: Arc<dyn MediaStore>) -> Self {
        Self {
            stories: StoryLifecycle::new(store.clone(), clock.clone(), media),
            likes: EngagementLedger::new(store.clone(), clock.clone()),
            goals: GoalTracker::new(store.clone(), clock.clone()),
            users: UserDirectory::new(store.clone()),
            store,
            clock,
        }
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        let now = self.clock.now();
        self.store.call(move |s| s.stats(now)).await
    }

    pub async fn schema_version(&self) -> Result<Option<i64>> {
        self.store.call(|s| schema::get_schema_version(s.conn())).await
    }

    pub async fn shutdown(&self) -> std::result::Result<(), StoreError> {
        self.store.shutdown().await
    }
}
