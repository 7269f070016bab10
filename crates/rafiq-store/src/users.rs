use rafiq_core::{EngagementError, Result, UserId};

use crate::handle::StoreHandle;

/// Display names for user ids, filled in by whoever issues identities.
#[derive(Clone)]
pub struct UserDirectory {
    store: StoreHandle,
}

impl UserDirectory {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    pub async fn upsert_user(&self, id: UserId, name: &str) -> Result<()> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(EngagementError::validation("user name is required"));
        }
        self.store.call(move |s| s.upsert_user(id, &name)).await
    }

    pub async fn user_name(&self, id: UserId) -> Result<Option<String>> {
        self.store.call(move |s| s.user_name(id)).await
    }
}
