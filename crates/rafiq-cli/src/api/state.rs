//! Shared application state.

use rafiq_store::Engagement;

/// Cloned into every handler. The components synchronize through their
/// store handle, so no outer lock is needed.
#[derive(Clone)]
pub struct AppState {
    pub engagement: Engagement,
}
