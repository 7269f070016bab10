pub mod engagement;
pub mod error;
pub mod goals;
pub mod handle;
pub mod likes;
pub mod schema;
pub mod store;
pub mod stories;
pub mod users;

pub use engagement::Engagement;
pub use error::{Result, StoreError};
pub use goals::GoalTracker;
pub use handle::{DEFAULT_REQUEST_TIMEOUT, StoreHandle};
pub use likes::EngagementLedger;
pub use store::{GoalIncrement, Store, StoreStats, StoryRemoval, ViewRecord};
pub use stories::StoryLifecycle;
pub use users::UserDirectory;
