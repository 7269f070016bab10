//! Engagement rules for the rafiq community backend.
//!
//! Stories expire after a time-to-live, views and likes are recorded at most
//! once per user, and tasbih goals count toward a target inside a fixed
//! seven-day window.
//!
//! Zero I/O: records and time arithmetic only. Persistence and
//! transport live in `rafiq-store` and `rafiq-cli`.

pub mod clock;
pub mod constants;
pub mod error;
pub mod goal;
pub mod like;
pub mod media;
pub mod story;

pub use clock::{Clock, ManualClock, SystemClock, Timestamp, unix_to_iso8601};
pub use constants::{GOAL_WINDOW_SECS, SECS_PER_DAY};
pub use error::{EngagementError, Result};
pub use goal::{
    FriendLink, FriendProgress, GoalDraft, GoalSnapshot, GoalState, GoalWindow, NewGoal,
    TasbihGoal, parse_delta,
};
pub use like::LikeInfo;
pub use media::{MediaStore, NoMedia};
pub use story::{MediaKind, NewStory, Overlay, Story, StoryDraft, StoryFeedItem, StoryScope, is_visible};

pub type UserId = i64;
pub type StoryId = i64;
pub type PostId = i64;
pub type GoalId = i64;
pub type FriendLinkId = i64;
