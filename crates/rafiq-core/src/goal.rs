//! Tasbih goals: a counter toward a target inside a fixed seven-day window.
//!
//! The window is fixed at creation and never extended. Expired goals are not
//! archived or renewed; readers get every goal and [`GoalState`] tells them
//! where each one stands.

use serde::{Deserialize, Serialize};

use crate::clock::{Timestamp, iso8601};
use crate::constants::{GOAL_WINDOW_SECS, MAX_GOAL_TEXT_CHARS};
use crate::error::{EngagementError, Result};
use crate::{FriendLinkId, GoalId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalState {
    Active,
    Expired,
}

/// Closed interval `[start, end]` during which a goal is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl GoalWindow {
    pub fn starting_at(start: Timestamp) -> Self {
        Self {
            start,
            end: start + GOAL_WINDOW_SECS,
        }
    }

    pub fn state_at(&self, t: Timestamp) -> GoalState {
        if t > self.end {
            GoalState::Expired
        } else {
            GoalState::Active
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TasbihGoal {
    pub id: GoalId,
    pub owner_id: UserId,
    pub text: String,
    pub target_count: i64,
    pub current_count: i64,
    #[serde(serialize_with = "iso8601::serialize")]
    pub start_date: Timestamp,
    #[serde(serialize_with = "iso8601::serialize")]
    pub end_date: Timestamp,
    /// Stored as created; nothing recomputes it.
    pub streak: i64,
    #[serde(serialize_with = "iso8601::serialize")]
    pub last_updated_at: Timestamp,
}

impl TasbihGoal {
    pub fn window(&self) -> GoalWindow {
        GoalWindow {
            start: self.start_date,
            end: self.end_date,
        }
    }

    pub fn snapshot(self, now: Timestamp) -> GoalSnapshot {
        GoalSnapshot {
            status: self.window().state_at(now),
            goal: self,
        }
    }
}

/// A goal together with its window state at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSnapshot {
    #[serde(flatten)]
    pub goal: TasbihGoal,
    pub status: GoalState,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    pub text: String,
    pub target_count: i64,
    #[serde(default)]
    pub initial_count: i64,
}

impl NewGoal {
    pub fn into_draft(self, owner_id: UserId, now: Timestamp) -> Result<GoalDraft> {
        let text = self.text.trim().to_string();
        if text.is_empty() {
            return Err(EngagementError::validation("goal text is required"));
        }
        if text.chars().count() > MAX_GOAL_TEXT_CHARS {
            return Err(EngagementError::validation(format!(
                "goal text exceeds {MAX_GOAL_TEXT_CHARS} characters"
            )));
        }
        if self.target_count <= 0 {
            return Err(EngagementError::validation("target count must be positive"));
        }
        if self.initial_count < 0 {
            return Err(EngagementError::validation(
                "initial count must not be negative",
            ));
        }

        Ok(GoalDraft {
            owner_id,
            text,
            target_count: self.target_count,
            initial_count: self.initial_count,
            window: GoalWindow::starting_at(now),
        })
    }
}

/// A validated goal not yet assigned an id. `window.start` doubles as the
/// initial `last_updated_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalDraft {
    pub owner_id: UserId,
    pub text: String,
    pub target_count: i64,
    pub initial_count: i64,
    pub window: GoalWindow,
}

/// Read an increment from a raw request value.
///
/// Only whole, non-negative numbers are counts; `0` is accepted as a no-op
/// that still touches `last_updated_at`.
pub fn parse_delta(raw: &serde_json::Value) -> Result<i64> {
    let serde_json::Value::Number(n) = raw else {
        return Err(EngagementError::validation("increment must be a number"));
    };
    let delta = match (n.as_i64(), n.as_f64()) {
        (Some(i), _) => i,
        (None, Some(f)) if f.fract() == 0.0 && f.abs() < 9.0e15 => f as i64,
        _ => {
            return Err(EngagementError::validation(
                "increment must be a whole number",
            ));
        }
    };
    if delta < 0 {
        return Err(EngagementError::validation(
            "increment must not be negative",
        ));
    }
    Ok(delta)
}

/// Whether `owner_id` may see `friend_user_id`'s goal progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendLink {
    pub id: FriendLinkId,
    pub owner_id: UserId,
    pub friend_user_id: UserId,
    pub is_public: bool,
}

/// One friend goal as exposed through a public friend link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendProgress {
    pub friend_name: String,
    pub goal_text: String,
    pub progress: i64,
    pub target: i64,
    pub streak: i64,
}
