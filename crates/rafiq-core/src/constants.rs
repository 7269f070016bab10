pub const SECS_PER_DAY: i64 = 86_400;

/// Length of a tasbih goal window, fixed when the goal is created.
pub const GOAL_WINDOW_SECS: i64 = 7 * SECS_PER_DAY;

/// Longest accepted goal text, in characters.
pub const MAX_GOAL_TEXT_CHARS: usize = 500;
