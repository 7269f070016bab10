use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior, params};
use serde::Serialize;

use rafiq_core::{
    FriendLink, FriendLinkId, FriendProgress, GoalDraft, GoalId, LikeInfo, MediaKind, Overlay,
    PostId, Story, StoryDraft, StoryFeedItem, StoryId, TasbihGoal, Timestamp, UserId,
};

use crate::error::{Result, StoreError};
use crate::schema;

const STORY_COLUMNS: &str = "s.id, s.owner_id, s.media_ref, s.media_kind, s.overlay_type, \
     s.title, s.content, s.arabic, s.translation, s.created_at, s.expires_at";

const GOAL_COLUMNS: &str = "id, owner_id, text, target_count, current_count, start_date, \
     end_date, streak, last_updated_at";

/// Result of an idempotent view insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewRecord {
    Inserted,
    AlreadyViewed,
    /// The story is absent or expired at the time of the call.
    NotVisible,
}

/// Result of an owner-checked story deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryRemoval {
    Removed(Story),
    NotOwner,
    Missing,
}

/// Result of a conditional goal increment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalIncrement {
    Applied(TasbihGoal),
    /// The count would leave `0..=i64::MAX`; nothing was written.
    OutOfRange,
    Missing,
}

/// Row counts for `rafiq stats` and the health endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub users: u64,
    pub stories_visible: u64,
    pub stories_expired: u64,
    pub story_views: u64,
    pub likes: u64,
    pub goals_active: u64,
    pub goals_expired: u64,
    pub friend_links: u64,
}

/// One SQLite connection holding every engagement relation.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Fold the WAL into the main database file and truncate it.
    pub fn checkpoint_truncate(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }

    /// Check-then-write sequences take the write lock up front so a second
    /// connection cannot slip in between the check and the write.
    fn write_transaction(&self) -> Result<Transaction<'_>> {
        Ok(Transaction::new_unchecked(
            &self.conn,
            TransactionBehavior::Immediate,
        )?)
    }

    // --- Users ---

    pub fn upsert_user(&self, id: UserId, name: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO users (id, name) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
            params![id, name],
        )?;
        Ok(())
    }

    pub fn user_name(&self, id: UserId) -> Result<Option<String>> {
        let name = self
            .conn
            .query_row("SELECT name FROM users WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(name)
    }

    // --- Stories ---

    pub fn insert_story(&self, draft: &StoryDraft) -> Result<Story> {
        let overlay = &draft.overlay;
        self.conn.execute(
            "INSERT INTO stories
                (owner_id, media_ref, media_kind, overlay_type, title, content, arabic,
                 translation, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                draft.owner_id,
                draft.media_ref,
                draft.media_kind.as_str(),
                overlay.overlay_type,
                overlay.title,
                overlay.content,
                overlay.arabic,
                overlay.translation,
                draft.created_at,
                draft.expires_at,
            ],
        )?;

        Ok(Story {
            id: self.conn.last_insert_rowid(),
            owner_id: draft.owner_id,
            media_ref: draft.media_ref.clone(),
            media_kind: draft.media_kind,
            overlay: draft.overlay.clone(),
            created_at: draft.created_at,
            expires_at: draft.expires_at,
        })
    }

    /// Fetch a story regardless of expiry.
    pub fn get_story(&self, id: StoryId) -> Result<Option<Story>> {
        let sql = format!("SELECT {STORY_COLUMNS} FROM stories s WHERE s.id = ?1");
        let row = self.conn.query_row(&sql, [id], read_story).optional()?;
        row.map(StoryRow::into_story).transpose()
    }

    /// Stories visible at `now`, newest first, annotated for `viewer`.
    /// `owner` narrows the listing to one author.
    pub fn list_visible_stories(
        &self,
        viewer: UserId,
        owner: Option<UserId>,
        now: Timestamp,
    ) -> Result<Vec<StoryFeedItem>> {
        let sql = feed_sql("(?3 IS NULL OR s.owner_id = ?3)");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows: Vec<(StoryRow, Option<String>, i64, bool)> = stmt
            .query_map(params![viewer, now, owner], read_feed_row)?
            .collect::<std::result::Result<_, _>>()?;

        rows.into_iter().map(into_feed_item).collect()
    }

    /// A single story if it is visible at `now`.
    pub fn visible_story(
        &self,
        id: StoryId,
        viewer: UserId,
        now: Timestamp,
    ) -> Result<Option<StoryFeedItem>> {
        let sql = feed_sql("s.id = ?3");
        let row = self
            .conn
            .query_row(&sql, params![viewer, now, id], read_feed_row)
            .optional()?;
        row.map(into_feed_item).transpose()
    }

    /// Record that `viewer` saw a visible story. Repeats are no-ops.
    pub fn record_view(&self, id: StoryId, viewer: UserId, now: Timestamp) -> Result<ViewRecord> {
        let tx = self.write_transaction()?;
        let visible: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM stories
                           WHERE id = ?1 AND (expires_at IS NULL OR expires_at > ?2))",
            params![id, now],
            |row| row.get(0),
        )?;
        if !visible {
            return Ok(ViewRecord::NotVisible);
        }

        let inserted = tx.execute(
            "INSERT INTO story_views (story_id, viewer_id, viewed_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(story_id, viewer_id) DO NOTHING",
            params![id, viewer, now],
        )?;
        tx.commit()?;

        Ok(if inserted == 1 {
            ViewRecord::Inserted
        } else {
            ViewRecord::AlreadyViewed
        })
    }

    pub fn view_count(&self, id: StoryId) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM story_views WHERE story_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Delete a story and its views if `caller` owns it.
    pub fn remove_story(&self, id: StoryId, caller: UserId) -> Result<StoryRemoval> {
        let tx = self.write_transaction()?;
        let sql = format!("SELECT {STORY_COLUMNS} FROM stories s WHERE s.id = ?1");
        let Some(row) = tx.query_row(&sql, [id], read_story).optional()? else {
            return Ok(StoryRemoval::Missing);
        };
        let story = row.into_story()?;
        if story.owner_id != caller {
            return Ok(StoryRemoval::NotOwner);
        }

        tx.execute("DELETE FROM story_views WHERE story_id = ?1", [id])?;
        tx.execute("DELETE FROM stories WHERE id = ?1", [id])?;
        tx.commit()?;
        Ok(StoryRemoval::Removed(story))
    }

    // --- Likes ---

    /// Insert a like unless the pair already exists. Returns whether a row
    /// was written.
    pub fn insert_like_if_absent(&self, post: PostId, user: UserId, now: Timestamp) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT INTO likes (post_id, user_id, liked_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(post_id, user_id) DO NOTHING",
            params![post, user, now],
        )?;
        Ok(inserted == 1)
    }

    pub fn delete_like(&self, post: PostId, user: UserId) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM likes WHERE post_id = ?1 AND user_id = ?2",
            params![post, user],
        )?;
        Ok(deleted > 0)
    }

    pub fn like_info(&self, post: PostId, user: UserId) -> Result<LikeInfo> {
        let (count, liked): (i64, bool) = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(MAX(user_id = ?2), 0)
             FROM likes WHERE post_id = ?1",
            params![post, user],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(LikeInfo {
            count: count as u64,
            liked_by_caller: liked,
        })
    }

    pub fn liked_post_ids(&self, user: UserId) -> Result<Vec<PostId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT post_id FROM likes WHERE user_id = ?1 ORDER BY post_id")?;
        let ids = stmt
            .query_map([user], |row| row.get(0))?
            .collect::<std::result::Result<_, _>>()?;
        Ok(ids)
    }

    // --- Tasbih goals ---

    pub fn insert_goal(&self, draft: &GoalDraft) -> Result<TasbihGoal> {
        self.conn.execute(
            "INSERT INTO tasbih_goals
                (owner_id, text, target_count, current_count, start_date, end_date,
                 streak, last_updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?5)",
            params![
                draft.owner_id,
                draft.text,
                draft.target_count,
                draft.initial_count,
                draft.window.start,
                draft.window.end,
            ],
        )?;

        Ok(TasbihGoal {
            id: self.conn.last_insert_rowid(),
            owner_id: draft.owner_id,
            text: draft.text.clone(),
            target_count: draft.target_count,
            current_count: draft.initial_count,
            start_date: draft.window.start,
            end_date: draft.window.end,
            streak: 0,
            last_updated_at: draft.window.start,
        })
    }

    pub fn get_goal(&self, id: GoalId) -> Result<Option<TasbihGoal>> {
        let sql = format!("SELECT {GOAL_COLUMNS} FROM tasbih_goals WHERE id = ?1");
        let goal = self.conn.query_row(&sql, [id], read_goal).optional()?;
        Ok(goal)
    }

    /// Add `delta` to a goal's count in one conditional statement.
    ///
    /// The update only applies when the new count stays within
    /// `0..=i64::MAX`; SQLite would otherwise store an overflowed sum as REAL.
    /// The read-modify-write never leaves SQLite.
    pub fn increment_goal(&self, id: GoalId, delta: i64, now: Timestamp) -> Result<GoalIncrement> {
        let sql = format!(
            "UPDATE tasbih_goals
             SET current_count = current_count + ?1, last_updated_at = ?2
             WHERE id = ?3
               AND (?1 >= 0 OR current_count + ?1 >= 0)
               AND (?1 <= 0 OR current_count <= 9223372036854775807 - ?1)
             RETURNING {GOAL_COLUMNS}"
        );
        let goal = self
            .conn
            .query_row(&sql, params![delta, now, id], read_goal)
            .optional()?;
        if let Some(goal) = goal {
            return Ok(GoalIncrement::Applied(goal));
        }

        // Goals are never deleted, so existence after a refused update is stable.
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM tasbih_goals WHERE id = ?1)",
            [id],
            |row| row.get(0),
        )?;
        Ok(if exists {
            GoalIncrement::OutOfRange
        } else {
            GoalIncrement::Missing
        })
    }

    pub fn list_goals(&self, owner: UserId) -> Result<Vec<TasbihGoal>> {
        let sql = format!("SELECT {GOAL_COLUMNS} FROM tasbih_goals WHERE owner_id = ?1 ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let goals = stmt
            .query_map([owner], read_goal)?
            .collect::<std::result::Result<_, _>>()?;
        Ok(goals)
    }

    // --- Friend links ---

    /// Create a link unless `(owner, friend)` already exists.
    pub fn insert_friend_link_if_absent(
        &self,
        owner: UserId,
        friend: UserId,
        is_public: bool,
    ) -> Result<Option<FriendLink>> {
        let link = self
            .conn
            .query_row(
                "INSERT INTO tasbih_friends (owner_id, friend_user_id, is_public)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(owner_id, friend_user_id) DO NOTHING
                 RETURNING id, owner_id, friend_user_id, is_public",
                params![owner, friend, is_public],
                read_friend_link,
            )
            .optional()?;
        Ok(link)
    }

    /// Returns whether the link exists.
    pub fn set_friend_link_privacy(&self, id: FriendLinkId, is_public: bool) -> Result<bool> {
        let updated = self.conn.execute(
            "UPDATE tasbih_friends SET is_public = ?1 WHERE id = ?2",
            params![is_public, id],
        )?;
        Ok(updated > 0)
    }

    /// Goals of every friend `owner` follows through a public link.
    pub fn friends_progress(&self, owner: UserId) -> Result<Vec<FriendProgress>> {
        let mut stmt = self.conn.prepare(
            "SELECT u.name, g.text, g.current_count, g.target_count, g.streak
             FROM tasbih_friends f
             JOIN users u ON u.id = f.friend_user_id
             JOIN tasbih_goals g ON g.owner_id = f.friend_user_id
             WHERE f.owner_id = ?1 AND f.is_public = 1
             ORDER BY u.name, g.id",
        )?;
        let rows = stmt
            .query_map([owner], |row| {
                Ok(FriendProgress {
                    friend_name: row.get(0)?,
                    goal_text: row.get(1)?,
                    progress: row.get(2)?,
                    target: row.get(3)?,
                    streak: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<_, _>>()?;
        Ok(rows)
    }

    // --- Stats ---

    pub fn stats(&self, now: Timestamp) -> Result<StoreStats> {
        let counts: [i64; 8] = self.conn.query_row(
            "SELECT
                (SELECT COUNT(*) FROM users),
                (SELECT COUNT(*) FROM stories WHERE expires_at IS NULL OR expires_at > ?1),
                (SELECT COUNT(*) FROM stories WHERE expires_at <= ?1),
                (SELECT COUNT(*) FROM story_views),
                (SELECT COUNT(*) FROM likes),
                (SELECT COUNT(*) FROM tasbih_goals WHERE end_date >= ?1),
                (SELECT COUNT(*) FROM tasbih_goals WHERE end_date < ?1),
                (SELECT COUNT(*) FROM tasbih_friends)",
            [now],
            |row| {
                Ok([
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                ])
            },
        )?;
        let [users, visible, expired, views, likes, active, lapsed, links] =
            counts.map(|c| c as u64);
        Ok(StoreStats {
            users,
            stories_visible: visible,
            stories_expired: expired,
            story_views: views,
            likes,
            goals_active: active,
            goals_expired: lapsed,
            friend_links: links,
        })
    }
}

// --- Row mapping ---

struct StoryRow {
    id: StoryId,
    owner_id: UserId,
    media_ref: String,
    media_kind: String,
    overlay: Overlay,
    created_at: Timestamp,
    expires_at: Option<Timestamp>,
}

impl StoryRow {
    fn into_story(self) -> Result<Story> {
        let media_kind = MediaKind::parse(&self.media_kind).map_err(|_| {
            StoreError::InvalidData(format!(
                "story {} has media kind '{}'",
                self.id, self.media_kind
            ))
        })?;
        Ok(Story {
            id: self.id,
            owner_id: self.owner_id,
            media_ref: self.media_ref,
            media_kind,
            overlay: self.overlay,
            created_at: self.created_at,
            expires_at: self.expires_at,
        })
    }
}

fn read_story(row: &Row<'_>) -> rusqlite::Result<StoryRow> {
    Ok(StoryRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        media_ref: row.get(2)?,
        media_kind: row.get(3)?,
        overlay: Overlay {
            overlay_type: row.get(4)?,
            title: row.get(5)?,
            content: row.get(6)?,
            arabic: row.get(7)?,
            translation: row.get(8)?,
        },
        created_at: row.get(9)?,
        expires_at: row.get(10)?,
    })
}

/// Feed query binding `?1` = viewer, `?2` = now; `filter` may bind `?3`.
fn feed_sql(filter: &str) -> String {
    format!(
        "SELECT {STORY_COLUMNS}, u.name,
            (SELECT COUNT(*) FROM story_views v WHERE v.story_id = s.id),
            EXISTS(SELECT 1 FROM story_views v WHERE v.story_id = s.id AND v.viewer_id = ?1)
         FROM stories s
         LEFT JOIN users u ON u.id = s.owner_id
         WHERE (s.expires_at IS NULL OR s.expires_at > ?2) AND {filter}
         ORDER BY s.created_at DESC, s.id DESC"
    )
}

fn read_feed_row(row: &Row<'_>) -> rusqlite::Result<(StoryRow, Option<String>, i64, bool)> {
    Ok((read_story(row)?, row.get(11)?, row.get(12)?, row.get(13)?))
}

fn into_feed_item(
    (story, owner_name, view_count, viewed): (StoryRow, Option<String>, i64, bool),
) -> Result<StoryFeedItem> {
    Ok(StoryFeedItem {
        story: story.into_story()?,
        owner_name,
        view_count: view_count as u64,
        viewed_by_caller: viewed,
    })
}

fn read_goal(row: &Row<'_>) -> rusqlite::Result<TasbihGoal> {
    Ok(TasbihGoal {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        text: row.get(2)?,
        target_count: row.get(3)?,
        current_count: row.get(4)?,
        start_date: row.get(5)?,
        end_date: row.get(6)?,
        streak: row.get(7)?,
        last_updated_at: row.get(8)?,
    })
}

fn read_friend_link(row: &Row<'_>) -> rusqlite::Result<FriendLink> {
    Ok(FriendLink {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        friend_user_id: row.get(2)?,
        is_public: row.get(3)?,
    })
}
