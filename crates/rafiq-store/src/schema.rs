use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: i64 = 1;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;
    // Checkpoint every ~400KB instead of the default ~4MB
    conn.pragma_update(None, "wal_autocheckpoint", 100)?;

    // Fold any stale WAL left by an unclean exit into the main file.
    // In-memory and fresh databases legitimately fail this.
    if conn
        .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
        .is_ok()
    {
        tracing::info!("startup WAL checkpoint complete");
    }

    // Uniqueness of (story_id, viewer_id), (post_id, user_id) and
    // (owner_id, friend_user_id) is enforced here, not by callers.
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS users (
            id   INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS stories (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id     INTEGER NOT NULL,
            media_ref    TEXT NOT NULL,
            media_kind   TEXT NOT NULL CHECK (media_kind IN ('image', 'video')),
            overlay_type TEXT,
            title        TEXT,
            content      TEXT,
            arabic       TEXT,
            translation  TEXT,
            created_at   INTEGER NOT NULL,
            expires_at   INTEGER
        );

        CREATE TABLE IF NOT EXISTS story_views (
            story_id  INTEGER NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
            viewer_id INTEGER NOT NULL,
            viewed_at INTEGER NOT NULL,
            PRIMARY KEY (story_id, viewer_id)
        );

        CREATE TABLE IF NOT EXISTS likes (
            post_id  INTEGER NOT NULL,
            user_id  INTEGER NOT NULL,
            liked_at INTEGER NOT NULL,
            PRIMARY KEY (post_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS tasbih_goals (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id        INTEGER NOT NULL,
            text            TEXT NOT NULL,
            target_count    INTEGER NOT NULL CHECK (target_count > 0),
            current_count   INTEGER NOT NULL DEFAULT 0 CHECK (current_count >= 0),
            start_date      INTEGER NOT NULL,
            end_date        INTEGER NOT NULL,
            streak          INTEGER NOT NULL DEFAULT 0,
            last_updated_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tasbih_friends (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id       INTEGER NOT NULL,
            friend_user_id INTEGER NOT NULL,
            is_public      INTEGER NOT NULL DEFAULT 0,
            UNIQUE (owner_id, friend_user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_story_owner ON stories(owner_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_story_expiry ON stories(expires_at);
        CREATE INDEX IF NOT EXISTS idx_like_user ON likes(user_id);
        CREATE INDEX IF NOT EXISTS idx_goal_owner ON tasbih_goals(owner_id);
        ",
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

pub fn get_schema_version(conn: &Connection) -> Result<Option<i64>> {
    let mut stmt = conn.prepare("SELECT value FROM metadata WHERE key = 'schema_version'")?;
    let version = stmt
        .query_row([], |row| {
            let v: String = row.get(0)?;
            Ok(v.parse::<i64>().unwrap_or(0))
        })
        .ok();
    Ok(version)
}
