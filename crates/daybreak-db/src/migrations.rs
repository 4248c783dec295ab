use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id                    TEXT PRIMARY KEY,
            google_id             TEXT NOT NULL UNIQUE,
            email                 TEXT NOT NULL,
            username              TEXT NOT NULL,
            picture               TEXT,
            timezone              TEXT NOT NULL DEFAULT 'UTC',
            invite_code           TEXT NOT NULL UNIQUE,
            notifications_enabled INTEGER NOT NULL DEFAULT 0,
            paired_user_id        TEXT REFERENCES users(id),
            created_at            TEXT NOT NULL,
            updated_at            TEXT NOT NULL
        );

        -- Notices are append-only: superseded rows stay around as history,
        -- and rowid is the creation-order tie-break for 'most recent'.
        CREATE TABLE IF NOT EXISTS notices (
            id                TEXT PRIMARY KEY,
            sender_id         TEXT NOT NULL REFERENCES users(id),
            recipient_id      TEXT NOT NULL REFERENCES users(id),
            message           TEXT,
            photo_url         TEXT,
            song_url          TEXT,
            song_title        TEXT,
            song_artist       TEXT,
            song_album_cover  TEXT,
            song_explanation  TEXT,
            foreground_color  TEXT NOT NULL,
            background_color  TEXT NOT NULL,
            reactions         TEXT NOT NULL DEFAULT '[]',
            sent_at           TEXT NOT NULL,
            reset_at          TEXT NOT NULL,
            edited_at         TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_notices_recipient
            ON notices(recipient_id, reset_at);

        CREATE TABLE IF NOT EXISTS push_subscriptions (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id),
            endpoint    TEXT NOT NULL,
            p256dh      TEXT NOT NULL,
            auth        TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_push_user
            ON push_subscriptions(user_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
