//! Database row types — these map directly to SQLite rows.
//! Distinct from the daybreak-types wire models to keep the DB layer
//! independent of the HTTP surface.

use chrono::{DateTime, Utc};
use tracing::warn;

use daybreak_types::models::{Notice, User};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub google_id: String,
    pub email: String,
    pub username: String,
    pub picture: Option<String>,
    pub timezone: String,
    pub invite_code: String,
    pub notifications_enabled: bool,
    pub paired_user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Wire representation; drops the Google subject ID.
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            picture: self.picture,
            timezone: self.timezone,
            unique_code: self.invite_code,
            notifications_enabled: self.notifications_enabled,
            paired_user_id: self.paired_user_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NoticeRow {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub message: Option<String>,
    pub photo_url: Option<String>,
    pub song_url: Option<String>,
    pub song_title: Option<String>,
    pub song_artist: Option<String>,
    pub song_album_cover: Option<String>,
    pub song_explanation: Option<String>,
    pub foreground_color: String,
    pub background_color: String,
    /// JSON array text, e.g. `["❤️","😂"]`. Ordered, duplicates allowed.
    pub reactions: String,
    pub sent_at: DateTime<Utc>,
    pub reset_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}

impl NoticeRow {
    pub fn into_notice(self) -> Notice {
        let reactions: Vec<String> = serde_json::from_str(&self.reactions).unwrap_or_else(|e| {
            warn!("Corrupt reactions '{}' on notice '{}': {}", self.reactions, self.id, e);
            Vec::new()
        });

        Notice {
            id: self.id,
            sender_id: self.sender_id,
            recipient_id: self.recipient_id,
            message: self.message,
            photo_url: self.photo_url,
            song_url: self.song_url,
            song_title: self.song_title,
            song_artist: self.song_artist,
            song_album_cover: self.song_album_cover,
            song_explanation: self.song_explanation,
            foreground_color: self.foreground_color,
            background_color: self.background_color,
            reactions,
            sent_at: self.sent_at,
            reset_at: self.reset_at,
            edited_at: self.edited_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PushSubscriptionRow {
    pub id: String,
    pub user_id: String,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub created_at: String,
}
