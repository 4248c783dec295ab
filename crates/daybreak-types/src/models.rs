use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public user profile as it travels over the wire. Field names are
/// camelCase to match what the web client expects. The Google subject ID
/// stays server-side and is deliberately not part of this model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub picture: Option<String>,
    pub timezone: String,
    pub unique_code: String,
    pub notifications_enabled: bool,
    pub paired_user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One daily notice from one paired user to the other. Song metadata is
/// best-effort: a notice can carry a song URL with no title/artist/cover
/// when enrichment did not succeed at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
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
    pub reactions: Vec<String>,
    pub sent_at: DateTime<Utc>,
    /// The instant this notice stops being "current": the recipient's next
    /// local midnight, computed at creation time.
    pub reset_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}
