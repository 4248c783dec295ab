use crate::Database;
use crate::models::{NoticeRow, PushSubscriptionRow, UserRow};
use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use thiserror::Error;

/// Outcome of the pairing operation. The four domain variants map to the
/// specific messages the client shows; `Storage` is any persistence failure.
#[derive(Debug, Error)]
pub enum PairError {
    #[error("partner not found")]
    PartnerNotFound,
    #[error("cannot pair with yourself")]
    SelfPair,
    #[error("already paired")]
    AlreadyPaired,
    #[error("partner already paired with someone else")]
    PartnerTaken,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Fields the identity resolver supplies when creating a user on first
/// sight. Timezone defaults to UTC and notifications start disabled.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub google_id: String,
    pub email: String,
    pub username: String,
    pub picture: Option<String>,
    pub invite_code: String,
}

impl Database {
    // -- Users --

    pub fn create_user(&self, new: &NewUser) -> Result<UserRow> {
        let now = Utc::now();
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users
                     (id, google_id, email, username, picture, timezone,
                      invite_code, notifications_enabled, paired_user_id,
                      created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 'UTC', ?6, 0, NULL, ?7, ?7)",
                rusqlite::params![
                    new.id,
                    new.google_id,
                    new.email,
                    new.username,
                    new.picture,
                    new.invite_code,
                    now
                ],
            )?;
            Ok(())
        })?;

        Ok(UserRow {
            id: new.id.clone(),
            google_id: new.google_id.clone(),
            email: new.email.clone(),
            username: new.username.clone(),
            picture: new.picture.clone(),
            timezone: "UTC".to_string(),
            invite_code: new.invite_code.clone(),
            notifications_enabled: false,
            paired_user_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn get_user_by_google_id(&self, google_id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "google_id", google_id))
    }

    pub fn invite_code_exists(&self, code: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE invite_code = ?1",
                [code],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    pub fn update_username(&self, id: &str, username: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET username = ?2, updated_at = ?3 WHERE id = ?1",
                rusqlite::params![id, username, Utc::now()],
            )?;
            if changed == 0 {
                return Err(anyhow!("User not found: {}", id));
            }
            Ok(())
        })
    }

    // -- Pairing --

    /// Pair the requester with the owner of `invite_code`. Both partner
    /// references are written inside one transaction so a failure cannot
    /// leave a one-sided pairing behind.
    pub fn pair_users(&self, requester_id: &str, invite_code: &str) -> Result<(), PairError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let Some(candidate) = query_user(&tx, "invite_code", invite_code)? else {
                return Ok(Err(PairError::PartnerNotFound));
            };
            if candidate.id == requester_id {
                return Ok(Err(PairError::SelfPair));
            }

            let requester = query_user(&tx, "id", requester_id)?
                .ok_or_else(|| anyhow!("User not found: {}", requester_id))?;
            if requester.paired_user_id.is_some() {
                return Ok(Err(PairError::AlreadyPaired));
            }
            if candidate.paired_user_id.is_some() {
                return Ok(Err(PairError::PartnerTaken));
            }

            let now = Utc::now();
            tx.execute(
                "UPDATE users SET paired_user_id = ?2, updated_at = ?3 WHERE id = ?1",
                rusqlite::params![requester.id, candidate.id, now],
            )?;
            tx.execute(
                "UPDATE users SET paired_user_id = ?2, updated_at = ?3 WHERE id = ?1",
                rusqlite::params![candidate.id, requester.id, now],
            )?;
            tx.commit()?;

            Ok(Ok(()))
        })
        .map_err(PairError::Storage)?
    }

    // -- Notices --

    pub fn insert_notice(&self, notice: &NoticeRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO notices
                     (id, sender_id, recipient_id, message, photo_url,
                      song_url, song_title, song_artist, song_album_cover,
                      song_explanation, foreground_color, background_color,
                      reactions, sent_at, reset_at, edited_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                         ?13, ?14, ?15, ?16)",
                rusqlite::params![
                    notice.id,
                    notice.sender_id,
                    notice.recipient_id,
                    notice.message,
                    notice.photo_url,
                    notice.song_url,
                    notice.song_title,
                    notice.song_artist,
                    notice.song_album_cover,
                    notice.song_explanation,
                    notice.foreground_color,
                    notice.background_color,
                    notice.reactions,
                    notice.sent_at,
                    notice.reset_at,
                    notice.edited_at,
                ],
            )?;
            Ok(())
        })
    }

    /// The recipient's current notice: the most recently created row whose
    /// reset instant is still ahead of `now`. Recency is insertion order
    /// (rowid), not timestamp comparison, so it stays stable under clock
    /// skew between writers.
    pub fn current_notice(
        &self,
        recipient_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<NoticeRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, sender_id, recipient_id, message, photo_url,
                        song_url, song_title, song_artist, song_album_cover,
                        song_explanation, foreground_color, background_color,
                        reactions, sent_at, reset_at, edited_at
                 FROM notices
                 WHERE recipient_id = ?1 AND reset_at > ?2
                 ORDER BY rowid DESC
                 LIMIT 1",
            )?;

            let row = stmt
                .query_row(rusqlite::params![recipient_id, now], notice_from_row)
                .optional()?;

            Ok(row)
        })
    }

    // -- Push subscriptions --

    /// Register a push subscription, replacing any prior one for the user.
    /// Delete and insert share a transaction: a user ends up with exactly
    /// one row, never zero or two.
    pub fn replace_subscription(&self, sub: &PushSubscriptionRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM push_subscriptions WHERE user_id = ?1",
                [&sub.user_id],
            )?;
            tx.execute(
                "INSERT INTO push_subscriptions (id, user_id, endpoint, p256dh, auth)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![sub.id, sub.user_id, sub.endpoint, sub.p256dh, sub.auth],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn delete_subscription(&self, user_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute("DELETE FROM push_subscriptions WHERE user_id = ?1", [user_id])?;
            Ok(())
        })
    }

    pub fn get_subscription(&self, user_id: &str) -> Result<Option<PushSubscriptionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, endpoint, p256dh, auth, created_at
                 FROM push_subscriptions WHERE user_id = ?1",
            )?;

            let row = stmt
                .query_row([user_id], |row| {
                    Ok(PushSubscriptionRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        endpoint: row.get(2)?,
                        p256dh: row.get(3)?,
                        auth: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })
                .optional()?;

            Ok(row)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // `column` is a compile-time constant at every call site, never input.
    let sql = format!(
        "SELECT id, google_id, email, username, picture, timezone,
                invite_code, notifications_enabled, paired_user_id,
                created_at, updated_at
         FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                google_id: row.get(1)?,
                email: row.get(2)?,
                username: row.get(3)?,
                picture: row.get(4)?,
                timezone: row.get(5)?,
                invite_code: row.get(6)?,
                notifications_enabled: row.get(7)?,
                paired_user_id: row.get(8)?,
                created_at: row.get(9)?,
                updated_at: row.get(10)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn notice_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<NoticeRow> {
    Ok(NoticeRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        recipient_id: row.get(2)?,
        message: row.get(3)?,
        photo_url: row.get(4)?,
        song_url: row.get(5)?,
        song_title: row.get(6)?,
        song_artist: row.get(7)?,
        song_album_cover: row.get(8)?,
        song_explanation: row.get(9)?,
        foreground_color: row.get(10)?,
        background_color: row.get(11)?,
        reactions: row.get(12)?,
        sent_at: row.get(13)?,
        reset_at: row.get(14)?,
        edited_at: row.get(15)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn seed_user(db: &Database, name: &str, code: &str) -> UserRow {
        db.create_user(&NewUser {
            id: Uuid::new_v4().to_string(),
            google_id: format!("google-{}", name),
            email: format!("{}@example.com", name),
            username: name.to_string(),
            picture: None,
            invite_code: code.to_string(),
        })
        .unwrap()
    }

    fn seed_notice(db: &Database, sender: &str, recipient: &str, reset_at: DateTime<Utc>) -> String {
        let id = Uuid::new_v4().to_string();
        db.insert_notice(&NoticeRow {
            id: id.clone(),
            sender_id: sender.to_string(),
            recipient_id: recipient.to_string(),
            message: Some("good morning".to_string()),
            photo_url: None,
            song_url: None,
            song_title: None,
            song_artist: None,
            song_album_cover: None,
            song_explanation: None,
            foreground_color: "#000000".to_string(),
            background_color: "#ffffff".to_string(),
            reactions: "[]".to_string(),
            sent_at: Utc::now(),
            reset_at,
            edited_at: None,
        })
        .unwrap();
        id
    }

    #[test]
    fn pair_links_both_users() {
        let db = test_db();
        let a = seed_user(&db, "ana", "brave_red_dinosaur");
        let b = seed_user(&db, "ben", "wise_teal_owl");

        db.pair_users(&a.id, "wise_teal_owl").unwrap();

        let a = db.get_user_by_id(&a.id).unwrap().unwrap();
        let b = db.get_user_by_id(&b.id).unwrap().unwrap();
        assert_eq!(a.paired_user_id.as_deref(), Some(b.id.as_str()));
        assert_eq!(b.paired_user_id.as_deref(), Some(a.id.as_str()));
    }

    #[test]
    fn pair_with_unknown_code_fails() {
        let db = test_db();
        let a = seed_user(&db, "ana", "brave_red_dinosaur");

        let err = db.pair_users(&a.id, "no_such_code").unwrap_err();
        assert!(matches!(err, PairError::PartnerNotFound));
    }

    #[test]
    fn pair_with_own_code_fails() {
        let db = test_db();
        let a = seed_user(&db, "ana", "brave_red_dinosaur");

        let err = db.pair_users(&a.id, "brave_red_dinosaur").unwrap_err();
        assert!(matches!(err, PairError::SelfPair));
    }

    #[test]
    fn pair_when_already_paired_fails() {
        let db = test_db();
        let a = seed_user(&db, "ana", "code_a");
        let _b = seed_user(&db, "ben", "code_b");
        let c = seed_user(&db, "cat", "code_c");
        db.pair_users(&a.id, "code_b").unwrap();

        // Requester already paired, regardless of candidate state
        let err = db.pair_users(&a.id, "code_c").unwrap_err();
        assert!(matches!(err, PairError::AlreadyPaired));

        // Candidate already paired
        let err = db.pair_users(&c.id, "code_a").unwrap_err();
        assert!(matches!(err, PairError::PartnerTaken));

        // Third wheel remains unpaired
        let c = db.get_user_by_id(&c.id).unwrap().unwrap();
        assert!(c.paired_user_id.is_none());
    }

    #[test]
    fn current_notice_ignores_expired_rows() {
        let db = test_db();
        let a = seed_user(&db, "ana", "code_a");
        let b = seed_user(&db, "ben", "code_b");
        let now = Utc::now();

        seed_notice(&db, &a.id, &b.id, now - Duration::hours(1));
        assert!(db.current_notice(&b.id, now).unwrap().is_none());

        let fresh = seed_notice(&db, &a.id, &b.id, now + Duration::hours(10));
        let current = db.current_notice(&b.id, now).unwrap().unwrap();
        assert_eq!(current.id, fresh);
    }

    #[test]
    fn current_notice_prefers_newest_unexpired() {
        let db = test_db();
        let a = seed_user(&db, "ana", "code_a");
        let b = seed_user(&db, "ben", "code_b");
        let now = Utc::now();

        let _older = seed_notice(&db, &a.id, &b.id, now + Duration::hours(5));
        let newer = seed_notice(&db, &a.id, &b.id, now + Duration::hours(5));

        let current = db.current_notice(&b.id, now).unwrap().unwrap();
        assert_eq!(current.id, newer);

        // Notices addressed to someone else never show up
        assert!(db.current_notice(&a.id, now).unwrap().is_none());
    }

    #[test]
    fn notice_history_is_kept() {
        let db = test_db();
        let a = seed_user(&db, "ana", "code_a");
        let b = seed_user(&db, "ben", "code_b");
        let now = Utc::now();

        seed_notice(&db, &a.id, &b.id, now - Duration::hours(1));
        seed_notice(&db, &a.id, &b.id, now + Duration::hours(1));

        let count: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM notices", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn subscription_replace_is_last_write_wins() {
        let db = test_db();
        let a = seed_user(&db, "ana", "code_a");

        for endpoint in ["https://push.example/one", "https://push.example/two"] {
            db.replace_subscription(&PushSubscriptionRow {
                id: Uuid::new_v4().to_string(),
                user_id: a.id.clone(),
                endpoint: endpoint.to_string(),
                p256dh: "key".to_string(),
                auth: "auth".to_string(),
                created_at: String::new(),
            })
            .unwrap();
        }

        let count: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM push_subscriptions WHERE user_id = ?1",
                    [&a.id],
                    |row| row.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(count, 1);

        let sub = db.get_subscription(&a.id).unwrap().unwrap();
        assert_eq!(sub.endpoint, "https://push.example/two");

        db.delete_subscription(&a.id).unwrap();
        assert!(db.get_subscription(&a.id).unwrap().is_none());
    }
}
