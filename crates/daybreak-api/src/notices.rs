use anyhow::anyhow;
use axum::{Extension, extract::State};
use chrono::Utc;
use chrono_tz::Tz;
use tracing::warn;
use uuid::Uuid;

use daybreak_db::models::{NoticeRow, UserRow};
use daybreak_spotify::Enrichment;
use daybreak_types::api::{Ack, Claims, CreateNoticeRequest, CurrentNoticeResponse};

use crate::auth::AppState;
use crate::error::{ApiError, join_error};
use crate::extract::Json;
use crate::reset;

/// POST /notices/create — send today's notice to the caller's partner.
/// Song enrichment is best-effort; the reset boundary is the partner's next
/// local midnight.
pub async fn create_notice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateNoticeRequest>,
) -> Result<Json<Ack>, ApiError> {
    if req.foreground_color.trim().is_empty() || req.background_color.trim().is_empty() {
        return Err(ApiError::Validation(
            "foregroundColor and backgroundColor are required".to_string(),
        ));
    }

    let db = state.clone();
    let sender_id = claims.sub.to_string();
    let lookup = tokio::task::spawn_blocking(
        move || -> anyhow::Result<Option<(UserRow, Option<UserRow>)>> {
            let Some(sender) = db.db.get_user_by_id(&sender_id)? else {
                return Ok(None);
            };
            let partner = match &sender.paired_user_id {
                Some(partner_id) => db.db.get_user_by_id(partner_id)?,
                None => None,
            };
            Ok(Some((sender, partner)))
        },
    )
    .await
    .map_err(join_error)??;

    let (sender, partner) = lookup.ok_or(ApiError::Unauthorized)?;
    if sender.paired_user_id.is_none() {
        return Err(ApiError::Conflict("no paired user".to_string()));
    }
    let partner = partner.ok_or_else(|| {
        ApiError::Internal(anyhow!("partner row missing for user {}", sender.id))
    })?;

    // Best-effort song enrichment; Skipped/Failed keep the raw URL only.
    let song_url = req.song_url.filter(|url| !url.trim().is_empty());
    let (mut song_title, mut song_artist, mut song_album_cover) = (None, None, None);
    if let Some(url) = song_url.as_deref() {
        if let Enrichment::Enriched(details) = state.spotify.enrich(url).await {
            song_title = Some(details.title);
            song_artist = Some(details.artist);
            song_album_cover = details.album_cover;
        }
    }

    let now = Utc::now();
    let tz = partner.timezone.parse::<Tz>().unwrap_or_else(|_| {
        warn!(
            "Invalid timezone '{}' for user {}, falling back to UTC",
            partner.timezone, partner.id
        );
        Tz::UTC
    });
    let reset_at = reset::next_local_midnight(now, tz);

    let notice = NoticeRow {
        id: Uuid::new_v4().to_string(),
        sender_id: sender.id,
        recipient_id: partner.id,
        message: req.message.filter(|m| !m.is_empty()),
        photo_url: req.photo_url.filter(|u| !u.is_empty()),
        song_url,
        song_title,
        song_artist,
        song_album_cover,
        song_explanation: req.song_explanation.filter(|s| !s.is_empty()),
        foreground_color: req.foreground_color,
        background_color: req.background_color,
        reactions: "[]".to_string(),
        sent_at: now,
        reset_at,
        edited_at: None,
    };

    let db = state.clone();
    tokio::task::spawn_blocking(move || db.db.insert_notice(&notice))
        .await
        .map_err(join_error)??;

    Ok(Json(Ack::new("notice created successfully")))
}

/// GET /notices/get — the caller's current notice, or null once the last
/// one has crossed its reset boundary.
pub async fn get_current_notice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<CurrentNoticeResponse>, ApiError> {
    let db = state.clone();
    let recipient_id = claims.sub.to_string();

    let row = tokio::task::spawn_blocking(move || db.db.current_notice(&recipient_id, Utc::now()))
        .await
        .map_err(join_error)??;

    Ok(Json(CurrentNoticeResponse {
        notice: row.map(NoticeRow::into_notice),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{claims_for, seed_user, test_state};

    fn notice_request() -> CreateNoticeRequest {
        CreateNoticeRequest {
            message: Some("good morning".to_string()),
            photo_url: None,
            song_url: None,
            song_explanation: None,
            foreground_color: "#000000".to_string(),
            background_color: "#ffffff".to_string(),
        }
    }

    #[tokio::test]
    async fn create_without_partner_is_rejected() {
        let state = test_state();
        let ana = seed_user(&state, "Ana", "red-fox-1");

        let err = create_notice(
            State(state),
            Extension(claims_for(&ana)),
            Json(notice_request()),
        )
        .await
        .expect_err("unpaired sender must be rejected");

        match err {
            ApiError::Conflict(msg) => assert_eq!(msg, "no paired user"),
            other => panic!("expected Conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_colors_are_rejected() {
        let state = test_state();
        let ana = seed_user(&state, "Ana", "red-fox-1");

        let mut req = notice_request();
        req.background_color = "  ".to_string();

        let err = create_notice(State(state), Extension(claims_for(&ana)), Json(req))
            .await
            .expect_err("blank colors must be rejected");
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn created_notice_becomes_partners_current() {
        let state = test_state();
        let ana = seed_user(&state, "Ana", "red-fox-1");
        let ben = seed_user(&state, "Ben", "blue-owl-2");
        state.db.pair_users(&ana.id, "blue-owl-2").unwrap();

        create_notice(
            State(state.clone()),
            Extension(claims_for(&ana)),
            Json(notice_request()),
        )
        .await
        .unwrap();

        let Json(body) = get_current_notice(State(state.clone()), Extension(claims_for(&ben)))
            .await
            .unwrap();
        let notice = body.notice.expect("partner must see the notice");
        assert_eq!(notice.sender_id, ana.id);
        assert_eq!(notice.recipient_id, ben.id);
        assert!(notice.reset_at > Utc::now());

        // The sender has not received anything themselves.
        let Json(body) = get_current_notice(State(state), Extension(claims_for(&ana)))
            .await
            .unwrap();
        assert!(body.notice.is_none());
    }
}

