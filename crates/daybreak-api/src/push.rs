use axum::{Extension, extract::State};
use uuid::Uuid;

use daybreak_db::models::PushSubscriptionRow;
use daybreak_types::api::{Ack, Claims, PushSubscribeRequest};

use crate::auth::AppState;
use crate::error::{ApiError, join_error};
use crate::extract::Json;

/// POST /push/subscribe — register the caller's push endpoint, replacing
/// any prior subscription (one row per user, last write wins).
pub async fn subscribe(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PushSubscribeRequest>,
) -> Result<Json<Ack>, ApiError> {
    if req.endpoint.is_empty() || req.p256dh.is_empty() || req.auth.is_empty() {
        return Err(ApiError::Validation(
            "endpoint, p256dh and auth are required".to_string(),
        ));
    }

    let row = PushSubscriptionRow {
        id: Uuid::new_v4().to_string(),
        user_id: claims.sub.to_string(),
        endpoint: req.endpoint,
        p256dh: req.p256dh,
        auth: req.auth,
        created_at: String::new(),
    };

    let db = state.clone();
    tokio::task::spawn_blocking(move || db.db.replace_subscription(&row))
        .await
        .map_err(join_error)??;

    Ok(Json(Ack::new("subscription saved successfully")))
}

/// DELETE /push/unsubscribe — drop the caller's subscription if any.
pub async fn unsubscribe(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Ack>, ApiError> {
    let db = state.clone();
    let user_id = claims.sub.to_string();
    tokio::task::spawn_blocking(move || db.db.delete_subscription(&user_id))
        .await
        .map_err(join_error)??;

    Ok(Json(Ack::new("unsubscribed successfully")))
}
