use axum::{Extension, extract::State};
use tracing::warn;

use daybreak_db::models::UserRow;
use daybreak_types::api::{Ack, Claims, EditUserRequest, PairRequest, UserWithPartner};

use crate::auth::AppState;
use crate::error::{ApiError, join_error};
use crate::extract::Json;

/// GET /me — the caller's profile plus their partner. A valid session
/// pointing at a deleted row is treated like no session.
pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserWithPartner>, ApiError> {
    let loaded = load_user_with_partner(&state, &claims).await?;
    loaded.ok_or(ApiError::Unauthorized).map(Json)
}

/// GET /user/get — same payload as /me, but a missing row is a plain 404.
pub async fn get_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserWithPartner>, ApiError> {
    let loaded = load_user_with_partner(&state, &claims).await?;
    loaded
        .ok_or_else(|| ApiError::NotFound("user not found".to_string()))
        .map(Json)
}

/// Load the caller and their partner. A partner that cannot be loaded is
/// reported as null, not an error.
async fn load_user_with_partner(
    state: &AppState,
    claims: &Claims,
) -> Result<Option<UserWithPartner>, ApiError> {
    let db = state.clone();
    let user_id = claims.sub.to_string();

    let pair = tokio::task::spawn_blocking(
        move || -> anyhow::Result<Option<(UserRow, Option<UserRow>)>> {
            let Some(user) = db.db.get_user_by_id(&user_id)? else {
                return Ok(None);
            };

            let partner = match &user.paired_user_id {
                Some(partner_id) => match db.db.get_user_by_id(partner_id) {
                    Ok(Some(partner)) => Some(partner),
                    Ok(None) => {
                        warn!("Partner {} of user {} has no row", partner_id, user.id);
                        None
                    }
                    Err(e) => {
                        warn!("Partner lookup failed for user {}: {}", user.id, e);
                        None
                    }
                },
                None => None,
            };

            Ok(Some((user, partner)))
        },
    )
    .await
    .map_err(join_error)??;

    Ok(pair.map(|(user, partner)| UserWithPartner {
        user: user.into_user(),
        partner: partner.map(UserRow::into_user),
    }))
}

/// PUT /user/edit — rename the caller.
pub async fn edit_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<EditUserRequest>,
) -> Result<Json<Ack>, ApiError> {
    let username = req.username.trim().to_string();
    if username.is_empty() {
        return Err(ApiError::Validation("username must not be empty".to_string()));
    }

    let db = state.clone();
    let user_id = claims.sub.to_string();
    tokio::task::spawn_blocking(move || db.db.update_username(&user_id, &username))
        .await
        .map_err(join_error)??;

    Ok(Json(Ack::new("username updated successfully")))
}

/// POST /user/pair — link the caller with the owner of the invite code.
/// Both partner references commit in one transaction (see daybreak-db).
pub async fn pair(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PairRequest>,
) -> Result<Json<Ack>, ApiError> {
    if req.pair_code.trim().is_empty() {
        return Err(ApiError::Validation("pairCode must not be empty".to_string()));
    }

    let db = state.clone();
    let user_id = claims.sub.to_string();
    tokio::task::spawn_blocking(move || db.db.pair_users(&user_id, req.pair_code.trim()))
        .await
        .map_err(join_error)??;

    Ok(Json(Ack::new("users paired successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{claims_for, seed_user, test_state};
    use uuid::Uuid;

    #[tokio::test]
    async fn ghost_session_is_401_on_me_and_404_on_user_get() {
        let state = test_state();
        let ghost = Claims {
            sub: Uuid::new_v4(),
            iat: 0,
            exp: usize::MAX,
        };

        let err = get_me(State(state.clone()), Extension(ghost.clone()))
            .await
            .expect_err("unknown user must be rejected");
        assert!(matches!(err, ApiError::Unauthorized));

        let err = get_user(State(state), Extension(ghost))
            .await
            .expect_err("unknown user must be rejected");
        match err {
            ApiError::NotFound(msg) => assert_eq!(msg, "user not found"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn user_get_returns_profile_and_partner() {
        let state = test_state();
        let ana = seed_user(&state, "Ana", "red-fox-1");
        let ben = seed_user(&state, "Ben", "blue-owl-2");
        state.db.pair_users(&ana.id, "blue-owl-2").unwrap();

        let Json(body) = get_user(State(state), Extension(claims_for(&ana)))
            .await
            .unwrap();
        assert_eq!(body.user.id, ana.id);
        assert_eq!(body.partner.unwrap().id, ben.id);
    }
}
