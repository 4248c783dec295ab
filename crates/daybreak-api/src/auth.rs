use std::sync::Arc;

use anyhow::{Result, anyhow};
use axum::extract::{Query, State};
use axum::response::Redirect;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use daybreak_db::Database;
use daybreak_db::models::UserRow;
use daybreak_db::queries::NewUser;
use daybreak_types::api::Claims;

use crate::error::{ApiError, join_error};
use crate::invite;
use crate::middleware::SESSION_COOKIE;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

const SESSION_TTL_HOURS: i64 = 24;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub http: reqwest::Client,
    pub jwt_secret: String,
    pub frontend_url: String,
    pub google: GoogleConfig,
    pub spotify: daybreak_spotify::Client,
    pub store: daybreak_storage::ObjectStore,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

// -- Session tokens --

pub fn issue_token(secret: &str, user_id: Uuid) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(SESSION_TTL_HOURS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify signature, algorithm, and expiry. Any failure is `None` — callers
/// must not distinguish the causes.
pub fn verify_token(secret: &str, token: &str) -> Option<Claims> {
    // Pinning HS256 rejects tokens claiming any other algorithm.
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .ok()
    .map(|data| data.claims)
}

// -- OAuth flow --

/// GET /auth/google — redirect to Google's consent screen.
pub async fn google_login(State(state): State<AppState>) -> Result<Redirect, ApiError> {
    let nonce = oauth_state();
    let url = reqwest::Url::parse_with_params(
        GOOGLE_AUTH_URL,
        &[
            ("client_id", state.google.client_id.as_str()),
            ("redirect_uri", state.google.redirect_url.as_str()),
            ("scope", "openid email profile"),
            ("response_type", "code"),
            ("state", nonce.as_str()),
            ("access_type", "offline"),
        ],
    )
    .map_err(|e| ApiError::Internal(e.into()))?;

    Ok(Redirect::temporary(url.as_str()))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

/// GET /auth/google/callback — exchange the code, resolve the identity,
/// set the session cookie, and bounce back to the frontend.
pub async fn google_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Result<(CookieJar, Redirect), ApiError> {
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::Validation("no authorization code".to_string()))?;

    let token = exchange_code(&state.http, &state.google, &code).await?;
    let profile = fetch_profile(&state.http, &token.access_token).await?;

    let db = state.clone();
    let user = tokio::task::spawn_blocking(move || resolve_identity(&db.db, profile))
        .await
        .map_err(join_error)??;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow!("corrupt user id '{}': {}", user.id, e)))?;
    let token = issue_token(&state.jwt_secret, user_id)?;

    Ok((
        jar.add(session_cookie(token)),
        Redirect::temporary(&state.frontend_url),
    ))
}

/// GET /logout — drop the session cookie and bounce to the frontend.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let cookie = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    (jar.remove(cookie), Redirect::temporary(&state.frontend_url))
}

/// Session cookie whose lifetime matches the token's expiry, so browsers
/// drop it when the token would stop verifying anyway.
fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::hours(SESSION_TTL_HOURS))
        .build()
}

fn oauth_state() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Debug, Deserialize)]
struct GoogleToken {
    access_token: String,
}

async fn exchange_code(
    http: &reqwest::Client,
    google: &GoogleConfig,
    code: &str,
) -> Result<GoogleToken> {
    let token = http
        .post(GOOGLE_TOKEN_URL)
        .form(&[
            ("code", code),
            ("client_id", google.client_id.as_str()),
            ("client_secret", google.client_secret.as_str()),
            ("redirect_uri", google.redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(token)
}

/// Verified identity assertion from Google's userinfo endpoint. We trust it
/// as-is; the trust boundary is the token exchange above.
#[derive(Debug, Deserialize)]
pub struct GoogleProfile {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub picture: Option<String>,
}

async fn fetch_profile(http: &reqwest::Client, access_token: &str) -> Result<GoogleProfile> {
    let profile = http
        .get(GOOGLE_USERINFO_URL)
        .bearer_auth(access_token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(profile)
}

// -- Identity resolution --

/// Map a Google subject ID to our user record, creating one on first sight:
/// UTC timezone, notifications off, fresh invite code.
pub fn resolve_identity(db: &Database, profile: GoogleProfile) -> Result<UserRow> {
    if let Some(user) = db.get_user_by_google_id(&profile.id)? {
        return Ok(user);
    }

    let invite_code = invite::generate_unique_code(db)?;
    let user = db.create_user(&NewUser {
        id: Uuid::new_v4().to_string(),
        google_id: profile.id,
        email: profile.email,
        username: profile.name,
        picture: profile.picture,
        invite_code,
    })?;

    info!("Created user {} ({})", user.id, user.email);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn issue_then_verify_roundtrip() {
        let user_id = Uuid::new_v4();
        let token = issue_token(SECRET, user_id).unwrap();

        let claims = verify_token(SECRET, &token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.exp, claims.iat + 24 * 3600);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(SECRET, Uuid::new_v4()).unwrap();
        assert!(verify_token("other-secret", &token).is_none());
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: (now - Duration::hours(48)).timestamp() as usize,
            exp: (now - Duration::hours(24)).timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(verify_token(SECRET, &token).is_none());
    }

    #[test]
    fn foreign_algorithm_is_rejected() {
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: now.timestamp() as usize,
            exp: (now + Duration::hours(1)).timestamp() as usize,
        };
        // Signed with the right secret but a different HMAC variant; the
        // verifier only accepts HS256.
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(verify_token(SECRET, &token).is_none());
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(verify_token(SECRET, "not.a.jwt").is_none());
        assert!(verify_token(SECRET, "").is_none());
    }

    #[test]
    fn session_cookie_expires_with_the_token() {
        let cookie = session_cookie("tok".to_string());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(24)));
    }

    #[test]
    fn resolve_identity_creates_then_reuses() {
        let db = Database::open_in_memory().unwrap();

        let created = resolve_identity(
            &db,
            GoogleProfile {
                id: "google-123".to_string(),
                email: "ana@example.com".to_string(),
                name: "Ana".to_string(),
                picture: Some("https://example.com/ana.png".to_string()),
            },
        )
        .unwrap();

        assert_eq!(created.timezone, "UTC");
        assert!(!created.notifications_enabled);
        assert!(created.paired_user_id.is_none());
        assert!(!created.invite_code.is_empty());

        let again = resolve_identity(
            &db,
            GoogleProfile {
                id: "google-123".to_string(),
                email: "ana@example.com".to_string(),
                name: "Ana".to_string(),
                picture: None,
            },
        )
        .unwrap();

        assert_eq!(again.id, created.id);
        assert_eq!(again.invite_code, created.invite_code);
    }
}
