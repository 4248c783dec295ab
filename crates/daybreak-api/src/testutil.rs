//! Shared fixtures for handler tests: an in-memory state and seeded users.

use std::sync::Arc;

use uuid::Uuid;

use daybreak_db::Database;
use daybreak_db::models::UserRow;
use daybreak_db::queries::NewUser;
use daybreak_types::api::Claims;

use crate::auth::{AppStateInner, GoogleConfig};

/// App state over an in-memory database. The outbound clients are built
/// with placeholder credentials; tests that use this state never let a
/// request reach them.
pub(crate) fn test_state() -> crate::auth::AppState {
    Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        http: reqwest::Client::new(),
        jwt_secret: "test-secret".to_string(),
        frontend_url: "http://localhost:3000".to_string(),
        google: GoogleConfig {
            client_id: "test-client".to_string(),
            client_secret: "test-secret".to_string(),
            redirect_url: "http://localhost:24804/auth/google/callback".to_string(),
        },
        spotify: daybreak_spotify::Client::new(String::new(), String::new()),
        store: daybreak_storage::ObjectStore::new(daybreak_storage::ObjectStoreConfig {
            endpoint: "http://localhost:9000".to_string(),
            region: "auto".to_string(),
            access_key_id: "test".to_string(),
            secret_access_key: "test".to_string(),
            bucket: "test".to_string(),
            public_url: "http://localhost:9000/test".to_string(),
        }),
    })
}

pub(crate) fn seed_user(state: &crate::auth::AppState, name: &str, code: &str) -> UserRow {
    state
        .db
        .create_user(&NewUser {
            id: Uuid::new_v4().to_string(),
            google_id: format!("google-{}", name),
            email: format!("{}@example.com", name),
            username: name.to_string(),
            picture: None,
            invite_code: code.to_string(),
        })
        .unwrap()
}

pub(crate) fn claims_for(user: &UserRow) -> Claims {
    Claims {
        sub: user.id.parse().unwrap(),
        iat: 0,
        exp: usize::MAX,
    }
}
