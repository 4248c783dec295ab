mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use daybreak_api::auth::{self, AppState, AppStateInner, GoogleConfig};
use daybreak_api::middleware::require_auth;
use daybreak_api::{notices, push, upload, users};

use crate::config::Config;

// Multipart framing adds overhead on top of the 5 MB photo cap, and the
// upload handler owns the real size check, so the body limit sits higher.
const BODY_LIMIT: usize = 10 * 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "daybreak=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = daybreak_db::Database::open(&config.db_path)?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        http: reqwest::Client::new(),
        jwt_secret: config.jwt_secret.clone(),
        frontend_url: config.frontend_url.clone(),
        google: GoogleConfig {
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            redirect_url: config.google_redirect_url.clone(),
        },
        spotify: daybreak_spotify::Client::new(
            config.spotify_client_id.clone(),
            config.spotify_client_secret.clone(),
        ),
        store: daybreak_storage::ObjectStore::new(config.object_store.clone()),
    });

    // Routes
    let public_routes = Router::new()
        .route("/", get(root))
        .route("/auth/google", get(auth::google_login))
        .route("/auth/google/callback", get(auth::google_callback))
        .route("/logout", get(auth::logout))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/me", get(users::get_me))
        .route("/user/get", get(users::get_user))
        .route("/user/edit", put(users::edit_user))
        .route("/user/pair", post(users::pair))
        .route("/notices/create", post(notices::create_notice))
        .route("/notices/get", get(notices::get_current_notice))
        .route("/upload", post(upload::upload_image))
        .route("/push/subscribe", post(push::subscribe))
        .route("/push/unsubscribe", delete(push::unsubscribe))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    // Cookie auth needs credentialed CORS pinned to the frontend origin.
    let cors = CorsLayer::new()
        .allow_origin(config.frontend_url.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Daybreak server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "daybreak backend" }))
}
