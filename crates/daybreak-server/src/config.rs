use std::path::PathBuf;

use anyhow::{Context, Result};

use daybreak_storage::ObjectStoreConfig;

/// Process configuration, collected from the environment once at startup.
/// Spotify credentials are optional — without them enrichment fails soft
/// and notices go out with the raw song URL only.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub frontend_url: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_redirect_url: String,
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub object_store: ObjectStoreConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let endpoint = required("S3_ENDPOINT")?;
        let public_url = std::env::var("S3_PUBLIC_URL").unwrap_or_else(|_| endpoint.clone());

        Ok(Self {
            host: optional("DAYBREAK_HOST", "0.0.0.0"),
            port: optional("DAYBREAK_PORT", "24804")
                .parse()
                .context("DAYBREAK_PORT must be a port number")?,
            db_path: PathBuf::from(optional("DAYBREAK_DB_PATH", "daybreak.db")),
            jwt_secret: required("DAYBREAK_JWT_SECRET")?,
            frontend_url: optional("DAYBREAK_FRONTEND_URL", "http://localhost:3000"),
            google_client_id: required("GOOGLE_CLIENT_ID")?,
            google_client_secret: required("GOOGLE_CLIENT_SECRET")?,
            google_redirect_url: required("GOOGLE_REDIRECT_URL")?,
            spotify_client_id: optional("SPOTIFY_CLIENT_ID", ""),
            spotify_client_secret: optional("SPOTIFY_CLIENT_SECRET", ""),
            object_store: ObjectStoreConfig {
                endpoint,
                region: optional("S3_REGION", "auto"),
                access_key_id: required("S3_ACCESS_KEY_ID")?,
                secret_access_key: required("S3_SECRET_ACCESS_KEY")?,
                bucket: required("S3_BUCKET")?,
                public_url,
            },
        })
    }
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{} must be set", key))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
