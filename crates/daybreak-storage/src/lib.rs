//! Object storage for uploaded photos. Targets any S3-compatible store
//! (R2, MinIO, S3 itself) through a custom endpoint URL and static
//! credentials. The rest of the system only sees `put`, which returns the
//! public URL of the stored object.

use anyhow::{Context, Result};
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use tracing::info;

#[derive(Debug, Clone)]
pub struct ObjectStoreConfig {
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
    /// Base URL objects are served from; falls back to the endpoint.
    pub public_url: String,
}

pub struct ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_url: String,
}

impl ObjectStore {
    pub fn new(cfg: ObjectStoreConfig) -> Self {
        let credentials = Credentials::new(
            cfg.access_key_id,
            cfg.secret_access_key,
            None,
            None,
            "daybreak-static",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(cfg.region))
            .endpoint_url(&cfg.endpoint)
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: cfg.bucket,
            public_url: cfg.public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Store an object and return its public URL.
    pub async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let size = bytes.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .with_context(|| format!("putting object '{}'", key))?;

        info!("Stored object '{}' ({} bytes)", key, size);
        Ok(format!("{}/{}", self.public_url, key))
    }
}
