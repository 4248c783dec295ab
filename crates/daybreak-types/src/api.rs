use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Notice, User};

// -- JWT Claims --

/// Session claims carried in the `jwt` cookie. Canonical definition lives
/// here in daybreak-types so the middleware and the issuer agree on shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: usize,
    pub exp: usize,
}

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditUserRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PairRequest {
    pub pair_code: String,
}

/// `partner` is null when the caller is unpaired, or when the partner row
/// could not be loaded (logged server-side, not an error for the caller).
#[derive(Debug, Serialize)]
pub struct UserWithPartner {
    pub user: User,
    pub partner: Option<User>,
}

// -- Notices --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateNoticeRequest {
    pub message: Option<String>,
    pub photo_url: Option<String>,
    pub song_url: Option<String>,
    pub song_explanation: Option<String>,
    pub foreground_color: String,
    pub background_color: String,
}

#[derive(Debug, Serialize)]
pub struct CurrentNoticeResponse {
    pub notice: Option<Notice>,
}

// -- Uploads --

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

// -- Push --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PushSubscribeRequest {
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
}

// -- Acks --

#[derive(Debug, Serialize)]
pub struct Ack {
    pub message: &'static str,
}

impl Ack {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}
