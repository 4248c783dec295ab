use axum::Extension;
use axum::extract::{Multipart, State};
use chrono::Utc;
use rand::RngCore;

use daybreak_types::api::{Claims, UploadResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::Json;

/// 5 MB upload limit for photos
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

const ALLOWED_MIME: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];
const ALLOWED_EXT: [&str; 4] = [".jpg", ".jpeg", ".png", ".webp"];

/// POST /upload — multipart field `image`, validated here before anything
/// touches the object store, then stored under a fresh key.
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut image = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Validation("invalid multipart body".to_string()))?
    {
        if field.name() == Some("image") {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|_| ApiError::Validation("failed to read image field".to_string()))?;
            image = Some((file_name, content_type, data));
            break;
        }
    }

    let (file_name, content_type, data) =
        image.ok_or_else(|| ApiError::Validation("no image file provided".to_string()))?;

    validate_image(data.len(), &content_type, &file_name)?;

    let key = object_key(&file_name);
    let url = state.store.put(&key, data.to_vec(), &content_type).await?;

    Ok(Json(UploadResponse { url }))
}

/// All three checks run before any network call: size cap, declared MIME
/// type, and file extension. MIME and extension are checked independently —
/// a `.gif` with an allowed MIME type fails, and vice versa.
fn validate_image(size: usize, content_type: &str, file_name: &str) -> Result<(), ApiError> {
    if size > MAX_FILE_SIZE {
        return Err(ApiError::Validation(
            "file size exceeds 5mb limit".to_string(),
        ));
    }

    if !ALLOWED_MIME.contains(&content_type) {
        return Err(ApiError::Validation(format!(
            "invalid file type: {}",
            content_type
        )));
    }

    let ext = extension(file_name);
    if !ALLOWED_EXT.contains(&ext.as_str()) {
        return Err(ApiError::Validation(format!(
            "invalid file extension: {}",
            ext
        )));
    }

    Ok(())
}

fn extension(file_name: &str) -> String {
    file_name
        .rfind('.')
        .map(|i| file_name[i..].to_ascii_lowercase())
        .unwrap_or_default()
}

/// Fresh object key: nanosecond timestamp + 8 random bytes + original
/// extension, e.g. `1717000000000000000_a1b2c3d4e5f60718.jpg`.
fn object_key(original_name: &str) -> String {
    let mut random = [0u8; 8];
    rand::rng().fill_bytes(&mut random);
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{}_{}{}", nanos, hex::encode(random), extension(original_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_images() {
        assert!(validate_image(1024, "image/jpeg", "morning.jpg").is_ok());
        assert!(validate_image(1024, "image/png", "photo.PNG").is_ok());
        assert!(validate_image(MAX_FILE_SIZE, "image/webp", "pic.webp").is_ok());
    }

    #[test]
    fn rejects_oversized_file() {
        let err = validate_image(6 * 1024 * 1024, "image/jpeg", "big.jpg").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn rejects_disallowed_extension_despite_valid_mime() {
        let err = validate_image(1024, "image/jpeg", "sneaky.gif").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn rejects_disallowed_mime_despite_valid_extension() {
        let err = validate_image(1024, "image/gif", "looks-fine.jpg").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn rejects_missing_extension() {
        assert!(validate_image(1024, "image/jpeg", "noext").is_err());
    }

    #[test]
    fn object_key_keeps_extension() {
        let key = object_key("holiday.JPEG");
        assert!(key.ends_with(".jpeg"), "got {}", key);
        assert_ne!(object_key("a.jpg"), object_key("a.jpg"));
    }
}
