use std::io::Cursor;

use anyhow::Context;
use bytes::Bytes;
use image::{DynamicImage, ImageError, ImageFormat};
use uuid::Uuid;

use crate::state::AppState;

/// Content types accepted for label uploads.
pub const ALLOWED_CONTENT_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

pub const STORED_CONTENT_TYPE: &str = "image/webp";

/// Lifetime of URLs embedded in analysis responses.
pub const RESPONSE_URL_TTL_SECS: u64 = 30 * 60;
/// Lifetime of URLs behind the image redirect.
pub const REDIRECT_URL_TTL_SECS: u64 = 10 * 60;

pub fn is_supported_content_type(ct: &str) -> bool {
    let essence = ct.split(';').next().unwrap_or_default().trim();
    ALLOWED_CONTENT_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(essence))
}

pub fn image_key(user_id: Uuid, analysis_id: Uuid) -> String {
    format!("analyses/{}/{}.webp", user_id, analysis_id)
}

/// Re-encode any supported upload as lossless WebP.
pub fn encode_webp(bytes: &[u8]) -> Result<Vec<u8>, ImageError> {
    let img = image::load_from_memory(bytes)?;
    let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
    let mut out = Vec::new();
    rgba.write_to(&mut Cursor::new(&mut out), ImageFormat::WebP)?;
    Ok(out)
}

/// Encode and upload the label photo; returns the storage key.
pub async fn store_label_image(
    st: &AppState,
    user_id: Uuid,
    analysis_id: Uuid,
    original: Bytes,
) -> anyhow::Result<String> {
    let webp = tokio::task::spawn_blocking(move || encode_webp(&original))
        .await
        .context("webp encoding task failed")?
        .context("encode webp")?;

    let key = image_key(user_id, analysis_id);
    st.storage
        .put_object(&key, Bytes::from(webp), STORED_CONTENT_TYPE)
        .await
        .with_context(|| format!("put_object {}", key))?;
    Ok(key)
}

pub async fn presign(st: &AppState, key: &str, ttl_secs: u64) -> anyhow::Result<String> {
    st.storage
        .presign_get(key, ttl_secs)
        .await
        .with_context(|| format!("presign url for {}", key))
}
