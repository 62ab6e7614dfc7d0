use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{AnalysisResponse, Pagination},
    repo, services,
};
use crate::{
    auth::AuthUser,
    error::AppError,
    extract::{ApiMultipart, ApiPath, ApiQuery},
    images::services::{is_supported_content_type, presign, REDIRECT_URL_TTL_SECS},
    state::AppState,
};

const IMAGE_FIELD: &str = "image";
const INVALID_TYPE: &str = "Invalid file type. Only JPEG, PNG, GIF, and WebP are allowed.";

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/analysis/history", get(history))
        .route("/analysis/:id", get(get_analysis))
        .route("/analysis/:id/image", get(get_image))
}

pub fn write_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/analysis/upload", post(upload))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("File too large".into())
    } else {
        AppError::bad_request(format!("Invalid upload: {}", e.body_text()))
    }
}

/// Pull the `image` field out of the form, checking its declared type.
async fn read_image_field(mp: &mut Multipart) -> Result<Option<Bytes>, AppError> {
    while let Some(field) = mp.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        if !is_supported_content_type(&content_type) {
            warn!(%content_type, "rejected upload type");
            return Err(AppError::bad_request(INVALID_TYPE));
        }
        let data = field.bytes().await.map_err(multipart_error)?;
        return Ok((!data.is_empty()).then_some(data));
    }
    Ok(None)
}

/// POST /analysis/upload (multipart, field `image`)
#[instrument(skip(state, mp))]
pub async fn upload(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiMultipart(mut mp): ApiMultipart,
) -> Result<Json<AnalysisResponse>, AppError> {
    let image = read_image_field(&mut mp)
        .await?
        .ok_or_else(|| AppError::bad_request("No image file provided"))?;

    info!(%user_id, bytes = image.len(), "processing image upload");
    let analysis = services::analyze_label(&state, user_id, image).await?;
    Ok(Json(analysis))
}

#[instrument(skip(state))]
pub async fn history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiQuery(p): ApiQuery<Pagination>,
) -> Result<Json<Vec<AnalysisResponse>>, AppError> {
    let (limit, offset) = p.clamped();
    let items = services::history(&state, user_id, limit, offset)
        .await
        .map_err(|e| AppError::internal("Failed to fetch analysis history", e))?;
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn get_analysis(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<AnalysisResponse>, AppError> {
    services::get_for_user(&state, user_id, id)
        .await
        .map_err(|e| AppError::internal("Failed to fetch analysis", e))?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Analysis not found"))
}

/// 307 → presigned url of the stored label photo
#[instrument(skip(state))]
pub async fn get_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Redirect, AppError> {
    let row = repo::find_for_user(&state.db, user_id, id)
        .await
        .map_err(|e| AppError::internal("Failed to fetch analysis", e))?
        .ok_or_else(|| AppError::not_found("Analysis not found"))?;
    let key = row
        .image_url
        .ok_or_else(|| AppError::not_found("Image not found"))?;

    let url = presign(&state, &key, REDIRECT_URL_TTL_SECS)
        .await
        .map_err(|e| AppError::internal("Failed to load image", e))?;
    Ok(Redirect::temporary(&url))
}
