use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::AnalysisResponse,
    repo::{self, AnalysisRow, NewAnalysis},
};
use crate::{
    ai::RiskLevel,
    error::AppError,
    images::services::{presign, store_label_image, RESPONSE_URL_TTL_SECS},
    ocr::{self, OcrError},
    state::AppState,
};

/// Fewer extracted characters than this means the photo was unreadable.
pub const MIN_TEXT_CHARS: usize = 10;

pub const INSUFFICIENT_TEXT: &str = "Could not extract sufficient text from image. \
Please ensure the image is clear and contains readable ingredient text.";

/// OCR → AI → store image → insert row.
pub async fn analyze_label(
    st: &AppState,
    user_id: Uuid,
    image: Bytes,
) -> Result<AnalysisResponse, AppError> {
    let text = match ocr::extract_text(st.ocr.as_ref(), image.clone()).await {
        Ok(t) => t,
        Err(OcrError::Decode(e)) => {
            warn!(error = %e, %user_id, "upload is not a decodable image");
            return Err(AppError::bad_request("Could not read the uploaded image"));
        }
        Err(OcrError::Engine(e)) => {
            return Err(AppError::internal("Failed to extract text from image", e));
        }
    };

    if text.chars().count() < MIN_TEXT_CHARS {
        warn!(%user_id, chars = text.chars().count(), "insufficient text extracted");
        return Err(AppError::bad_request(INSUFFICIENT_TEXT));
    }

    let report = st
        .analyzer
        .analyze(&text)
        .await
        .map_err(|e| AppError::internal("Failed to analyze ingredients with AI", e))?;

    let analysis_id = Uuid::new_v4();
    let image_key = match store_label_image(st, user_id, analysis_id, image).await {
        Ok(key) => Some(key),
        Err(e) => {
            warn!(error = ?e, %analysis_id, "image not stored; continuing without it");
            None
        }
    };

    let new = NewAnalysis {
        id: analysis_id,
        user_id,
        original_text: &text,
        translated_text: report.translated_text.as_deref(),
        analysis: &report.full_analysis,
        recommendations: &report.recommendations,
        risk_level: report.risk_level,
        image_key: image_key.as_deref(),
    };
    let row = match repo::insert(&st.db, &new).await {
        Ok(row) => row,
        Err(e) => {
            if let Some(key) = &image_key {
                if let Err(del) = st.storage.delete_object(key).await {
                    warn!(error = ?del, %key, "orphaned image left in storage");
                }
            }
            return Err(AppError::internal("Failed to save analysis", e));
        }
    };

    info!(
        %user_id,
        analysis_id = %row.id,
        risk_level = %report.risk_level,
        "analysis stored"
    );
    Ok(to_response(st, row).await?)
}

pub async fn history(
    st: &AppState,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<AnalysisResponse>> {
    let rows = repo::list_by_user(&st.db, user_id, limit, offset).await?;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(to_response(st, row).await?);
    }
    Ok(out)
}

pub async fn get_for_user(
    st: &AppState,
    user_id: Uuid,
    analysis_id: Uuid,
) -> anyhow::Result<Option<AnalysisResponse>> {
    match repo::find_for_user(&st.db, user_id, analysis_id).await? {
        Some(row) => Ok(Some(to_response(st, row).await?)),
        None => Ok(None),
    }
}

/// Storage key → presigned URL. A presign failure drops the URL, not the row.
pub async fn to_response(st: &AppState, row: AnalysisRow) -> anyhow::Result<AnalysisResponse> {
    let risk_level: RiskLevel = row.risk_level.parse()?;
    let image_url = match row.image_url.as_deref() {
        Some(key) => match presign(st, key, RESPONSE_URL_TTL_SECS).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(error = ?e, analysis_id = %row.id, "presign failed");
                None
            }
        },
        None => None,
    };
    Ok(AnalysisResponse {
        id: row.id,
        original_text: row.original_text,
        translated_text: row.translated_text,
        analysis: row.analysis,
        recommendations: row.recommendations,
        risk_level,
        image_url,
        created_at: row.created_at,
    })
}
