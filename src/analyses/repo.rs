use anyhow::Context;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::ai::RiskLevel;

/// Row in `analyses`; `image_url` holds the storage key.
#[derive(Debug, Clone, FromRow)]
pub struct AnalysisRow {
    pub id: Uuid,
    pub original_text: String,
    pub translated_text: Option<String>,
    pub analysis: String,
    pub recommendations: String,
    pub risk_level: String,
    pub image_url: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct NewAnalysis<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub original_text: &'a str,
    pub translated_text: Option<&'a str>,
    pub analysis: &'a str,
    pub recommendations: &'a str,
    pub risk_level: RiskLevel,
    pub image_key: Option<&'a str>,
}

pub async fn insert(db: &PgPool, new: &NewAnalysis<'_>) -> anyhow::Result<AnalysisRow> {
    sqlx::query_as::<_, AnalysisRow>(
        r#"
        INSERT INTO analyses
            (id, user_id, original_text, translated_text, analysis, recommendations, risk_level, image_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, original_text, translated_text, analysis, recommendations,
                  risk_level, image_url, created_at
        "#,
    )
    .bind(new.id)
    .bind(new.user_id)
    .bind(new.original_text)
    .bind(new.translated_text)
    .bind(new.analysis)
    .bind(new.recommendations)
    .bind(new.risk_level.as_str())
    .bind(new.image_key) // Option<&str> → NULL allowed
    .fetch_one(db)
    .await
    .context("insert analysis")
}

/// Newest first.
pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<AnalysisRow>> {
    sqlx::query_as::<_, AnalysisRow>(
        r#"
        SELECT id, original_text, translated_text, analysis, recommendations,
               risk_level, image_url, created_at
          FROM analyses
         WHERE user_id = $1
         ORDER BY created_at DESC, id DESC
         LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("list analyses by user")
}

/// `None` both when the row is missing and when it belongs to someone else.
pub async fn find_for_user(
    db: &PgPool,
    user_id: Uuid,
    analysis_id: Uuid,
) -> anyhow::Result<Option<AnalysisRow>> {
    sqlx::query_as::<_, AnalysisRow>(
        r#"
        SELECT id, original_text, translated_text, analysis, recommendations,
               risk_level, image_url, created_at
          FROM analyses
         WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(analysis_id)
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("get analysis for user")
}
