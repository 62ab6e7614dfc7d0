use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::ai::RiskLevel;

pub const DEFAULT_HISTORY_LIMIT: i64 = 50;
pub const MAX_HISTORY_LIMIT: i64 = 100;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub id: Uuid,
    pub original_text: String,
    pub translated_text: Option<String>,
    pub analysis: String,
    pub recommendations: String,
    pub risk_level: RiskLevel,
    /// Presigned URL, short lived.
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    DEFAULT_HISTORY_LIMIT
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_HISTORY_LIMIT,
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn clamped(&self) -> (i64, i64) {
        (self.limit.clamp(1, MAX_HISTORY_LIMIT), self.offset.max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn pagination_defaults_and_clamps() {
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.clamped(), (50, 0));
        let p = Pagination { limit: 10_000, offset: -3 };
        assert_eq!(p.clamped(), (MAX_HISTORY_LIMIT, 0));
        let p = Pagination { limit: 0, offset: 20 };
        assert_eq!(p.clamped(), (1, 20));
    }

    #[test]
    fn response_uses_client_field_names() {
        let res = AnalysisResponse {
            id: Uuid::nil(),
            original_text: "Wasser, Zucker".into(),
            translated_text: Some("Water, sugar".into()),
            analysis: "...".into(),
            recommendations: "Moderation.".into(),
            risk_level: RiskLevel::Low,
            image_url: None,
            created_at: datetime!(2024-05-06 07:08:09 UTC),
        };
        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["originalText"], "Wasser, Zucker");
        assert_eq!(json["translatedText"], "Water, sugar");
        assert_eq!(json["riskLevel"], "low");
        assert!(json["imageUrl"].is_null());
        assert_eq!(json["createdAt"], "2024-05-06T07:08:09Z");
    }
}
