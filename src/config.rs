use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

/// Settings for the hosted generative-AI endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    pub command: String,
    pub language: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub ai: AiConfig,
    pub ocr: OcrConfig,
    pub max_upload_bytes: usize,
    /// Empty means any origin is accepted.
    pub cors_origins: Vec<String>,
}

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: env_required("JWT_SECRET")?,
            issuer: env_or("JWT_ISSUER", "toxscan"),
            audience: env_or("JWT_AUDIENCE", "toxscan-users"),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 60 * 24 * 7),
            refresh_ttl_minutes: env_parse("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };
        let storage = StorageConfig {
            endpoint: env_required("MINIO_ENDPOINT")?,
            bucket: env_required("MINIO_BUCKET")?,
            access_key: env_required("MINIO_ACCESS_KEY")?,
            secret_key: env_required("MINIO_SECRET_KEY")?,
            region: env_or("MINIO_REGION", "us-east-1"),
        };
        let ai = AiConfig {
            api_key: std::env::var("GOOGLE_AI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            model: env_or("GEMINI_MODEL", "gemini-2.0-flash"),
            base_url: env_or("GEMINI_BASE_URL", "https://generativelanguage.googleapis.com"),
            timeout_secs: env_parse("AI_TIMEOUT_SECS", 60),
        };
        let ocr = OcrConfig {
            command: env_or("TESSERACT_CMD", "tesseract"),
            language: env_or("OCR_LANG", "eng"),
            timeout_secs: env_parse("OCR_TIMEOUT_SECS", 60),
        };
        let cors_origins = std::env::var("CORS_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_default();

        Ok(Self {
            database_url,
            jwt,
            storage,
            ai,
            ocr,
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            cors_origins,
        })
    }
}

fn env_required(key: &str) -> anyhow::Result<String> {
    std::env::var(key).with_context(|| format!("{key} must be set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_origins_skips_blanks() {
        let origins = parse_origins(" http://localhost:5173, ,https://toxscan.example ,");
        assert_eq!(
            origins,
            vec!["http://localhost:5173", "https://toxscan.example"]
        );
    }

    #[test]
    fn env_parse_falls_back_on_garbage() {
        std::env::set_var("TOXSCAN_TEST_NUMBER", "not-a-number");
        assert_eq!(env_parse("TOXSCAN_TEST_NUMBER", 42u64), 42);
        std::env::set_var("TOXSCAN_TEST_NUMBER", "7");
        assert_eq!(env_parse("TOXSCAN_TEST_NUMBER", 42u64), 7);
        std::env::remove_var("TOXSCAN_TEST_NUMBER");
    }

    #[test]
    fn missing_required_var_is_named() {
        std::env::remove_var("TOXSCAN_TEST_REQUIRED");
        let err = env_required("TOXSCAN_TEST_REQUIRED").unwrap_err();
        assert_eq!(err.to_string(), "TOXSCAN_TEST_REQUIRED must be set");

        std::env::set_var("TOXSCAN_TEST_REQUIRED", "present");
        assert_eq!(env_required("TOXSCAN_TEST_REQUIRED").unwrap(), "present");
        std::env::remove_var("TOXSCAN_TEST_REQUIRED");
    }
}
