//! Text extraction from label photos.
//!
//! The image is cleaned up in-process (see [`preprocess`]) and then handed to
//! an [`OcrEngine`]. The production engine shells out to Tesseract.

mod preprocess;
mod tesseract;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info};

pub use preprocess::preprocess;
pub use tesseract::TesseractCli;

/// Anything able to turn a PNG into plain text.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, png: Bytes) -> anyhow::Result<String>;
}

#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("unreadable image: {0}")]
    Decode(#[from] image::ImageError),
    #[error(transparent)]
    Engine(#[from] anyhow::Error),
}

/// Preprocess `image` on the blocking pool, run OCR and trim the result.
pub async fn extract_text(engine: &dyn OcrEngine, image: Bytes) -> Result<String, OcrError> {
    let input_len = image.len();
    let png = tokio::task::spawn_blocking(move || preprocess(&image))
        .await
        .context("image preprocessing task failed")??;
    debug!(input_len, png_len = png.len(), "image preprocessed for ocr");

    let text = engine.recognize(Bytes::from(png)).await?;
    let text = text.trim().to_string();
    info!(chars = text.chars().count(), "ocr completed");
    Ok(text)
}


#[cfg(test)]
mod tests {
    use super::testing::{tiny_png, StaticOcr};
    use super::*;

    #[tokio::test]
    async fn extract_text_trims_engine_output() {
        let engine = StaticOcr("  \n Water, Sugar, Citric Acid \n\n".into());
        let text = extract_text(&engine, Bytes::from(tiny_png())).await.unwrap();
        assert_eq!(text, "Water, Sugar, Citric Acid");
    }

    #[tokio::test]
    async fn extract_text_rejects_garbage_bytes() {
        let engine = StaticOcr("never reached".into());
        let err = extract_text(&engine, Bytes::from_static(b"definitely not an image"))
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::Decode(_)));
    }
}
