//! Ingredient safety analysis delegated to a hosted LLM.

mod gemini;
mod prompt;
mod report;

use async_trait::async_trait;

pub use gemini::GeminiClient;
pub use prompt::build_prompt;
pub use report::{RiskLevel, SafetyReport};

/// Produces a safety report for a block of ingredient text.
#[async_trait]
pub trait SafetyAnalyzer: Send + Sync {
    async fn analyze(&self, ingredients: &str) -> anyhow::Result<SafetyReport>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Parses a canned reply instead of calling out.
    pub struct CannedAnalyzer(pub String);

    #[async_trait]
    impl SafetyAnalyzer for CannedAnalyzer {
        async fn analyze(&self, _ingredients: &str) -> anyhow::Result<SafetyReport> {
            Ok(SafetyReport::from_reply(self.0.clone()))
        }
    }
}
