use async_trait::async_trait;

use crate::core::error::Result;

/// Text generation service producing natural-language spending analyses
#[async_trait]
pub trait InsightGenerator: Send + Sync {
    /// Submit `prompt` and return the generated text as-is
    async fn generate(&self, prompt: &str) -> Result<String>;
}
