//! LLM module for spending insights
//!
//! Provides the Gemini `generateContent` client behind the
//! `InsightGenerator` abstraction.

mod gemini_client;
mod insight_generator;

pub use gemini_client::GeminiClient;
pub use insight_generator::InsightGenerator;
