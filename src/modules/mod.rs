//! Modules layer - Infrastructure components for external integrations
//!
//! Contains clients and adapters for object storage and the LLM provider.

pub mod llm;
pub mod storage;
