//! Storage module for bill attachments
//!
//! Provides the MinIO/S3-compatible client and the `AttachmentStore`
//! abstraction the bill service uploads through.

mod attachment_store;
mod minio_client;

pub use attachment_store::{AttachmentStore, StoredObject};
pub use minio_client::MinIOClient;
