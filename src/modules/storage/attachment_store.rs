use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::Result;
use crate::modules::storage::MinIOClient;
use crate::shared::validation::sanitize_file_name;

/// An object written to the attachment store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Publicly reachable URL of the object
    pub url: String,
    /// Opaque handle that removes this object again
    pub deletion_handle: String,
}

/// Object storage for bill attachments
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Store `data` under `folder`, named after `file_name`
    async fn upload(
        &self,
        folder: &str,
        file_name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject>;

    /// Remove the object behind a handle returned by [`AttachmentStore::upload`]
    async fn delete(&self, deletion_handle: &str) -> Result<()>;
}

#[async_trait]
impl AttachmentStore for MinIOClient {
    async fn upload(
        &self,
        folder: &str,
        file_name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject> {
        // A fresh UUID per object keeps same-named files from different bills apart
        let path = format!(
            "{}/{}/{}",
            folder,
            Uuid::new_v4(),
            sanitize_file_name(file_name)
        );
        let key = self.generate_public_key(&path);

        MinIOClient::upload(self, &key, &data, content_type).await?;

        Ok(StoredObject {
            url: self.get_public_url(&key),
            deletion_handle: key,
        })
    }

    async fn delete(&self, deletion_handle: &str) -> Result<()> {
        MinIOClient::delete(self, deletion_handle).await
    }
}
