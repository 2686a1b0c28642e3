//! Resource repository trait.

use async_trait::async_trait;

use super::model::Resource;
use super::uri::ResourceUri;
use crate::error::Result;

/// An abstract repository for resource persistence.
///
/// Implementations must make every successful `save` durable before
/// returning, so a crash immediately afterwards never loses the record.
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    /// Finds a resource by its URI. Returns `Ok(None)` when absent.
    async fn find_by_uri(&self, uri: &ResourceUri) -> Result<Option<Resource>>;

    /// Saves a resource to storage.
    async fn save(&self, resource: &Resource) -> Result<()>;

    /// Deletes a resource. Deleting a missing resource is not an error.
    async fn delete(&self, uri: &ResourceUri) -> Result<()>;
}
