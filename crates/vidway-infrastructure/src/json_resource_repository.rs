//! JSON-backed ResourceRepository implementation.

use std::sync::Arc;

use async_trait::async_trait;

use vidway_core::error::Result;
use vidway_core::resource::{Resource, ResourceRepository, ResourceUri};

use crate::storage::KeyValueStore;

/// Stores resources as individual JSON records, keyed by kind and id.
///
/// Layout: `resources/{kind}/{id}`.
pub struct JsonResourceRepository {
    store: Arc<dyn KeyValueStore>,
}

impl JsonResourceRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn resource_key(uri: &ResourceUri) -> String {
        format!("resources/{}/{}", uri.kind(), uri.id())
    }
}

#[async_trait]
impl ResourceRepository for JsonResourceRepository {
    async fn find_by_uri(&self, uri: &ResourceUri) -> Result<Option<Resource>> {
        match self.store.get(&Self::resource_key(uri)).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, resource: &Resource) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(resource)?;
        self.store
            .put(&Self::resource_key(&resource.uri), &bytes)
            .await
    }

    async fn delete(&self, uri: &ResourceUri) -> Result<()> {
        self.store.delete(&Self::resource_key(uri)).await
    }
}
