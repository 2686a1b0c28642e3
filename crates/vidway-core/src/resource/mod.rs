//! Resource domain model: durably stored, URI-addressable call results.

pub mod model;
pub mod repository;
pub mod uri;

pub use model::Resource;
pub use repository::ResourceRepository;
pub use uri::{ResourceKind, ResourceUri, URI_SCHEME};
