//! Session domain model and persistence contract.

pub mod model;
pub mod repository;

pub use model::Session;
pub use repository::SessionRepository;
