//! ScreenerStore - confirmed-round-trip persistence of screeners and folders
//!
//! This crate owns the Screener and Folder entities. Every mutation
//! round-trips through the external persistence collaborator and is only
//! published to readers once the collaborator confirms; a failed mutation
//! leaves the last confirmed state in place.

pub mod backend;
pub mod error;
pub mod http;
pub mod memory;
pub mod models;
pub mod store;

pub use backend::PersistenceBackend;
pub use error::StoreError;
pub use http::HttpPersistence;
pub use memory::MemoryPersistence;
pub use models::{Folder, MutationState, Screener, DEFAULT_USER_ID};
pub use store::ScreenerStore;

// Result type alias
pub type Result<T> = std::result::Result<T, StoreError>;
