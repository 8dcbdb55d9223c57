//! Persistence collaborator seam

use crate::models::{Folder, Screener};
use crate::Result;
use async_trait::async_trait;

/// External keyed-record store the screener store round-trips through.
///
/// Implementations confirm a mutation by returning `Ok`; any `Err` means the
/// mutation must be treated as not applied.
#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    async fn list_screeners(&self, user_id: &str) -> Result<Vec<Screener>>;

    async fn create_screener(&self, screener: &Screener) -> Result<Screener>;

    /// Replace the stored screener's criteria wholesale (no partial patches)
    async fn update_screener(&self, screener: &Screener) -> Result<Screener>;

    async fn delete_screener(&self, id: &str) -> Result<()>;

    async fn list_folders(&self, user_id: &str) -> Result<Vec<Folder>>;

    async fn create_folder(&self, folder: &Folder) -> Result<Folder>;

    /// Replace the stored folder wholesale, membership list included
    async fn update_folder(&self, folder: &Folder) -> Result<Folder>;

    async fn delete_folder(&self, id: &str) -> Result<()>;
}
