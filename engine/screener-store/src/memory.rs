//! In-process persistence collaborator

use crate::backend::PersistenceBackend;
use crate::error::StoreError;
use crate::models::{Folder, Screener};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// Keyed in-memory backend for tests and local runs.
///
/// `fail_next_mutation` makes the next mutating call reject without applying
/// anything, which is how the revert-on-failure path is exercised.
#[derive(Default)]
pub struct MemoryPersistence {
    screeners: Mutex<HashMap<String, Screener>>,
    folders: Mutex<HashMap<String, Folder>>,
    fail_next: AtomicBool,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next mutating call fail
    pub fn fail_next_mutation(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn check_failure(&self, action: &str) -> Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            Err(StoreError::MutationFailed { message: format!("injected failure on {action}") })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PersistenceBackend for MemoryPersistence {
    async fn list_screeners(&self, user_id: &str) -> Result<Vec<Screener>> {
        let screeners = self.screeners.lock().await;
        Ok(screeners.values().filter(|s| s.user_id == user_id).cloned().collect())
    }

    async fn create_screener(&self, screener: &Screener) -> Result<Screener> {
        self.check_failure("create screener")?;
        let mut screeners = self.screeners.lock().await;
        screeners.insert(screener.id.clone(), screener.clone());
        Ok(screener.clone())
    }

    async fn update_screener(&self, screener: &Screener) -> Result<Screener> {
        self.check_failure("update screener")?;
        let mut screeners = self.screeners.lock().await;
        if !screeners.contains_key(&screener.id) {
            return Err(StoreError::ScreenerNotFound { id: screener.id.clone() });
        }
        screeners.insert(screener.id.clone(), screener.clone());
        Ok(screener.clone())
    }

    async fn delete_screener(&self, id: &str) -> Result<()> {
        self.check_failure("delete screener")?;
        let mut screeners = self.screeners.lock().await;
        screeners
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::ScreenerNotFound { id: id.to_string() })
    }

    async fn list_folders(&self, user_id: &str) -> Result<Vec<Folder>> {
        let folders = self.folders.lock().await;
        Ok(folders.values().filter(|f| f.user_id == user_id).cloned().collect())
    }

    async fn create_folder(&self, folder: &Folder) -> Result<Folder> {
        self.check_failure("create folder")?;
        let mut folders = self.folders.lock().await;
        folders.insert(folder.id.clone(), folder.clone());
        Ok(folder.clone())
    }

    async fn update_folder(&self, folder: &Folder) -> Result<Folder> {
        self.check_failure("update folder")?;
        let mut folders = self.folders.lock().await;
        if !folders.contains_key(&folder.id) {
            return Err(StoreError::FolderNotFound { id: folder.id.clone() });
        }
        folders.insert(folder.id.clone(), folder.clone());
        Ok(folder.clone())
    }

    async fn delete_folder(&self, id: &str) -> Result<()> {
        self.check_failure("delete folder")?;
        let mut folders = self.folders.lock().await;
        folders
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::FolderNotFound { id: id.to_string() })
    }
}
