//! ScreenerStore implementation

use crate::backend::PersistenceBackend;
use crate::error::StoreError;
use crate::models::{Folder, MutationState, Screener};
use crate::Result;
use screener_engine::FilterCriteria;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

/// Store of screeners and folders with confirmed-round-trip mutations.
///
/// Readers only ever see confirmed state. A mutation transitions its entity
/// `Idle → Pending → Confirmed|Failed`; on failure nothing unconfirmed was
/// published, so the last confirmed value is what readers keep seeing.
/// Mutations on the same entity are serialized: a second edit waits for the
/// first round-trip to resolve or fail before starting.
pub struct ScreenerStore {
    backend: Arc<dyn PersistenceBackend>,

    /// Confirmed screeners (id -> entity)
    screeners: RwLock<HashMap<String, Screener>>,

    /// Confirmed folders (id -> entity)
    folders: RwLock<HashMap<String, Folder>>,

    /// Last mutation state per entity id
    mutation_states: RwLock<HashMap<String, MutationState>>,

    /// Per-entity mutation locks
    entity_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ScreenerStore {
    /// Create a store over a persistence collaborator
    pub fn new(backend: Arc<dyn PersistenceBackend>) -> Self {
        Self {
            backend,
            screeners: RwLock::new(HashMap::new()),
            folders: RwLock::new(HashMap::new()),
            mutation_states: RwLock::new(HashMap::new()),
            entity_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Load the confirmed state for `user_id` from the collaborator
    pub async fn init(&self, user_id: &str) -> Result<()> {
        let screeners = self.backend.list_screeners(user_id).await?;
        let folders = self.backend.list_folders(user_id).await?;
        info!("Loaded {} screeners and {} folders for {}", screeners.len(), folders.len(), user_id);

        let mut confirmed = self.screeners.write().await;
        for screener in screeners {
            confirmed.insert(screener.id.clone(), screener);
        }
        drop(confirmed);

        let mut confirmed = self.folders.write().await;
        for folder in folders {
            confirmed.insert(folder.id.clone(), folder);
        }
        Ok(())
    }

    async fn entity_lock(&self, id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.entity_locks.lock().await;
        locks.entry(id.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    async fn set_state(&self, id: &str, state: MutationState) {
        let mut states = self.mutation_states.write().await;
        states.insert(id.to_string(), state);
    }

    /// Last mutation state recorded for an entity
    pub async fn mutation_state(&self, id: &str) -> MutationState {
        let states = self.mutation_states.read().await;
        states.get(id).copied().unwrap_or_default()
    }

    // ---- screeners ----

    /// Confirmed screeners owned by `user_id`
    pub async fn list_screeners(&self, user_id: &str) -> Vec<Screener> {
        let screeners = self.screeners.read().await;
        let mut list: Vec<Screener> =
            screeners.values().filter(|s| s.user_id == user_id).cloned().collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        list
    }

    /// Confirmed screener by id
    pub async fn get_screener(&self, id: &str) -> Option<Screener> {
        let screeners = self.screeners.read().await;
        screeners.get(id).cloned()
    }

    /// Create a screener; published only once the collaborator confirms
    pub async fn create_screener(
        &self,
        user_id: &str,
        name: &str,
        criteria: FilterCriteria,
    ) -> Result<Screener> {
        let screener = Screener::new(user_id, name, criteria);
        let lock = self.entity_lock(&screener.id).await;
        let _guard = lock.lock().await;

        self.set_state(&screener.id, MutationState::Pending).await;
        match self.backend.create_screener(&screener).await {
            Ok(confirmed) => {
                let mut screeners = self.screeners.write().await;
                screeners.insert(confirmed.id.clone(), confirmed.clone());
                drop(screeners);
                self.set_state(&confirmed.id, MutationState::Confirmed).await;
                info!("Created screener {} ({})", confirmed.name, confirmed.id);
                Ok(confirmed)
            }
            Err(e) => {
                self.set_state(&screener.id, MutationState::Failed).await;
                warn!("Create screener {} failed: {}", screener.name, e);
                Err(e)
            }
        }
    }

    /// Replace a screener's criteria wholesale
    pub async fn update_screener(&self, id: &str, criteria: FilterCriteria) -> Result<Screener> {
        let lock = self.entity_lock(id).await;
        let _guard = lock.lock().await;

        let mut updated = self
            .get_screener(id)
            .await
            .ok_or_else(|| StoreError::ScreenerNotFound { id: id.to_string() })?;
        updated.criteria = criteria;

        self.set_state(id, MutationState::Pending).await;
        match self.backend.update_screener(&updated).await {
            Ok(confirmed) => {
                let mut screeners = self.screeners.write().await;
                screeners.insert(confirmed.id.clone(), confirmed.clone());
                drop(screeners);
                self.set_state(id, MutationState::Confirmed).await;
                Ok(confirmed)
            }
            Err(e) => {
                // Confirmed state was never touched; readers keep the
                // previous criteria.
                self.set_state(id, MutationState::Failed).await;
                warn!("Update screener {} failed: {}", id, e);
                Err(e)
            }
        }
    }

    /// Delete a screener once the collaborator confirms
    pub async fn delete_screener(&self, id: &str) -> Result<()> {
        let lock = self.entity_lock(id).await;
        let _guard = lock.lock().await;

        self.set_state(id, MutationState::Pending).await;
        match self.backend.delete_screener(id).await {
            Ok(()) => {
                let mut screeners = self.screeners.write().await;
                screeners.remove(id);
                drop(screeners);
                self.set_state(id, MutationState::Confirmed).await;
                info!("Deleted screener {}", id);
                Ok(())
            }
            Err(e) => {
                self.set_state(id, MutationState::Failed).await;
                warn!("Delete screener {} failed: {}", id, e);
                Err(e)
            }
        }
    }

    // ---- folders ----

    /// Confirmed folders owned by `user_id`
    pub async fn list_folders(&self, user_id: &str) -> Vec<Folder> {
        let folders = self.folders.read().await;
        let mut list: Vec<Folder> =
            folders.values().filter(|f| f.user_id == user_id).cloned().collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        list
    }

    /// Confirmed folder by id
    pub async fn get_folder(&self, id: &str) -> Option<Folder> {
        let folders = self.folders.read().await;
        folders.get(id).cloned()
    }

    /// Create a folder; published only once the collaborator confirms
    pub async fn create_folder(&self, user_id: &str, name: &str, color: &str) -> Result<Folder> {
        let folder = Folder::new(user_id, name, color);
        let lock = self.entity_lock(&folder.id).await;
        let _guard = lock.lock().await;

        self.set_state(&folder.id, MutationState::Pending).await;
        match self.backend.create_folder(&folder).await {
            Ok(confirmed) => {
                let mut folders = self.folders.write().await;
                folders.insert(confirmed.id.clone(), confirmed.clone());
                drop(folders);
                self.set_state(&confirmed.id, MutationState::Confirmed).await;
                info!("Created folder {} ({})", confirmed.name, confirmed.id);
                Ok(confirmed)
            }
            Err(e) => {
                self.set_state(&folder.id, MutationState::Failed).await;
                warn!("Create folder {} failed: {}", folder.name, e);
                Err(e)
            }
        }
    }

    /// Delete a folder once the collaborator confirms
    pub async fn delete_folder(&self, id: &str) -> Result<()> {
        let lock = self.entity_lock(id).await;
        let _guard = lock.lock().await;

        self.set_state(id, MutationState::Pending).await;
        match self.backend.delete_folder(id).await {
            Ok(()) => {
                let mut folders = self.folders.write().await;
                folders.remove(id);
                drop(folders);
                self.set_state(id, MutationState::Confirmed).await;
                Ok(())
            }
            Err(e) => {
                self.set_state(id, MutationState::Failed).await;
                warn!("Delete folder {} failed: {}", id, e);
                Err(e)
            }
        }
    }

    /// Add a symbol to a folder's membership. Idempotent: the new list is
    /// derived append-if-absent and submitted as a full replacement.
    pub async fn add_symbol(&self, folder_id: &str, symbol: &str) -> Result<Folder> {
        self.replace_membership(folder_id, |folder| folder.with_symbol(symbol)).await
    }

    /// Remove a symbol from a folder's membership; removing a non-member is
    /// a no-op round-trip.
    pub async fn remove_symbol(&self, folder_id: &str, symbol: &str) -> Result<Folder> {
        self.replace_membership(folder_id, |folder| folder.without_symbol(symbol)).await
    }

    async fn replace_membership<F>(&self, folder_id: &str, derive: F) -> Result<Folder>
    where
        F: FnOnce(&Folder) -> Vec<String>,
    {
        let lock = self.entity_lock(folder_id).await;
        let _guard = lock.lock().await;

        let mut updated = self
            .get_folder(folder_id)
            .await
            .ok_or_else(|| StoreError::FolderNotFound { id: folder_id.to_string() })?;
        updated.trading_pairs = derive(&updated);
        updated.updated_at = chrono::Utc::now();

        self.submit_folder_update(updated).await
    }

    /// Toggle the folder's starred flag as a confirmed full replacement
    pub async fn toggle_star(&self, folder_id: &str) -> Result<Folder> {
        let lock = self.entity_lock(folder_id).await;
        let _guard = lock.lock().await;

        let mut updated = self
            .get_folder(folder_id)
            .await
            .ok_or_else(|| StoreError::FolderNotFound { id: folder_id.to_string() })?;
        updated.is_starred = !updated.is_starred;
        updated.updated_at = chrono::Utc::now();

        self.submit_folder_update(updated).await
    }

    async fn submit_folder_update(&self, updated: Folder) -> Result<Folder> {
        let id = updated.id.clone();
        self.set_state(&id, MutationState::Pending).await;
        match self.backend.update_folder(&updated).await {
            Ok(confirmed) => {
                let mut folders = self.folders.write().await;
                folders.insert(confirmed.id.clone(), confirmed.clone());
                drop(folders);
                self.set_state(&id, MutationState::Confirmed).await;
                Ok(confirmed)
            }
            Err(e) => {
                self.set_state(&id, MutationState::Failed).await;
                warn!("Update folder {} failed: {}", id, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryPersistence;
    use crate::models::DEFAULT_USER_ID;

    fn store_with_memory() -> (ScreenerStore, Arc<MemoryPersistence>) {
        let backend = Arc::new(MemoryPersistence::new());
        (ScreenerStore::new(backend.clone()), backend)
    }

    fn criteria_with_volume(min: f64) -> FilterCriteria {
        FilterCriteria { volume_min: Some(min), ..Default::default() }
    }

    #[tokio::test]
    async fn test_create_and_list_screeners() {
        let (store, _) = store_with_memory();

        let created = store
            .create_screener(DEFAULT_USER_ID, "High volume", criteria_with_volume(1e9))
            .await
            .unwrap();

        let listed = store.list_screeners(DEFAULT_USER_ID).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
        assert_eq!(store.mutation_state(&created.id).await, MutationState::Confirmed);

        // Other users see nothing
        assert!(store.list_screeners("someone-else").await.is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_criteria_wholesale() {
        let (store, _) = store_with_memory();
        let created = store
            .create_screener(DEFAULT_USER_ID, "Movers", criteria_with_volume(1e9))
            .await
            .unwrap();

        let replacement = FilterCriteria { price_change_min: Some(3.0), ..Default::default() };
        let updated = store.update_screener(&created.id, replacement.clone()).await.unwrap();

        assert_eq!(updated.criteria, replacement);
        // The volume bound from the old criteria is gone, not merged
        assert_eq!(updated.criteria.volume_min, None);
    }

    #[tokio::test]
    async fn test_failed_update_keeps_confirmed_criteria() {
        let (store, backend) = store_with_memory();
        let created = store
            .create_screener(DEFAULT_USER_ID, "Movers", criteria_with_volume(1e9))
            .await
            .unwrap();

        backend.fail_next_mutation();
        let result = store.update_screener(&created.id, criteria_with_volume(5.0)).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().is_mutation_failure());

        let confirmed = store.get_screener(&created.id).await.unwrap();
        assert_eq!(confirmed.criteria.volume_min, Some(1e9));
        assert_eq!(store.mutation_state(&created.id).await, MutationState::Failed);
    }

    #[tokio::test]
    async fn test_failed_create_publishes_nothing() {
        let (store, backend) = store_with_memory();

        backend.fail_next_mutation();
        let result =
            store.create_screener(DEFAULT_USER_ID, "Doomed", FilterCriteria::default()).await;
        assert!(result.is_err());
        assert!(store.list_screeners(DEFAULT_USER_ID).await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_screener() {
        let (store, _) = store_with_memory();
        let created = store
            .create_screener(DEFAULT_USER_ID, "Movers", FilterCriteria::default())
            .await
            .unwrap();

        store.delete_screener(&created.id).await.unwrap();
        assert!(store.get_screener(&created.id).await.is_none());
    }

    #[tokio::test]
    async fn test_add_symbol_twice_yields_one_entry() {
        let (store, _) = store_with_memory();
        let folder = store.create_folder(DEFAULT_USER_ID, "Majors", "#3b82f6").await.unwrap();

        store.add_symbol(&folder.id, "BTCUSDT").await.unwrap();
        let after_second = store.add_symbol(&folder.id, "BTCUSDT").await.unwrap();

        let count =
            after_second.trading_pairs.iter().filter(|p| p.as_str() == "BTCUSDT").count();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_remove_non_member_is_noop() {
        let (store, _) = store_with_memory();
        let folder = store.create_folder(DEFAULT_USER_ID, "Majors", "#3b82f6").await.unwrap();
        store.add_symbol(&folder.id, "BTCUSDT").await.unwrap();

        let after = store.remove_symbol(&folder.id, "ETHUSDT").await.unwrap();
        assert_eq!(after.trading_pairs, vec!["BTCUSDT".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_membership_edit_keeps_confirmed_list() {
        let (store, backend) = store_with_memory();
        let folder = store.create_folder(DEFAULT_USER_ID, "Majors", "#3b82f6").await.unwrap();
        store.add_symbol(&folder.id, "BTCUSDT").await.unwrap();

        backend.fail_next_mutation();
        assert!(store.add_symbol(&folder.id, "ETHUSDT").await.is_err());

        let confirmed = store.get_folder(&folder.id).await.unwrap();
        assert_eq!(confirmed.trading_pairs, vec!["BTCUSDT".to_string()]);
    }

    #[tokio::test]
    async fn test_toggle_star_round_trips() {
        let (store, _) = store_with_memory();
        let folder = store.create_folder(DEFAULT_USER_ID, "Majors", "#3b82f6").await.unwrap();
        assert!(!folder.is_starred);

        let starred = store.toggle_star(&folder.id).await.unwrap();
        assert!(starred.is_starred);

        let unstarred = store.toggle_star(&folder.id).await.unwrap();
        assert!(!unstarred.is_starred);
    }

    #[tokio::test]
    async fn test_init_loads_confirmed_state() {
        let backend = Arc::new(MemoryPersistence::new());
        let seeded = Screener::new(DEFAULT_USER_ID, "Seeded", FilterCriteria::default());
        backend.create_screener(&seeded).await.unwrap();

        let store = ScreenerStore::new(backend);
        store.init(DEFAULT_USER_ID).await.unwrap();

        assert_eq!(store.list_screeners(DEFAULT_USER_ID).await.len(), 1);
    }
}
