//! HTTP persistence collaborator

use crate::backend::PersistenceBackend;
use crate::error::StoreError;
use crate::models::{Folder, Screener};
use crate::Result;
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

/// REST client for the persistence collaborator:
/// `GET/POST/PUT/DELETE {base}/screeners` and `{base}/folders`.
pub struct HttpPersistence {
    client: Client,
    base_url: String,
}

impl HttpPersistence {
    /// Create a client against `base_url` (no trailing slash)
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn confirm(response: Response, action: &str) -> Result<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(StoreError::MutationFailed {
                message: format!("{} rejected with status {}", action, response.status()),
            })
        }
    }
}

#[async_trait]
impl PersistenceBackend for HttpPersistence {
    async fn list_screeners(&self, user_id: &str) -> Result<Vec<Screener>> {
        let url = self.url(&format!("/screeners/{user_id}"));
        debug!("Listing screeners from {}", url);
        let response = self.client.get(&url).send().await?;
        Ok(Self::confirm(response, "list screeners").await?.json().await?)
    }

    async fn create_screener(&self, screener: &Screener) -> Result<Screener> {
        let response = self.client.post(self.url("/screeners")).json(screener).send().await?;
        Ok(Self::confirm(response, "create screener").await?.json().await?)
    }

    async fn update_screener(&self, screener: &Screener) -> Result<Screener> {
        let url = self.url(&format!("/screeners/{}", screener.id));
        let response = self.client.put(&url).json(screener).send().await?;
        Ok(Self::confirm(response, "update screener").await?.json().await?)
    }

    async fn delete_screener(&self, id: &str) -> Result<()> {
        let url = self.url(&format!("/screeners/{id}"));
        let response = self.client.delete(&url).send().await?;
        Self::confirm(response, "delete screener").await?;
        Ok(())
    }

    async fn list_folders(&self, user_id: &str) -> Result<Vec<Folder>> {
        let url = self.url(&format!("/folders/{user_id}"));
        debug!("Listing folders from {}", url);
        let response = self.client.get(&url).send().await?;
        Ok(Self::confirm(response, "list folders").await?.json().await?)
    }

    async fn create_folder(&self, folder: &Folder) -> Result<Folder> {
        let response = self.client.post(self.url("/folders")).json(folder).send().await?;
        Ok(Self::confirm(response, "create folder").await?.json().await?)
    }

    async fn update_folder(&self, folder: &Folder) -> Result<Folder> {
        let url = self.url(&format!("/folders/{}", folder.id));
        let response = self.client.put(&url).json(folder).send().await?;
        Ok(Self::confirm(response, "update folder").await?.json().await?)
    }

    async fn delete_folder(&self, id: &str) -> Result<()> {
        let url = self.url(&format!("/folders/{id}"));
        let response = self.client.delete(&url).send().await?;
        Self::confirm(response, "delete folder").await?;
        Ok(())
    }
}
