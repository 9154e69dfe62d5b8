//! In-process link repository.
//!
//! Keeps every record, expired or not, like the relational backend does.
//! Nothing survives a restart.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::domain::entities::{NewLink, ShortLink};
use crate::domain::repositories::{LinkRepository, RepositoryError};

#[derive(Debug, Default)]
pub struct MemoryLinkRepository {
    links: RwLock<HashMap<String, ShortLink>>,
    last_id: AtomicI64,
}

impl MemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.links.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.links.read().await.is_empty()
    }
}

#[async_trait]
impl LinkRepository for MemoryLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<ShortLink, RepositoryError> {
        let mut links = self.links.write().await;

        match links.entry(new_link.code.clone()) {
            Entry::Occupied(_) => Err(RepositoryError::Conflict(new_link.code)),
            Entry::Vacant(slot) => {
                let id = match new_link.id {
                    Some(id) => id,
                    None => self.last_id.fetch_add(1, Ordering::SeqCst) + 1,
                };
                let link = new_link.into_link(id);
                slot.insert(link.clone());
                Ok(link)
            }
        }
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ShortLink>, RepositoryError> {
        Ok(self.links.read().await.get(code).cloned())
    }

    async fn increment_click(&self, code: &str) -> Result<(), RepositoryError> {
        if let Some(link) = self.links.write().await.get_mut(code) {
            link.click_count += 1;
            link.last_accessed_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn next_id(&self) -> Result<i64, RepositoryError> {
        Ok(self.last_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
