//! Local Override Store: camera records created or edited on this side.
//!
//! The list is loaded from the backing [`Store`] on first access and the
//! full list is written back after every mutation, before the mutation
//! returns. Each read-modify-write runs inside one critical section.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::{Mutex, MutexGuard};

use camwatch_core::camera::Camera;
use camwatch_core::types::EntityId;

use crate::store::Store;

#[derive(Default)]
struct Records {
    loaded: bool,
    by_id: IndexMap<EntityId, Camera>,
}

pub struct LocalOverrideStore {
    backend: Arc<dyn Store>,
    records: Mutex<Records>,
}

impl LocalOverrideStore {
    pub fn new(backend: Arc<dyn Store>) -> Self {
        Self {
            backend,
            records: Mutex::new(Records::default()),
        }
    }

    /// Every override record in insertion order.
    pub async fn all(&self) -> Vec<Camera> {
        self.lock_loaded().await.by_id.values().cloned().collect()
    }

    pub async fn get(&self, id: &str) -> Option<Camera> {
        self.lock_loaded().await.by_id.get(id).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.lock_loaded().await.by_id.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.lock_loaded().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Insert or replace `camera`, persist, and return it.
    pub async fn put(&self, camera: Camera) -> Camera {
        let mut records = self.lock_loaded().await;
        records.by_id.insert(camera.id.clone(), camera.clone());
        self.flush(&records).await;
        camera
    }

    /// Apply `edit` to the record with `id`, persist, and return the result.
    ///
    /// Returns `None` without writing when no record has that id.
    pub async fn update<F>(&self, id: &str, edit: F) -> Option<Camera>
    where
        F: FnOnce(&mut Camera),
    {
        let mut records = self.lock_loaded().await;
        let camera = records.by_id.get_mut(id)?;
        edit(camera);
        let updated = camera.clone();
        self.flush(&records).await;
        Some(updated)
    }

    async fn lock_loaded(&self) -> MutexGuard<'_, Records> {
        let mut records = self.records.lock().await;
        if !records.loaded {
            let stored = self.backend.read_all().await;
            tracing::debug!(count = stored.len(), "Loaded local override store");
            records.by_id = stored.into_iter().map(|c| (c.id.clone(), c)).collect();
            records.loaded = true;
        }
        records
    }

    async fn flush(&self, records: &Records) {
        let list: Vec<Camera> = records.by_id.values().cloned().collect();
        self.backend.write_all(&list).await;
    }
}
