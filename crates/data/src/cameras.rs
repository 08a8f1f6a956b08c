//! Camera Reconciliation Engine.
//!
//! Merges the remote service, the local override store and the synthetic
//! fixtures into one camera view. When the same id appears in several
//! sources, local override wins over remote, which wins over synthetic.
//! Remote failures never fail a read; they degrade to the other sources.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use camwatch_client::{CameraListParams, CameraService};
use camwatch_core::camera::{Camera, CameraPatch, Tag};
use camwatch_core::demographics::{DemographicsConfig, NewDemographicsConfig};
use camwatch_core::error::CoreError;
use camwatch_core::pagination::{
    clamp_page, clamp_size, page_count, page_window, remote_page_size, Page,
};
use camwatch_core::types::{EntityId, Timestamp};

use crate::fixtures::FixtureProvider;
use crate::overrides::LocalOverrideStore;
use crate::sources::{first_hit, CameraSource, FixtureSource, OverrideSource, RemoteSource};

pub struct CameraReconciler {
    remote: Arc<dyn CameraService>,
    overrides: Arc<LocalOverrideStore>,
    fixtures: Arc<FixtureProvider>,
    lookup_chain: Vec<Arc<dyn CameraSource>>,
    edit_locks: KeyedLocks,
    paginate_merged: bool,
}

impl CameraReconciler {
    pub fn new(
        remote: Arc<dyn CameraService>,
        overrides: Arc<LocalOverrideStore>,
        fixtures: Arc<FixtureProvider>,
    ) -> Self {
        let lookup_chain: Vec<Arc<dyn CameraSource>> = vec![
            Arc::new(OverrideSource(Arc::clone(&overrides))),
            Arc::new(FixtureSource(Arc::clone(&fixtures))),
            Arc::new(RemoteSource(Arc::clone(&remote))),
        ];
        Self {
            remote,
            overrides,
            fixtures,
            lookup_chain,
            edit_locks: KeyedLocks::default(),
            paginate_merged: false,
        }
    }

    /// Slice the merged collection to the requested page window instead of
    /// returning all of it.
    pub fn with_paginate_merged(mut self, paginate_merged: bool) -> Self {
        self.paginate_merged = paginate_merged;
        self
    }

    // ---- reads ----

    /// Merged camera listing.
    ///
    /// Inserts synthetic, then remote, then local override records keyed
    /// by id, so later sources replace earlier ones. If the remote call
    /// fails only local override and synthetic records are used. `total`
    /// and `pages` describe the merged collection. Unless merged pagination
    /// is enabled, `items` holds the whole merged collection.
    pub async fn list(&self, page: u64, size: u64, name_filter: Option<&str>) -> Page<Camera> {
        let page = clamp_page(page);
        let size = clamp_size(size);
        let name_filter = name_filter.map(str::trim).filter(|f| !f.is_empty());

        let params = CameraListParams {
            page,
            size: remote_page_size(size),
            camera_name: name_filter.map(str::to_string),
        };
        let remote = match self.remote.list_cameras(&params).await {
            Ok(remote_page) => remote_page.items,
            Err(e) => {
                tracing::warn!(
                    page,
                    size,
                    error = %e,
                    "Remote camera list unavailable, using local and synthetic cameras",
                );
                Vec::new()
            }
        };
        let local = self.overrides.all().await;
        let synthetic = self.fixtures.cameras(None);

        let mut merged: IndexMap<EntityId, Camera> = IndexMap::new();
        for camera in synthetic.into_iter().chain(remote).chain(local) {
            merged.insert(camera.id.clone(), camera);
        }

        let filter = name_filter.unwrap_or_default();
        let items: Vec<Camera> = merged
            .into_values()
            .filter(|c| c.matches_name(filter))
            .collect();

        let total = items.len() as u64;
        let items = if self.paginate_merged {
            page_window(items, page, size)
        } else {
            items
        };

        Page {
            items,
            total,
            page,
            size,
            pages: page_count(total, size),
        }
    }

    /// Resolve one camera: local override, then synthetic, then remote.
    ///
    /// The id is trimmed the same way edits trim it.
    pub async fn get_by_id(&self, id: &str) -> Result<Camera, CoreError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(CoreError::NotFound {
                entity: "camera",
                id: id.to_string(),
            });
        }
        first_hit(&self.lookup_chain, id)
            .await
            .map(|(camera, _)| camera)
            .ok_or_else(|| CoreError::NotFound {
                entity: "camera",
                id: id.to_string(),
            })
    }

    /// Remote tag list, or the synthetic tags plus any tag referenced by a
    /// local override when the remote call fails.
    pub async fn tags(&self) -> Vec<Tag> {
        match self.remote.list_tags().await {
            Ok(tags) => tags,
            Err(e) => {
                tracing::warn!(error = %e, "Remote tag list unavailable, using local tags");
                let mut tags: IndexMap<EntityId, Tag> = self
                    .fixtures
                    .tags()
                    .into_iter()
                    .map(|t| (t.id.clone(), t))
                    .collect();
                for camera in self.overrides.all().await {
                    for tag in camera.tags {
                        tags.entry(tag.id.clone()).or_insert(tag);
                    }
                }
                tags.into_values().collect()
            }
        }
    }

    // ---- writes ----

    /// Apply `patch` to camera `id` and return the edited record.
    ///
    /// Local override records are edited in place. Synthetic cameras are
    /// copied into the override store with the patch applied. Other ids go
    /// to the remote service; if that fails the edit is kept locally on a
    /// default record so it is never lost. Edits to the same id are applied
    /// one at a time in call order.
    pub async fn upsert(&self, id: &str, patch: &CameraPatch) -> Result<Camera, CoreError> {
        let id = require_id(id)?;
        patch.validate()?;

        let _guard = self.edit_locks.lock(id).await;
        let now = Utc::now();

        if let Some(updated) = self.overrides.update(id, |c| patch.apply(c, now)).await {
            tracing::info!(camera_id = %id, "Updated local override camera");
            return Ok(updated);
        }

        if let Some(fixture) = self.fixtures.camera(id) {
            tracing::info!(camera_id = %id, "Materializing synthetic camera into local overrides");
            return Ok(self.materialize(fixture, patch, now).await);
        }

        match self.remote.update_camera(id, patch).await {
            Ok(camera) => Ok(camera),
            Err(e) => {
                tracing::warn!(
                    camera_id = %id,
                    error = %e,
                    "Remote camera update failed, keeping edit locally",
                );
                Ok(self
                    .materialize(Camera::with_defaults(id, now), patch, now)
                    .await)
            }
        }
    }

    /// Create or update the demographics config of camera `camera_id`.
    ///
    /// Local override and synthetic cameras keep the config on their
    /// override record. Remote cameras get a remote update when they
    /// already have a config and a remote create otherwise; if the remote
    /// write fails the config is kept on a local override copy.
    pub async fn save_demographics_config(
        &self,
        camera_id: &str,
        config: &NewDemographicsConfig,
    ) -> Result<DemographicsConfig, CoreError> {
        let camera_id = require_id(camera_id)?;
        let config = NewDemographicsConfig {
            camera_id: camera_id.to_string(),
            ..config.clone()
        };
        config.validate()?;

        let _guard = self.edit_locks.lock(camera_id).await;
        let now = Utc::now();

        let mut attached = None;
        self.overrides
            .update(camera_id, |c| {
                attached = Some(c.attach_demographics_config(&config, now));
            })
            .await;
        if let Some(saved) = attached {
            tracing::info!(camera_id = %camera_id, "Saved demographics config on local override");
            return Ok(saved);
        }

        if let Some(fixture) = self.fixtures.camera(camera_id) {
            return Ok(self.keep_config_locally(fixture, &config, now).await);
        }

        let remote_camera = match self.remote.get_camera(camera_id).await {
            Ok(camera) => camera,
            Err(e) if e.is_not_found() => {
                return Err(CoreError::NotFound {
                    entity: "camera",
                    id: camera_id.to_string(),
                });
            }
            Err(e) => {
                tracing::warn!(
                    camera_id = %camera_id,
                    error = %e,
                    "Remote camera unavailable, keeping demographics config locally",
                );
                let base = Camera::with_defaults(camera_id, now);
                return Ok(self.keep_config_locally(base, &config, now).await);
            }
        };

        let saved = match &remote_camera.demographics_config {
            Some(existing) => {
                self.remote
                    .update_demographics_config(&existing.id, &config.to_update())
                    .await
            }
            None => self.remote.create_demographics_config(&config).await,
        };
        match saved {
            Ok(saved) => Ok(saved),
            Err(e) => {
                tracing::warn!(
                    camera_id = %camera_id,
                    error = %e,
                    "Remote demographics config write failed, keeping it locally",
                );
                Ok(self.keep_config_locally(remote_camera, &config, now).await)
            }
        }
    }

    // ---- private helpers ----

    async fn materialize(&self, mut base: Camera, patch: &CameraPatch, now: Timestamp) -> Camera {
        patch.apply(&mut base, now);
        self.overrides.put(base).await
    }

    async fn keep_config_locally(
        &self,
        mut base: Camera,
        config: &NewDemographicsConfig,
        now: Timestamp,
    ) -> DemographicsConfig {
        let saved = base.attach_demographics_config(config, now);
        self.overrides.put(base).await;
        saved
    }
}

fn require_id(id: &str) -> Result<&str, CoreError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(CoreError::Validation("camera id must not be empty".to_string()));
    }
    Ok(id)
}

// ---------------------------------------------------------------------------
// Per-id edit serialization
// ---------------------------------------------------------------------------

/// One FIFO mutex per key. Waiters on the same key are admitted in the
/// order they called [`KeyedLocks::lock`]. An entry is removed when its
/// last holder releases it with nobody waiting.
#[derive(Default)]
struct KeyedLocks {
    locks: std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    async fn lock(&self, key: &str) -> KeyedGuard<'_> {
        let lock = {
            let mut locks = self.entries();
            Arc::clone(locks.entry(key.to_string()).or_default())
        };
        let guard = Arc::clone(&lock).lock_owned().await;
        KeyedGuard {
            owner: self,
            key: key.to_string(),
            lock,
            guard: Some(guard),
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Mutex<()>>>> {
        self.locks.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries().len()
    }
}

struct KeyedGuard<'a> {
    owner: &'a KeyedLocks,
    key: String,
    lock: Arc<Mutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyedGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.owner.entries();
        // Only the map and this guard remain: nobody is waiting.
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lock_entry_is_removed_after_release() {
        let locks = KeyedLocks::default();

        let guard = locks.lock("cam-1").await;
        assert_eq!(locks.len(), 1);
        drop(guard);

        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn entry_survives_while_another_caller_waits() {
        let locks = Arc::new(KeyedLocks::default());
        let first = locks.lock("cam-1").await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock("cam-1").await;
            })
        };
        // Map, guard and held mutex account for 3; more means a waiter.
        while Arc::strong_count(&first.lock) <= 3 {
            tokio::task::yield_now().await;
        }

        drop(first);
        assert_eq!(locks.len(), 1);

        waiter.await.unwrap();
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn different_keys_do_not_block_each_other() {
        let locks = KeyedLocks::default();

        let _a = locks.lock("cam-1").await;
        let _b = locks.lock("cam-2").await;

        assert_eq!(locks.len(), 2);
    }
}
