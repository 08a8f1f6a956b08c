//! Ordered camera lookup strategies.
//!
//! Single-camera lookups walk a list of [`CameraSource`]s and stop at the
//! first hit. A source that fails is logged and treated like a miss, so a
//! remote outage never hides a camera another source can supply.

use std::sync::Arc;

use async_trait::async_trait;

use camwatch_client::CameraService;
use camwatch_core::camera::Camera;

use crate::fixtures::FixtureProvider;
use crate::overrides::LocalOverrideStore;

/// Result of asking one source for one camera.
#[derive(Debug)]
pub enum Lookup<T> {
    Hit(T),
    Miss,
    Failed(String),
}

#[async_trait]
pub trait CameraSource: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    async fn find(&self, id: &str) -> Lookup<Camera>;
}

/// Walk `sources` in order and return the first hit with its source name.
pub async fn first_hit(
    sources: &[Arc<dyn CameraSource>],
    id: &str,
) -> Option<(Camera, &'static str)> {
    for source in sources {
        match source.find(id).await {
            Lookup::Hit(camera) => {
                tracing::debug!(camera_id = %id, source = source.name(), "Camera resolved");
                return Some((camera, source.name()));
            }
            Lookup::Miss => {}
            Lookup::Failed(reason) => {
                tracing::warn!(
                    camera_id = %id,
                    source = source.name(),
                    error = %reason,
                    "Camera lookup failed, trying next source",
                );
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Implementations
// ---------------------------------------------------------------------------

pub struct OverrideSource(pub Arc<LocalOverrideStore>);

#[async_trait]
impl CameraSource for OverrideSource {
    fn name(&self) -> &'static str {
        "local_override"
    }

    async fn find(&self, id: &str) -> Lookup<Camera> {
        match self.0.get(id).await {
            Some(camera) => Lookup::Hit(camera),
            None => Lookup::Miss,
        }
    }
}

pub struct FixtureSource(pub Arc<FixtureProvider>);

#[async_trait]
impl CameraSource for FixtureSource {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn find(&self, id: &str) -> Lookup<Camera> {
        match self.0.camera(id) {
            Some(camera) => Lookup::Hit(camera),
            None => Lookup::Miss,
        }
    }
}

pub struct RemoteSource(pub Arc<dyn CameraService>);

#[async_trait]
impl CameraSource for RemoteSource {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn find(&self, id: &str) -> Lookup<Camera> {
        match self.0.get_camera(id).await {
            Ok(camera) => Lookup::Hit(camera),
            Err(e) if e.is_not_found() => Lookup::Miss,
            Err(e) => Lookup::Failed(e.to_string()),
        }
    }
}
