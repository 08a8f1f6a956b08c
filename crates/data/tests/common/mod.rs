#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::oneshot;

use camwatch_client::{
    ApiError, CameraListParams, CameraService, DemographicsResponse, DemographicsService,
};
use camwatch_core::camera::{Camera, CameraPatch, Tag};
use camwatch_core::demographics::{
    AgeGroup, DemographicsConfig, DemographicsConfigUpdate, DemographicsResult, Emotion,
    Ethnicity, Gender, NewDemographicsConfig,
};
use camwatch_core::filters::ActiveFilters;
use camwatch_core::pagination::Page;
use camwatch_core::types::Timestamp;
use camwatch_data::cameras::CameraReconciler;
use camwatch_data::demographics::DemographicsQueryEngine;
use camwatch_data::fixtures::FixtureProvider;
use camwatch_data::overrides::LocalOverrideStore;
use camwatch_data::store::MemoryStore;

/// Fixed reference time so records built in tests compare equal.
pub fn t0() -> Timestamp {
    DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_000)
}

pub fn camera(id: &str, name: &str) -> Camera {
    Camera {
        name: name.to_string(),
        rtsp_url: format!("rtsp://10.0.0.1/{id}"),
        ..Camera::with_defaults(id, t0())
    }
}

pub fn unavailable() -> ApiError {
    ApiError::Status {
        status: 503,
        body: "service unavailable".to_string(),
    }
}

pub fn not_found() -> ApiError {
    ApiError::Status {
        status: 404,
        body: "not found".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Remote camera service
// ---------------------------------------------------------------------------

/// In-memory camera service that can be switched off.
///
/// While unavailable every call answers 503. Unknown ids answer 404.
#[derive(Default)]
pub struct FakeCameraService {
    cameras: Mutex<Vec<Camera>>,
    tags: Mutex<Vec<Tag>>,
    down: AtomicBool,
    fail_config_writes: AtomicBool,
    update_gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    pub last_list_params: Mutex<Option<CameraListParams>>,
    pub list_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub config_creates: AtomicUsize,
    pub config_updates: AtomicUsize,
}

impl FakeCameraService {
    pub fn with_cameras(cameras: Vec<Camera>) -> Self {
        let service = Self::default();
        *service.cameras.lock().unwrap() = cameras;
        service
    }

    pub fn set_available(&self, available: bool) {
        self.down.store(!available, Ordering::SeqCst);
    }

    pub fn set_tags(&self, tags: Vec<Tag>) {
        *self.tags.lock().unwrap() = tags;
    }

    pub fn set_fail_config_writes(&self, fail: bool) {
        self.fail_config_writes.store(fail, Ordering::SeqCst);
    }

    /// Hold the next `update_camera` call for `id` until the sender fires.
    pub fn gate_update(&self, id: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.update_gates.lock().unwrap().insert(id.to_string(), rx);
        tx
    }

    pub fn stored(&self, id: &str) -> Option<Camera> {
        self.cameras.lock().unwrap().iter().find(|c| c.id == id).cloned()
    }

    async fn check(&self) -> Result<(), ApiError> {
        tokio::task::yield_now().await;
        if self.down.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(())
    }
}

#[async_trait]
impl CameraService for FakeCameraService {
    async fn list_cameras(&self, params: &CameraListParams) -> Result<Page<Camera>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_list_params.lock().unwrap() = Some(params.clone());
        self.check().await?;
        let filter = params.camera_name.clone().unwrap_or_default();
        let items: Vec<Camera> = self
            .cameras
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.matches_name(&filter))
            .cloned()
            .collect();
        Ok(Page::from_items(items, params.page, params.size))
    }

    async fn get_camera(&self, id: &str) -> Result<Camera, ApiError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.check().await?;
        self.stored(id).ok_or_else(not_found)
    }

    async fn update_camera(&self, id: &str, patch: &CameraPatch) -> Result<Camera, ApiError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.update_gates.lock().unwrap().remove(id);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.check().await?;
        let mut cameras = self.cameras.lock().unwrap();
        let camera = cameras.iter_mut().find(|c| c.id == id).ok_or_else(not_found)?;
        patch.apply(camera, Utc::now());
        Ok(camera.clone())
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, ApiError> {
        self.check().await?;
        Ok(self.tags.lock().unwrap().clone())
    }

    async fn create_demographics_config(
        &self,
        config: &NewDemographicsConfig,
    ) -> Result<DemographicsConfig, ApiError> {
        self.config_creates.fetch_add(1, Ordering::SeqCst);
        self.check().await?;
        if self.fail_config_writes.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let mut cameras = self.cameras.lock().unwrap();
        let camera = cameras
            .iter_mut()
            .find(|c| c.id == config.camera_id)
            .ok_or_else(not_found)?;
        let saved = config
            .clone()
            .into_config(format!("remote-cfg-{}", camera.id), Utc::now());
        camera.demographics_config = Some(saved.clone());
        Ok(saved)
    }

    async fn update_demographics_config(
        &self,
        id: &str,
        update: &DemographicsConfigUpdate,
    ) -> Result<DemographicsConfig, ApiError> {
        self.config_updates.fetch_add(1, Ordering::SeqCst);
        self.check().await?;
        if self.fail_config_writes.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let mut cameras = self.cameras.lock().unwrap();
        let config = cameras
            .iter_mut()
            .filter_map(|c| c.demographics_config.as_mut())
            .find(|cfg| cfg.id == id)
            .ok_or_else(not_found)?;
        update.apply(config, Utc::now());
        Ok(config.clone())
    }
}

// ---------------------------------------------------------------------------
// Remote demographics service
// ---------------------------------------------------------------------------

enum Reply {
    Results(Vec<DemographicsResult>),
    Fail,
}

/// Demographics service returning canned results.
///
/// Responses for a camera can be held back with [`Self::gate`] until the
/// returned sender is fired, to control completion order.
#[derive(Default)]
pub struct FakeDemographicsService {
    replies: Mutex<HashMap<String, Vec<DemographicsResult>>>,
    failing: AtomicBool,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<ActiveFilters>>,
}

impl FakeDemographicsService {
    pub fn with_results(camera_id: &str, results: Vec<DemographicsResult>) -> Self {
        let service = Self::default();
        service.set_results(camera_id, results);
        service
    }

    pub fn set_results(&self, camera_id: &str, results: Vec<DemographicsResult>) {
        self.replies
            .lock()
            .unwrap()
            .insert(camera_id.to_string(), results);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Hold the next response for `camera_id` until the sender fires.
    pub fn gate(&self, camera_id: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(camera_id.to_string(), rx);
        tx
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn reply_for(&self, camera_id: &str) -> Reply {
        if self.failing.load(Ordering::SeqCst) {
            return Reply::Fail;
        }
        Reply::Results(
            self.replies
                .lock()
                .unwrap()
                .get(camera_id)
                .cloned()
                .unwrap_or_default(),
        )
    }
}

#[async_trait]
impl DemographicsService for FakeDemographicsService {
    async fn query_results(
        &self,
        filters: &ActiveFilters,
    ) -> Result<DemographicsResponse, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(filters.clone());

        let gate = self.gates.lock().unwrap().remove(&filters.camera_id);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        tokio::task::yield_now().await;

        match self.reply_for(&filters.camera_id) {
            Reply::Fail => Err(unavailable()),
            Reply::Results(results) => Ok(DemographicsResponse {
                results,
                analytics: None,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Records and wiring
// ---------------------------------------------------------------------------

pub fn detection(
    id: &str,
    camera_id: &str,
    gender: Gender,
    age: AgeGroup,
    emotion: Emotion,
    ethnicity: Ethnicity,
) -> DemographicsResult {
    DemographicsResult {
        id: id.to_string(),
        camera_id: camera_id.to_string(),
        timestamp: t0(),
        gender: Some(gender),
        gender_confidence: Some(0.9),
        age: Some(age),
        age_confidence: Some(0.8),
        emotion: Some(emotion),
        emotion_confidence: Some(0.7),
        ethnicity: Some(ethnicity),
        ethnicity_confidence: Some(0.6),
    }
}

/// `males` male and `females` female detections for `camera_id`.
pub fn gender_mix(camera_id: &str, males: usize, females: usize) -> Vec<DemographicsResult> {
    (0..males + females)
        .map(|i| {
            let gender = if i < males { Gender::Male } else { Gender::Female };
            detection(
                &format!("r-{i}"),
                camera_id,
                gender,
                AgeGroup::Adult,
                Emotion::Neutral,
                Ethnicity::Asian,
            )
        })
        .collect()
}

pub struct CameraHarness {
    pub remote: Arc<FakeCameraService>,
    pub store: Arc<MemoryStore>,
    pub overrides: Arc<LocalOverrideStore>,
    pub fixtures: Arc<FixtureProvider>,
    pub reconciler: CameraReconciler,
}

pub fn camera_harness(remote_cameras: Vec<Camera>) -> CameraHarness {
    camera_harness_with_store(remote_cameras, MemoryStore::new())
}

pub fn camera_harness_with_store(remote_cameras: Vec<Camera>, store: MemoryStore) -> CameraHarness {
    let remote = Arc::new(FakeCameraService::with_cameras(remote_cameras));
    let store = Arc::new(store);
    let overrides = Arc::new(LocalOverrideStore::new(store.clone()));
    let fixtures = Arc::new(FixtureProvider::new(50, Some(11)));
    let reconciler = CameraReconciler::new(remote.clone(), overrides.clone(), fixtures.clone());
    CameraHarness {
        remote,
        store,
        overrides,
        fixtures,
        reconciler,
    }
}

pub fn demographics_engine(
    remote: Arc<FakeDemographicsService>,
) -> DemographicsQueryEngine {
    DemographicsQueryEngine::new(remote, Arc::new(FixtureProvider::new(200, Some(5))))
}
