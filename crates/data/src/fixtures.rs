//! Synthetic Fixture Provider.
//!
//! Supplies a fixed seed list of cameras and tags plus an on-demand
//! generator of demographics records, so callers always have data to show
//! while the remote service is unreachable or empty.
//!
//! The camera list is identical on every call. The demographics generator
//! draws fresh random values per call unless a seed is configured, in which
//! case categories and time offsets are reproducible per `(seed, camera_id)`.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use camwatch_core::camera::{Camera, Tag};
use camwatch_core::demographics::{
    AgeGroup, DemographicsConfig, DemographicsResult, Emotion, Ethnicity, Gender,
};
use camwatch_core::filters::ActiveFilters;
use camwatch_core::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default number of synthetic detections generated per query (before
/// filtering).
pub const DEFAULT_RESULTS_PER_QUERY: usize = 100;

/// Synthetic detections fall within this trailing window.
pub const SYNTHETIC_WINDOW_SECS: i64 = 7 * 24 * 60 * 60;

/// Days between the Unix epoch and 2024-01-01, the fixture creation date.
const FIXTURE_EPOCH_DAYS: i64 = 19_723;

const FIXTURE_NAMES: &[&str] = &[
    "Main Entrance",
    "Lobby",
    "Parking Lot North",
    "Loading Dock",
    "Cafeteria",
    "Reception Desk",
    "Warehouse Aisle 3",
    "Rooftop",
    "Back Office",
    "Elevator Bank",
];

/// `(id, name, color)` of the synthetic tags.
const FIXTURE_TAGS: &[(&str, &str, &str)] = &[
    ("tag-1", "Indoor", "#4caf50"),
    ("tag-2", "Outdoor", "#2196f3"),
    ("tag-3", "Entrance", "#ff9800"),
    ("tag-4", "Restricted", "#f44336"),
];

const FIXTURE_RESOLUTIONS: &[(u32, u32)] = &[(1920, 1080), (1280, 720), (2560, 1440)];
const FIXTURE_FPS: &[u32] = &[15, 20, 25, 30];

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

pub struct FixtureProvider {
    cameras: Vec<Camera>,
    tags: Vec<Tag>,
    results_per_query: usize,
    seed: Option<u64>,
}

impl Default for FixtureProvider {
    fn default() -> Self {
        Self::new(DEFAULT_RESULTS_PER_QUERY, None)
    }
}

impl FixtureProvider {
    pub fn new(results_per_query: usize, seed: Option<u64>) -> Self {
        let tags = fixture_tags();
        let cameras = (0..FIXTURE_NAMES.len())
            .map(|i| fixture_camera(i, &tags))
            .collect();
        Self {
            cameras,
            tags,
            results_per_query,
            seed,
        }
    }

    /// The seed camera list, optionally narrowed by a case-insensitive
    /// name substring.
    pub fn cameras(&self, name_filter: Option<&str>) -> Vec<Camera> {
        let filter = name_filter.unwrap_or_default();
        self.cameras
            .iter()
            .filter(|c| c.matches_name(filter))
            .cloned()
            .collect()
    }

    pub fn camera(&self, id: &str) -> Option<Camera> {
        self.cameras.iter().find(|c| c.id == id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.cameras.iter().any(|c| c.id == id)
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.tags.clone()
    }

    /// Generate synthetic detections for `filters.camera_id`, then keep
    /// those matching `filters`. Newest first.
    pub fn demographics(&self, filters: &ActiveFilters) -> Vec<DemographicsResult> {
        let now = Utc::now();
        match self.seed {
            Some(seed) => {
                let mut rng = StdRng::seed_from_u64(mix_seed(seed, &filters.camera_id));
                self.generate(&mut rng, filters, now)
            }
            None => self.generate(&mut rand::rng(), filters, now),
        }
    }

    fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        filters: &ActiveFilters,
        now: Timestamp,
    ) -> Vec<DemographicsResult> {
        let camera_id = &filters.camera_id;
        let mut results: Vec<DemographicsResult> = (0..self.results_per_query)
            .map(|i| DemographicsResult {
                id: format!("synthetic-{camera_id}-{i:04}"),
                camera_id: camera_id.clone(),
                timestamp: now - Duration::seconds(rng.random_range(0..SYNTHETIC_WINDOW_SECS)),
                gender: Some(pick(rng, Gender::ALL)),
                gender_confidence: Some(confidence(rng)),
                age: Some(pick(rng, AgeGroup::ALL)),
                age_confidence: Some(confidence(rng)),
                emotion: Some(pick(rng, Emotion::ALL)),
                emotion_confidence: Some(confidence(rng)),
                ethnicity: Some(pick(rng, Ethnicity::ALL)),
                ethnicity_confidence: Some(confidence(rng)),
            })
            .filter(|r| filters.matches(r))
            .collect();
        results.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        results
    }
}

fn pick<T: Copy, R: Rng + ?Sized>(rng: &mut R, values: &[T]) -> T {
    values[rng.random_range(0..values.len())]
}

/// Confidence in `[0.5, 1.0)`, rounded to two decimals.
fn confidence<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    (rng.random_range(0.5..1.0_f64) * 100.0).round() / 100.0
}

fn mix_seed(seed: u64, camera_id: &str) -> u64 {
    camera_id
        .bytes()
        .fold(seed, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)))
}

fn fixture_epoch() -> Timestamp {
    DateTime::<Utc>::UNIX_EPOCH + Duration::days(FIXTURE_EPOCH_DAYS)
}

fn fixture_tags() -> Vec<Tag> {
    FIXTURE_TAGS
        .iter()
        .map(|&(id, name, color)| Tag {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
        })
        .collect()
}

/// Camera `index` (0-based) of the seed list. Odd-numbered cameras
/// (`cam-001`, `cam-003`, ...) carry a demographics config.
fn fixture_camera(index: usize, tags: &[Tag]) -> Camera {
    let number = index + 1;
    let id = format!("cam-{number:03}");
    let created_at = fixture_epoch() + Duration::days(index as i64);
    let (frame_width, frame_height) = FIXTURE_RESOLUTIONS[index % FIXTURE_RESOLUTIONS.len()];

    let outdoor = matches!(index, 2 | 3 | 7);
    let mut camera_tags = vec![tags[usize::from(outdoor)].clone()];
    if index % 3 == 0 {
        camera_tags.push(tags[2].clone());
    }
    if index % 4 == 3 {
        camera_tags.push(tags[3].clone());
    }

    let demographics_config = (number % 2 == 1).then(|| {
        let mut config = DemographicsConfig::default_for(id.clone(), created_at);
        config.detection_confidence_threshold = 0.4 + 0.05 * (index % 5) as f64;
        config
    });

    Camera {
        name: FIXTURE_NAMES[index].to_string(),
        rtsp_url: format!("rtsp://192.168.1.{}:554/stream1", 100 + number),
        frame_width,
        frame_height,
        fps: FIXTURE_FPS[index % FIXTURE_FPS.len()],
        quality: 80 + ((index * 3) % 21) as u32,
        max_length: 3600,
        skip_frames: (index % 5) as u32,
        tags: camera_tags,
        demographics_config,
        created_at,
        updated_at: created_at,
        id,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
