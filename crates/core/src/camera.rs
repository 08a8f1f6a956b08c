//! Camera and tag records plus the partial-update patch applied by edits.
//!
//! A [`Camera`] may originate from the remote service, the local override
//! store, or the synthetic fixture set; the record shape is the same in
//! all three so the merged view can treat them uniformly.

use serde::{Deserialize, Serialize};

use crate::demographics::{DemographicsConfig, NewDemographicsConfig};
use crate::error::CoreError;
use crate::types::{deserialize_timestamp, EntityId, Timestamp};
use crate::validation::{
    validate_not_blank, validate_optional, FPS_RANGE, FRAME_DIMENSION_RANGE, MAX_LENGTH_RANGE,
    QUALITY_RANGE, SKIP_FRAMES_RANGE,
};

// ---------------------------------------------------------------------------
// Defaults used when a camera is created from a bare patch
// ---------------------------------------------------------------------------

pub const DEFAULT_FRAME_WIDTH: u32 = 1280;
pub const DEFAULT_FRAME_HEIGHT: u32 = 720;
pub const DEFAULT_FPS: u32 = 15;
pub const DEFAULT_QUALITY: u32 = 90;
pub const DEFAULT_MAX_LENGTH: u32 = 3600;
pub const DEFAULT_SKIP_FRAMES: u32 = 0;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A display tag attached to cameras. Owned by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: EntityId,
    pub name: String,
    pub color: String,
}

/// A managed video source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub id: EntityId,
    pub name: String,
    pub rtsp_url: String,
    pub frame_width: u32,
    pub frame_height: u32,
    pub fps: u32,
    pub quality: u32,
    pub max_length: u32,
    pub skip_frames: u32,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub demographics_config: Option<DemographicsConfig>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: Timestamp,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub updated_at: Timestamp,
}

impl Camera {
    /// Build a camera with default stream parameters.
    ///
    /// Used when an edit targets an id that no source knows about and the
    /// remote update failed: the patch is applied on top of this record.
    pub fn with_defaults(id: impl Into<EntityId>, now: Timestamp) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            rtsp_url: String::new(),
            frame_width: DEFAULT_FRAME_WIDTH,
            frame_height: DEFAULT_FRAME_HEIGHT,
            fps: DEFAULT_FPS,
            quality: DEFAULT_QUALITY,
            max_length: DEFAULT_MAX_LENGTH,
            skip_frames: DEFAULT_SKIP_FRAMES,
            tags: Vec::new(),
            demographics_config: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create or update this camera's single demographics config.
    ///
    /// An existing config keeps its id and `created_at`; a new one gets an
    /// id derived from the camera id. Either way `camera_id` is this camera.
    pub fn attach_demographics_config(
        &mut self,
        config: &NewDemographicsConfig,
        now: Timestamp,
    ) -> DemographicsConfig {
        let attached = match self.demographics_config.take() {
            Some(mut existing) => {
                config.to_update().apply(&mut existing, now);
                existing
            }
            None => config.clone().into_config(format!("cfg-{}", self.id), now),
        };
        let attached = DemographicsConfig {
            camera_id: self.id.clone(),
            ..attached
        };
        self.demographics_config = Some(attached.clone());
        self.updated_at = now;
        attached
    }

    /// Case-insensitive substring match against the camera name.
    ///
    /// A blank filter matches every camera.
    pub fn matches_name(&self, filter: &str) -> bool {
        let needle = filter.trim().to_lowercase();
        needle.is_empty() || self.name.to_lowercase().contains(&needle)
    }
}

// ---------------------------------------------------------------------------
// Patch
// ---------------------------------------------------------------------------

/// Partial camera update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtsp_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_frames: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demographics_config: Option<DemographicsConfig>,
}

impl CameraPatch {
    /// Check every present field against the stream parameter bounds.
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(name) = &self.name {
            validate_not_blank(name, "name")?;
        }
        validate_optional(self.frame_width, FRAME_DIMENSION_RANGE, "frame_width")?;
        validate_optional(self.frame_height, FRAME_DIMENSION_RANGE, "frame_height")?;
        validate_optional(self.fps, FPS_RANGE, "fps")?;
        validate_optional(self.quality, QUALITY_RANGE, "quality")?;
        validate_optional(self.max_length, MAX_LENGTH_RANGE, "max_length")?;
        validate_optional(self.skip_frames, SKIP_FRAMES_RANGE, "skip_frames")?;
        if let Some(config) = &self.demographics_config {
            config.validate()?;
        }
        Ok(())
    }

    /// Merge the present fields into `camera` and stamp `updated_at`.
    ///
    /// An attached demographics config is re-keyed to the camera so a
    /// camera never carries a config that points elsewhere.
    pub fn apply(&self, camera: &mut Camera, now: Timestamp) {
        if let Some(v) = &self.name {
            camera.name = v.clone();
        }
        if let Some(v) = &self.rtsp_url {
            camera.rtsp_url = v.clone();
        }
        if let Some(v) = self.frame_width {
            camera.frame_width = v;
        }
        if let Some(v) = self.frame_height {
            camera.frame_height = v;
        }
        if let Some(v) = self.fps {
            camera.fps = v;
        }
        if let Some(v) = self.quality {
            camera.quality = v;
        }
        if let Some(v) = self.max_length {
            camera.max_length = v;
        }
        if let Some(v) = self.skip_frames {
            camera.skip_frames = v;
        }
        if let Some(v) = &self.tags {
            camera.tags = v.clone();
        }
        if let Some(config) = &self.demographics_config {
            let mut config = config.clone();
            config.camera_id = camera.id.clone();
            camera.demographics_config = Some(config);
        }
        camera.updated_at = now;
    }

    /// True when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
