//! Demographics detection configuration and detection records.
//!
//! Category enums serialize to the same wire strings the remote service
//! and the filter UI use (`"male"`, `"25-34"`, `"latino_hispanic"`, ...).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{deserialize_timestamp, EntityId, Timestamp};
use crate::validation::{
    validate_optional, validate_range, BOX_AREA_RANGE, CONFIDENCE_RANGE, EXIT_THRESHOLD_RANGE,
    FRAME_SKIP_INTERVAL_RANGE, MIN_TRACK_DURATION_RANGE, MIN_TRACK_UPDATES_RANGE,
    SAVE_INTERVAL_RANGE, TRACK_HISTORY_RANGE,
};

// ---------------------------------------------------------------------------
// Category enums
// ---------------------------------------------------------------------------

macro_rules! define_category_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $variant:ident = $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( #[serde(rename = $wire)] $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire representation.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $wire ),+
                }
            }

            /// Parse a wire value, ignoring ASCII case and surrounding whitespace.
            pub fn parse(value: &str) -> Option<Self> {
                let value = value.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|c| c.as_str().eq_ignore_ascii_case(value))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

define_category_enum! {
    /// Detected gender.
    Gender {
        Male = "male",
        Female = "female",
    }
}

define_category_enum! {
    /// Detected age bracket.
    AgeGroup {
        Child = "0-17",
        YoungAdult = "18-24",
        Adult = "25-34",
        MidAdult = "35-44",
        MiddleAged = "45-54",
        Senior = "55-64",
        Elderly = "65+",
    }
}

define_category_enum! {
    /// Dominant detected emotion.
    Emotion {
        Angry = "angry",
        Disgust = "disgust",
        Fear = "fear",
        Happy = "happy",
        Sad = "sad",
        Surprise = "surprise",
        Neutral = "neutral",
    }
}

define_category_enum! {
    /// Detected ethnicity.
    Ethnicity {
        Asian = "asian",
        Black = "black",
        Indian = "indian",
        LatinoHispanic = "latino_hispanic",
        MiddleEastern = "middle_eastern",
        White = "white",
    }
}

// ---------------------------------------------------------------------------
// Configuration defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_DETECTION_CONFIDENCE: f64 = 0.5;
pub const DEFAULT_DEMOGRAPHICS_CONFIDENCE: f64 = 0.5;
pub const DEFAULT_BOX_AREA_THRESHOLD: f64 = 0.1;
pub const DEFAULT_TRACK_HISTORY_MAX_LENGTH: u32 = 30;
pub const DEFAULT_EXIT_THRESHOLD: u32 = 30;
pub const DEFAULT_MIN_TRACK_DURATION: u32 = 5;
pub const DEFAULT_MIN_TRACK_UPDATES: u32 = 10;
pub const DEFAULT_SAVE_INTERVAL: u32 = 600;
pub const DEFAULT_FRAME_SKIP_INTERVAL: f64 = 1.0;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Detection and tracking parameters for one camera.
///
/// A camera holds at most one config; `camera_id` always names its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemographicsConfig {
    pub id: EntityId,
    pub camera_id: EntityId,
    pub detection_confidence_threshold: f64,
    pub demographics_confidence_threshold: f64,
    pub box_area_threshold: f64,
    pub track_history_max_length: u32,
    pub exit_threshold: u32,
    pub min_track_duration: u32,
    pub min_track_updates: u32,
    pub save_interval: u32,
    pub frame_skip_interval: f64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: Timestamp,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub updated_at: Timestamp,
}

impl DemographicsConfig {
    /// A config with default tuning for `camera_id`. The id is derived
    /// from the camera id.
    pub fn default_for(camera_id: impl Into<EntityId>, now: Timestamp) -> Self {
        let camera_id = camera_id.into();
        NewDemographicsConfig::defaults_for(camera_id.clone())
            .into_config(format!("cfg-{camera_id}"), now)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_tuning(
            self.detection_confidence_threshold,
            self.demographics_confidence_threshold,
            self.box_area_threshold,
            self.track_history_max_length,
            self.exit_threshold,
            self.min_track_duration,
            self.min_track_updates,
            self.save_interval,
            self.frame_skip_interval,
        )
    }
}

/// Create payload: a config without server-assigned fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDemographicsConfig {
    pub camera_id: EntityId,
    pub detection_confidence_threshold: f64,
    pub demographics_confidence_threshold: f64,
    pub box_area_threshold: f64,
    pub track_history_max_length: u32,
    pub exit_threshold: u32,
    pub min_track_duration: u32,
    pub min_track_updates: u32,
    pub save_interval: u32,
    pub frame_skip_interval: f64,
}

impl NewDemographicsConfig {
    pub fn defaults_for(camera_id: impl Into<EntityId>) -> Self {
        Self {
            camera_id: camera_id.into(),
            detection_confidence_threshold: DEFAULT_DETECTION_CONFIDENCE,
            demographics_confidence_threshold: DEFAULT_DEMOGRAPHICS_CONFIDENCE,
            box_area_threshold: DEFAULT_BOX_AREA_THRESHOLD,
            track_history_max_length: DEFAULT_TRACK_HISTORY_MAX_LENGTH,
            exit_threshold: DEFAULT_EXIT_THRESHOLD,
            min_track_duration: DEFAULT_MIN_TRACK_DURATION,
            min_track_updates: DEFAULT_MIN_TRACK_UPDATES,
            save_interval: DEFAULT_SAVE_INTERVAL,
            frame_skip_interval: DEFAULT_FRAME_SKIP_INTERVAL,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.camera_id.trim().is_empty() {
            return Err(CoreError::Validation(
                "camera_id is required for a demographics config".to_string(),
            ));
        }
        validate_tuning(
            self.detection_confidence_threshold,
            self.demographics_confidence_threshold,
            self.box_area_threshold,
            self.track_history_max_length,
            self.exit_threshold,
            self.min_track_duration,
            self.min_track_updates,
            self.save_interval,
            self.frame_skip_interval,
        )
    }

    /// Materialize into a full config with the given id.
    pub fn into_config(self, id: impl Into<EntityId>, now: Timestamp) -> DemographicsConfig {
        DemographicsConfig {
            id: id.into(),
            camera_id: self.camera_id,
            detection_confidence_threshold: self.detection_confidence_threshold,
            demographics_confidence_threshold: self.demographics_confidence_threshold,
            box_area_threshold: self.box_area_threshold,
            track_history_max_length: self.track_history_max_length,
            exit_threshold: self.exit_threshold,
            min_track_duration: self.min_track_duration,
            min_track_updates: self.min_track_updates,
            save_interval: self.save_interval,
            frame_skip_interval: self.frame_skip_interval,
            created_at: now,
            updated_at: now,
        }
    }

    /// The same values as a full-field update for an existing config.
    pub fn to_update(&self) -> DemographicsConfigUpdate {
        DemographicsConfigUpdate {
            detection_confidence_threshold: Some(self.detection_confidence_threshold),
            demographics_confidence_threshold: Some(self.demographics_confidence_threshold),
            box_area_threshold: Some(self.box_area_threshold),
            track_history_max_length: Some(self.track_history_max_length),
            exit_threshold: Some(self.exit_threshold),
            min_track_duration: Some(self.min_track_duration),
            min_track_updates: Some(self.min_track_updates),
            save_interval: Some(self.save_interval),
            frame_skip_interval: Some(self.frame_skip_interval),
        }
    }
}

/// Partial config update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemographicsConfigUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_confidence_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demographics_confidence_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_area_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_history_max_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_threshold: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_track_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_track_updates: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_skip_interval: Option<f64>,
}

impl DemographicsConfigUpdate {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_optional(
            self.detection_confidence_threshold,
            CONFIDENCE_RANGE,
            "detection_confidence_threshold",
        )?;
        validate_optional(
            self.demographics_confidence_threshold,
            CONFIDENCE_RANGE,
            "demographics_confidence_threshold",
        )?;
        validate_optional(self.box_area_threshold, BOX_AREA_RANGE, "box_area_threshold")?;
        validate_optional(
            self.track_history_max_length,
            TRACK_HISTORY_RANGE,
            "track_history_max_length",
        )?;
        validate_optional(self.exit_threshold, EXIT_THRESHOLD_RANGE, "exit_threshold")?;
        validate_optional(
            self.min_track_duration,
            MIN_TRACK_DURATION_RANGE,
            "min_track_duration",
        )?;
        validate_optional(
            self.min_track_updates,
            MIN_TRACK_UPDATES_RANGE,
            "min_track_updates",
        )?;
        validate_optional(self.save_interval, SAVE_INTERVAL_RANGE, "save_interval")?;
        validate_optional(
            self.frame_skip_interval,
            FRAME_SKIP_INTERVAL_RANGE,
            "frame_skip_interval",
        )
    }

    /// Merge the present fields into `config` and stamp `updated_at`.
    pub fn apply(&self, config: &mut DemographicsConfig, now: Timestamp) {
        if let Some(v) = self.detection_confidence_threshold {
            config.detection_confidence_threshold = v;
        }
        if let Some(v) = self.demographics_confidence_threshold {
            config.demographics_confidence_threshold = v;
        }
        if let Some(v) = self.box_area_threshold {
            config.box_area_threshold = v;
        }
        if let Some(v) = self.track_history_max_length {
            config.track_history_max_length = v;
        }
        if let Some(v) = self.exit_threshold {
            config.exit_threshold = v;
        }
        if let Some(v) = self.min_track_duration {
            config.min_track_duration = v;
        }
        if let Some(v) = self.min_track_updates {
            config.min_track_updates = v;
        }
        if let Some(v) = self.save_interval {
            config.save_interval = v;
        }
        if let Some(v) = self.frame_skip_interval {
            config.frame_skip_interval = v;
        }
        config.updated_at = now;
    }
}

#[allow(clippy::too_many_arguments)]
fn validate_tuning(
    detection_confidence_threshold: f64,
    demographics_confidence_threshold: f64,
    box_area_threshold: f64,
    track_history_max_length: u32,
    exit_threshold: u32,
    min_track_duration: u32,
    min_track_updates: u32,
    save_interval: u32,
    frame_skip_interval: f64,
) -> Result<(), CoreError> {
    validate_range(
        detection_confidence_threshold,
        CONFIDENCE_RANGE,
        "detection_confidence_threshold",
    )?;
    validate_range(
        demographics_confidence_threshold,
        CONFIDENCE_RANGE,
        "demographics_confidence_threshold",
    )?;
    validate_range(box_area_threshold, BOX_AREA_RANGE, "box_area_threshold")?;
    validate_range(
        track_history_max_length,
        TRACK_HISTORY_RANGE,
        "track_history_max_length",
    )?;
    validate_range(exit_threshold, EXIT_THRESHOLD_RANGE, "exit_threshold")?;
    validate_range(min_track_duration, MIN_TRACK_DURATION_RANGE, "min_track_duration")?;
    validate_range(min_track_updates, MIN_TRACK_UPDATES_RANGE, "min_track_updates")?;
    validate_range(save_interval, SAVE_INTERVAL_RANGE, "save_interval")?;
    validate_range(
        frame_skip_interval,
        FRAME_SKIP_INTERVAL_RANGE,
        "frame_skip_interval",
    )
}

// ---------------------------------------------------------------------------
// Detection records
// ---------------------------------------------------------------------------

/// One detection event. Read-only from this layer's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemographicsResult {
    pub id: EntityId,
    pub camera_id: EntityId,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: Timestamp,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub gender_confidence: Option<f64>,
    #[serde(default)]
    pub age: Option<AgeGroup>,
    #[serde(default)]
    pub age_confidence: Option<f64>,
    #[serde(default)]
    pub emotion: Option<Emotion>,
    #[serde(default)]
    pub emotion_confidence: Option<f64>,
    #[serde(default)]
    pub ethnicity: Option<Ethnicity>,
    #[serde(default)]
    pub ethnicity_confidence: Option<f64>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    // -- category enums ----------------------------------------------------

    #[test]
    fn age_group_serializes_to_bracket() {
        let json = serde_json::to_string(&AgeGroup::Adult).unwrap();
        assert_eq!(json, "\"25-34\"");
    }

    #[test]
    fn ethnicity_deserializes_from_snake_case() {
        let e: Ethnicity = serde_json::from_str("\"latino_hispanic\"").unwrap();
        assert_eq!(e, Ethnicity::LatinoHispanic);
    }

    #[test]
    fn parse_ignores_case_and_whitespace() {
        assert_eq!(Gender::parse(" Male "), Some(Gender::Male));
        assert_eq!(Emotion::parse("HAPPY"), Some(Emotion::Happy));
        assert_eq!(AgeGroup::parse("65+"), Some(AgeGroup::Elderly));
        assert_eq!(Gender::parse("robot"), None);
    }

    #[test]
    fn all_lists_every_variant_once() {
        assert_eq!(Gender::ALL.len(), 2);
        assert_eq!(AgeGroup::ALL.len(), 7);
        assert_eq!(Emotion::ALL.len(), 7);
        assert_eq!(Ethnicity::ALL.len(), 6);
    }

    #[test]
    fn display_matches_wire_value() {
        assert_eq!(Ethnicity::MiddleEastern.to_string(), "middle_eastern");
    }

    // -- config ------------------------------------------------------------

    #[test]
    fn defaults_are_within_bounds() {
        let config = DemographicsConfig::default_for("cam-001", now());
        assert!(config.validate().is_ok());
        assert_eq!(config.id, "cfg-cam-001");
        assert_eq!(config.camera_id, "cam-001");
    }

    #[test]
    fn new_config_requires_camera_id() {
        let config = NewDemographicsConfig::defaults_for("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn new_config_rejects_save_interval_below_minimum() {
        let mut config = NewDemographicsConfig::defaults_for("cam-001");
        config.save_interval = 120;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("save_interval"));
    }

    #[test]
    fn update_validates_only_present_fields() {
        let update = DemographicsConfigUpdate {
            frame_skip_interval: Some(0.05),
            ..Default::default()
        };
        assert!(update.validate().is_err());
        assert!(DemographicsConfigUpdate::default().validate().is_ok());
    }

    #[test]
    fn update_apply_changes_fields_and_timestamp() {
        let mut config = DemographicsConfig::default_for("cam-001", now());
        let later = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        let update = DemographicsConfigUpdate {
            exit_threshold: Some(90),
            box_area_threshold: Some(0.2),
            ..Default::default()
        };

        update.apply(&mut config, later);

        assert_eq!(config.exit_threshold, 90);
        assert_eq!(config.box_area_threshold, 0.2);
        assert_eq!(config.save_interval, DEFAULT_SAVE_INTERVAL);
        assert_eq!(config.updated_at, later);
    }

    #[test]
    fn to_update_carries_every_field() {
        let new = NewDemographicsConfig::defaults_for("cam-003");
        let mut config = DemographicsConfig::default_for("cam-003", now());
        config.exit_threshold = 1;
        new.to_update().apply(&mut config, now());
        assert_eq!(config.exit_threshold, DEFAULT_EXIT_THRESHOLD);
    }

    // -- records -----------------------------------------------------------

    #[test]
    fn result_deserializes_null_categories() {
        let json = serde_json::json!({
            "id": "r1",
            "camera_id": "1",
            "timestamp": "2024-03-01T12:00:00Z",
            "gender": null,
            "age": "18-24"
        });
        let result: DemographicsResult = serde_json::from_value(json).unwrap();
        assert!(result.gender.is_none());
        assert_eq!(result.age, Some(AgeGroup::YoungAdult));
        assert!(result.emotion.is_none());
    }

    #[test]
    fn result_accepts_offset_free_timestamp_as_utc() {
        let json = serde_json::json!({
            "id": "r2",
            "camera_id": "1",
            "timestamp": "2024-03-01T12:00:00"
        });
        let result: DemographicsResult = serde_json::from_value(json).unwrap();
        assert_eq!(result.timestamp, now());
    }

    #[test]
    fn result_with_unparseable_timestamp_is_rejected() {
        let json = serde_json::json!({
            "id": "r3",
            "camera_id": "1",
            "timestamp": "last tuesday"
        });
        assert!(serde_json::from_value::<DemographicsResult>(json).is_err());
    }
}
