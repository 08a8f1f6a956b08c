//! Demographics filter normalization and predicates.
//!
//! Callers send a loosely typed [`DemographicsFilter`] where an empty
//! string or `"all"` means "unconstrained". [`DemographicsFilter::normalize`]
//! turns it into an [`ActiveFilters`] record with one typed field per
//! predicate, which the query engine, the remote client and the synthetic
//! generator all share.

use serde::{Deserialize, Serialize};

use crate::demographics::{AgeGroup, DemographicsResult, Emotion, Ethnicity, Gender};
use crate::error::CoreError;
use crate::types::{EntityId, Timestamp};

/// Sentinel meaning "do not constrain this field".
pub const FILTER_ALL: &str = "all";

/// Raw filter input as sent by a caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemographicsFilter {
    #[serde(default)]
    pub camera_id: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age: Option<String>,
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub ethnicity: Option<String>,
    #[serde(default)]
    pub start_date: Option<Timestamp>,
    #[serde(default)]
    pub end_date: Option<Timestamp>,
}

/// Outcome of normalizing a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterState {
    /// No camera selected: the query must not run.
    Disabled,
    Active(ActiveFilters),
}

/// A normalized filter. `None` fields are unconstrained.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveFilters {
    pub camera_id: EntityId,
    pub gender: Option<Gender>,
    pub age: Option<AgeGroup>,
    pub emotion: Option<Emotion>,
    pub ethnicity: Option<Ethnicity>,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
}

impl DemographicsFilter {
    /// Filter for a single camera with every other field unconstrained.
    pub fn for_camera(camera_id: impl Into<String>) -> Self {
        Self {
            camera_id: camera_id.into(),
            ..Default::default()
        }
    }

    /// Map sentinels to "unconstrained" and parse category values.
    ///
    /// A blank `camera_id` yields [`FilterState::Disabled`]. Unknown
    /// category values and a start date after the end date are validation
    /// errors.
    pub fn normalize(&self) -> Result<FilterState, CoreError> {
        let camera_id = self.camera_id.trim();
        if camera_id.is_empty() {
            return Ok(FilterState::Disabled);
        }

        let gender = parse_category(self.gender.as_deref(), "gender", Gender::parse)?;
        let age = parse_category(self.age.as_deref(), "age", AgeGroup::parse)?;
        let emotion = parse_category(self.emotion.as_deref(), "emotion", Emotion::parse)?;
        let ethnicity = parse_category(self.ethnicity.as_deref(), "ethnicity", Ethnicity::parse)?;

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(CoreError::Validation(format!(
                    "start_date {start} is after end_date {end}"
                )));
            }
        }

        Ok(FilterState::Active(ActiveFilters {
            camera_id: camera_id.to_string(),
            gender,
            age,
            emotion,
            ethnicity,
            start_date: self.start_date,
            end_date: self.end_date,
        }))
    }
}

/// True when `value` leaves the field unconstrained.
pub fn is_unconstrained(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(v) => {
            let v = v.trim();
            v.is_empty() || v.eq_ignore_ascii_case(FILTER_ALL)
        }
    }
}

fn parse_category<T>(
    value: Option<&str>,
    field: &str,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>, CoreError> {
    if is_unconstrained(value) {
        return Ok(None);
    }
    let raw = value.unwrap_or_default();
    parse(raw)
        .map(Some)
        .ok_or_else(|| CoreError::Validation(format!("Unknown {field} value '{}'", raw.trim())))
}

impl ActiveFilters {
    /// Filter for a single camera with every other field unconstrained.
    pub fn for_camera(camera_id: impl Into<EntityId>) -> Self {
        Self {
            camera_id: camera_id.into(),
            gender: None,
            age: None,
            emotion: None,
            ethnicity: None,
            start_date: None,
            end_date: None,
        }
    }

    /// AND of the camera and every active predicate. Date bounds are
    /// inclusive.
    ///
    /// A constrained category never matches a record whose value is null.
    pub fn matches(&self, record: &DemographicsResult) -> bool {
        if record.camera_id != self.camera_id {
            return false;
        }
        if self.gender.is_some() && record.gender != self.gender {
            return false;
        }
        if self.age.is_some() && record.age != self.age {
            return false;
        }
        if self.emotion.is_some() && record.emotion != self.emotion {
            return false;
        }
        if self.ethnicity.is_some() && record.ethnicity != self.ethnicity {
            return false;
        }
        if let Some(start) = self.start_date {
            if record.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if record.timestamp > end {
                return false;
            }
        }
        true
    }

    /// Query-string pairs for the remote results endpoint. Only active
    /// predicates are included.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("camera_id", self.camera_id.clone())];
        if let Some(v) = self.gender {
            pairs.push(("gender", v.as_str().to_string()));
        }
        if let Some(v) = self.age {
            pairs.push(("age", v.as_str().to_string()));
        }
        if let Some(v) = self.emotion {
            pairs.push(("emotion", v.as_str().to_string()));
        }
        if let Some(v) = self.ethnicity {
            pairs.push(("ethnicity", v.as_str().to_string()));
        }
        if let Some(v) = self.start_date {
            pairs.push(("start_date", v.to_rfc3339()));
        }
        if let Some(v) = self.end_date {
            pairs.push(("end_date", v.to_rfc3339()));
        }
        pairs
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
