//! Category distribution summaries for demographics charts.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::demographics::{AgeGroup, DemographicsResult, Emotion, Ethnicity, Gender};

/// Per-field `category -> count` maps over a filtered result set.
///
/// Keys keep first-seen order from the input records; consumers must not
/// assume sorted output. Each map's counts sum to the number of non-null
/// values for that field, and `total_count` is the number of records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub gender_distribution: IndexMap<Gender, u64>,
    pub age_distribution: IndexMap<AgeGroup, u64>,
    pub emotion_distribution: IndexMap<Emotion, u64>,
    pub ethnicity_distribution: IndexMap<Ethnicity, u64>,
    pub total_count: u64,
}

impl DistributionSummary {
    /// Single pass over `results`, skipping null values per field.
    pub fn from_results(results: &[DemographicsResult]) -> Self {
        let mut summary = Self::default();
        for record in results {
            bump(&mut summary.gender_distribution, record.gender);
            bump(&mut summary.age_distribution, record.age);
            bump(&mut summary.emotion_distribution, record.emotion);
            bump(&mut summary.ethnicity_distribution, record.ethnicity);
        }
        summary.total_count = results.len() as u64;
        summary
    }

    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }
}

fn bump<K: std::hash::Hash + Eq>(map: &mut IndexMap<K, u64>, key: Option<K>) {
    if let Some(key) = key {
        *map.entry(key).or_insert(0) += 1;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
