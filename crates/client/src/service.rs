//! Remote service contract consumed by the data layer.
//!
//! | Call                        | Method & path                    |
//! |-----------------------------|----------------------------------|
//! | List cameras                | `GET /cameras/`                  |
//! | Get camera                  | `GET /cameras/{id}`              |
//! | Update camera               | `PUT /cameras/{id}`              |
//! | List tags                   | `GET /tags/`                     |
//! | Create demographics config  | `POST /demographics/config`      |
//! | Update demographics config  | `PUT /demographics/config/{id}`  |
//! | Query demographics results  | `GET /demographics/results`      |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use camwatch_core::analytics::DistributionSummary;
use camwatch_core::camera::{Camera, CameraPatch, Tag};
use camwatch_core::demographics::{
    DemographicsConfig, DemographicsConfigUpdate, DemographicsResult, NewDemographicsConfig,
};
use camwatch_core::filters::ActiveFilters;
use camwatch_core::pagination::Page;

use crate::api::ApiError;

/// Query parameters for `GET /cameras/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraListParams {
    pub page: u64,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_name: Option<String>,
}

/// Body of `GET /demographics/results`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemographicsResponse {
    #[serde(default)]
    pub results: Vec<DemographicsResult>,
    #[serde(default)]
    pub analytics: Option<DistributionSummary>,
}

/// Camera, tag and demographics-config endpoints.
#[async_trait]
pub trait CameraService: Send + Sync {
    async fn list_cameras(&self, params: &CameraListParams) -> Result<Page<Camera>, ApiError>;

    async fn get_camera(&self, id: &str) -> Result<Camera, ApiError>;

    async fn update_camera(&self, id: &str, patch: &CameraPatch) -> Result<Camera, ApiError>;

    async fn list_tags(&self) -> Result<Vec<Tag>, ApiError>;

    async fn create_demographics_config(
        &self,
        config: &NewDemographicsConfig,
    ) -> Result<DemographicsConfig, ApiError>;

    async fn update_demographics_config(
        &self,
        id: &str,
        update: &DemographicsConfigUpdate,
    ) -> Result<DemographicsConfig, ApiError>;
}

/// Demographics results endpoint.
#[async_trait]
pub trait DemographicsService: Send + Sync {
    async fn query_results(&self, filters: &ActiveFilters)
        -> Result<DemographicsResponse, ApiError>;
}
