//! Camera fleet data layer.
//!
//! Presents one consistent view of cameras and demographics detections
//! drawn from three sources of differing reliability:
//!
//! - the remote service ([`camwatch_client`]), authoritative but possibly
//!   unreachable,
//! - the local override store ([`overrides`]), edits made on this side and
//!   persisted in a key-value store,
//! - the synthetic fixtures ([`fixtures`]), always available.
//!
//! [`cameras::CameraReconciler`] merges camera records with precedence
//! local override > remote > synthetic, and
//! [`demographics::DemographicsQueryEngine`] filters and summarizes
//! detection records.

pub mod cameras;
pub mod config;
pub mod demographics;
pub mod fixtures;
pub mod overrides;
pub mod sources;
pub mod store;

use std::sync::Arc;

use camwatch_client::{ApiError, CameraService, CamwatchApi, DemographicsService};

use crate::cameras::CameraReconciler;
use crate::config::DataConfig;
use crate::demographics::DemographicsQueryEngine;
use crate::fixtures::FixtureProvider;
use crate::overrides::LocalOverrideStore;
use crate::store::{JsonFileStore, Store};

/// The two engines sharing one override store and one fixture set.
#[derive(Clone)]
pub struct DataLayer {
    pub cameras: Arc<CameraReconciler>,
    pub demographics: Arc<DemographicsQueryEngine>,
}

impl DataLayer {
    pub fn new(
        camera_service: Arc<dyn CameraService>,
        demographics_service: Arc<dyn DemographicsService>,
        store: Arc<dyn Store>,
        fixtures: Arc<FixtureProvider>,
        paginate_merged: bool,
    ) -> Self {
        let overrides = Arc::new(LocalOverrideStore::new(store));
        let cameras = CameraReconciler::new(camera_service, overrides, Arc::clone(&fixtures))
            .with_paginate_merged(paginate_merged);
        let demographics = DemographicsQueryEngine::new(demographics_service, fixtures);
        Self {
            cameras: Arc::new(cameras),
            demographics: Arc::new(demographics),
        }
    }

    /// Wire the HTTP client, the JSON file store and the fixtures from
    /// `config`.
    pub fn from_config(config: &DataConfig) -> Result<Self, ApiError> {
        let api = Arc::new(CamwatchApi::new(&config.api_url, config.request_timeout)?);
        let store = Arc::new(JsonFileStore::new(&config.store_dir, &config.store_key));
        let fixtures = Arc::new(FixtureProvider::new(
            config.synthetic_results,
            config.synthetic_seed,
        ));

        tracing::info!(
            api_url = %api.api_url(),
            store = %store.path().display(),
            "Data layer configured",
        );

        Ok(Self::new(
            api.clone(),
            api,
            store,
            fixtures,
            config.paginate_merged,
        ))
    }
}
