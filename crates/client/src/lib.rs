//! Client for the remote camera and demographics service.
//!
//! [`service`] defines the consumed contract as traits so the data layer
//! can run against fakes; [`api`] implements it over HTTP with [`reqwest`].

pub mod api;
pub mod service;

pub use api::{ApiError, CamwatchApi};
pub use service::{CameraListParams, CameraService, DemographicsResponse, DemographicsService};
