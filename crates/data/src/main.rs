//! `camwatch-probe` -- prints the merged camera view and, optionally, the
//! demographics summary of one camera.
//!
//! Usage: `camwatch-probe [camera_id]`
//!
//! Configuration comes from the environment (see
//! [`camwatch_data::config::DataConfig::from_env`]); a `.env` file is
//! loaded first if present.

use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use camwatch_core::filters::DemographicsFilter;
use camwatch_core::pagination::DEFAULT_PAGE_SIZE;
use camwatch_data::config::DataConfig;
use camwatch_data::DataLayer;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "camwatch_data=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = DataConfig::from_env();
    let layer = DataLayer::from_config(&config).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build HTTP client");
        std::process::exit(1);
    });

    let cameras = layer.cameras.list(1, DEFAULT_PAGE_SIZE, None).await;
    tracing::info!(total = cameras.total, pages = cameras.pages, "Listed cameras");
    print_json(&cameras);

    if let Some(camera_id) = std::env::args().nth(1) {
        match layer.cameras.get_by_id(&camera_id).await {
            Ok(camera) => print_json(&camera),
            Err(e) => tracing::warn!(camera_id = %camera_id, error = %e, "Camera lookup failed"),
        }

        let outcome = layer
            .demographics
            .query(&DemographicsFilter::for_camera(camera_id))
            .await;
        if let Some(result) = outcome.into_result() {
            print_json(&result);
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!(error = %e, "Failed to serialize output"),
    }
}
