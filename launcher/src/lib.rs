//! Campaign scheduling, launch creation and segment group management, served
//! as a JSON API.

pub mod api;
pub mod config;
pub mod errors;
pub mod launch;
pub mod metrics_defs;
pub mod schedule;
pub mod segment_groups;
pub mod strategy;
pub mod types;

#[cfg(test)]
mod testutils;

use crate::api::{AppState, router};
use crate::config::Config;
use crate::errors::{LauncherError, Result};
use klaviyo::CampaignPlatform;
use segment_store::SegmentGroupStore;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpListener;

/// Serves the API and the admin endpoints until either listener fails.
///
/// `/ready` on the admin listener reports ready once the API listener is bound.
pub async fn run(
    config: Config,
    platform: Arc<dyn CampaignPlatform>,
    store: Arc<dyn SegmentGroupStore>,
) -> Result<()> {
    let ready = Arc::new(AtomicBool::new(false));

    let admin_ready = ready.clone();
    let admin_service =
        AdminService::<_, LauncherError>::new(move || admin_ready.load(Ordering::Relaxed));
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    let app = router(AppState::new(platform, store, config.strategy.clone()));
    let api_task = async {
        let addr = format!("{}:{}", config.listener.host, config.listener.port);
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!(%addr, "console API listening");
        ready.store(true, Ordering::Relaxed);

        axum::serve(listener, app).await?;
        Ok::<(), LauncherError>(())
    };

    tokio::try_join!(api_task, admin_task)?;
    Ok(())
}
