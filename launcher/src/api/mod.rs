//! HTTP routes of the console API.

mod campaigns;
mod segment_groups;

use crate::launch::LaunchCreator;
use crate::schedule::Scheduler;
use crate::segment_groups::SegmentGroups;
use crate::strategy::StrategyRules;
use axum::Router;
use axum::routing::{get, post};
use klaviyo::CampaignPlatform;
use segment_store::SegmentGroupStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    platform: Arc<dyn CampaignPlatform>,
    rules: StrategyRules,
    scheduler: Scheduler,
    launches: LaunchCreator,
    segment_groups: SegmentGroups,
}

impl AppState {
    pub fn new(
        platform: Arc<dyn CampaignPlatform>,
        store: Arc<dyn SegmentGroupStore>,
        rules: StrategyRules,
    ) -> Self {
        AppState {
            scheduler: Scheduler::new(platform.clone()),
            launches: LaunchCreator::new(platform.clone()),
            segment_groups: SegmentGroups::new(store),
            platform,
            rules,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/campaigns", get(campaigns::list))
        .route("/api/campaigns/sent", get(campaigns::list_sent))
        .route("/api/campaigns/{id}/jobs", get(campaigns::list_jobs))
        .route("/api/campaigns/validate", post(campaigns::validate))
        .route("/api/campaigns/schedule", post(campaigns::schedule))
        .route("/api/campaigns/reschedule", post(campaigns::reschedule))
        .route("/api/campaigns/cancel", post(campaigns::cancel))
        .route("/api/campaigns/revert", post(campaigns::revert))
        .route("/api/campaigns/create-launch", post(campaigns::create_launch))
        .route("/api/segments", get(campaigns::list_segments))
        .route(
            "/api/segment-groups",
            get(segment_groups::list).post(segment_groups::create),
        )
        .route(
            "/api/segment-groups/{id}",
            get(segment_groups::get)
                .put(segment_groups::update)
                .delete(segment_groups::delete),
        )
        .route(
            "/api/segment-groups/{id}/segments",
            post(segment_groups::assign),
        )
        .with_state(state)
}
