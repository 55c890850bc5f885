//! Client for the Klaviyo campaign API.
//!
//! [`CampaignPlatform`] is the seam the rest of the workspace programs against;
//! [`client::KlaviyoClient`] is the HTTP implementation.

pub mod client;
pub mod config;
mod document;
pub mod metrics_defs;
pub mod types;

#[cfg(test)]
mod testutils;

use async_trait::async_trait;

pub use client::{ClientError, KlaviyoClient};
pub use types::{
    Audiences, Campaign, CampaignId, CampaignStatus, ScheduledJob, Segment, SegmentId,
    SendJobAction, SendMethod, SendOptions, SendStrategy,
};

/// Remote operations on the email marketing platform.
///
/// Every call is a single round trip. Nothing is retried.
#[async_trait]
pub trait CampaignPlatform: Send + Sync {
    /// All email campaigns, across every page.
    async fn list_campaigns(&self) -> Result<Vec<Campaign>, ClientError>;

    /// Send jobs of a campaign. A campaign without a job yields an empty list.
    async fn list_send_jobs(&self, campaign_id: &str) -> Result<Vec<ScheduledJob>, ClientError>;

    /// Overwrites the campaign's send strategy and send options.
    async fn update_send_strategy(
        &self,
        campaign_id: &str,
        send_strategy: &SendStrategy,
        send_options: &SendOptions,
    ) -> Result<(), ClientError>;

    /// Queues the campaign for sending according to its send strategy.
    async fn create_send_job(&self, campaign_id: &str) -> Result<(), ClientError>;

    /// Cancels or reverts the campaign's current send job.
    async fn update_send_job(
        &self,
        campaign_id: &str,
        action: SendJobAction,
    ) -> Result<(), ClientError>;

    /// Clones `campaign_id` under `new_name` and returns the clone.
    async fn clone_campaign(&self, campaign_id: &str, new_name: &str)
    -> Result<Campaign, ClientError>;

    /// Replaces the campaign's included and excluded audiences.
    async fn update_audiences(
        &self,
        campaign_id: &str,
        audiences: &Audiences,
    ) -> Result<Campaign, ClientError>;

    /// All segments, across every page.
    async fn list_segments(&self) -> Result<Vec<Segment>, ClientError>;
}
