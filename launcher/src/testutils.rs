use crate::api::{AppState, router};
use crate::strategy::StrategyRules;
use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use klaviyo::{
    Audiences, Campaign, CampaignPlatform, CampaignStatus, ClientError, ScheduledJob, Segment,
    SendJobAction, SendOptions, SendStrategy,
};
use parking_lot::Mutex;
use segment_store::MemoryStore;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

/// The API router over a [`FakePlatform`] and an in-memory segment store.
pub struct TestApp {
    pub platform: Arc<FakePlatform>,
    router: Router,
}

impl TestApp {
    pub fn new(platform: FakePlatform) -> Self {
        let platform = Arc::new(platform);
        let state = AppState::new(
            platform.clone(),
            Arc::new(MemoryStore::new()),
            StrategyRules::default(),
        );
        TestApp {
            platform,
            router: router(state),
        }
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let body = body.map(|b| b.to_string()).unwrap_or_default();
        self.send_raw(method, uri, &body).await
    }

    pub async fn send_raw(&self, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    ListCampaigns,
    ListSendJobs(String),
    UpdateSendStrategy(String),
    CreateSendJob(String),
    UpdateSendJob(String, SendJobAction),
    CloneCampaign(String, String),
    UpdateAudiences(String, Audiences),
    ListSegments,
}

/// In-memory [`CampaignPlatform`] that records every call.
///
/// Failures are programmed per operation and campaign id and surface as
/// platform errors carrying the given detail.
#[derive(Default)]
pub struct FakePlatform {
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashMap<(&'static str, String), String>>,
    listing_failure: Mutex<Option<String>>,
    campaigns: Mutex<Vec<Campaign>>,
    segments: Mutex<Vec<Segment>>,
    jobs: Mutex<HashMap<String, Vec<ScheduledJob>>>,
    strategies: Mutex<HashMap<String, SendStrategy>>,
    clone_count: Mutex<usize>,
}

impl FakePlatform {
    pub fn with_campaigns(campaigns: Vec<Campaign>) -> Self {
        let platform = FakePlatform::default();
        *platform.campaigns.lock() = campaigns;
        platform
    }

    pub fn set_segments(&self, segments: Vec<Segment>) {
        *self.segments.lock() = segments;
    }

    pub fn set_jobs(&self, campaign_id: &str, jobs: Vec<ScheduledJob>) {
        self.jobs.lock().insert(campaign_id.to_string(), jobs);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn strategy_of(&self, campaign_id: &str) -> Option<SendStrategy> {
        self.strategies.lock().get(campaign_id).cloned()
    }

    pub fn fail_update_send_strategy(&self, campaign_id: &str, detail: &str) {
        self.fail("update_send_strategy", campaign_id, detail);
    }

    pub fn fail_create_send_job(&self, campaign_id: &str, detail: &str) {
        self.fail("create_send_job", campaign_id, detail);
    }

    pub fn fail_update_send_job(&self, campaign_id: &str, detail: &str) {
        self.fail("update_send_job", campaign_id, detail);
    }

    pub fn fail_clone_campaign(&self, campaign_id: &str, detail: &str) {
        self.fail("clone_campaign", campaign_id, detail);
    }

    pub fn fail_update_audiences(&self, campaign_id: &str, detail: &str) {
        self.fail("update_audiences", campaign_id, detail);
    }

    /// Makes every listing operation fail.
    pub fn fail_listings(&self, detail: &str) {
        *self.listing_failure.lock() = Some(detail.to_string());
    }

    fn fail(&self, operation: &'static str, campaign_id: &str, detail: &str) {
        self.failures
            .lock()
            .insert((operation, campaign_id.to_string()), detail.to_string());
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn check(&self, operation: &'static str, campaign_id: &str) -> Result<(), ClientError> {
        match self
            .failures
            .lock()
            .get(&(operation, campaign_id.to_string()))
        {
            Some(detail) => Err(api_error(detail)),
            None => Ok(()),
        }
    }

    fn check_listing(&self) -> Result<(), ClientError> {
        match self.listing_failure.lock().as_deref() {
            Some(detail) => Err(api_error(detail)),
            None => Ok(()),
        }
    }
}

fn api_error(detail: &str) -> ClientError {
    ClientError::Api {
        status: StatusCode::BAD_REQUEST,
        detail: detail.to_string(),
    }
}

#[async_trait]
impl CampaignPlatform for FakePlatform {
    async fn list_campaigns(&self) -> Result<Vec<Campaign>, ClientError> {
        self.record(Call::ListCampaigns);
        self.check_listing()?;
        Ok(self.campaigns.lock().clone())
    }

    async fn list_send_jobs(&self, campaign_id: &str) -> Result<Vec<ScheduledJob>, ClientError> {
        self.record(Call::ListSendJobs(campaign_id.to_string()));
        self.check_listing()?;
        Ok(self
            .jobs
            .lock()
            .get(campaign_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_send_strategy(
        &self,
        campaign_id: &str,
        send_strategy: &SendStrategy,
        _send_options: &SendOptions,
    ) -> Result<(), ClientError> {
        self.record(Call::UpdateSendStrategy(campaign_id.to_string()));
        self.check("update_send_strategy", campaign_id)?;
        self.strategies
            .lock()
            .insert(campaign_id.to_string(), send_strategy.clone());
        Ok(())
    }

    async fn create_send_job(&self, campaign_id: &str) -> Result<(), ClientError> {
        self.record(Call::CreateSendJob(campaign_id.to_string()));
        self.check("create_send_job", campaign_id)
    }

    async fn update_send_job(
        &self,
        campaign_id: &str,
        action: SendJobAction,
    ) -> Result<(), ClientError> {
        self.record(Call::UpdateSendJob(campaign_id.to_string(), action));
        self.check("update_send_job", campaign_id)
    }

    async fn clone_campaign(
        &self,
        campaign_id: &str,
        new_name: &str,
    ) -> Result<Campaign, ClientError> {
        self.record(Call::CloneCampaign(
            campaign_id.to_string(),
            new_name.to_string(),
        ));
        self.check("clone_campaign", campaign_id)?;

        let count = {
            let mut count = self.clone_count.lock();
            *count += 1;
            *count
        };
        let clone = Campaign {
            id: format!("{campaign_id}-clone-{count}"),
            name: new_name.to_string(),
            status: CampaignStatus::Draft,
        };
        self.campaigns.lock().push(clone.clone());
        Ok(clone)
    }

    async fn update_audiences(
        &self,
        campaign_id: &str,
        audiences: &Audiences,
    ) -> Result<Campaign, ClientError> {
        self.record(Call::UpdateAudiences(
            campaign_id.to_string(),
            audiences.clone(),
        ));
        self.check("update_audiences", campaign_id)?;

        self.campaigns
            .lock()
            .iter()
            .find(|c| c.id == campaign_id)
            .cloned()
            .ok_or_else(|| ClientError::Api {
                status: StatusCode::NOT_FOUND,
                detail: format!("Campaign {campaign_id} not found"),
            })
    }

    async fn list_segments(&self) -> Result<Vec<Segment>, ClientError> {
        self.record(Call::ListSegments);
        self.check_listing()?;
        Ok(self.segments.lock().clone())
    }
}
