//! Batch scheduling of campaigns.
//!
//! Requests are validated as a whole before anything is sent to the platform.
//! Afterwards every item runs on its own: a failing item is reported in its
//! result and the batch moves on to the next one.

use crate::errors::RequestError;
use crate::metrics_defs::{BATCH_DURATION, BATCH_ITEMS};
use crate::strategy::{self, Completeness, StrategyRules};
use crate::types::{BatchResult, CampaignRequest, ItemResult};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use klaviyo::{CampaignPlatform, SendJobAction, SendMethod, SendStrategy};
use serde_json::Value;
use shared::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;

/// Methods that send at a given time and therefore need a date or datetime.
/// `scheduled` is a legacy token still sent by older clients.
fn is_time_based(method: &str) -> bool {
    matches!(method, "static" | "throttled" | "smart_send_time" | "scheduled")
}

/// Checks the shape of a scheduling batch and parses it.
///
/// Datetimes with an offset are normalized to UTC with millisecond precision,
/// local datetimes are kept as sent. Completeness is not checked here, see
/// [`require_complete`].
pub fn parse_requests(body: &Value) -> Result<Vec<CampaignRequest>, RequestError> {
    let items = match body.as_array() {
        Some(items) if !items.is_empty() => items,
        _ => return Err(RequestError::EmptyBatch),
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_request(index, item))
        .collect()
}

fn parse_request(index: usize, item: &Value) -> Result<CampaignRequest, RequestError> {
    let campaign_id = item
        .get("campaignId")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(RequestError::InvalidCampaignId { index })?;

    let raw_strategy = item
        .get("send_strategy")
        .filter(|s| s.is_object())
        .ok_or(RequestError::InvalidStrategyObject { index })?;

    let method = raw_strategy
        .get("method")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .ok_or(RequestError::InvalidMethod { index })?;

    let mut send_strategy: SendStrategy = serde_json::from_value(raw_strategy.clone())
        .map_err(|e| RequestError::MalformedStrategy {
            index,
            reason: e.to_string(),
        })?;

    if is_time_based(method) && send_strategy.date().is_none() && send_strategy.datetime().is_none()
    {
        return Err(RequestError::MissingSendTime {
            index,
            method: method.to_string(),
        });
    }

    if let Some(datetime) = send_strategy.datetime().map(str::to_owned) {
        let normalized = normalize_datetime(&datetime)
            .ok_or(RequestError::InvalidDatetime { index, value: datetime })?;
        send_strategy.datetime = Some(normalized);
    }

    let send_options = match item.get("send_options") {
        None | Some(Value::Null) => Default::default(),
        Some(options) => serde_json::from_value(options.clone()).map_err(|e| {
            RequestError::MalformedStrategy {
                index,
                reason: format!("send_options: {e}"),
            }
        })?,
    };

    Ok(CampaignRequest {
        campaign_id: campaign_id.to_string(),
        send_strategy,
        send_options,
    })
}

/// `2025-05-01T12:00:00+02:00` becomes `2025-05-01T10:00:00.000Z`.
///
/// Datetimes without an offset, like `2025-05-01T10:00` from a browser's
/// local datetime picker, are wall-clock times and pass through unchanged.
pub fn normalize_datetime(value: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Millis, true));
    }

    LOCAL_DATETIME_FORMATS
        .iter()
        .any(|format| NaiveDateTime::parse_from_str(value, format).is_ok())
        .then(|| value.to_string())
}

const LOCAL_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S%.f"];

/// Rejects the batch if any strategy is incomplete. Returns warnings for
/// smart send time strategies that only pass the configured rule.
pub fn require_complete(
    requests: &[CampaignRequest],
    rules: &StrategyRules,
) -> Result<Vec<String>, RequestError> {
    let mut warnings = Vec::new();
    for (index, request) in requests.iter().enumerate() {
        let strategy = &request.send_strategy;
        if let Completeness::Incomplete { missing } = strategy::completeness(strategy, rules) {
            return Err(RequestError::Incomplete {
                index,
                method: strategy::method_name(strategy).to_string(),
                missing: missing.join(", "),
            });
        }
        if let Some(warning) = strategy::rule_divergence(strategy, rules) {
            tracing::warn!(index, campaign_id = %request.campaign_id, "{warning}");
            warnings.push(warning);
        }
    }
    Ok(warnings)
}

/// Parses `{"campaignIds": [..]}`. Blank ids are kept and fail individually.
pub fn parse_campaign_ids(body: &Value) -> Result<Vec<String>, RequestError> {
    let ids = body
        .get("campaignIds")
        .and_then(Value::as_array)
        .filter(|ids| !ids.is_empty())
        .ok_or(RequestError::EmptyCampaignIds)?;

    Ok(ids
        .iter()
        .map(|id| id.as_str().unwrap_or_default().trim().to_string())
        .collect())
}

#[derive(Clone)]
pub struct Scheduler {
    platform: Arc<dyn CampaignPlatform>,
}

impl Scheduler {
    pub fn new(platform: Arc<dyn CampaignPlatform>) -> Self {
        Scheduler { platform }
    }

    /// Applies each request's send strategy and queues its send job.
    pub async fn schedule(&self, requests: &[CampaignRequest]) -> BatchResult {
        let start = Instant::now();
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            results.push(self.schedule_one(request).await);
        }
        finish("schedule", start, results)
    }

    /// Reverts each campaign's current send job, then schedules it again.
    pub async fn reschedule(&self, requests: &[CampaignRequest]) -> BatchResult {
        let start = Instant::now();
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            let id = &request.campaign_id;
            let result = match self.platform.update_send_job(id, SendJobAction::Revert).await {
                Ok(()) => self.schedule_one(request).await,
                Err(e) => ItemResult::failed(id, format!("Failed to cancel existing job: {e}")),
            };
            results.push(result);
        }
        finish("reschedule", start, results)
    }

    /// Cancels or reverts the send job of every campaign.
    pub async fn update_jobs(&self, campaign_ids: &[String], action: SendJobAction) -> BatchResult {
        let start = Instant::now();
        let mut results = Vec::with_capacity(campaign_ids.len());
        for id in campaign_ids {
            let result = if id.is_empty() {
                ItemResult::failed(id, "campaignId is required")
            } else {
                match self.platform.update_send_job(id, action).await {
                    Ok(()) => ItemResult::succeeded(id),
                    Err(e) => ItemResult::failed(id, e),
                }
            };
            results.push(result);
        }
        finish(action.as_str(), start, results)
    }

    async fn schedule_one(&self, request: &CampaignRequest) -> ItemResult {
        let id = &request.campaign_id;
        if request.send_strategy.method == Some(SendMethod::Immediate) {
            tracing::info!(campaign_id = %id, "sending campaign immediately");
        }

        if let Err(e) = self
            .platform
            .update_send_strategy(id, &request.send_strategy, &request.send_options)
            .await
        {
            return ItemResult::failed(id, e);
        }

        match self.platform.create_send_job(id).await {
            Ok(()) => ItemResult::succeeded(id),
            Err(e) => ItemResult::failed(id, e),
        }
    }
}

fn finish(operation: &'static str, start: Instant, results: Vec<ItemResult>) -> BatchResult {
    for result in &results {
        let outcome = if result.success { "success" } else { "failure" };
        counter!(BATCH_ITEMS, "operation" => operation, "outcome" => outcome).increment(1);
        if let Some(error) = &result.error {
            tracing::warn!(operation, campaign_id = %result.id, error = %error, "batch item failed");
        }
    }
    histogram!(BATCH_DURATION, "operation" => operation).record(start.elapsed().as_secs_f64());

    let batch: BatchResult = results.into_iter().collect();
    tracing::info!(
        operation,
        total = batch.results.len(),
        failed = batch.failed_count(),
        "batch finished"
    );
    batch
}
