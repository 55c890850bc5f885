use super::AppState;
use crate::errors::ApiError;
use crate::launch::{LaunchReport, LaunchRequest};
use crate::schedule::{self, parse_campaign_ids};
use crate::strategy::{self, ValidationReport};
use crate::types::BatchResult;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use klaviyo::{Campaign, CampaignStatus, ScheduledJob, SendJobAction};
use serde_json::{Value, json};

type JsonBody = Result<Json<Value>, JsonRejection>;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Campaign>>, ApiError> {
    let campaigns = state
        .platform
        .list_campaigns()
        .await
        .map_err(ApiError::platform("Failed to fetch campaigns"))?;
    Ok(Json(campaigns))
}

pub async fn list_sent(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let sent: Vec<Campaign> = state
        .platform
        .list_campaigns()
        .await
        .map_err(ApiError::platform("Failed to fetch sent campaigns"))?
        .into_iter()
        .filter(|c| c.status == CampaignStatus::Sent)
        .collect();
    Ok(Json(json!({"success": true, "count": sent.len(), "data": sent})))
}

pub async fn list_jobs(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ScheduledJob>>, ApiError> {
    let jobs = state
        .platform
        .list_send_jobs(&id)
        .await
        .map_err(ApiError::platform("Failed to fetch scheduled jobs"))?;
    Ok(Json(jobs))
}

pub async fn list_segments(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let segments = state
        .platform
        .list_segments()
        .await
        .map_err(ApiError::platform("Failed to fetch segments"))?;
    Ok(Json(json!({"success": true, "count": segments.len(), "data": segments})))
}

pub async fn validate(
    State(state): State<AppState>,
    body: JsonBody,
) -> Result<Json<ValidationReport>, ApiError> {
    let Json(body) = body?;
    let requests = schedule::parse_requests(&body)?;
    Ok(Json(strategy::validate_requests(&requests, &state.rules)))
}

pub async fn schedule(
    State(state): State<AppState>,
    body: JsonBody,
) -> Result<Json<BatchResult>, ApiError> {
    let Json(body) = body?;
    let requests = schedule::parse_requests(&body)?;
    schedule::require_complete(&requests, &state.rules)?;
    Ok(Json(state.scheduler.schedule(&requests).await))
}

pub async fn reschedule(
    State(state): State<AppState>,
    body: JsonBody,
) -> Result<Json<BatchResult>, ApiError> {
    let Json(body) = body?;
    let requests = schedule::parse_requests(&body)?;
    schedule::require_complete(&requests, &state.rules)?;
    Ok(Json(state.scheduler.reschedule(&requests).await))
}

pub async fn cancel(
    State(state): State<AppState>,
    body: JsonBody,
) -> Result<Json<BatchResult>, ApiError> {
    let Json(body) = body?;
    let ids = parse_campaign_ids(&body)?;
    Ok(Json(state.scheduler.update_jobs(&ids, SendJobAction::Cancel).await))
}

pub async fn revert(
    State(state): State<AppState>,
    body: JsonBody,
) -> Result<Json<BatchResult>, ApiError> {
    let Json(body) = body?;
    let ids = parse_campaign_ids(&body)?;
    Ok(Json(state.scheduler.update_jobs(&ids, SendJobAction::Revert).await))
}

/// Answers 207 Multi-Status when at least one configuration failed.
pub async fn create_launch(
    State(state): State<AppState>,
    body: JsonBody,
) -> Result<(StatusCode, Json<LaunchReport>), ApiError> {
    let Json(body) = body?;
    let request = LaunchRequest::parse(&body)?;
    let report = state.launches.create(request).await;
    let status = if report.success {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };
    Ok((status, Json(report)))
}

#[cfg(test)]
mod tests {
    use crate::testutils::{Call, FakePlatform, TestApp};
    use axum::http::{Method, StatusCode};
    use klaviyo::{Campaign, CampaignStatus, ScheduledJob, Segment, SendJobAction};
    use serde_json::json;

    fn campaign(id: &str, status: CampaignStatus) -> Campaign {
        Campaign {
            id: id.into(),
            name: format!("Campaign {id}"),
            status,
        }
    }

    #[tokio::test]
    async fn test_passthroughs() {
        let platform = FakePlatform::with_campaigns(vec![
            campaign("c1", CampaignStatus::Draft),
            campaign("c2", CampaignStatus::Sent),
        ]);
        platform.set_segments(vec![Segment {
            id: "s1".into(),
            name: "Engaged".into(),
        }]);
        platform.set_jobs(
            "c1",
            vec![ScheduledJob {
                id: "c1".into(),
                status: "queued".into(),
                scheduled_at: None,
                created_at: None,
                updated_at: None,
            }],
        );
        let app = TestApp::new(platform);

        let (status, body) = app.send(Method::GET, "/api/campaigns", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[1]["status"], "Sent");

        let (_, body) = app.send(Method::GET, "/api/campaigns/sent", None).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["id"], "c2");

        let (_, body) = app.send(Method::GET, "/api/campaigns/c1/jobs", None).await;
        assert_eq!(body, json!([{"id": "c1", "status": "queued", "scheduledAt": null, "createdAt": null, "updatedAt": null}]));

        let (_, body) = app.send(Method::GET, "/api/campaigns/unknown/jobs", None).await;
        assert_eq!(body, json!([]));

        let (_, body) = app.send(Method::GET, "/api/segments", None).await;
        assert_eq!(body, json!({"success": true, "count": 1, "data": [{"id": "s1", "name": "Engaged"}]}));
    }

    #[tokio::test]
    async fn test_passthrough_failures() {
        let platform = FakePlatform::default();
        platform.fail_listings("Rate limited");
        let app = TestApp::new(platform);

        let (status, body) = app.send(Method::GET, "/api/segments", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"success": false, "error": "Failed to fetch segments", "message": "Rate limited"})
        );

        let (status, body) = app.send(Method::GET, "/api/campaigns/sent", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch sent campaigns");
    }

    #[tokio::test]
    async fn test_schedule() {
        let platform = FakePlatform::default();
        platform.fail_update_send_strategy("c2", "Campaign is not a draft");
        let app = TestApp::new(platform);

        let (status, body) = app
            .send(
                Method::POST,
                "/api/campaigns/schedule",
                Some(json!([
                    {"campaignId": "c1", "send_strategy": {"method": "static", "datetime": "2025-05-01T12:00:00+02:00", "options": {"is_local": false}}},
                    {"campaignId": "c2", "send_strategy": {"method": "immediate"}}
                ])),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "success": false,
                "results": [
                    {"id": "c1", "success": true},
                    {"id": "c2", "success": false, "error": "Campaign is not a draft"}
                ]
            })
        );
        assert_eq!(
            app.platform.strategy_of("c1").unwrap().datetime.as_deref(),
            Some("2025-05-01T10:00:00.000Z")
        );
    }

    #[tokio::test]
    async fn test_schedule_rejects_whole_batch() {
        let app = TestApp::new(FakePlatform::default());

        let (status, body) = app
            .send(
                Method::POST,
                "/api/campaigns/schedule",
                Some(json!([
                    {"campaignId": "c1", "send_strategy": {"method": "immediate"}},
                    {"campaignId": "c2", "send_strategy": {"method": "throttled", "datetime": "2025-05-01T10:00:00Z"}}
                ])),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Campaign request at index 1 has an incomplete send_strategy (throttled): missing throttle_percentage"
        );
        assert!(app.platform.calls().is_empty());

        let (status, body) = app
            .send(Method::POST, "/api/campaigns/schedule", Some(json!([])))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Request body must be a non-empty array of campaign requests"
        );

        let (status, body) = app
            .send_raw(Method::POST, "/api/campaigns/schedule", "{not json")
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid JSON body");
    }

    #[tokio::test]
    async fn test_validate_reports_without_remote_calls() {
        let app = TestApp::new(FakePlatform::default());

        let (status, body) = app
            .send(
                Method::POST,
                "/api/campaigns/validate",
                Some(json!([
                    {"campaignId": "c1", "send_strategy": {"method": "smart_send_time", "date": "2025-05-01"}},
                    {"campaignId": "c2", "send_strategy": {"method": "static", "datetime": "2025-05-01T10:00:00Z"}}
                ])),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isValid"], false);
        assert_eq!(body["incompleteCount"], 1);
        assert_eq!(body["incompleteCampaigns"][0]["missing"], json!(["options.is_local"]));
        assert_eq!(body["warnings"].as_array().unwrap().len(), 1);
        assert!(app.platform.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_and_revert() {
        let app = TestApp::new(FakePlatform::default());

        let (status, body) = app
            .send(
                Method::POST,
                "/api/campaigns/cancel",
                Some(json!({"campaignIds": ["c1"]})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "results": [{"id": "c1", "success": true}]}));

        app.send(
            Method::POST,
            "/api/campaigns/revert",
            Some(json!({"campaignIds": ["c2"]})),
        )
        .await;
        assert_eq!(
            app.platform.calls(),
            vec![
                Call::UpdateSendJob("c1".into(), SendJobAction::Cancel),
                Call::UpdateSendJob("c2".into(), SendJobAction::Revert),
            ]
        );

        let (status, _) = app
            .send(Method::POST, "/api/campaigns/cancel", Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_launch_multi_status() {
        let platform = FakePlatform::default();
        platform.fail_clone_campaign("broken", "Campaign not found");
        let app = TestApp::new(platform);

        let row = |campaign: &str, user_type: &str| {
            json!({
                "id": 1,
                "campaignToClone": campaign,
                "userType": user_type,
                "audience": "A",
                "territory": "US",
                "test": "A",
                "excludedSegments": null
            })
        };
        let (status, body) = app
            .send(
                Method::POST,
                "/api/campaigns/create-launch",
                Some(json!({
                    "launchName": "Spring",
                    "configurations": [row("abc123", "New"), row("broken", "Old"), row("abc123", "Lapsed")]
                })),
            )
            .await;

        assert_eq!(status, StatusCode::MULTI_STATUS);
        assert_eq!(body["success"], false);
        assert_eq!(body["launchName"], "Spring");
        assert_eq!(body["totalConfigurations"], 3);
        assert_eq!(body["successfulCampaigns"], 2);
        assert_eq!(body["failedCampaigns"], 1);
        assert_eq!(
            body["createdCampaigns"][0],
            json!({
                "originalCampaignId": "abc123",
                "newCampaignId": "abc123-clone-1",
                "name": "C | Spring | New | US | A",
                "userType": "New",
                "audience": "A",
                "territory": "US",
                "test": "A"
            })
        );
        assert_eq!(
            body["results"][1],
            json!({
                "configuration": row("broken", "Old"),
                "result": {"success": false, "error": "Campaign not found"},
                "success": false
            })
        );
    }

    #[tokio::test]
    async fn test_create_launch_all_succeed() {
        let app = TestApp::new(FakePlatform::default());

        let (status, body) = app
            .send(
                Method::POST,
                "/api/campaigns/create-launch",
                Some(json!({
                    "launchName": "Spring",
                    "configurations": [{"campaignToClone": "abc123", "userType": "New", "territory": "US", "test": "B"}]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["results"][0]["result"]["name"], "C | Spring | New | US | B");

        let (status, body) = app
            .send(
                Method::POST,
                "/api/campaigns/create-launch",
                Some(json!({"launchName": "", "configurations": []})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Launch name is required and must be a non-empty string"
        );
    }
}
