//! Batch creation of campaigns for a launch.
//!
//! Every configuration row clones a source campaign under a generated name and
//! points the clone at the row's audiences. Rows are processed in order and a
//! failing row does not stop the others.

use crate::errors::RequestError;
use crate::metrics_defs::LAUNCH_ITEMS;
use klaviyo::{Audiences, CampaignPlatform};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::counter;
use std::sync::Arc;

/// A segment reference as sent by clients: a bare id or a `{id, name}` object.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SegmentRef {
    Id(String),
    Segment { id: String },
}

impl SegmentRef {
    pub fn into_id(self) -> String {
        match self {
            SegmentRef::Id(id) | SegmentRef::Segment { id } => id,
        }
    }
}

/// Audience selection attached to a configuration row, usually a segment group.
/// Fields other than the two lists are ignored. A missing or null list is empty.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudienceSelection {
    #[serde(default)]
    pub segments_to_include: Option<Vec<SegmentRef>>,
    #[serde(default)]
    pub segments_to_exclude: Option<Vec<SegmentRef>>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchConfiguration {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub campaign_to_clone: String,
    #[serde(default)]
    pub user_type: String,
    #[serde(default)]
    pub audience: String,
    #[serde(default)]
    pub territory: String,
    #[serde(default)]
    pub test: String,
    #[serde(default)]
    pub excluded_segments: Option<AudienceSelection>,
}

impl LaunchConfiguration {
    pub fn audiences(&self) -> Audiences {
        let selection = self.excluded_segments.clone().unwrap_or_default();
        Audiences {
            included: selection
                .segments_to_include
                .unwrap_or_default()
                .into_iter()
                .map(SegmentRef::into_id)
                .collect(),
            excluded: selection
                .segments_to_exclude
                .unwrap_or_default()
                .into_iter()
                .map(SegmentRef::into_id)
                .collect(),
        }
    }

    /// `C | {launch} | {user type} | {territory} | {test}`. The audience column
    /// is not part of the name.
    pub fn campaign_name(&self, launch_name: &str) -> String {
        format!(
            "C | {} | {} | {} | {}",
            launch_name, self.user_type, self.territory, self.test
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LaunchRequest {
    pub launch_name: String,
    /// Rows as received, echoed back in the results.
    pub configurations: Vec<Value>,
}

impl LaunchRequest {
    pub fn parse(body: &Value) -> Result<Self, RequestError> {
        let launch_name = body
            .get("launchName")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
            .ok_or(RequestError::MissingLaunchName)?;

        let configurations = body
            .get("configurations")
            .and_then(Value::as_array)
            .filter(|configurations| !configurations.is_empty())
            .ok_or(RequestError::EmptyConfigurations)?;

        Ok(LaunchRequest {
            launch_name: launch_name.to_string(),
            configurations: configurations.clone(),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CloneOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CloneOutcome {
    fn failed(error: impl ToString) -> Self {
        CloneOutcome {
            error: Some(error.to_string()),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConfigurationResult {
    pub configuration: Value,
    pub result: CloneOutcome,
    pub success: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedCampaign {
    pub original_campaign_id: String,
    pub new_campaign_id: String,
    pub name: String,
    pub user_type: String,
    pub audience: String,
    pub territory: String,
    pub test: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchReport {
    pub success: bool,
    pub launch_name: String,
    pub total_configurations: usize,
    pub successful_campaigns: usize,
    pub failed_campaigns: usize,
    pub created_campaigns: Vec<CreatedCampaign>,
    pub results: Vec<ConfigurationResult>,
}

#[derive(Clone)]
pub struct LaunchCreator {
    platform: Arc<dyn CampaignPlatform>,
}

impl LaunchCreator {
    pub fn new(platform: Arc<dyn CampaignPlatform>) -> Self {
        LaunchCreator { platform }
    }

    pub async fn create(&self, request: LaunchRequest) -> LaunchReport {
        let total_configurations = request.configurations.len();
        let mut created_campaigns = Vec::new();
        let mut results = Vec::with_capacity(total_configurations);

        for raw in request.configurations {
            let outcome = match serde_json::from_value::<LaunchConfiguration>(raw.clone()) {
                Ok(configuration) => {
                    let outcome = self.create_one(&request.launch_name, &configuration).await;
                    if outcome.success {
                        let name = configuration.campaign_name(&request.launch_name);
                        created_campaigns.push(CreatedCampaign {
                            original_campaign_id: configuration.campaign_to_clone,
                            new_campaign_id: outcome.id.clone().unwrap_or_default(),
                            name,
                            user_type: configuration.user_type,
                            audience: configuration.audience,
                            territory: configuration.territory,
                            test: configuration.test,
                        });
                    }
                    outcome
                }
                Err(e) => CloneOutcome::failed(format!("Invalid configuration: {e}")),
            };

            let label = if outcome.success { "success" } else { "failure" };
            counter!(LAUNCH_ITEMS, "outcome" => label).increment(1);

            results.push(ConfigurationResult {
                configuration: raw,
                success: outcome.success,
                result: outcome,
            });
        }

        let successful_campaigns = created_campaigns.len();
        tracing::info!(
            launch_name = %request.launch_name,
            total = total_configurations,
            created = successful_campaigns,
            "launch finished"
        );

        LaunchReport {
            success: successful_campaigns == total_configurations,
            launch_name: request.launch_name,
            total_configurations,
            successful_campaigns,
            failed_campaigns: total_configurations - successful_campaigns,
            created_campaigns,
            results,
        }
    }

    async fn create_one(&self, launch_name: &str, configuration: &LaunchConfiguration) -> CloneOutcome {
        let source_id = configuration.campaign_to_clone.trim();
        if source_id.is_empty() {
            return CloneOutcome::failed("campaignToClone is required");
        }

        let name = configuration.campaign_name(launch_name);
        let clone = match self.platform.clone_campaign(source_id, &name).await {
            Ok(clone) => clone,
            Err(e) => {
                tracing::warn!(source_id, name = %name, error = %e, "clone failed");
                return CloneOutcome::failed(e);
            }
        };

        match self
            .platform
            .update_audiences(&clone.id, &configuration.audiences())
            .await
        {
            Ok(updated) => CloneOutcome {
                success: true,
                id: Some(updated.id),
                name: Some(updated.name),
                error: None,
            },
            // The clone stays behind; report its id so it can be cleaned up
            Err(e) => {
                tracing::warn!(clone_id = %clone.id, error = %e, "audience update failed");
                CloneOutcome {
                    success: false,
                    id: Some(clone.id),
                    name: Some(clone.name),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
