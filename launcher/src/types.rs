use klaviyo::{SendOptions, SendStrategy};
use serde::{Deserialize, Serialize};

/// One entry of a scheduling batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CampaignRequest {
    #[serde(rename = "campaignId")]
    pub campaign_id: String,
    pub send_strategy: SendStrategy,
    #[serde(default)]
    pub send_options: SendOptions,
}

/// Outcome of a single batch item.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ItemResult {
    pub id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItemResult {
    pub fn succeeded(id: &str) -> Self {
        ItemResult {
            id: id.to_string(),
            success: true,
            error: None,
        }
    }

    pub fn failed(id: &str, error: impl ToString) -> Self {
        ItemResult {
            id: id.to_string(),
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Per item outcomes of a batch, in request order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BatchResult {
    pub success: bool,
    pub results: Vec<ItemResult>,
}

impl FromIterator<ItemResult> for BatchResult {
    fn from_iter<I: IntoIterator<Item = ItemResult>>(iter: I) -> Self {
        let results: Vec<ItemResult> = iter.into_iter().collect();
        BatchResult {
            success: results.iter().all(|r| r.success),
            results,
        }
    }
}

impl BatchResult {
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }
}
