use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub type CampaignId = String;
pub type SegmentId = String;

/// Lifecycle status of a campaign as reported by the platform.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CampaignStatus {
    Draft,
    Scheduled,
    Sending,
    Sent,
    Cancelled,
    Other(String),
}

impl From<String> for CampaignStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Draft" => CampaignStatus::Draft,
            "Scheduled" => CampaignStatus::Scheduled,
            "Sending" => CampaignStatus::Sending,
            "Sent" => CampaignStatus::Sent,
            "Cancelled" => CampaignStatus::Cancelled,
            _ => CampaignStatus::Other(value),
        }
    }
}

impl From<CampaignStatus> for String {
    fn from(status: CampaignStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CampaignStatus::Draft => "Draft",
            CampaignStatus::Scheduled => "Scheduled",
            CampaignStatus::Sending => "Sending",
            CampaignStatus::Sent => "Sent",
            CampaignStatus::Cancelled => "Cancelled",
            CampaignStatus::Other(other) => other,
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub status: CampaignStatus,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub name: String,
}

/// Read-only projection of a campaign send job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledJob {
    pub id: String,
    pub status: String,
    pub scheduled_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Segment lists a campaign is sent to and suppressed from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Audiences {
    pub included: Vec<SegmentId>,
    pub excluded: Vec<SegmentId>,
}

/// Delivery method of a send strategy.
///
/// Unknown tokens are preserved so they can be reported back to the caller
/// instead of failing deserialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SendMethod {
    Static,
    Throttled,
    SmartSendTime,
    Immediate,
    Other(String),
}

impl SendMethod {
    pub fn as_str(&self) -> &str {
        match self {
            SendMethod::Static => "static",
            SendMethod::Throttled => "throttled",
            SendMethod::SmartSendTime => "smart_send_time",
            SendMethod::Immediate => "immediate",
            SendMethod::Other(other) => other,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.as_str().trim().is_empty()
    }
}

impl From<String> for SendMethod {
    fn from(value: String) -> Self {
        match value.as_str() {
            "static" => SendMethod::Static,
            "throttled" => SendMethod::Throttled,
            "smart_send_time" => SendMethod::SmartSendTime,
            "immediate" => SendMethod::Immediate,
            _ => SendMethod::Other(value),
        }
    }
}

impl From<SendMethod> for String {
    fn from(method: SendMethod) -> Self {
        method.as_str().to_string()
    }
}

impl fmt::Display for SendMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When and how a campaign is delivered.
///
/// `options` is forwarded to the platform untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SendStrategy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<SendMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throttle_percentage: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
}

impl SendStrategy {
    pub fn new(method: SendMethod) -> Self {
        SendStrategy {
            method: Some(method),
            ..Default::default()
        }
    }

    /// The datetime, if set to a non-empty string.
    pub fn datetime(&self) -> Option<&str> {
        self.datetime.as_deref().filter(|s| !s.is_empty())
    }

    /// The date, if set to a non-empty string.
    pub fn date(&self) -> Option<&str> {
        self.date.as_deref().filter(|s| !s.is_empty())
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.as_ref().and_then(|options| options.get(key))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SendOptions {
    #[serde(default)]
    pub use_smart_sending: bool,
}

/// Actions accepted by the send job update endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendJobAction {
    /// Stop the send and mark the campaign cancelled.
    Cancel,
    /// Stop the send and return the campaign to draft.
    Revert,
}

impl SendJobAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendJobAction::Cancel => "cancel",
            SendJobAction::Revert => "revert",
        }
    }
}
