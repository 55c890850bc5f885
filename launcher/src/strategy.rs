//! Completeness rules for send strategies.
//!
//! A strategy is complete when every field its method needs is present:
//!
//! | method            | required                                              |
//! |-------------------|-------------------------------------------------------|
//! | `static`          | `datetime`, `options.is_local` (any value)            |
//! | `throttled`       | `datetime`, non-zero `throttle_percentage`            |
//! | `smart_send_time` | `date`, or with [`SmartSendTimeRule::Full`] the send  |
//! |                   | window options plus `datetime`                        |
//! | `immediate`       | nothing                                               |
//!
//! Any other method is incomplete.

use crate::types::CampaignRequest;
use klaviyo::{SendMethod, SendStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// What a smart send time strategy needs to be complete.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SmartSendTimeRule {
    /// A `date` is enough.
    #[default]
    DateOnly,
    /// `options.timezone`, `options.sendWindowStart`, `options.sendWindowEnd`
    /// and `datetime`.
    Full,
}

impl SmartSendTimeRule {
    fn other(self) -> Self {
        match self {
            SmartSendTimeRule::DateOnly => SmartSendTimeRule::Full,
            SmartSendTimeRule::Full => SmartSendTimeRule::DateOnly,
        }
    }
}

impl fmt::Display for SmartSendTimeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmartSendTimeRule::DateOnly => f.write_str("date_only"),
            SmartSendTimeRule::Full => f.write_str("full"),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct StrategyRules {
    #[serde(default)]
    pub smart_send_time: SmartSendTimeRule,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completeness {
    Complete,
    Incomplete { missing: Vec<&'static str> },
}

impl Completeness {
    pub fn is_complete(&self) -> bool {
        matches!(self, Completeness::Complete)
    }

    fn from_missing(missing: Vec<&'static str>) -> Self {
        if missing.is_empty() {
            Completeness::Complete
        } else {
            Completeness::Incomplete { missing }
        }
    }
}

pub fn completeness(strategy: &SendStrategy, rules: &StrategyRules) -> Completeness {
    let Some(method) = strategy.method.as_ref() else {
        return Completeness::Incomplete {
            missing: vec!["method"],
        };
    };

    let mut missing = Vec::new();
    match method {
        SendMethod::Static => {
            if strategy.datetime().is_none() {
                missing.push("datetime");
            }
            if strategy.option("is_local").is_none() {
                missing.push("options.is_local");
            }
        }
        SendMethod::Throttled => {
            if strategy.datetime().is_none() {
                missing.push("datetime");
            }
            if strategy.throttle_percentage.unwrap_or(0) == 0 {
                missing.push("throttle_percentage");
            }
        }
        SendMethod::SmartSendTime => {
            missing = smart_send_time_missing(strategy, rules.smart_send_time);
        }
        SendMethod::Immediate => {}
        SendMethod::Other(_) => missing.push("method"),
    }
    Completeness::from_missing(missing)
}

fn smart_send_time_missing(strategy: &SendStrategy, rule: SmartSendTimeRule) -> Vec<&'static str> {
    let mut missing = Vec::new();
    match rule {
        SmartSendTimeRule::DateOnly => {
            if strategy.date().is_none() {
                missing.push("date");
            }
        }
        SmartSendTimeRule::Full => {
            for (key, field) in [
                ("timezone", "options.timezone"),
                ("sendWindowStart", "options.sendWindowStart"),
                ("sendWindowEnd", "options.sendWindowEnd"),
            ] {
                if !strategy.option(key).is_some_and(is_truthy) {
                    missing.push(field);
                }
            }
            if strategy.datetime().is_none() {
                missing.push("datetime");
            }
        }
    }
    missing
}

/// Smart send time strategies that pass the configured rule but would fail
/// the other one. Returns a human readable warning for those.
pub fn rule_divergence(strategy: &SendStrategy, rules: &StrategyRules) -> Option<String> {
    if strategy.method != Some(SendMethod::SmartSendTime) {
        return None;
    }
    if !smart_send_time_missing(strategy, rules.smart_send_time).is_empty() {
        return None;
    }

    let other = rules.smart_send_time.other();
    let missing = smart_send_time_missing(strategy, other);
    if missing.is_empty() {
        return None;
    }
    Some(format!(
        "smart_send_time strategy satisfies the {} rule but is missing {} under the {} rule",
        rules.smart_send_time,
        missing.join(", "),
        other
    ))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncompleteCampaign {
    pub index: usize,
    pub campaign_id: String,
    pub method: String,
    pub missing: Vec<&'static str>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub incomplete_count: usize,
    pub incomplete_campaigns: Vec<IncompleteCampaign>,
    pub warnings: Vec<String>,
}

pub fn validate_requests(requests: &[CampaignRequest], rules: &StrategyRules) -> ValidationReport {
    let mut incomplete_campaigns = Vec::new();
    let mut warnings = Vec::new();

    for (index, request) in requests.iter().enumerate() {
        let strategy = &request.send_strategy;
        if let Completeness::Incomplete { missing } = completeness(strategy, rules) {
            incomplete_campaigns.push(IncompleteCampaign {
                index,
                campaign_id: request.campaign_id.clone(),
                method: method_name(strategy).to_string(),
                missing,
            });
        }
        if let Some(warning) = rule_divergence(strategy, rules) {
            tracing::warn!(index, campaign_id = %request.campaign_id, "{warning}");
            warnings.push(format!("Campaign request at index {index}: {warning}"));
        }
    }

    ValidationReport {
        is_valid: incomplete_campaigns.is_empty(),
        incomplete_count: incomplete_campaigns.len(),
        incomplete_campaigns,
        warnings,
    }
}

pub(crate) fn method_name(strategy: &SendStrategy) -> &str {
    strategy.method.as_ref().map(SendMethod::as_str).unwrap_or("")
}
