//! JSON:API envelopes exchanged with the platform.
//!
//! Responses wrap resources as `{"data": {"id": .., "attributes": {..}}}` and
//! failures as `{"errors": [{"detail": ..}]}`. Only the fields this crate reads
//! are modelled; everything else is ignored.

use crate::types::{Audiences, CampaignStatus, SendJobAction, SendOptions, SendStrategy};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug)]
pub(crate) struct Document<T> {
    pub data: T,
}

#[derive(Deserialize, Debug)]
pub(crate) struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub links: Option<Links>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct Links {
    pub next: Option<String>,
}

/// Some endpoints answer with a single resource where a list is expected.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub(crate) enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[derive(Deserialize, Debug)]
pub(crate) struct MaybeDocument<T> {
    pub data: Option<T>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct Resource<A> {
    pub id: String,
    pub attributes: A,
}

#[derive(Deserialize, Debug)]
pub(crate) struct CampaignAttributes {
    pub name: String,
    pub status: CampaignStatus,
}

#[derive(Deserialize, Debug)]
pub(crate) struct SegmentAttributes {
    pub name: String,
}

#[derive(Deserialize, Debug)]
pub(crate) struct SendJobAttributes {
    pub status: Option<String>,
    pub scheduled_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct ErrorDocument {
    #[serde(default)]
    pub errors: Vec<ErrorObject>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ErrorObject {
    pub detail: Option<String>,
}

impl ErrorDocument {
    pub fn first_detail(&self) -> Option<&str> {
        self.errors.first().and_then(|e| e.detail.as_deref())
    }
}

/// Outgoing resource object: `{"type": .., "id": .., "attributes": {..}}`.
#[derive(Serialize, Debug)]
pub(crate) struct OutgoingResource<'a, A> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<A>,
}

#[derive(Serialize, Debug)]
pub(crate) struct OutgoingDocument<'a, A> {
    pub data: OutgoingResource<'a, A>,
}

impl<'a, A> OutgoingDocument<'a, A> {
    pub fn new(kind: &'static str, id: &'a str, attributes: Option<A>) -> Self {
        OutgoingDocument {
            data: OutgoingResource {
                kind,
                id,
                attributes,
            },
        }
    }
}

#[derive(Serialize, Debug)]
pub(crate) struct SendStrategyAttributes<'a> {
    pub send_strategy: &'a SendStrategy,
    pub send_options: &'a SendOptions,
}

#[derive(Serialize, Debug)]
pub(crate) struct AudienceAttributes<'a> {
    pub audiences: &'a Audiences,
}

#[derive(Serialize, Debug)]
pub(crate) struct CloneAttributes<'a> {
    pub new_name: &'a str,
}

#[derive(Serialize, Debug)]
pub(crate) struct SendJobActionAttributes {
    pub action: SendJobAction,
}
