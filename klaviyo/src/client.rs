use crate::CampaignPlatform;
use crate::config::Config;
use crate::document::{
    AudienceAttributes, CampaignAttributes, CloneAttributes, Document, ErrorDocument,
    MaybeDocument, OneOrMany, OutgoingDocument, Page, Resource, SegmentAttributes,
    SendJobActionAttributes, SendJobAttributes, SendStrategyAttributes,
};
use crate::metrics_defs::{PLATFORM_REQUEST_DURATION, PLATFORM_REQUEST_FAILED};
use crate::types::{
    Audiences, Campaign, ScheduledJob, Segment, SendJobAction, SendOptions, SendStrategy,
};
use async_trait::async_trait;
use http::StatusCode;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::{counter, histogram};
use std::time::{Duration, Instant};
use url::Url;

const JSON_API: &str = "application/vnd.api+json";
const EMAIL_CAMPAIGNS_FILTER: &str = "equals(messages.channel,'email')";
// Upper bound on followed `links.next` hops for a single listing.
const MAX_PAGES: usize = 500;

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("HTTP client error: {0}")]
    ReqwestError(#[from] reqwest::Error),
    /// The platform answered with a non-2xx status. `detail` is the first error
    /// detail of the response, or `HTTP <status>` when there is none.
    #[error("{detail}")]
    Api { status: StatusCode, detail: String },
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("base URL cannot carry resource paths: {0}")]
    InvalidBaseUrl(String),
    #[error("could not encode request body: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("API key environment variable {0} is not set")]
    MissingApiKey(String),
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::ReqwestError(e) => e.status(),
            _ => None,
        }
    }
}

/// HTTP implementation of [`CampaignPlatform`].
#[derive(Clone)]
pub struct KlaviyoClient {
    client: reqwest::Client,
    base_url: Url,
    revision: String,
    authorization: String,
}

impl KlaviyoClient {
    /// Builds a client reading the API key from the environment variable named
    /// by `config.api_key_env`.
    pub fn from_env(config: &Config) -> Result<Self, ClientError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ClientError::MissingApiKey(config.api_key_env.clone()))?;
        Self::new(config, &api_key)
    }

    pub fn new(config: &Config, api_key: &str) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        if config.base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(config.base_url.to_string()));
        }

        Ok(KlaviyoClient {
            client: builder.build()?,
            base_url: config.base_url.clone(),
            revision: config.revision.clone(),
            authorization: format!("Klaviyo-API-Key {api_key}"),
        })
    }

    fn resource_url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(AUTHORIZATION, &self.authorization)
            .header(ACCEPT, JSON_API)
            .header("revision", &self.revision)
    }

    fn request_with_body<T: Serialize>(
        &self,
        method: Method,
        url: Url,
        body: &T,
    ) -> Result<RequestBuilder, ClientError> {
        let bytes = serde_json::to_vec(body)?;
        Ok(self
            .request(method, url)
            .header(CONTENT_TYPE, JSON_API)
            .body(bytes))
    }

    /// Sends the request and turns non-2xx answers into [`ClientError::Api`].
    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, ClientError> {
        let start = Instant::now();
        let result = request.send().await;
        histogram!(PLATFORM_REQUEST_DURATION, "operation" => operation)
            .record(start.elapsed().as_secs_f64());

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                counter!(PLATFORM_REQUEST_FAILED, "operation" => operation).increment(1);
                tracing::warn!(operation, error = %e, "platform request failed");
                return Err(e.into());
            }
        };

        let status = response.status();
        tracing::debug!(operation, status = %status, "platform response");
        if status.is_success() {
            return Ok(response);
        }

        counter!(PLATFORM_REQUEST_FAILED, "operation" => operation).increment(1);
        let error = api_error(response).await;
        tracing::warn!(operation, status = %status, error = %error, "platform rejected request");
        Err(error)
    }

    /// Follows `links.next` until the last page and returns every resource.
    async fn fetch_all<A>(
        &self,
        operation: &'static str,
        first: Url,
    ) -> Result<Vec<Resource<A>>, ClientError>
    where
        A: DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut next = Some(first);
        let mut page_fetches = 0;

        while let Some(url) = next.take() {
            if page_fetches == MAX_PAGES {
                return Err(ClientError::UnexpectedResponse(format!(
                    "{operation} did not finish after {MAX_PAGES} pages"
                )));
            }

            let response = self.send(operation, self.request(Method::GET, url)).await?;
            let page: Page<Resource<A>> = response.json().await?;
            items.extend(page.data);
            page_fetches += 1;

            next = match page.links.and_then(|links| links.next) {
                Some(link) => Some(self.base_url.join(&link)?),
                None => None,
            };
        }

        tracing::debug!(operation, page_fetches, count = items.len(), "fetched listing");
        Ok(items)
    }
}

async fn api_error(response: Response) -> ClientError {
    let status = response.status();
    let detail = response
        .json::<ErrorDocument>()
        .await
        .ok()
        .and_then(|doc| doc.first_detail().map(String::from))
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
    ClientError::Api { status, detail }
}

fn into_campaign(resource: Resource<CampaignAttributes>) -> Campaign {
    Campaign {
        id: resource.id,
        name: resource.attributes.name,
        status: resource.attributes.status,
    }
}

#[async_trait]
impl CampaignPlatform for KlaviyoClient {
    async fn list_campaigns(&self) -> Result<Vec<Campaign>, ClientError> {
        let mut url = self.resource_url(&["campaigns"])?;
        url.query_pairs_mut()
            .append_pair("filter", EMAIL_CAMPAIGNS_FILTER);

        let campaigns = self
            .fetch_all::<CampaignAttributes>("list_campaigns", url)
            .await?
            .into_iter()
            .map(into_campaign)
            .collect();
        Ok(campaigns)
    }

    async fn list_send_jobs(&self, campaign_id: &str) -> Result<Vec<ScheduledJob>, ClientError> {
        let url = self.resource_url(&["campaign-send-jobs", campaign_id])?;
        let response = match self
            .send("list_send_jobs", self.request(Method::GET, url))
            .await
        {
            Ok(response) => response,
            Err(ClientError::Api { status, .. }) if status == StatusCode::NOT_FOUND => {
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let document: MaybeDocument<OneOrMany<Resource<SendJobAttributes>>> =
            response.json().await?;
        let Some(data) = document.data else {
            tracing::debug!(campaign_id, "no send job data for campaign");
            return Ok(Vec::new());
        };

        let jobs = data
            .into_vec()
            .into_iter()
            .map(|job| ScheduledJob {
                id: job.id,
                status: job
                    .attributes
                    .status
                    .unwrap_or_else(|| "unknown".to_string()),
                scheduled_at: job.attributes.scheduled_at,
                created_at: job.attributes.created_at,
                updated_at: job.attributes.updated_at,
            })
            .collect();
        Ok(jobs)
    }

    async fn update_send_strategy(
        &self,
        campaign_id: &str,
        send_strategy: &SendStrategy,
        send_options: &SendOptions,
    ) -> Result<(), ClientError> {
        let url = self.resource_url(&["campaigns", campaign_id])?;
        let body = OutgoingDocument::new(
            "campaign",
            campaign_id,
            Some(SendStrategyAttributes {
                send_strategy,
                send_options,
            }),
        );
        let request = self.request_with_body(Method::PATCH, url, &body)?;
        self.send("update_send_strategy", request).await?;
        Ok(())
    }

    async fn create_send_job(&self, campaign_id: &str) -> Result<(), ClientError> {
        let url = self.resource_url(&["campaign-send-jobs"])?;
        let body = OutgoingDocument::<()>::new("campaign-send-job", campaign_id, None);
        let request = self.request_with_body(Method::POST, url, &body)?;
        self.send("create_send_job", request).await?;
        Ok(())
    }

    async fn update_send_job(
        &self,
        campaign_id: &str,
        action: SendJobAction,
    ) -> Result<(), ClientError> {
        let url = self.resource_url(&["campaign-send-jobs", campaign_id])?;
        let body = OutgoingDocument::new(
            "campaign-send-job",
            campaign_id,
            Some(SendJobActionAttributes { action }),
        );
        let request = self.request_with_body(Method::PATCH, url, &body)?;
        self.send("update_send_job", request).await?;
        Ok(())
    }

    async fn clone_campaign(
        &self,
        campaign_id: &str,
        new_name: &str,
    ) -> Result<Campaign, ClientError> {
        let url = self.resource_url(&["campaign-clone"])?;
        let body = OutgoingDocument::new("campaign", campaign_id, Some(CloneAttributes { new_name }));
        let request = self.request_with_body(Method::POST, url, &body)?;
        let response = self.send("clone_campaign", request).await?;
        let document: Document<Resource<CampaignAttributes>> = response.json().await?;
        Ok(into_campaign(document.data))
    }

    async fn update_audiences(
        &self,
        campaign_id: &str,
        audiences: &Audiences,
    ) -> Result<Campaign, ClientError> {
        let url = self.resource_url(&["campaigns", campaign_id])?;
        let body = OutgoingDocument::new("campaign", campaign_id, Some(AudienceAttributes { audiences }));
        let request = self.request_with_body(Method::PATCH, url, &body)?;
        let response = self.send("update_audiences", request).await?;
        let document: Document<Resource<CampaignAttributes>> = response.json().await?;
        Ok(into_campaign(document.data))
    }

    async fn list_segments(&self) -> Result<Vec<Segment>, ClientError> {
        let url = self.resource_url(&["segments"])?;
        let segments = self
            .fetch_all::<SegmentAttributes>("list_segments", url)
            .await?
            .into_iter()
            .map(|segment| Segment {
                id: segment.id,
                name: segment.attributes.name,
            })
            .collect();
        Ok(segments)
    }
}
