use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use klaviyo::ClientError;
use segment_store::StoreError;
use serde::Serialize;
use thiserror::Error;

/// Result type alias for launcher operations
pub type Result<T, E = LauncherError> = std::result::Result<T, E>;

/// Errors that stop the launcher from serving
#[derive(Error, Debug)]
pub enum LauncherError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A request body that cannot be processed at all.
#[derive(Error, Debug, PartialEq)]
pub enum RequestError {
    #[error("Request body must be a non-empty array of campaign requests")]
    EmptyBatch,

    #[error("Campaign request at index {index} must have a valid campaignId")]
    InvalidCampaignId { index: usize },

    #[error("Campaign request at index {index} must have a valid send_strategy object")]
    InvalidStrategyObject { index: usize },

    #[error("Campaign request at index {index} must have a valid send_strategy.method")]
    InvalidMethod { index: usize },

    #[error(
        "Campaign request at index {index} must have either send_strategy.date or send_strategy.datetime for {method} method"
    )]
    MissingSendTime { index: usize, method: String },

    #[error("Campaign request at index {index} has an invalid send_strategy.datetime: {value}")]
    InvalidDatetime { index: usize, value: String },

    #[error("Campaign request at index {index} has an invalid send_strategy: {reason}")]
    MalformedStrategy { index: usize, reason: String },

    #[error(
        "Campaign request at index {index} has an incomplete send_strategy ({method}): missing {missing}"
    )]
    Incomplete {
        index: usize,
        method: String,
        missing: String,
    },

    #[error("campaignIds must be a non-empty array of campaign ids")]
    EmptyCampaignIds,

    #[error("Launch name is required and must be a non-empty string")]
    MissingLaunchName,

    #[error("Configurations must be a non-empty array")]
    EmptyConfigurations,

    #[error("segmentId and assignment (include, exclude or none) are required")]
    InvalidAssignment,
}

/// Errors returned by API handlers, rendered as
/// `{"success": false, "error": .., "message": ..}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    InvalidRequest(#[from] RequestError),

    #[error("Invalid JSON body: {0}")]
    InvalidJson(String),

    #[error("Missing required fields")]
    MissingFields,

    #[error("Segment group not found")]
    SegmentGroupNotFound { id: String },

    /// Name collision on create or rename. `error` differs between the two.
    #[error("{error}")]
    DuplicateName { error: &'static str },

    #[error("{context}: {source}")]
    Platform {
        context: &'static str,
        source: ClientError,
    },

    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        source: StoreError,
    },
}

impl ApiError {
    pub fn platform(context: &'static str) -> impl FnOnce(ClientError) -> ApiError {
        move |source| ApiError::Platform { context, source }
    }

    /// Maps store failures of segment group `id`, keeping not found and
    /// duplicate names distinct from other failures.
    pub fn store(
        id: &str,
        context: &'static str,
        duplicate_error: &'static str,
    ) -> impl FnOnce(StoreError) -> ApiError {
        let id = id.to_string();
        move |source| match source {
            StoreError::NotFound(_) => ApiError::SegmentGroupNotFound { id },
            StoreError::UniqueViolation(_) => ApiError::DuplicateName {
                error: duplicate_error,
            },
            source => ApiError::Store { context, source },
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) | ApiError::InvalidJson(_) | ApiError::MissingFields => {
                StatusCode::BAD_REQUEST
            }
            ApiError::SegmentGroupNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::DuplicateName { .. } => StatusCode::CONFLICT,
            ApiError::Platform { .. } | ApiError::Store { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidJson(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, message) = match &self {
            ApiError::InvalidRequest(e) => (e.to_string(), None),
            ApiError::InvalidJson(detail) => ("Invalid JSON body".to_string(), Some(detail.clone())),
            ApiError::MissingFields => (
                self.to_string(),
                Some("name, segmentsToInclude, and segmentsToExclude are required".to_string()),
            ),
            ApiError::SegmentGroupNotFound { id } => (
                self.to_string(),
                Some(format!("No segment group found with ID: {id}")),
            ),
            ApiError::DuplicateName { error } => (
                error.to_string(),
                Some("A segment group with this name already exists".to_string()),
            ),
            ApiError::Platform { context, source } => {
                tracing::error!(error = %source, status = ?source.status(), "{context}");
                (context.to_string(), Some(source.to_string()))
            }
            ApiError::Store { context, source } => {
                tracing::error!(error = %source, "{context}");
                (context.to_string(), Some(source.to_string()))
            }
        };

        let body = Json(ErrorBody {
            success: false,
            error,
            message,
        });
        (status, body).into_response()
    }
}
