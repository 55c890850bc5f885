use crate::errors::{ApiError, RequestError};
use crate::metrics_defs::SEGMENT_GROUP_MUTATIONS;
use segment_store::{Assignment, SegmentGroup, SegmentGroupDraft, SegmentGroupStore};
use serde_json::Value;
use shared::counter;
use std::sync::Arc;

const CREATE_CONFLICT: &str = "Segment group already exists";
const UPDATE_CONFLICT: &str = "Segment group name already exists";

/// Parses a create or update body. `name` must be a non-empty string and both
/// segment lists arrays of ids. Empty lists are fine.
pub fn parse_draft(body: &Value) -> Result<SegmentGroupDraft, ApiError> {
    let name = body
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .ok_or(ApiError::MissingFields)?;

    Ok(SegmentGroupDraft {
        name: name.to_string(),
        segments_to_include: segment_list(body, "segmentsToInclude")?,
        segments_to_exclude: segment_list(body, "segmentsToExclude")?,
    })
}

fn segment_list(body: &Value, key: &str) -> Result<Vec<String>, ApiError> {
    body.get(key)
        .and_then(Value::as_array)
        .ok_or(ApiError::MissingFields)?
        .iter()
        .map(|id| id.as_str().map(String::from).ok_or(ApiError::MissingFields))
        .collect()
}

pub fn parse_assignment(body: &Value) -> Result<(String, Assignment), RequestError> {
    let segment_id = body
        .get("segmentId")
        .and_then(Value::as_str)
        .filter(|id| !id.trim().is_empty())
        .ok_or(RequestError::InvalidAssignment)?;
    let assignment = body
        .get("assignment")
        .cloned()
        .and_then(|a| serde_json::from_value(a).ok())
        .ok_or(RequestError::InvalidAssignment)?;
    Ok((segment_id.to_string(), assignment))
}

/// Segment group operations over the configured store.
#[derive(Clone)]
pub struct SegmentGroups {
    store: Arc<dyn SegmentGroupStore>,
}

impl SegmentGroups {
    pub fn new(store: Arc<dyn SegmentGroupStore>) -> Self {
        SegmentGroups { store }
    }

    pub async fn list(&self) -> Result<Vec<SegmentGroup>, ApiError> {
        self.store
            .list()
            .await
            .map_err(ApiError::store("", "Failed to fetch segment groups", CREATE_CONFLICT))
    }

    pub async fn get(&self, id: &str) -> Result<SegmentGroup, ApiError> {
        self.store
            .get(id)
            .await
            .map_err(ApiError::store(id, "Failed to fetch segment group", CREATE_CONFLICT))
    }

    pub async fn create(&self, draft: SegmentGroupDraft) -> Result<SegmentGroup, ApiError> {
        let group = self
            .store
            .create(draft)
            .await
            .map_err(ApiError::store("", "Failed to create segment group", CREATE_CONFLICT))?;
        counter!(SEGMENT_GROUP_MUTATIONS, "operation" => "create").increment(1);
        tracing::info!(id = %group.id, name = %group.name, "created segment group");
        Ok(group)
    }

    pub async fn update(&self, id: &str, draft: SegmentGroupDraft) -> Result<SegmentGroup, ApiError> {
        let group = self
            .store
            .update(id, draft)
            .await
            .map_err(ApiError::store(id, "Failed to update segment group", UPDATE_CONFLICT))?;
        counter!(SEGMENT_GROUP_MUTATIONS, "operation" => "update").increment(1);
        tracing::info!(id = %group.id, name = %group.name, "updated segment group");
        Ok(group)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.store
            .delete(id)
            .await
            .map_err(ApiError::store(id, "Failed to delete segment group", CREATE_CONFLICT))?;
        counter!(SEGMENT_GROUP_MUTATIONS, "operation" => "delete").increment(1);
        tracing::info!(id, "deleted segment group");
        Ok(())
    }

    /// Moves a segment to the include list, the exclude list or neither.
    pub async fn assign(
        &self,
        id: &str,
        segment_id: &str,
        assignment: Assignment,
    ) -> Result<SegmentGroup, ApiError> {
        let group = self
            .store
            .assign(id, segment_id, assignment)
            .await
            .map_err(ApiError::store(id, "Failed to update segment group", UPDATE_CONFLICT))?;
        counter!(SEGMENT_GROUP_MUTATIONS, "operation" => "assign").increment(1);
        tracing::info!(id, segment_id, ?assignment, "assigned segment");
        Ok(group)
    }
}
