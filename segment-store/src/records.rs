//! Record set shared by every backend.
//!
//! Holds the groups keyed by id and enforces name uniqueness. Backends decide
//! where the set lives and when it is persisted.

use crate::StoreError;
use crate::types::{Assignment, SegmentGroup, SegmentGroupDraft};
use chrono::Utc;
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
pub(crate) struct Records {
    groups: HashMap<String, SegmentGroup>,
}

impl Records {
    pub fn from_groups(groups: Vec<SegmentGroup>) -> Self {
        Records {
            groups: groups.into_iter().map(|g| (g.id.clone(), g)).collect(),
        }
    }

    /// All groups, ordered by name.
    pub fn list(&self) -> Vec<SegmentGroup> {
        let mut groups: Vec<SegmentGroup> = self.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        groups
    }

    pub fn get(&self, id: &str) -> Result<SegmentGroup, StoreError> {
        self.groups
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub fn create(&mut self, draft: SegmentGroupDraft) -> Result<SegmentGroup, StoreError> {
        self.check_unique(&draft.name, None)?;

        let now = Utc::now();
        let group = SegmentGroup {
            id: uuid::Uuid::new_v4().to_string(),
            name: draft.name,
            segments_to_include: draft.segments_to_include,
            segments_to_exclude: draft.segments_to_exclude,
            created_at: now,
            updated_at: now,
        };
        self.groups.insert(group.id.clone(), group.clone());
        Ok(group)
    }

    pub fn update(
        &mut self,
        id: &str,
        draft: SegmentGroupDraft,
    ) -> Result<SegmentGroup, StoreError> {
        if !self.groups.contains_key(id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.check_unique(&draft.name, Some(id))?;

        let group = self
            .groups
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        group.name = draft.name;
        group.segments_to_include = draft.segments_to_include;
        group.segments_to_exclude = draft.segments_to_exclude;
        group.updated_at = Utc::now();
        Ok(group.clone())
    }

    /// Moves `segment_id` within group `id`. Leaves the group untouched when
    /// the segment already has the requested assignment.
    pub fn assign(
        &mut self,
        id: &str,
        segment_id: &str,
        assignment: Assignment,
    ) -> Result<SegmentGroup, StoreError> {
        let mut draft = self.get(id)?.draft();
        if draft.assignment_of(segment_id) == assignment {
            return self.get(id);
        }
        draft.assign(segment_id, assignment);
        self.update(id, draft)
    }

    pub fn delete(&mut self, id: &str) -> Result<SegmentGroup, StoreError> {
        self.groups
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn check_unique(&self, name: &str, except_id: Option<&str>) -> Result<(), StoreError> {
        let taken = self
            .groups
            .values()
            .any(|g| g.name == name && Some(g.id.as_str()) != except_id);
        if taken {
            return Err(StoreError::UniqueViolation(name.to_string()));
        }
        Ok(())
    }
}
