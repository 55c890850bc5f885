use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named pair of segment lists, reused as the audience of launched campaigns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentGroup {
    pub id: String,
    pub name: String,
    pub segments_to_include: Vec<String>,
    pub segments_to_exclude: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SegmentGroup {
    pub fn draft(&self) -> SegmentGroupDraft {
        SegmentGroupDraft {
            name: self.name.clone(),
            segments_to_include: self.segments_to_include.clone(),
            segments_to_exclude: self.segments_to_exclude.clone(),
        }
    }
}

/// Client supplied fields of a segment group.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentGroupDraft {
    pub name: String,
    pub segments_to_include: Vec<String>,
    pub segments_to_exclude: Vec<String>,
}

/// Which list of a group a segment belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Assignment {
    Include,
    Exclude,
    #[serde(rename = "none")]
    Unassigned,
}

impl SegmentGroupDraft {
    /// Moves `segment_id` to the requested list. The segment is removed from
    /// the other list, so it is never included and excluded at once.
    pub fn assign(&mut self, segment_id: &str, assignment: Assignment) {
        self.segments_to_include.retain(|s| s != segment_id);
        self.segments_to_exclude.retain(|s| s != segment_id);
        match assignment {
            Assignment::Include => self.segments_to_include.push(segment_id.to_string()),
            Assignment::Exclude => self.segments_to_exclude.push(segment_id.to_string()),
            Assignment::Unassigned => {}
        }
    }

    pub fn assignment_of(&self, segment_id: &str) -> Assignment {
        if self.segments_to_include.iter().any(|s| s == segment_id) {
            Assignment::Include
        } else if self.segments_to_exclude.iter().any(|s| s == segment_id) {
            Assignment::Exclude
        } else {
            Assignment::Unassigned
        }
    }
}
