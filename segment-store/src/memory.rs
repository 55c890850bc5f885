use crate::records::Records;
use crate::types::{Assignment, SegmentGroup, SegmentGroupDraft};
use crate::{SegmentGroupStore, StoreError};
use async_trait::async_trait;
use parking_lot::RwLock;

/// Process local store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Records>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SegmentGroupStore for MemoryStore {
    async fn list(&self) -> Result<Vec<SegmentGroup>, StoreError> {
        Ok(self.records.read().list())
    }

    async fn get(&self, id: &str) -> Result<SegmentGroup, StoreError> {
        self.records.read().get(id)
    }

    async fn create(&self, draft: SegmentGroupDraft) -> Result<SegmentGroup, StoreError> {
        self.records.write().create(draft)
    }

    async fn update(
        &self,
        id: &str,
        draft: SegmentGroupDraft,
    ) -> Result<SegmentGroup, StoreError> {
        self.records.write().update(id, draft)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.records.write().delete(id).map(|_| ())
    }

    async fn assign(
        &self,
        id: &str,
        segment_id: &str,
        assignment: Assignment,
    ) -> Result<SegmentGroup, StoreError> {
        self.records.write().assign(id, segment_id, assignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_crud() {
        let store = MemoryStore::new();
        let created = store
            .create(SegmentGroupDraft {
                name: "Newsletter".into(),
                segments_to_include: vec!["s1".into()],
                segments_to_exclude: vec!["s2".into()],
            })
            .await
            .unwrap();

        assert_eq!(store.get(&created.id).await.unwrap(), created);
        assert_eq!(store.list().await.unwrap().len(), 1);

        let mut draft = created.draft();
        draft.segments_to_exclude.clear();
        let updated = store.update(&created.id, draft).await.unwrap();
        assert!(updated.segments_to_exclude.is_empty());

        store.delete(&created.id).await.unwrap();
        assert!(matches!(
            store.get(&created.id).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_assignments_are_kept() {
        let store = Arc::new(MemoryStore::new());
        let group = store
            .create(SegmentGroupDraft {
                name: "VIP".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let store = store.clone();
                let id = group.id.clone();
                tokio::spawn(async move {
                    store
                        .assign(&id, &format!("s{i}"), Assignment::Include)
                        .await
                        .unwrap();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let group = store.get(&group.id).await.unwrap();
        assert_eq!(group.segments_to_include.len(), 32);
    }
}
