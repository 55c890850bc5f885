/// Segment groups persisted as a single snapshot file.
///
/// The whole snapshot is loaded when the store is opened and rewritten after
/// every mutation. A mutation only becomes visible once its snapshot is on disk.
use crate::records::Records;
use crate::types::{Assignment, SegmentGroup, SegmentGroupDraft};
use crate::{SegmentGroupStore, StoreError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Compression {
    None,
    // zstd with compression level
    Zstd(i32),
}

struct Codec {
    compression: Compression,
}

impl Codec {
    fn new(compression: Compression) -> Self {
        Codec { compression }
    }

    fn write<W: Write>(&self, writer: &mut W, groups: &[SegmentGroup]) -> Result<(), StoreError> {
        match self.compression {
            Compression::None => {
                serde_json::to_writer(&mut *writer, groups).map_err(StoreError::Encode)?;
                writer.flush()?;
            }
            Compression::Zstd(level) => {
                let mut encoder = zstd::stream::write::Encoder::new(writer, level)?;
                serde_json::to_writer(&mut encoder, groups).map_err(StoreError::Encode)?;
                encoder.finish()?.flush()?;
            }
        }
        Ok(())
    }

    fn read<R: Read>(&self, reader: R) -> Result<Vec<SegmentGroup>, StoreError> {
        match self.compression {
            Compression::None => serde_json::from_reader(reader).map_err(StoreError::Decode),
            Compression::Zstd(_) => {
                let decoder = zstd::stream::read::Decoder::new(reader)?;
                serde_json::from_reader(decoder).map_err(StoreError::Decode)
            }
        }
    }
}

pub struct FilesystemStore {
    path: PathBuf,
    codec: Codec,
    records: Mutex<Records>,
}

impl FilesystemStore {
    /// Opens the snapshot at `base_dir/filename`. A missing file is an empty store.
    pub fn open(
        base_dir: impl AsRef<Path>,
        filename: &str,
        compression: Compression,
    ) -> Result<Self, StoreError> {
        let path = base_dir.as_ref().join(filename);
        let codec = Codec::new(compression);

        let groups = match File::open(&path) {
            Ok(file) => codec.read(BufReader::new(file))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no segment group snapshot, starting empty");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(path = %path.display(), count = groups.len(), "loaded segment groups");

        Ok(FilesystemStore {
            path,
            codec,
            records: Mutex::new(Records::from_groups(groups)),
        })
    }

    fn persist(&self, records: &Records) -> Result<(), StoreError> {
        // Write next to the target and rename so readers never see a partial file
        let tmp_path = self.path.with_extension("tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            self.codec.write(&mut writer, &records.list())?;
            writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        tracing::debug!(path = %self.path.display(), "stored segment group snapshot");
        Ok(())
    }

    /// Applies `mutation` to a copy of the records and swaps it in once persisted.
    fn mutate<T>(
        &self,
        mutation: impl FnOnce(&mut Records) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut records = self.records.lock();
        let mut next = records.clone();
        let result = mutation(&mut next)?;
        self.persist(&next)?;
        *records = next;
        Ok(result)
    }
}

#[async_trait]
impl SegmentGroupStore for FilesystemStore {
    async fn list(&self) -> Result<Vec<SegmentGroup>, StoreError> {
        Ok(self.records.lock().list())
    }

    async fn get(&self, id: &str) -> Result<SegmentGroup, StoreError> {
        self.records.lock().get(id)
    }

    async fn create(&self, draft: SegmentGroupDraft) -> Result<SegmentGroup, StoreError> {
        self.mutate(|records| records.create(draft))
    }

    async fn update(
        &self,
        id: &str,
        draft: SegmentGroupDraft,
    ) -> Result<SegmentGroup, StoreError> {
        self.mutate(|records| records.update(id, draft))
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.mutate(|records| records.delete(id).map(|_| ()))
    }

    async fn assign(
        &self,
        id: &str,
        segment_id: &str,
        assignment: Assignment,
    ) -> Result<SegmentGroup, StoreError> {
        self.mutate(|records| records.assign(id, segment_id, assignment))
    }
}
