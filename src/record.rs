//! File records as seen by the conversion tracker.
//!
//! The storage listing owns the records; the tracker only reads a file's
//! URL and step and writes the step back after each lifecycle edge.
//! [`FileRecordStore`] is that seam. [`InMemoryFileStore`] backs tests and
//! the CLI.

use crate::error::ConvertError;
use crate::step::ConversionStep;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// One entry of the cloud-storage listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Opaque key addressing the file on the server.
    #[serde(rename = "fileUUID")]
    pub file_uuid: String,
    pub file_name: String,
    /// Download URL (or local path); only its extension matters here.
    #[serde(rename = "fileURL")]
    pub file_url: String,
    #[serde(rename = "convertStep", default)]
    pub conversion_step: ConversionStep,
}

impl FileRecord {
    pub fn new(file_uuid: impl Into<String>, file_url: impl Into<String>) -> Self {
        let file_url = file_url.into();
        let file_name = file_url
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .to_string();
        Self {
            file_uuid: file_uuid.into(),
            file_name,
            file_url,
            conversion_step: ConversionStep::None,
        }
    }

    pub fn with_step(mut self, step: ConversionStep) -> Self {
        self.conversion_step = step;
        self
    }
}

/// Read/update access to the storage listing.
#[async_trait]
pub trait FileRecordStore: Send + Sync {
    /// Look up one record.
    async fn get(&self, file_uuid: &str) -> Result<Option<FileRecord>, ConvertError>;

    /// Every record currently listed.
    async fn list(&self) -> Result<Vec<FileRecord>, ConvertError>;

    /// Overwrite a record's step.
    ///
    /// # Errors
    /// [`ConvertError::FileNotFound`] if the record is not listed;
    /// [`ConvertError::Store`] if the backend cannot be written.
    async fn update_step(&self, file_uuid: &str, step: ConversionStep) -> Result<(), ConvertError>;
}

/// Process-local store keyed by file UUID.
#[derive(Debug, Default)]
pub struct InMemoryFileStore {
    records: DashMap<String, FileRecord>,
}

impl InMemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record.
    pub fn insert(&self, record: FileRecord) {
        self.records.insert(record.file_uuid.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<FileRecord> for InMemoryFileStore {
    fn from_iter<I: IntoIterator<Item = FileRecord>>(iter: I) -> Self {
        let store = InMemoryFileStore::new();
        for record in iter {
            store.insert(record);
        }
        store
    }
}

#[async_trait]
impl FileRecordStore for InMemoryFileStore {
    async fn get(&self, file_uuid: &str) -> Result<Option<FileRecord>, ConvertError> {
        Ok(self.records.get(file_uuid).map(|r| r.value().clone()))
    }

    async fn list(&self) -> Result<Vec<FileRecord>, ConvertError> {
        let mut records: Vec<FileRecord> =
            self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| a.file_uuid.cmp(&b.file_uuid));
        Ok(records)
    }

    async fn update_step(&self, file_uuid: &str, step: ConversionStep) -> Result<(), ConvertError> {
        match self.records.get_mut(file_uuid) {
            Some(mut record) => {
                record.conversion_step = step;
                Ok(())
            }
            None => Err(ConvertError::FileNotFound {
                file_id: file_uuid.to_string(),
            }),
        }
    }
}
