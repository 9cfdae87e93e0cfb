//! Exam snapshots - save/load JSON files.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bucket::Bucket;
use crate::error::{Result, VistaError};
use crate::instance::{ExamId, InstanceId, LayoutInstance};

/// Current snapshot format version.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// The records of one instance inside a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceBucket {
    pub instance_id: InstanceId,
    pub records: Bucket,
}

/// A point-in-time copy of an exam: its layout instances and their data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamSnapshot {
    pub format_version: u32,

    #[serde(default)]
    pub exam_id: Option<ExamId>,

    pub saved_at: DateTime<Utc>,

    #[serde(default)]
    pub instances: Vec<LayoutInstance>,

    #[serde(default)]
    pub buckets: Vec<InstanceBucket>,
}

impl ExamSnapshot {
    /// Create an empty snapshot.
    pub fn new(exam_id: Option<ExamId>) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            exam_id,
            saved_at: Utc::now(),
            instances: Vec::new(),
            buckets: Vec::new(),
        }
    }

    /// The bucket stored for an instance, if any.
    pub fn bucket(&self, instance: InstanceId) -> Option<&Bucket> {
        self.buckets
            .iter()
            .find(|b| b.instance_id == instance)
            .map(|b| &b.records)
    }

    /// Total number of records across all instances.
    pub fn record_count(&self) -> usize {
        self.buckets.iter().map(|b| b.records.len()).sum()
    }

    /// Save the snapshot to a JSON file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use vista::persistence::ExamSnapshot;
    /// # fn example(snapshot: &ExamSnapshot) -> vista::Result<()> {
    /// snapshot.save("exam-42.snapshot.json")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| VistaError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let file = File::create(path).map_err(|source| VistaError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Load a snapshot from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|source| VistaError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let snapshot: ExamSnapshot = serde_json::from_reader(BufReader::new(file))?;
        if snapshot.format_version > SNAPSHOT_FORMAT_VERSION {
            return Err(VistaError::Config(format!(
                "Snapshot '{}' has format version {}, newest supported is {}",
                path.display(),
                snapshot.format_version,
                SNAPSHOT_FORMAT_VERSION
            )));
        }

        Ok(snapshot)
    }
}
