//! External service traits consumed by the exam session.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::bucket::Bucket;
use crate::error::Result;
use crate::instance::{ExamId, InstanceId, LayoutId, LayoutInstance};
use crate::layout::LayoutData;

/// Request to persist a new layout instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInstance {
    pub exam_id: ExamId,
    pub layout_id: Option<LayoutId>,
    pub is_active: bool,
    pub order: u32,
    pub layout_data: LayoutData,
}

impl NewInstance {
    /// Build a creation request from an in-memory instance.
    pub fn from_instance(exam_id: ExamId, instance: &LayoutInstance) -> Self {
        Self {
            exam_id,
            layout_id: instance.layout_id,
            is_active: instance.is_active,
            order: instance.order,
            layout_data: instance.layout_data.clone(),
        }
    }
}

/// Loads and saves the card records of one layout instance.
#[async_trait]
pub trait ComponentDataService: Send + Sync {
    /// Load every record stored for an instance.
    async fn load_all(&self, instance: InstanceId) -> Result<Bucket>;

    /// Save every record of an instance's bucket.
    ///
    /// # Returns
    /// The bucket as stored, with record ids assigned.
    async fn save_all(&self, instance: InstanceId, bucket: &Bucket) -> Result<Bucket>;
}

/// Creates, updates and deletes layout instances.
#[async_trait]
pub trait LayoutInstanceService: Send + Sync {
    /// Persist a new instance and return it with its real id.
    async fn create(&self, request: NewInstance) -> Result<LayoutInstance>;

    /// Replace a persisted instance.
    async fn update(&self, instance: &LayoutInstance) -> Result<LayoutInstance>;

    /// Delete a persisted instance and its records.
    async fn delete(&self, instance: InstanceId) -> Result<()>;
}
