//! In-memory services, backed optionally by a snapshot.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::Mutex;
use tracing::debug;

use crate::bucket::Bucket;
use crate::error::{Result, VistaError};
use crate::instance::{ExamId, InstanceId, LayoutInstance};
use crate::persistence::{ExamSnapshot, InstanceBucket};

use super::provider::{ComponentDataService, LayoutInstanceService, NewInstance};

#[derive(Debug, Default)]
struct MemoryState {
    instances: IndexMap<InstanceId, LayoutInstance>,
    buckets: IndexMap<InstanceId, Bucket>,
    next_instance_id: i64,
    next_record_id: i64,
}

#[derive(Debug, Default)]
struct FailurePlan {
    creates_allowed: Option<usize>,
    failing_saves: HashSet<InstanceId>,
    failing_loads: HashSet<InstanceId>,
}

/// Implements both service traits over in-memory maps.
///
/// Used by the CLI (seeded from a snapshot file) and by tests, which can
/// inject failures and latency.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    failures: Mutex<FailurePlan>,
    delay: Option<Duration>,
    create_calls: AtomicUsize,
    save_calls: AtomicUsize,
    load_calls: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store. Instance ids start at 1.
    pub fn new() -> Self {
        Self::with_state(MemoryState {
            next_instance_id: 1,
            next_record_id: 1,
            ..MemoryState::default()
        })
    }

    /// Create a store holding the instances and records of a snapshot.
    pub fn from_snapshot(snapshot: &ExamSnapshot) -> Self {
        let mut state = MemoryState {
            next_instance_id: 1,
            next_record_id: 1,
            ..MemoryState::default()
        };

        for instance in &snapshot.instances {
            state.next_instance_id = state.next_instance_id.max(instance.id.0 + 1);
            state.instances.insert(instance.id, instance.clone());
        }
        for entry in &snapshot.buckets {
            for (_, record) in entry.records.iter() {
                if let Some(id) = record.id {
                    state.next_record_id = state.next_record_id.max(id + 1);
                }
            }
            state.buckets.insert(entry.instance_id, entry.records.clone());
        }

        Self::with_state(state)
    }

    fn with_state(state: MemoryState) -> Self {
        Self {
            state: Mutex::new(state),
            failures: Mutex::new(FailurePlan::default()),
            delay: None,
            create_calls: AtomicUsize::new(0),
            save_calls: AtomicUsize::new(0),
            load_calls: AtomicUsize::new(0),
        }
    }

    /// Id the next created instance will receive.
    pub fn with_next_instance_id(mut self, id: i64) -> Self {
        self.state.get_mut().next_instance_id = id;
        self
    }

    /// Delay every service call by `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Seed an instance and its records.
    pub async fn seed(&self, instance: LayoutInstance, bucket: Bucket) {
        let mut state = self.state.lock().await;
        state.next_instance_id = state.next_instance_id.max(instance.id.0 + 1);
        state.buckets.insert(instance.id, bucket);
        state.instances.insert(instance.id, instance);
    }

    /// Let the next `count` creations succeed and fail every one after.
    pub async fn fail_creates_after(&self, count: usize) {
        self.failures.lock().await.creates_allowed = Some(count);
    }

    /// Fail every save for `instance`.
    pub async fn fail_saves_for(&self, instance: InstanceId) {
        self.failures.lock().await.failing_saves.insert(instance);
    }

    /// Fail every load for `instance`.
    pub async fn fail_loads_for(&self, instance: InstanceId) {
        self.failures.lock().await.failing_loads.insert(instance);
    }

    /// Remove all injected failures.
    pub async fn clear_failures(&self) {
        *self.failures.lock().await = FailurePlan::default();
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }

    /// A stored instance.
    pub async fn instance(&self, id: InstanceId) -> Option<LayoutInstance> {
        self.state.lock().await.instances.get(&id).cloned()
    }

    /// The records stored for an instance.
    pub async fn stored(&self, id: InstanceId) -> Option<Bucket> {
        self.state.lock().await.buckets.get(&id).cloned()
    }

    /// Snapshot of everything stored.
    pub async fn snapshot(&self, exam_id: Option<ExamId>) -> ExamSnapshot {
        let state = self.state.lock().await;
        let mut snapshot = ExamSnapshot::new(exam_id);
        snapshot.instances = state
            .instances
            .values()
            .filter(|i| exam_id.is_none() || i.exam_id == exam_id)
            .cloned()
            .collect();
        snapshot.buckets = snapshot
            .instances
            .iter()
            .filter_map(|i| {
                state.buckets.get(&i.id).map(|records| InstanceBucket {
                    instance_id: i.id,
                    records: records.clone(),
                })
            })
            .collect();
        snapshot
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ComponentDataService for MemoryStore {
    async fn load_all(&self, instance: InstanceId) -> Result<Bucket> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        if self.failures.lock().await.failing_loads.contains(&instance) {
            return Err(VistaError::Service(format!(
                "load failed for instance {}",
                instance
            )));
        }

        let state = self.state.lock().await;
        Ok(state.buckets.get(&instance).cloned().unwrap_or_default())
    }

    async fn save_all(&self, instance: InstanceId, bucket: &Bucket) -> Result<Bucket> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        if self.failures.lock().await.failing_saves.contains(&instance) {
            return Err(VistaError::Service(format!(
                "save failed for instance {}",
                instance
            )));
        }

        let mut state = self.state.lock().await;
        let mut stored = bucket.clone();
        stored.stamp(instance);
        for record in stored.records_mut() {
            if record.id.is_none() {
                record.id = Some(state.next_record_id);
                state.next_record_id += 1;
            }
        }

        debug!(instance = %instance, records = stored.len(), "Stored component data");
        state.buckets.insert(instance, stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl LayoutInstanceService for MemoryStore {
    async fn create(&self, request: NewInstance) -> Result<LayoutInstance> {
        let call = self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        if let Some(allowed) = self.failures.lock().await.creates_allowed {
            if call >= allowed {
                return Err(VistaError::Service("instance creation rejected".to_string()));
            }
        }

        let mut state = self.state.lock().await;
        let id = InstanceId(state.next_instance_id);
        state.next_instance_id += 1;

        let instance = LayoutInstance {
            id,
            exam_id: Some(request.exam_id),
            layout_id: request.layout_id,
            layout_data: request.layout_data,
            is_active: request.is_active,
            order: request.order,
        };
        state.instances.insert(id, instance.clone());
        Ok(instance)
    }

    async fn update(&self, instance: &LayoutInstance) -> Result<LayoutInstance> {
        self.pause().await;

        let mut state = self.state.lock().await;
        match state.instances.get_mut(&instance.id) {
            Some(stored) => {
                *stored = instance.clone();
                Ok(instance.clone())
            }
            None => Err(VistaError::UnknownInstance(instance.id)),
        }
    }

    async fn delete(&self, instance: InstanceId) -> Result<()> {
        self.pause().await;

        let mut state = self.state.lock().await;
        if state.instances.shift_remove(&instance).is_none() {
            return Err(VistaError::UnknownInstance(instance));
        }
        state.buckets.shift_remove(&instance);
        Ok(())
    }
}
