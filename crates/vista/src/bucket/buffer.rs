//! Buffered field edits.

use indexmap::IndexMap;
use tracing::debug;

use crate::catalog::FieldValue;
use crate::instance::InstanceId;
use crate::layout::CardKey;

use super::store::BucketStore;

/// Pending field edits that have not reached the bucket store yet.
///
/// Edits to the same field collapse to the latest value. Anything that reads
/// bucket state (save, copy, aggregation) flushes first.
#[derive(Debug, Clone, Default)]
pub struct InputBuffer {
    pending: IndexMap<(InstanceId, CardKey, String), FieldValue>,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a field edit.
    pub fn push(
        &mut self,
        instance: InstanceId,
        key: CardKey,
        field: impl Into<String>,
        value: impl Into<FieldValue>,
    ) {
        self.pending
            .insert((instance, key, field.into()), value.into());
    }

    /// Latest pending value for a field, if any.
    pub fn pending_value(&self, instance: InstanceId, key: &CardKey, field: &str) -> Option<&FieldValue> {
        self.pending
            .iter()
            .find(|((i, k, f), _)| *i == instance && k == key && f == field)
            .map(|(_, value)| value)
    }

    /// Drop pending edits for one instance.
    pub fn discard_instance(&mut self, instance: InstanceId) {
        self.pending.retain(|(i, _, _), _| *i != instance);
    }

    /// Point pending edits at a new instance id.
    pub fn rekey(&mut self, from: InstanceId, to: InstanceId) {
        self.pending = std::mem::take(&mut self.pending)
            .into_iter()
            .map(|((i, k, f), v)| (((if i == from { to } else { i }), k, f), v))
            .collect();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Apply every pending edit to the store and return how many were applied.
    ///
    /// Missing records are created, stamped with their instance and, for
    /// repeatable types, their card id.
    pub fn flush(&mut self, store: &mut BucketStore) -> usize {
        let count = self.pending.len();
        if count == 0 {
            return 0;
        }

        for ((instance, key, field), value) in self.pending.drain(..) {
            let card_id = key.card_id().map(str::to_string);
            let record = store.bucket_mut(instance).entry(key);
            if record.layout_instance_id.is_none() {
                record.layout_instance_id = Some(instance);
            }
            if record.card_instance_id.is_none() {
                record.card_instance_id = card_id;
            }
            record.fields.insert(field, value);
        }

        debug!(edits = count, "Flushed input buffer");
        count
    }
}
