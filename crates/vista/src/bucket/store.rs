//! Per-instance buckets of card data.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::ComponentRecord;
use crate::instance::InstanceId;
use crate::layout::CardKey;

/// Card data of one layout instance, keyed by card key.
///
/// Serialized as a map from the string form of each key. Keys that do not
/// parse are dropped on read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "IndexMap<String, ComponentRecord>",
    into = "IndexMap<String, ComponentRecord>"
)]
pub struct Bucket {
    records: IndexMap<CardKey, ComponentRecord>,
}

impl From<IndexMap<String, ComponentRecord>> for Bucket {
    fn from(raw: IndexMap<String, ComponentRecord>) -> Self {
        let mut bucket = Bucket::new();
        for (key, record) in raw {
            match CardKey::parse_with_card(&key, record.card_instance_id.as_deref()) {
                Some(card_key) => {
                    bucket.insert(card_key, record);
                }
                None => warn!(key = %key, "Skipping record with unrecognised card key"),
            }
        }
        bucket
    }
}

impl From<Bucket> for IndexMap<String, ComponentRecord> {
    fn from(bucket: Bucket) -> Self {
        bucket
            .records
            .into_iter()
            .map(|(key, record)| (key.to_string(), record))
            .collect()
    }
}

impl FromIterator<(CardKey, ComponentRecord)> for Bucket {
    fn from_iter<I: IntoIterator<Item = (CardKey, ComponentRecord)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl Bucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record, returning the previous one.
    pub fn insert(&mut self, key: CardKey, record: ComponentRecord) -> Option<ComponentRecord> {
        self.records.insert(key, record)
    }

    pub fn get(&self, key: &CardKey) -> Option<&ComponentRecord> {
        self.records.get(key)
    }

    pub fn get_mut(&mut self, key: &CardKey) -> Option<&mut ComponentRecord> {
        self.records.get_mut(key)
    }

    /// The record under `key`, created empty if missing.
    pub fn entry(&mut self, key: CardKey) -> &mut ComponentRecord {
        self.records.entry(key).or_default()
    }

    pub fn remove(&mut self, key: &CardKey) -> Option<ComponentRecord> {
        self.records.shift_remove(key)
    }

    pub fn contains(&self, key: &CardKey) -> bool {
        self.records.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &CardKey> {
        self.records.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CardKey, &ComponentRecord)> {
        self.records.iter()
    }

    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut ComponentRecord> {
        self.records.values_mut()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Stamp every record with its owning instance.
    pub fn stamp(&mut self, instance: InstanceId) {
        for record in self.records.values_mut() {
            record.layout_instance_id = Some(instance);
        }
    }

    /// Put stored records underneath the ones held in memory.
    ///
    /// Stored keys keep their order and in-memory fields win. A record id is
    /// taken from storage when the in-memory record has none. Keys only held
    /// in memory are appended.
    pub fn underlay(&mut self, stored: Bucket) {
        let mut memory = std::mem::take(&mut self.records);
        let mut merged = IndexMap::with_capacity(stored.len() + memory.len());

        for (key, mut record) in stored.records {
            if let Some(local) = memory.shift_remove(&key) {
                record.id = local.id.or(record.id);
                record.layout_instance_id = local.layout_instance_id.or(record.layout_instance_id);
                record.card_instance_id = local.card_instance_id.or(record.card_instance_id);
                record.fields.extend(local.fields);
            }
            merged.insert(key, record);
        }
        merged.extend(memory);

        self.records = merged;
    }
}

/// Buckets for every layout instance of an exam.
#[derive(Debug, Clone, Default)]
pub struct BucketStore {
    buckets: IndexMap<InstanceId, Bucket>,
    loaded: HashSet<InstanceId>,
}

impl BucketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, instance: InstanceId) -> Option<&Bucket> {
        self.buckets.get(&instance)
    }

    pub fn get_mut(&mut self, instance: InstanceId) -> Option<&mut Bucket> {
        self.buckets.get_mut(&instance)
    }

    /// The bucket of `instance`, created empty if missing.
    pub fn bucket_mut(&mut self, instance: InstanceId) -> &mut Bucket {
        self.buckets.entry(instance).or_default()
    }

    /// Replace the bucket of an instance.
    pub fn insert(&mut self, instance: InstanceId, bucket: Bucket) -> Option<Bucket> {
        self.buckets.insert(instance, bucket)
    }

    pub fn remove(&mut self, instance: InstanceId) -> Option<Bucket> {
        self.loaded.remove(&instance);
        self.buckets.shift_remove(&instance)
    }

    /// Move a bucket to a new instance id, keeping its position, and restamp
    /// its records.
    pub fn rekey(&mut self, from: InstanceId, to: InstanceId) {
        if let Some(index) = self.buckets.get_index_of(&from) {
            if let Some((_, mut bucket)) = self.buckets.shift_remove_index(index) {
                bucket.stamp(to);
                self.buckets.insert(to, bucket);
                let last = self.buckets.len() - 1;
                self.buckets.move_index(last, index);
            }
        }
        if self.loaded.remove(&from) {
            self.loaded.insert(to);
        }
    }

    /// Merge loaded records under whatever the instance already holds and
    /// mark it loaded.
    pub fn absorb_loaded(&mut self, instance: InstanceId, stored: Bucket) {
        self.bucket_mut(instance).underlay(stored);
        self.loaded.insert(instance);
    }

    pub fn is_loaded(&self, instance: InstanceId) -> bool {
        self.loaded.contains(&instance)
    }

    pub fn mark_loaded(&mut self, instance: InstanceId) {
        self.loaded.insert(instance);
    }

    /// Whether an instance has records in memory.
    pub fn has_data(&self, instance: InstanceId) -> bool {
        self.buckets.get(&instance).is_some_and(|b| !b.is_empty())
    }

    pub fn instances(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.buckets.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (InstanceId, &Bucket)> {
        self.buckets.iter().map(|(id, bucket)| (*id, bucket))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
