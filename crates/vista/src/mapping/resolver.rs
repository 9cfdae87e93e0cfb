//! Field mapping resolution and the copy/clear primitives built on it.

use indexmap::IndexMap;
use serde::Serialize;

use crate::catalog::{ComponentRecord, ComponentType, FieldValue};

use super::overrides;

/// Field-to-field mapping for an ordered (source, target) pair of types.
///
/// A `None` target means the source field is dropped during a copy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct FieldMapping {
    entries: IndexMap<&'static str, Option<&'static str>>,
}

impl FieldMapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity entries for every field name present in both schemas; source
    /// fields the target lacks map to `None`.
    pub fn shared_names(source: ComponentType, target: ComponentType) -> Self {
        let entries = source
            .fields()
            .iter()
            .map(|field| {
                let dst = target.fields().iter().copied().find(|f| f == field);
                (*field, dst)
            })
            .collect();
        Self { entries }
    }

    /// Set the target of a source field.
    pub fn insert(&mut self, source: &'static str, target: Option<&'static str>) {
        self.entries.insert(source, target);
    }

    /// The entry for a source field: `Some(None)` means explicitly dropped.
    pub fn get(&self, source: &str) -> Option<Option<&'static str>> {
        self.entries.get(source).copied()
    }

    /// The target field a source field is copied into, if any.
    pub fn target_of(&self, source: &str) -> Option<&'static str> {
        self.get(source).flatten()
    }

    /// All entries, including dropped fields.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Option<&'static str>)> + '_ {
        self.entries.iter().map(|(src, dst)| (*src, *dst))
    }

    /// Only the entries that transfer a value.
    pub fn transfers(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.entries
            .iter()
            .filter_map(|(src, dst)| dst.map(|dst| (*src, dst)))
    }

    /// Number of entries, including dropped fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing would be transferred, i.e. the pair is incompatible.
    pub fn is_empty(&self) -> bool {
        self.transfers().next().is_none()
    }
}

/// Resolve the mapping from `source` to `target`.
///
/// An explicit override wins; otherwise types listed as compatible (and every
/// type with itself) map by shared field names; any other pair is empty.
pub fn mapping(source: ComponentType, target: ComponentType) -> FieldMapping {
    if let Some(explicit) = overrides::lookup(source, target) {
        return explicit.clone();
    }

    if source == target || source.compatible_targets().contains(&target) {
        return FieldMapping::shared_names(source, target);
    }

    FieldMapping::new()
}

/// Resolve a mapping from type identifiers; unknown identifiers have an empty
/// schema and therefore produce an empty mapping.
pub fn mapping_for_slugs(source: &str, target: &str) -> FieldMapping {
    match (
        ComponentType::from_slug(source),
        ComponentType::from_slug(target),
    ) {
        (Some(source), Some(target)) => mapping(source, target),
        _ => FieldMapping::new(),
    }
}

/// Copy mapped, non-empty source values onto a copy of `target`.
///
/// Fields the mapping does not cover, and fields whose source value is empty,
/// keep their target value.
pub fn copy_data(
    source: &ComponentRecord,
    target: &ComponentRecord,
    source_type: ComponentType,
    target_type: ComponentType,
) -> ComponentRecord {
    let mut result = target.clone();

    for (src, dst) in mapping(source_type, target_type).transfers() {
        if let Some(value) = source.fields.get(src) {
            if !value.is_empty() {
                result.fields.insert(dst.to_string(), value.clone());
            }
        }
    }

    result
}

/// Types present in a layout that `source` can be copied into, in catalog order.
pub fn available_targets(
    source: ComponentType,
    present: impl IntoIterator<Item = ComponentType>,
) -> Vec<ComponentType> {
    let present: Vec<ComponentType> = present.into_iter().collect();

    ComponentType::ALL
        .iter()
        .copied()
        .filter(|target| present.contains(target))
        .filter(|target| {
            *target == source
                || source.compatible_targets().contains(target)
                || overrides::has_override(source, *target)
        })
        .collect()
}

/// Blank every field value while keeping the record's identity and placement.
pub fn clear_data(record: &ComponentRecord) -> ComponentRecord {
    ComponentRecord {
        id: record.id,
        layout_instance_id: record.layout_instance_id,
        card_instance_id: record.card_instance_id.clone(),
        fields: record
            .fields
            .keys()
            .map(|name| (name.clone(), FieldValue::Null))
            .collect(),
    }
}
