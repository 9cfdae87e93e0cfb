//! Sparse component records and their field values.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::instance::InstanceId;

use super::component::ComponentType;

/// A single field value in a component record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Explicitly unset.
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Returns true for values that carry nothing to copy (null or blank text).
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Bool(_) | FieldValue::Number(_) => false,
        }
    }

    /// Returns true for values that count as recorded data.
    ///
    /// Stricter than `!is_empty()`: an unchecked box is not a measurement.
    pub fn is_recorded(&self) -> bool {
        match self {
            FieldValue::Bool(b) => *b,
            other => !other.is_empty(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// The data of one card: typed fields plus addressing metadata.
///
/// Field names are not restricted to the component schema; records loaded
/// from storage may carry extra columns, which are preserved untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentRecord {
    /// Storage identifier, assigned once the record has been persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Layout instance that owns this record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_instance_id: Option<InstanceId>,

    /// Owning card id, for repeatable component types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_instance_id: Option<String>,

    /// Field values in insertion order.
    #[serde(flatten)]
    pub fields: IndexMap<String, FieldValue>,
}

impl ComponentRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the owning layout instance.
    pub fn with_instance(mut self, instance: InstanceId) -> Self {
        self.layout_instance_id = Some(instance);
        self
    }

    /// Set the owning card id.
    pub fn with_card(mut self, card_id: impl Into<String>) -> Self {
        self.card_instance_id = Some(card_id.into());
        self
    }

    /// Set a field value.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Get a field value.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Set a field value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Text title stored on the record, if any.
    pub fn title(&self) -> Option<&str> {
        self.get("title")
            .and_then(FieldValue::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Whether the record holds no recorded measurement for `component`.
    ///
    /// Only schema fields are inspected and `title` never counts as data.
    pub fn is_empty_for(&self, component: ComponentType) -> bool {
        !component
            .fields()
            .iter()
            .filter(|field| **field != "title")
            .any(|field| self.fields.get(*field).is_some_and(FieldValue::is_recorded))
    }
}
