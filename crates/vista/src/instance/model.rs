//! Identifiers and the layout instance record.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::layout::LayoutData;

/// Identifier of a layout instance.
///
/// Negative ids are temporary: the instance exists only in memory until the
/// exam is first saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub i64);

impl InstanceId {
    pub fn is_temporary(&self) -> bool {
        self.0 < 0
    }

    pub fn state(&self) -> InstanceState {
        if self.is_temporary() {
            InstanceState::Temporary
        } else {
            InstanceState::Persisted
        }
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExamId(pub i64);

impl fmt::Display for ExamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a reusable layout template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutId(pub i64);

impl fmt::Display for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persistence state of an instance, derived from its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceState {
    Temporary,
    Persisted,
}

/// A reusable named layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutTemplate {
    pub id: LayoutId,
    pub name: String,
    pub data: LayoutData,
}

impl LayoutTemplate {
    pub fn new(id: LayoutId, name: impl Into<String>, data: LayoutData) -> Self {
        Self {
            id,
            name: name.into(),
            data,
        }
    }
}

/// The binding of a layout to one exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutInstance {
    pub id: InstanceId,

    /// Owning exam; `None` while the exam itself is not persisted.
    #[serde(default)]
    pub exam_id: Option<ExamId>,

    /// Backing template, or `None` for an ad-hoc (full data) layout.
    #[serde(default)]
    pub layout_id: Option<LayoutId>,

    pub layout_data: LayoutData,

    #[serde(default)]
    pub is_active: bool,

    #[serde(default)]
    pub order: u32,
}

impl LayoutInstance {
    pub fn new(id: InstanceId, layout_id: Option<LayoutId>, layout_data: LayoutData) -> Self {
        Self {
            id,
            exam_id: None,
            layout_id,
            layout_data,
            is_active: false,
            order: 0,
        }
    }

    pub fn with_exam(mut self, exam_id: ExamId) -> Self {
        self.exam_id = Some(exam_id);
        self
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Whether this is the synthetic full data instance.
    pub fn is_full_data(&self) -> bool {
        self.layout_id.is_none()
    }

    pub fn state(&self) -> InstanceState {
        self.id.state()
    }
}
