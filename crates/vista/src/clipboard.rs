//! Page-scoped clipboard for card data.
//!
//! A [`Clipboard`] is a cheap cloneable handle to one shared slot. Pages that
//! should paste across each other receive clones of the same handle; separate
//! exams get separate handles.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{ComponentRecord, ComponentType};
use crate::mapping::{copy_data, mapping};

/// The copied data and the type it was copied from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipboardEntry {
    #[serde(rename = "type")]
    pub component: ComponentType,
    pub data: ComponentRecord,
}

/// Result of a "copy to neighbouring card" action.
#[derive(Debug, Clone, PartialEq)]
pub enum CopyOutcome {
    /// Data was merged into the nearest compatible card.
    Copied {
        card_id: String,
        component: ComponentType,
    },
    /// No card in that direction accepts this type.
    NoTarget,
    /// The source card has no resolvable key (e.g. a cover test without tabs).
    Skipped,
}

/// Result of a paste.
#[derive(Debug, Clone, PartialEq)]
pub enum PasteOutcome {
    Pasted { from: ComponentType },
    /// Nothing transfers between the two types; no data was changed.
    Incompatible {
        source: ComponentType,
        target: ComponentType,
    },
    /// The clipboard holds nothing.
    Empty,
    /// The target card has no resolvable key.
    Skipped,
}

/// Shared single-entry clipboard slot.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    slot: Arc<RwLock<Option<ClipboardEntry>>>,
}

impl Clipboard {
    /// Create an empty clipboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy a card's data, replacing whatever was held before.
    pub fn copy(&self, component: ComponentType, data: ComponentRecord) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(ClipboardEntry { component, data });
        debug!(component = %component, "Copied card data to clipboard");
    }

    /// The current entry, if any.
    pub fn entry(&self) -> Option<ClipboardEntry> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    pub fn clear(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Merge the held entry onto `target` of type `target_type`.
    ///
    /// Returns the merged record, or the soft outcome that prevented it. The
    /// entry stays on the clipboard.
    pub fn paste_onto(
        &self,
        target_type: ComponentType,
        target: &ComponentRecord,
    ) -> std::result::Result<ComponentRecord, PasteOutcome> {
        let Some(entry) = self.entry() else {
            return Err(PasteOutcome::Empty);
        };

        if mapping(entry.component, target_type).is_empty() {
            return Err(PasteOutcome::Incompatible {
                source: entry.component,
                target: target_type,
            });
        }

        Ok(copy_data(&entry.data, target, entry.component, target_type))
    }

    /// Whether two handles share one slot.
    pub fn shares_slot_with(&self, other: &Clipboard) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}
