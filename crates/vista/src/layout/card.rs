//! Cards and rows.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::catalog::ComponentType;

/// A measurement widget placed in a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Stable identifier within the layout.
    pub id: String,

    /// Component type rendered by this card.
    #[serde(rename = "type")]
    pub component: ComponentType,

    /// Optional title, for types that support one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Card {
    /// Create a card with a known id.
    pub fn new(id: impl Into<String>, component: ComponentType) -> Self {
        Self {
            id: id.into(),
            component,
            title: None,
        }
    }

    /// Create a card with a freshly generated id.
    pub fn generate(component: ComponentType) -> Self {
        Self::new(generate_id(component.slug()), component)
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// An ordered list of cards displayed side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub id: String,
    pub cards: Vec<Card>,
}

impl Row {
    /// Create an empty row with a known id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cards: Vec::new(),
        }
    }

    /// Create an empty row with a freshly generated id.
    pub fn generate() -> Self {
        Self::new(generate_id("row"))
    }

    /// Append a card.
    pub fn with_card(mut self, card: Card) -> Self {
        self.cards.push(card);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Generate an id of the form `<prefix>-<millis>-<hex>`.
pub(crate) fn generate_id(prefix: &str) -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    format!(
        "{}-{}-{:x}{:04x}",
        prefix,
        Utc::now().timestamp_millis(),
        COUNTER.fetch_add(1, Ordering::Relaxed),
        fastrand::u16(..)
    )
}

/// Generate a tab id. Tab ids never contain `-`.
pub(crate) fn generate_tab_id() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    format!(
        "t{:x}{:06x}",
        COUNTER.fetch_add(1, Ordering::Relaxed),
        fastrand::u32(..0x0100_0000)
    )
}
