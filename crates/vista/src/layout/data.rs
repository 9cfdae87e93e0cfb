//! Layout data: rows of cards plus per-card width overrides.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::catalog::ComponentType;
use crate::error::{Result, VistaError};

use super::card::{generate_id, Card, Row};

/// Width overrides: row id -> card id -> percentage of the row.
pub type CustomWidths = IndexMap<String, IndexMap<String, f64>>;

/// Direction for "copy to neighbouring card" actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyDirection {
    Left,
    Right,
    Below,
}

/// The structure of a layout.
///
/// Always written as `{ "rows": [...], "customWidths": {...} }`. Reading also
/// accepts a bare array of rows, and either shape encoded as a JSON string.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "LayoutDataRepr")]
pub struct LayoutData {
    pub rows: Vec<Row>,

    #[serde(rename = "customWidths", default)]
    pub custom_widths: CustomWidths,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LayoutDataRepr {
    Legacy(Vec<RawRow>),
    Current {
        #[serde(default)]
        rows: Vec<RawRow>,
        #[serde(rename = "customWidths", default)]
        custom_widths: CustomWidths,
    },
    Encoded(String),
}

#[derive(Deserialize)]
struct RawRow {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    cards: Vec<RawCard>,
}

#[derive(Deserialize)]
struct RawCard {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    title: Option<String>,
}

impl TryFrom<LayoutDataRepr> for LayoutData {
    type Error = VistaError;

    fn try_from(repr: LayoutDataRepr) -> Result<Self> {
        match repr {
            LayoutDataRepr::Legacy(rows) => Ok(Self::from_raw(rows, CustomWidths::new())),
            LayoutDataRepr::Current {
                rows,
                custom_widths,
            } => Ok(Self::from_raw(rows, custom_widths)),
            LayoutDataRepr::Encoded(text) => {
                let inner: LayoutDataRepr = serde_json::from_str(&text)
                    .map_err(|e| VistaError::LayoutData(format!("encoded layout: {}", e)))?;
                if matches!(inner, LayoutDataRepr::Encoded(_)) {
                    return Err(VistaError::LayoutData(
                        "layout data is encoded more than once".to_string(),
                    ));
                }
                Self::try_from(inner)
            }
        }
    }
}

impl LayoutData {
    /// Create layout data from rows, with no width overrides.
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            custom_widths: CustomWidths::new(),
        }
    }

    /// Parse layout data from JSON text in any accepted shape.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse layout data from a JSON value in any accepted shape.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Serialize to the object form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn from_raw(rows: Vec<RawRow>, custom_widths: CustomWidths) -> Self {
        let rows = rows
            .into_iter()
            .map(|raw| {
                let id = raw.id.unwrap_or_else(|| generate_id("row"));
                let cards = raw
                    .cards
                    .into_iter()
                    .filter_map(|card| match ComponentType::from_slug(&card.kind) {
                        Some(component) => Some(Card {
                            id: card.id.unwrap_or_else(|| generate_id(component.slug())),
                            component,
                            title: card.title,
                        }),
                        None => {
                            warn!(card_type = %card.kind, row = %id, "Skipping card of unknown type");
                            None
                        }
                    })
                    .collect();
                Row { id, cards }
            })
            .collect();

        Self {
            rows,
            custom_widths,
        }
    }

    /// All cards in display order.
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.rows.iter().flat_map(|row| row.cards.iter())
    }

    pub fn card_count(&self) -> usize {
        self.rows.iter().map(|row| row.cards.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.card_count() == 0
    }

    /// Distinct component types in display order.
    pub fn component_types(&self) -> Vec<ComponentType> {
        let mut types = Vec::new();
        for card in self.cards() {
            if !types.contains(&card.component) {
                types.push(card.component);
            }
        }
        types
    }

    /// Row and column index of a card.
    pub fn locate(&self, card_id: &str) -> Option<(usize, usize)> {
        self.rows.iter().enumerate().find_map(|(r, row)| {
            row.cards
                .iter()
                .position(|card| card.id == card_id)
                .map(|c| (r, c))
        })
    }

    pub fn find_card(&self, card_id: &str) -> Option<&Card> {
        self.cards().find(|card| card.id == card_id)
    }

    /// First card of a given type, if any.
    pub fn first_of(&self, component: ComponentType) -> Option<&Card> {
        self.cards().find(|card| card.component == component)
    }

    /// Cards neighbouring `card_id` in `direction`, nearest first.
    ///
    /// Left and right walk the card's own row; below walks every following
    /// row from left to right.
    pub fn neighbours(&self, card_id: &str, direction: CopyDirection) -> Vec<&Card> {
        let Some((row, col)) = self.locate(card_id) else {
            return Vec::new();
        };

        match direction {
            CopyDirection::Left => self.rows[row].cards[..col].iter().rev().collect(),
            CopyDirection::Right => self.rows[row].cards[col + 1..].iter().collect(),
            CopyDirection::Below => self.rows[row + 1..]
                .iter()
                .flat_map(|r| r.cards.iter())
                .collect(),
        }
    }

    /// Override the width of a card, as a percentage of its row.
    pub fn set_custom_width(&mut self, row_id: &str, card_id: &str, width: f64) -> Result<()> {
        if !(width > 0.0 && width <= 100.0) {
            return Err(VistaError::InvalidWidth {
                card_id: card_id.to_string(),
                width,
            });
        }

        let in_row = self
            .rows
            .iter()
            .find(|row| row.id == row_id)
            .is_some_and(|row| row.cards.iter().any(|card| card.id == card_id));
        if !in_row {
            return Err(VistaError::UnknownCard(card_id.to_string()));
        }

        self.custom_widths
            .entry(row_id.to_string())
            .or_default()
            .insert(card_id.to_string(), width);
        debug!(row = row_id, card = card_id, width, "Set custom card width");
        Ok(())
    }

    /// Effective width of a card: its override, or an even share of the row.
    pub fn width_of(&self, row_id: &str, card_id: &str) -> Option<f64> {
        let row = self.rows.iter().find(|row| row.id == row_id)?;
        if !row.cards.iter().any(|card| card.id == card_id) {
            return None;
        }

        let custom = self
            .custom_widths
            .get(row_id)
            .and_then(|widths| widths.get(card_id))
            .copied();

        Some(custom.unwrap_or(100.0 / row.cards.len() as f64))
    }
}
